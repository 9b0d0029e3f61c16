use std::path::Path;
use std::process::{Command, Output};

fn srgraph(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_srgraph"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("run srgraph")
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("utf-8 temp path")
}

fn assert_success(output: &Output, what: &str) {
    assert!(
        output.status.success(),
        "{what} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn help_lists_subcommands() {
    let output = srgraph(&["help"]);
    assert_success(&output, "srgraph help");

    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["init", "export", "verify", "inspect"] {
        assert!(stdout.contains(command), "missing {command} in help output");
    }
}

#[test]
fn init_export_inspect_verify() {
    let dir = tempfile::tempdir().expect("temp dir");
    let weights = dir.path().join("weights.safetensors");
    let model = dir.path().join("model.onnx");

    let output = srgraph(&["init", "--upscale-factor", "3", "--seed", "1", "--output", path_str(&weights)]);
    assert_success(&output, "init");
    assert!(weights.is_file());

    let output = srgraph(&[
        "export",
        "--weights",
        path_str(&weights),
        "--output",
        path_str(&model),
        "--height",
        "16",
        "--width",
        "12",
    ]);
    assert_success(&output, "export");

    let output = srgraph(&["inspect", "--model", path_str(&model)]);
    assert_success(&output, "inspect");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("conv1/Conv"));
    assert!(stdout.contains("pixel_shuffle/Transpose"));
    assert!(stdout.contains("[1, 1, 48, 36]"));

    let output = srgraph(&[
        "verify",
        "--weights",
        path_str(&weights),
        "--height",
        "20",
        "--width",
        "20",
    ]);
    assert_success(&output, "verify");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ReshapeTranspose: ok"));
    assert!(stdout.contains("DepthToSpace: ok"));
}

#[test]
fn export_with_depth_to_space_to_json() {
    let dir = tempfile::tempdir().expect("temp dir");
    let weights = dir.path().join("weights.json");
    let model = dir.path().join("model.json");

    assert_success(&srgraph(&["init", "-r", "2", "-o", path_str(&weights)]), "init");
    let output = srgraph(&[
        "export",
        "-w",
        path_str(&weights),
        "-o",
        path_str(&model),
        "--height",
        "8",
        "--width",
        "8",
        "--lowering",
        "depth-to-space",
    ]);
    assert_success(&output, "export");

    let text = std::fs::read_to_string(&model).expect("read exported json");
    assert!(text.contains("DepthToSpace"));
    assert!(text.contains("CRD"));
}

#[test]
fn mismatched_upscale_factor_fails() {
    let dir = tempfile::tempdir().expect("temp dir");
    let weights = dir.path().join("weights.safetensors");
    assert_success(&srgraph(&["init", "-r", "2", "-o", path_str(&weights)]), "init");

    let output = srgraph(&["verify", "-w", path_str(&weights), "-r", "3", "--height", "8", "--width", "8"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("conv4.weight"));
}

#[test]
fn missing_weights_file_fails() {
    let dir = tempfile::tempdir().expect("temp dir");
    let output = srgraph(&["verify", "-w", path_str(&dir.path().join("absent.safetensors"))]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn config_export_format_overrides_extension() {
    let dir = tempfile::tempdir().expect("temp dir");
    let weights = dir.path().join("weights.safetensors");
    let config = dir.path().join("pipeline.toml");
    let model = dir.path().join("model.onnx");
    std::fs::write(&config, "[export]\nformat = \"json\"\n").expect("write config");

    assert_success(&srgraph(&["init", "-r", "2", "-o", path_str(&weights)]), "init");
    let output = srgraph(&[
        "export",
        "-w",
        path_str(&weights),
        "-c",
        path_str(&config),
        "-o",
        path_str(&model),
        "--height",
        "8",
        "--width",
        "8",
    ]);
    assert_success(&output, "export");

    let text = std::fs::read_to_string(&model).expect("exported graph is utf-8 JSON");
    assert!(text.trim_start().starts_with('{'));
    assert!(text.contains("\"ir_version\""));

    let output = srgraph(&["inspect", "-m", path_str(&model)]);
    assert_success(&output, "inspect");
    assert!(String::from_utf8_lossy(&output.stdout).contains("[1, 1, 16, 16]"));
}

#[test]
fn format_flag_writes_protobuf_behind_json_extension() {
    let dir = tempfile::tempdir().expect("temp dir");
    let weights = dir.path().join("weights.safetensors");
    let model = dir.path().join("model.json");

    assert_success(&srgraph(&["init", "-r", "2", "-o", path_str(&weights)]), "init");
    let output = srgraph(&[
        "export", "-w", path_str(&weights), "-o", path_str(&model), "--height", "8", "--width", "8",
        "--format", "onnx",
    ]);
    assert_success(&output, "export");

    let bytes = std::fs::read(&model).expect("read exported graph");
    assert_ne!(bytes.first(), Some(&b'{'));
}
