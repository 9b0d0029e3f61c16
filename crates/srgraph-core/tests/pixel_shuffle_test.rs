use srgraph_core::ops::{pixel_shuffle, pixel_unshuffle};
use srgraph_core::Tensor;

/// Channel `c`, row `h`, column `w` holds `c*1000 + h*10 + w`.
fn labelled_input(r: usize, height: usize, width: usize) -> Tensor<f32> {
    let channels = r * r;
    let mut data = Vec::with_capacity(channels * height * width);
    for c in 0..channels {
        for h in 0..height {
            for w in 0..width {
                data.push((c * 1000 + h * 10 + w) as f32);
            }
        }
    }
    Tensor::from_vec(data, &[1, channels, height, width]).unwrap()
}

#[test]
fn test_pixel_shuffle_index_mapping() {
    for r in [2usize, 3, 4] {
        let (height, width) = (3, 5);
        let input = labelled_input(r, height, width);
        let output = pixel_shuffle(&input, r).unwrap();
        assert_eq!(output.dims(), &[1, 1, height * r, width * r]);

        for c in 0..r * r {
            for h in 0..height {
                for w in 0..width {
                    let expected = (c * 1000 + h * 10 + w) as f32;
                    let actual = output
                        .get(&[0, 0, h * r + c / r, w * r + c % r])
                        .unwrap();
                    assert_eq!(
                        actual, expected,
                        "r={r}: channel {c} at ({h}, {w}) landed in the wrong place"
                    );
                }
            }
        }
    }
}

#[test]
fn test_pixel_shuffle_is_a_permutation() {
    let input = labelled_input(3, 4, 4);
    let output = pixel_shuffle(&input, 3).unwrap();

    let mut before = input.to_vec();
    let mut after = output.to_vec();
    before.sort_by(|a, b| a.partial_cmp(b).unwrap());
    after.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(before, after);
}

#[test]
fn test_pixel_shuffle_batches_independently() {
    let first = labelled_input(2, 2, 3);
    let second = Tensor::from_vec(
        first.to_vec().iter().map(|v| -v).collect(),
        first.dims(),
    )
    .unwrap();
    let mut data = first.to_vec();
    data.extend(second.to_vec());
    let batched = Tensor::from_vec(data, &[2, 4, 2, 3]).unwrap();

    let output = pixel_shuffle(&batched, 2).unwrap();
    assert_eq!(output.dims(), &[2, 1, 4, 6]);

    let single = pixel_shuffle(&first, 2).unwrap().to_vec();
    let out = output.to_vec();
    assert_eq!(&out[..24], single.as_slice());
    let negated: Vec<f32> = single.iter().map(|v| -v).collect();
    assert_eq!(&out[24..], negated.as_slice());
}

#[test]
fn test_unshuffle_round_trip() {
    let input = labelled_input(4, 2, 2);
    let restored = pixel_unshuffle(&pixel_shuffle(&input, 4).unwrap(), 4).unwrap();
    assert_eq!(restored, input);
}
