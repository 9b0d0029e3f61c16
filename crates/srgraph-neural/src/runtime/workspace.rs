use srgraph_core::{Result, Tensor, TensorError};
use std::collections::HashMap;

/// Named tensors produced and consumed by a graph run
///
/// Owned by the caller and passed to [`GraphExecutor::run`](super::GraphExecutor::run)
/// by reference; nothing is shared between workspaces.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    blobs: HashMap<String, Tensor<f32>>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a tensor under `name`, replacing any previous value
    pub fn feed_blob(&mut self, name: impl Into<String>, tensor: Tensor<f32>) -> Option<Tensor<f32>> {
        self.blobs.insert(name.into(), tensor)
    }

    pub fn fetch_blob(&self, name: &str) -> Result<&Tensor<f32>> {
        self.blobs.get(name).ok_or_else(|| {
            TensorError::invalid_argument_op("fetch_blob", &format!("no blob named '{name}'"))
        })
    }

    /// Move a tensor out of the workspace
    pub fn take_blob(&mut self, name: &str) -> Result<Tensor<f32>> {
        self.blobs.remove(name).ok_or_else(|| {
            TensorError::invalid_argument_op("take_blob", &format!("no blob named '{name}'"))
        })
    }

    pub fn has_blob(&self, name: &str) -> bool {
        self.blobs.contains_key(name)
    }

    /// Blob names in sorted order
    pub fn blobs(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.blobs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    pub fn clear(&mut self) {
        self.blobs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_and_fetch() {
        let mut ws = Workspace::new();
        assert!(ws.is_empty());
        ws.feed_blob("b", Tensor::zeros(&[1]));
        ws.feed_blob("a", Tensor::ones(&[2]));
        assert!(ws.has_blob("a"));
        assert_eq!(ws.blobs(), vec!["a", "b"]);
        assert_eq!(ws.fetch_blob("a").unwrap().to_vec(), vec![1.0, 1.0]);
        assert!(ws.fetch_blob("missing").is_err());

        let taken = ws.take_blob("b").unwrap();
        assert_eq!(taken.dims(), &[1]);
        assert_eq!(ws.len(), 1);
        ws.clear();
        assert!(ws.is_empty());
    }
}
