use thiserror::Error;

/// Result type used across srgraph
pub type Result<T> = std::result::Result<T, TensorError>;

/// Errors raised by tensor kernels, layers and graph tooling
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TensorError {
    #[error("Shape mismatch in operation '{operation}': expected {expected}, got {got}")]
    ShapeMismatch {
        operation: String,
        expected: String,
        got: String,
    },

    /// A layer received a tensor whose channel count differs from its declared input channels
    #[error("Shape error in layer '{layer}': expected {expected} input channels, got {actual}")]
    ShapeError {
        layer: String,
        expected: usize,
        actual: usize,
    },

    /// A required parameter is absent or disagrees with the layer's declared dimensions
    #[error("Parameter error for '{parameter}': {reason}")]
    ParameterError { parameter: String, reason: String },

    #[error("Invalid shape in operation '{operation}': {reason}")]
    InvalidShape {
        operation: String,
        reason: String,
        shape: Option<Vec<usize>>,
    },

    #[error("Invalid argument in operation '{operation}': {reason}")]
    InvalidArgument { operation: String, reason: String },

    #[error("Operation '{operation}' not supported: {reason}")]
    UnsupportedOperation { operation: String, reason: String },

    #[error("Invalid operation '{operation}': {reason}")]
    InvalidOperation { operation: String, reason: String },

    #[error("Compute error in operation '{operation}': {details}")]
    ComputeError { operation: String, details: String },

    #[error("Serialization error in operation '{operation}': {details}")]
    SerializationError { operation: String, details: String },

    #[error("IO error in operation '{operation}': {details}")]
    IoError {
        operation: String,
        details: String,
        path: Option<String>,
    },

    #[error("Numerical error in operation '{operation}': {details}")]
    NumericalError { operation: String, details: String },
}

impl TensorError {
    /// Create a shape mismatch error
    pub fn shape_mismatch(operation: &str, expected: &str, got: &str) -> Self {
        Self::ShapeMismatch {
            operation: operation.to_string(),
            expected: expected.to_string(),
            got: got.to_string(),
        }
    }

    /// Create a channel-count error for a named layer
    pub fn shape_error(layer: &str, expected: usize, actual: usize) -> Self {
        Self::ShapeError {
            layer: layer.to_string(),
            expected,
            actual,
        }
    }

    /// Create a parameter error
    pub fn parameter_error(parameter: &str, reason: impl Into<String>) -> Self {
        Self::ParameterError {
            parameter: parameter.to_string(),
            reason: reason.into(),
        }
    }

    /// Create an invalid shape error carrying the offending shape
    pub fn invalid_shape(operation: &str, reason: impl Into<String>, shape: &[usize]) -> Self {
        Self::InvalidShape {
            operation: operation.to_string(),
            reason: reason.into(),
            shape: Some(shape.to_vec()),
        }
    }

    /// Create an invalid shape error without operation context
    pub fn invalid_shape_simple(reason: String) -> Self {
        Self::InvalidShape {
            operation: "unknown".to_string(),
            reason,
            shape: None,
        }
    }

    /// Create an invalid argument error with operation context
    pub fn invalid_argument_op(operation: &str, reason: &str) -> Self {
        Self::InvalidArgument {
            operation: operation.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an unsupported operation error
    pub fn unsupported_operation(operation: &str, reason: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            operation: operation.to_string(),
            reason: reason.into(),
        }
    }

    /// Create an invalid operation error
    pub fn invalid_operation(operation: &str, reason: impl Into<String>) -> Self {
        Self::InvalidOperation {
            operation: operation.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a compute error
    pub fn compute_error(operation: &str, details: impl Into<String>) -> Self {
        Self::ComputeError {
            operation: operation.to_string(),
            details: details.into(),
        }
    }

    /// Create a serialization error with operation context
    pub fn serialization_error(operation: &str, details: impl Into<String>) -> Self {
        Self::SerializationError {
            operation: operation.to_string(),
            details: details.into(),
        }
    }

    /// Create a serialization error without operation context
    pub fn serialization_error_simple(details: String) -> Self {
        Self::SerializationError {
            operation: "unknown".to_string(),
            details,
        }
    }

    /// Create an IO error for a path
    pub fn io_error(operation: &str, details: impl Into<String>, path: &std::path::Path) -> Self {
        Self::IoError {
            operation: operation.to_string(),
            details: details.into(),
            path: Some(path.display().to_string()),
        }
    }

    /// Create a numerical error
    pub fn numerical_error(operation: &str, details: impl Into<String>) -> Self {
        Self::NumericalError {
            operation: operation.to_string(),
            details: details.into(),
        }
    }

    /// Get the operation (or layer / parameter) name for this error
    pub fn operation(&self) -> &str {
        match self {
            Self::ShapeMismatch { operation, .. } => operation,
            Self::ShapeError { layer, .. } => layer,
            Self::ParameterError { parameter, .. } => parameter,
            Self::InvalidShape { operation, .. } => operation,
            Self::InvalidArgument { operation, .. } => operation,
            Self::UnsupportedOperation { operation, .. } => operation,
            Self::InvalidOperation { operation, .. } => operation,
            Self::ComputeError { operation, .. } => operation,
            Self::SerializationError { operation, .. } => operation,
            Self::IoError { operation, .. } => operation,
            Self::NumericalError { operation, .. } => operation,
        }
    }

    /// Whether the error was raised while binding parameters, before any inference
    pub fn is_parameter_error(&self) -> bool {
        matches!(self, Self::ParameterError { .. })
    }
}
