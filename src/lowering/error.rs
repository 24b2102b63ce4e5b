//! Lowering error types.
//!
//! Every failure the lowering layer can report is a value of
//! [`LoweringError`]. None of them abort compilation by themselves: the
//! driver collects them (see [`crate::compat`]) and reports every
//! incompatibility in one pass.

use thiserror::Error;

use crate::intrinsics::Arity;
use crate::lowering::Backend;

/// An error produced while resolving or emitting an intrinsic call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoweringError {
    /// No provider on any backend recognizes the name.
    #[error("`{name}` is not an intrinsic")]
    UnknownIntrinsic { name: String },

    /// The intrinsic exists, but the requested backend has no provider for it.
    #[error("intrinsic `{name}` is not supported on the {backend} backend")]
    UnsupportedOnBackend { name: String, backend: Backend },

    /// The call site supplies an argument count outside the declared range.
    #[error("intrinsic `{name}` called with {found} arguments, expected {expected}")]
    ArityMismatch {
        name: String,
        expected: Arity,
        found: usize,
    },

    /// An argument fragment the backend cannot use as given.
    #[error("argument {position} of `{name}` is invalid: {message}")]
    InvalidArgument {
        name: String,
        /// 1-based argument position, matching how BASIC users count.
        position: usize,
        message: String,
    },
}

impl LoweringError {
    /// Returns the intrinsic name the error refers to.
    pub fn name(&self) -> &str {
        match self {
            LoweringError::UnknownIntrinsic { name }
            | LoweringError::UnsupportedOnBackend { name, .. }
            | LoweringError::ArityMismatch { name, .. }
            | LoweringError::InvalidArgument { name, .. } => name,
        }
    }
}

/// Error returned when parsing a backend identifier fails.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown backend `{0}` (expected managed, native, ir, or bytecode)")]
pub struct ParseBackendError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_names_intrinsic_and_backend() {
        let err = LoweringError::UnsupportedOnBackend {
            name: "TcpConnect".to_string(),
            backend: Backend::Native,
        };
        let message = err.to_string();
        assert!(message.contains("TcpConnect"));
        assert!(message.contains("native"));
    }

    #[test]
    fn test_arity_display() {
        let err = LoweringError::ArityMismatch {
            name: "Mid".to_string(),
            expected: Arity { min: 2, max: 3 },
            found: 1,
        };
        assert_eq!(
            err.to_string(),
            "intrinsic `Mid` called with 1 arguments, expected 2 to 3"
        );
        assert_eq!(err.name(), "Mid");
    }

    #[test]
    fn test_parse_backend_error_display() {
        let err = ParseBackendError("wasm".to_string());
        assert!(err.to_string().contains("wasm"));
    }
}
