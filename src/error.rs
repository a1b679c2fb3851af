//! Error types for BPS encoding operations.

use thiserror::Error;

/// Result alias for BPS operations.
pub type Result<T> = core::result::Result<T, BpsError>;

/// Errors that can occur during basis construction, encoding, or decoding.
///
/// Variants fall into two families: configuration errors, which mean the
/// call site passed something inconsistent and should be fixed there, and
/// [`BpsError::Oracle`], which carries a failure from a nearest-neighbor or
/// surface-distance backend unchanged.
#[derive(Error, Debug)]
pub enum BpsError {
    /// Invalid construction or call configuration.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    /// Tensor shapes disagree where they must match.
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected shape.
        expected: Vec<usize>,
        /// Actual shape.
        got: Vec<usize>,
    },

    /// The basis batch dimension is neither 1 nor the input batch size.
    #[error("basis batch size {basis_batch} does not match input batch size {input_batch} (must be 1 or equal)")]
    BasisBatchMismatch {
        /// Batch dimension of the (custom) basis.
        basis_batch: usize,
        /// Batch dimension of the input point clouds.
        input_batch: usize,
    },

    /// An encode call requested no feature channels at all.
    #[error("no feature channels requested; supported: dists, deltas, closest, features")]
    NoFeaturesRequested,

    /// The `features` channel was requested but no per-point features were supplied.
    #[error("feature channel 'features' requested but no x_features tensor was provided")]
    MissingPointFeatures,

    /// A mesh failed structural validation.
    #[error("invalid mesh: {message}")]
    InvalidMesh {
        /// Description of the mesh defect.
        message: String,
    },

    /// A nearest-neighbor or surface-distance backend failed.
    ///
    /// The message is propagated uninterpreted; remediation lives with the
    /// backend, not the call site.
    #[error("oracle failure: {message}")]
    Oracle {
        /// Backend-supplied failure description.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_distinguishes_families() {
        let cfg = BpsError::MissingPointFeatures;
        let oracle = BpsError::Oracle {
            message: "empty reference set".to_string(),
        };
        assert!(cfg.to_string().contains("x_features"));
        assert!(oracle.to_string().starts_with("oracle failure"));
    }

    #[test]
    fn test_basis_batch_mismatch_message() {
        let err = BpsError::BasisBatchMismatch {
            basis_batch: 3,
            input_batch: 5,
        };
        let msg = err.to_string();
        assert!(msg.contains('3') && msg.contains('5'));
    }
}
