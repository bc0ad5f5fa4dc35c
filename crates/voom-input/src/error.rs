//! Pointer-capture error types.

/// Failures reported by the host's capture contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    /// The host denied or could not grant pointer capture. Not retried;
    /// a new request must be issued explicitly.
    #[error("pointer capture request failed: {reason}")]
    RequestFailed {
        /// Host-supplied description of the failure.
        reason: String,
    },
}
