//! Text-service boundary error types.

use thiserror::Error;

use crate::types::RequestId;

/// Errors raised at the boundary with the external text service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// The inbox this sender belonged to has been dropped.
    #[error("Generation inbox is closed")]
    InboxClosed,

    /// No pending request carries this id (never registered, already
    /// answered, cancelled or expired).
    #[error("No pending request {0}")]
    UnknownRequest(RequestId),

    /// The text service gave up on a request.
    #[error("Generation failed for request {request}: {reason}")]
    GenerationFailed {
        /// The request.
        request: RequestId,
        /// What the service reported.
        reason: String,
    },
}
