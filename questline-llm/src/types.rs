//! Core types for text-service requests and responses.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier handed out when a request is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Raw text produced for a character, ready for directive parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedText {
    /// Request this text answers.
    pub request_id: RequestId,
    /// Character that will speak the text.
    pub giver: String,
    /// Raw text, directives included.
    pub text: String,
    /// When the response reached the inbox.
    pub received_at: DateTime<Utc>,
}

/// Counters describing inbox traffic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InboxStats {
    /// Requests still waiting for a response.
    pub pending: usize,
    /// Requests registered since startup.
    pub total_registered: u64,
    /// Responses handed to the tick loop.
    pub total_delivered: u64,
    /// Failures reported by the service.
    pub total_failed: u64,
    /// Responses for unknown requests, thrown away.
    pub total_discarded: u64,
    /// Requests that passed their deadline.
    pub total_expired: u64,
}
