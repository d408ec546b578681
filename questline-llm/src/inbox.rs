//! Generation inbox, where async text-service responses re-enter the tick.
//!
//! The host registers a request before it starts the async call, hands the
//! task an [`InboxSender`], and drains the inbox once per tick. Responses are
//! matched against the pending table; anything unknown or past its deadline
//! is discarded with a warning, so a slow answer can never hand a quest to a
//! character the player has already walked away from.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::LlmError;
use crate::types::{GeneratedText, InboxStats, RequestId};

/// A request awaiting its response.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    /// Character the text is for.
    pub giver: String,
    /// When the request was registered.
    pub issued_at: Instant,
    /// How long the response may take.
    pub deadline: Duration,
}

impl PendingRequest {
    /// Whether the deadline has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.issued_at.elapsed() > self.deadline
    }
}

#[derive(Debug)]
enum Envelope {
    Text { request: RequestId, text: String },
    Failed { request: RequestId, reason: String },
}

#[derive(Debug, Default)]
struct PendingTable {
    requests: HashMap<RequestId, PendingRequest>,
    next_id: u64,
    stats: InboxStats,
}

impl PendingTable {
    fn purge_expired(&mut self) -> Vec<RequestId> {
        let expired: Vec<RequestId> = self
            .requests
            .iter()
            .filter(|(_, r)| r.is_expired())
            .map(|(id, _)| *id)
            .collect();
        for id in &expired {
            if let Some(request) = self.requests.remove(id) {
                warn!(request = %id, giver = %request.giver, "Generation request expired");
            }
        }
        self.stats.total_expired += expired.len() as u64;
        expired
    }
}

/// Cloneable handle given to async tasks.
#[derive(Debug, Clone)]
pub struct InboxSender {
    tx: mpsc::UnboundedSender<Envelope>,
    pending: Arc<Mutex<PendingTable>>,
}

impl InboxSender {
    /// Post generated text for `request`.
    ///
    /// # Errors
    /// [`LlmError::InboxClosed`] if the inbox is gone.
    pub fn deliver(&self, request: RequestId, text: impl Into<String>) -> Result<(), LlmError> {
        self.tx
            .send(Envelope::Text {
                request,
                text: text.into(),
            })
            .map_err(|_| LlmError::InboxClosed)
    }

    /// Report that the service could not produce text for `request`.
    ///
    /// # Errors
    /// [`LlmError::InboxClosed`] if the inbox is gone.
    pub fn fail(&self, request: RequestId, reason: impl Into<String>) -> Result<(), LlmError> {
        self.tx
            .send(Envelope::Failed {
                request,
                reason: reason.into(),
            })
            .map_err(|_| LlmError::InboxClosed)
    }

    /// Whether `request` is still awaited. Tasks can use this to skip work
    /// nobody will read.
    #[must_use]
    pub fn is_wanted(&self, request: RequestId) -> bool {
        self.pending
            .lock()
            .requests
            .get(&request)
            .is_some_and(|r| !r.is_expired())
    }
}

/// Single-consumer inbox drained by the tick loop.
#[derive(Debug)]
pub struct GenerationInbox {
    tx: mpsc::UnboundedSender<Envelope>,
    rx: mpsc::UnboundedReceiver<Envelope>,
    pending: Arc<Mutex<PendingTable>>,
}

impl Default for GenerationInbox {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationInbox {
    /// Create an empty inbox.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx,
            pending: Arc::new(Mutex::new(PendingTable::default())),
        }
    }

    /// Record that text for `giver` has been requested.
    pub fn register(&self, giver: &str, deadline: Duration) -> RequestId {
        let mut table = self.pending.lock();
        let id = RequestId(table.next_id);
        table.next_id += 1;
        table.stats.total_registered += 1;
        table.requests.insert(
            id,
            PendingRequest {
                giver: giver.to_string(),
                issued_at: Instant::now(),
                deadline,
            },
        );
        debug!(request = %id, giver = %giver, "Generation request registered");
        id
    }

    /// Stop waiting for `request`.
    ///
    /// # Errors
    /// [`LlmError::UnknownRequest`] if it is not pending.
    pub fn cancel(&self, request: RequestId) -> Result<(), LlmError> {
        self.pending
            .lock()
            .requests
            .remove(&request)
            .map(|_| ())
            .ok_or(LlmError::UnknownRequest(request))
    }

    /// Whether `giver` already has a request in flight.
    #[must_use]
    pub fn is_pending_for(&self, giver: &str) -> bool {
        self.pending
            .lock()
            .requests
            .values()
            .any(|r| r.giver.eq_ignore_ascii_case(giver.trim()) && !r.is_expired())
    }

    /// A handle for an async task.
    #[must_use]
    pub fn sender(&self) -> InboxSender {
        InboxSender {
            tx: self.tx.clone(),
            pending: Arc::clone(&self.pending),
        }
    }

    /// Take every response that arrived since the last drain. Never blocks.
    pub fn drain(&mut self) -> Vec<GeneratedText> {
        let mut envelopes = Vec::new();
        while let Ok(envelope) = self.rx.try_recv() {
            envelopes.push(envelope);
        }

        let mut table = self.pending.lock();
        table.purge_expired();

        let mut out = Vec::new();
        for envelope in envelopes {
            match envelope {
                Envelope::Text { request, text } => match table.requests.remove(&request) {
                    Some(pending) => {
                        table.stats.total_delivered += 1;
                        out.push(GeneratedText {
                            request_id: request,
                            giver: pending.giver,
                            text,
                            received_at: Utc::now(),
                        });
                    }
                    None => {
                        table.stats.total_discarded += 1;
                        warn!(error = %LlmError::UnknownRequest(request), "Discarding generated text");
                    }
                },
                Envelope::Failed { request, reason } => {
                    if table.requests.remove(&request).is_some() {
                        table.stats.total_failed += 1;
                    } else {
                        table.stats.total_discarded += 1;
                    }
                    warn!(error = %LlmError::GenerationFailed { request, reason }, "Generation failed");
                }
            }
        }
        out
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> InboxStats {
        let table = self.pending.lock();
        InboxStats {
            pending: table.requests.len(),
            ..table.stats
        }
    }
}
