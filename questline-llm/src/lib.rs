//! # questline-llm: boundary with the external text service
//!
//! Questline never talks to the text service itself. Hosts build prompts and
//! run requests however they like; this crate only provides the re-entry
//! point that brings responses back onto the single-threaded tick:
//!
//! ```text
//! tick ──register()──▶ pending table
//!   │                       ▲
//!   │                 is_wanted()
//!   ▼                       │
//! spawn task ──────▶ InboxSender ──deliver()──▶ mpsc ──drain()──▶ tick
//! ```
//!
//! Responses for unknown, cancelled or expired requests are discarded.

pub mod error;
pub mod inbox;
pub mod types;

pub use error::LlmError;
pub use inbox::{GenerationInbox, InboxSender};
pub use types::{GeneratedText, InboxStats, RequestId};
