//! Message payloads exchanged with the remote authority.
//!
//! Inbound, the authority pushes ordered batches of partition actions, each
//! entry a small JSON array:
//!
//! ```text
//! ["a", x, y, [tile, tile, ...]]             bind a partition with a full grid
//! ["u", x, y, color | null, [[lx, ly, tile]]] sparse update, optional highlight colour
//! ["r", x, y]                                 release a partition
//! ```
//!
//! `x`/`y` are partition keys as decimal strings (or plain JSON integers).
//! Outbound, the engine reports camera moves, viewport resizes, and the
//! reveal/flag intents recognised from pointer input.
#![forbid(unsafe_code)]

pub mod inbound;
pub mod outbound;

pub use inbound::{Action, ActionKind, decode_action, decode_batch};
pub use outbound::Outbound;

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("action batch must be a json array")]
    NotABatch,
    #[error("action entry must be a non-empty array, got {0}")]
    NotAnEntry(String),
    #[error("unknown action tag {0:?}")]
    UnknownTag(String),
    #[error("action {tag:?} is missing field {index}")]
    MissingField { tag: &'static str, index: usize },
    #[error("bad partition key component: {0}")]
    BadKey(String),
    #[error("bad tile id: {0}")]
    BadTile(String),
    #[error("bad colour hint: {0}")]
    BadColor(String),
    #[error("bad sparse delta: {0}")]
    BadDelta(String),
}
