//! Wire protocol layer.
//!
//! Messages are flat strings, one per line: `key:value` pairs joined by `,`,
//! with an `action` field identifying the message kind. List-valued payloads
//! (the lobby roster, deck contents) are `|`-joined sequences of per-element
//! records using `-`/`>` as separators. Untrusted text fields are escaped
//! before serialization so the five reserved characters never appear raw.
//!
//! - `escape.rs`:  reserved-character escape table and its inverse
//! - `fields.rs`:  the flat record type with parse/serialize and typed accessors
//! - `actions.rs`: typed `ServerAction` / `ClientRequest` enums — the surface
//!   the dispatcher and all handlers work against

pub mod actions;
pub mod escape;
pub mod fields;

pub use actions::{ClientRequest, ServerAction};
pub use fields::Fields;

use thiserror::Error;

/// A message that could not be decoded into a request.
///
/// Reported to the offending connection as a generic error notification;
/// the connection stays open.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    #[error("empty message")]
    Empty,

    #[error("message has no action field")]
    MissingAction,

    #[error("unknown action `{0}`")]
    UnknownAction(String),

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("invalid value `{value}` for field `{field}`")]
    InvalidField { field: &'static str, value: String },

    #[error("invalid score literal `{0}`")]
    InvalidScore(String),
}
