//! Error taxonomy for schema-tree operations.
//!
//! Every failure in this crate is terminal for the triggering call; nothing
//! retries. Callers match on the variants: `InvalidArgument` and
//! `UnknownModule` are caller-facing conditions, `IllegalState` signals a
//! broken internal invariant and should be treated as a bug report.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The caller passed an argument the operation rejects (empty path,
    /// absolute path where a relative one is required, path not addressing
    /// an rpc node, payload without a top-level member).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A tree invariant was violated by prior code. Not recoverable by the
    /// caller.
    #[error("illegal state: {0}")]
    IllegalState(String),

    /// The module source was asked for a module it does not know. Only
    /// raised for identifiers present in a capability lookup; identifiers
    /// absent from the lookup never reach the source.
    #[error("unknown module '{name}'{}", revision_suffix(.revision))]
    UnknownModule {
        name: String,
        revision: Option<String>,
    },

    /// The XML payload did not parse. Propagated unmodified from the parser.
    #[error("malformed XML payload: {0}")]
    XmlSyntax(#[from] roxmltree::Error),

    /// The JSON payload did not parse. Propagated unmodified from the parser.
    #[error("malformed JSON payload: {0}")]
    JsonSyntax(#[from] serde_json::Error),
}

impl Error {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }

    pub fn illegal_state(message: impl Into<String>) -> Self {
        Error::IllegalState(message.into())
    }
}

fn revision_suffix(revision: &Option<String>) -> String {
    match revision {
        Some(rev) => format!(" revision {rev}"),
        None => String::new(),
    }
}
