//! Errors shared by the parsers, the unpacker and the transport glue.

/// Every failure is terminal for the request that triggered it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A grammar token did not match at `position` (byte offset into the text).
    #[error("Unable to parse stream at offset {position}: {snippet:?}")]
    Syntax { position: usize, snippet: String },
    /// A token matched the grammar but is not a valid literal of the expected kind.
    #[error("Invalid {expected} literal {literal:?} at offset {position}")]
    InvalidLiteral {
        position: usize,
        literal: String,
        expected: &'static str,
    },
    /// Alias or dotted-path segment that resolves nowhere in the tree.
    #[error("Lookup: {0}")]
    Lookup(String),
    /// Buffer exhausted or a value that cannot be decoded at `offset`.
    #[error("Decode at offset {offset}: {reason}")]
    Decode { offset: usize, reason: String },
    #[error("Shape: {count} elements cannot be reshaped to {shape:?}")]
    Shape { count: usize, shape: Vec<usize> },
    #[error("Transport: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, Error>;
