/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for template parsing and rendering.

use thiserror::Error;

/// Errors detected while parsing template text.
///
/// Each variant carries the byte offset into the template source at which
/// the problem was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A tag was opened but its closing delimiter never appeared.
    #[error("mismatched delimiter at offset {0}")]
    UnclosedTag(usize),

    /// A close tag did not match the open section name.
    #[error("mismatched end section tag at offset {0}")]
    MismatchedSection(usize),

    /// A tag key was empty or malformed.
    #[error("invalid key at offset {0}")]
    InvalidKey(usize),

    /// A set-delimiter tag named an empty or malformed delimiter.
    #[error("invalid delimiter at offset {0}")]
    InvalidDelimiter(usize),

    /// A set-delimiter tag was missing its `=` terminator.
    #[error("mismatched '=' at offset {0}")]
    MismatchedSetDelim(usize),
}

/// Errors raised during rendering.
///
/// The engine itself does not fail on missing data; every variant here
/// originates from a collaborator (a sink, a lazy value, or an
/// unresolved-name handler) and is propagated to the render caller
/// without retry. Output already written to the sink stays written.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A name could not be resolved and the unresolved-name handler
    /// chose to abort the render.
    #[error("unresolved variable: {name}")]
    Unresolved { name: String },

    /// A collaborator-supplied failure (lazy value, handler, ...).
    #[error("{0}")]
    Message(String),

    /// An I/O failure from a writer-backed sink.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RenderError {
    /// Convenience constructor for collaborator failures.
    pub fn msg(message: impl Into<String>) -> RenderError {
        RenderError::Message(message.into())
    }
}

/// Result type for parse operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;
