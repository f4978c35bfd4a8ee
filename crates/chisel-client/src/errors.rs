//! Error types surfaced by the client facade.

use std::fmt;

use thiserror::Error;

use crate::channel::TransportFault;
use chisel_wire::decode::ShapeError;

/// Interactive operation being executed when an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Loading a buffer into the elaborator.
    Load,
    /// Switching the elaborator's working directory.
    ChangeDirectory,
    /// REPL-style evaluation of user input.
    Interpret,
    /// Type query.
    TypeOf,
    /// Case split on a pattern variable.
    CaseSplit,
    /// Initial clause generation.
    AddClause,
    /// Proof-style clause generation.
    AddProofClause,
    /// Missing-case generation.
    AddMissing,
    /// `with`-block rewrite.
    MakeWith,
    /// Expression search for a hole.
    ProofSearch,
    /// Metavariable refinement.
    Refine,
    /// Identifier completion.
    Completion,
}

impl fmt::Display for Operation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Load => "load",
            Self::ChangeDirectory => "change-directory",
            Self::Interpret => "interpret",
            Self::TypeOf => "type-of",
            Self::CaseSplit => "case-split",
            Self::AddClause => "add-clause",
            Self::AddProofClause => "add-proof-clause",
            Self::AddMissing => "add-missing",
            Self::MakeWith => "make-with",
            Self::ProofSearch => "proof-search",
            Self::Refine => "refine",
            Self::Completion => "completion",
        };
        formatter.write_str(label)
    }
}

/// Errors returned by [`crate::ElabClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The elaborator process is not running when a call requires it.
    #[error("elaborator process is unavailable")]
    ProcessUnavailable,

    /// No identifier is resolvable at the cursor for a point-scoped command.
    #[error("no identifier at the cursor position")]
    NoTargetAtPoint,

    /// The expected hole text is absent from the line at edit time.
    #[error("metavariable '?{name}' is no longer present on the current line")]
    MetavariableVanished {
        /// Hole name without the marker.
        name: String,
    },

    /// The elaborator rejected the buffer during a load.
    #[error("load failed: {diagnostic}")]
    LoadFailed {
        /// Diagnostic text reported by the elaborator.
        diagnostic: String,
    },

    /// A specific command failed server-side.
    #[error("{operation} failed: {diagnostic}")]
    CallFailed {
        /// Operation that failed.
        operation: Operation,
        /// Diagnostic text reported by the elaborator.
        diagnostic: String,
    },

    /// The elaborator answered with a payload of the wrong shape.
    #[error("{operation} returned an unexpected reply: {source}")]
    UnexpectedReply {
        /// Operation whose reply was malformed.
        operation: Operation,
        /// The shape mismatch.
        #[source]
        source: ShapeError,
    },

    /// Channel-level failure while talking to the process.
    #[error("transport failure: {0}")]
    Transport(#[from] TransportFault),
}

impl ClientError {
    /// Builds a `CallFailed` error for the supplied operation.
    pub(crate) fn call_failed(operation: Operation, diagnostic: impl Into<String>) -> Self {
        Self::CallFailed {
            operation,
            diagnostic: diagnostic.into(),
        }
    }

    /// Builds an `UnexpectedReply` error for the supplied operation.
    pub(crate) fn unexpected_reply(operation: Operation, source: ShapeError) -> Self {
        Self::UnexpectedReply { operation, source }
    }

    /// Builds a `MetavariableVanished` error.
    pub(crate) fn vanished(name: impl Into<String>) -> Self {
        Self::MetavariableVanished { name: name.into() }
    }
}
