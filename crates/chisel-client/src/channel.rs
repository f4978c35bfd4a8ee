//! The transport seam between the client core and the elaborator process.

use std::io;

use thiserror::Error;

use chisel_wire::{DecodeError, Envelope, Request};

/// Lifecycle control over the elaborator process.
pub trait ProcessLifecycle {
    /// Starts the process if it is not already running; no-op otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`TransportFault`] when the process cannot be spawned.
    fn ensure_running(&mut self) -> Result<(), TransportFault>;

    /// Whether the process is currently running.
    fn is_running(&self) -> bool;

    /// Terminates the process, closing the channel.
    fn terminate(&mut self);
}

/// Message delivery to and from the elaborator.
///
/// [`wait`](Channel::wait) blocks until the next envelope arrives and backs
/// synchronous calls; [`poll`](Channel::poll) returns immediately and backs
/// the dispatcher's pump. Implementations deliver envelopes in arrival
/// order; correlation is the dispatcher's concern.
pub trait Channel: ProcessLifecycle {
    /// Submits one encoded request.
    ///
    /// # Errors
    ///
    /// Returns [`TransportFault`] when the process is gone or the write
    /// fails.
    fn submit(&mut self, request: &Request) -> Result<(), TransportFault>;

    /// Blocks until the next incoming envelope.
    ///
    /// # Errors
    ///
    /// Returns [`TransportFault`] when the channel is closed or delivery
    /// fails.
    fn wait(&mut self) -> Result<Envelope, TransportFault>;

    /// Returns the next incoming envelope if one is already available.
    ///
    /// # Errors
    ///
    /// Returns [`TransportFault`] when the channel is closed.
    fn poll(&mut self) -> Result<Option<Envelope>, TransportFault>;
}

/// Channel-level failures.
#[derive(Debug, Error)]
pub enum TransportFault {
    /// The elaborator binary was not found.
    #[error("elaborator binary not found: {command}")]
    BinaryNotFound {
        /// The command that was not found.
        command: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Failed to spawn the elaborator process.
    #[error("failed to spawn elaborator: {message}")]
    SpawnFailed {
        /// Description of the spawn failure.
        message: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The process is not running.
    #[error("elaborator process is not running")]
    NotRunning,

    /// I/O failure while reading or writing the channel.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A frame header that is not six hex digits.
    #[error("malformed frame header '{header}'")]
    BadFrame {
        /// The offending header bytes, rendered lossily.
        header: String,
    },

    /// An incoming message that does not decode to an envelope.
    #[error("undecodable message: {0}")]
    Decode(#[from] DecodeError),

    /// The elaborator closed its end of the channel.
    #[error("elaborator closed the channel")]
    Closed,
}
