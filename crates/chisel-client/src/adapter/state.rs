//! Internal state management for the elaborator process.

use std::io::BufWriter;
use std::process::{Child, ChildStdin};
use std::sync::mpsc::Receiver;
use std::thread::JoinHandle;

use crate::channel::TransportFault;
use chisel_wire::Envelope;

/// Internal state of the elaborator process.
pub(super) enum ChannelState {
    /// Process has not been started.
    NotStarted,
    /// Process is running and ready for communication.
    Running {
        /// The child process handle.
        child: Child,
        /// Buffered writer over the child's stdin.
        writer: BufWriter<ChildStdin>,
        /// Envelopes decoded by the reader thread.
        inbox: Receiver<Result<Envelope, TransportFault>>,
        /// The reader thread, joined on shutdown.
        reader: Option<JoinHandle<()>>,
    },
    /// Process has been stopped.
    Stopped,
}
