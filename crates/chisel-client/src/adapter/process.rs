//! Process adapter implementing the channel and lifecycle traits.

use std::io::{BufReader, BufWriter};
use std::process::{Child, ChildStdout, Command as OsCommand, Stdio};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use super::config::ElabConfig;
use super::state::ChannelState;
use super::transport::{read_frame, write_frame};
use crate::channel::{Channel, ProcessLifecycle, TransportFault};
use chisel_wire::{Envelope, Request};

/// Log target for adapter operations.
const ADAPTER_TARGET: &str = "chisel_client::adapter";

/// A channel backed by a spawned elaborator process.
///
/// Outgoing requests are framed onto the child's stdin; a dedicated reader
/// thread decodes incoming frames from its stdout and delivers them
/// through an in-process queue, so [`poll`](Channel::poll) never blocks.
/// The reader thread owns no session state.
pub struct ProcessChannel {
    config: ElabConfig,
    state: ChannelState,
}

impl ProcessChannel {
    /// Builds a channel for the given spawn configuration. The process is
    /// not started until [`ensure_running`](ProcessLifecycle::ensure_running).
    #[must_use]
    pub fn new(config: ElabConfig) -> Self {
        Self {
            config,
            state: ChannelState::NotStarted,
        }
    }

    fn spawn(&mut self) -> Result<(), TransportFault> {
        debug!(
            target: ADAPTER_TARGET,
            command = %self.config.command,
            args = ?self.config.args,
            "spawning elaborator process"
        );

        let mut command = OsCommand::new(self.config.command.as_std_path());
        command
            .args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());

        if let Some(dir) = &self.config.working_dir {
            command.current_dir(dir.as_std_path());
        }

        let mut child = command.spawn().map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                TransportFault::BinaryNotFound {
                    command: self.config.command.to_string(),
                    source,
                }
            } else {
                TransportFault::SpawnFailed {
                    message: format!("failed to start {}", self.config.command),
                    source,
                }
            }
        })?;

        let stdin = child.stdin.take().ok_or_else(|| TransportFault::SpawnFailed {
            message: "failed to capture stdin".to_owned(),
            source: std::io::Error::other("no stdin"),
        })?;
        let stdout = child.stdout.take().ok_or_else(|| TransportFault::SpawnFailed {
            message: "failed to capture stdout".to_owned(),
            source: std::io::Error::other("no stdout"),
        })?;

        let (sender, inbox): (Sender<Result<Envelope, TransportFault>>, Receiver<_>) =
            mpsc::channel();
        let reader = thread::spawn(move || reader_loop(stdout, &sender));

        debug!(target: ADAPTER_TARGET, pid = child.id(), "elaborator process spawned");

        self.state = ChannelState::Running {
            child,
            writer: BufWriter::new(stdin),
            inbox,
            reader: Some(reader),
        };
        Ok(())
    }
}

impl ProcessLifecycle for ProcessChannel {
    fn ensure_running(&mut self) -> Result<(), TransportFault> {
        match self.state {
            ChannelState::Running { .. } => Ok(()),
            ChannelState::NotStarted | ChannelState::Stopped => self.spawn(),
        }
    }

    fn is_running(&self) -> bool {
        matches!(self.state, ChannelState::Running { .. })
    }

    fn terminate(&mut self) {
        if let ChannelState::Running {
            mut child,
            writer,
            reader,
            ..
        } = std::mem::replace(&mut self.state, ChannelState::Stopped)
        {
            // Closing stdin asks the elaborator to exit on its own.
            drop(writer);
            terminate_child(&mut child);
            if let Some(handle) = reader {
                let _ = handle.join();
            }
        }
    }
}

impl Channel for ProcessChannel {
    fn submit(&mut self, request: &Request) -> Result<(), TransportFault> {
        match &mut self.state {
            ChannelState::Running { writer, .. } => {
                debug!(
                    target: ADAPTER_TARGET,
                    handle = %request.handle,
                    tag = request.command.tag(),
                    "sending request"
                );
                write_frame(writer, &request.encode())
            }
            ChannelState::NotStarted | ChannelState::Stopped => Err(TransportFault::NotRunning),
        }
    }

    fn wait(&mut self) -> Result<Envelope, TransportFault> {
        match &mut self.state {
            ChannelState::Running { inbox, .. } => {
                inbox.recv().map_err(|_| TransportFault::Closed)?
            }
            ChannelState::NotStarted | ChannelState::Stopped => Err(TransportFault::NotRunning),
        }
    }

    fn poll(&mut self) -> Result<Option<Envelope>, TransportFault> {
        match &mut self.state {
            ChannelState::Running { inbox, .. } => match inbox.try_recv() {
                Ok(delivery) => delivery.map(Some),
                Err(TryRecvError::Empty) => Ok(None),
                Err(TryRecvError::Disconnected) => Err(TransportFault::Closed),
            },
            ChannelState::NotStarted | ChannelState::Stopped => Err(TransportFault::NotRunning),
        }
    }
}

impl Drop for ProcessChannel {
    fn drop(&mut self) {
        if let ChannelState::Running { mut child, .. } =
            std::mem::replace(&mut self.state, ChannelState::Stopped)
        {
            if let Err(error) = child.kill() {
                warn!(
                    target: ADAPTER_TARGET,
                    error = %error,
                    "failed to kill elaborator process on drop"
                );
            } else {
                let _ = child.wait();
            }
        }
    }
}

impl std::fmt::Debug for ProcessChannel {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &self.state {
            ChannelState::NotStarted => "not_started".to_owned(),
            ChannelState::Running { child, .. } => format!("running (pid: {})", child.id()),
            ChannelState::Stopped => "stopped".to_owned(),
        };
        formatter
            .debug_struct("ProcessChannel")
            .field("command", &self.config.command)
            .field("state", &state)
            .finish()
    }
}

/// Decodes frames from the elaborator's stdout until the stream closes.
fn reader_loop(stdout: ChildStdout, sender: &Sender<Result<Envelope, TransportFault>>) {
    let mut reader = BufReader::new(stdout);
    loop {
        match read_frame(&mut reader) {
            Ok(text) => match Envelope::decode(&text) {
                Ok(envelope) => {
                    if sender.send(Ok(envelope)).is_err() {
                        break;
                    }
                }
                Err(error) => {
                    warn!(target: ADAPTER_TARGET, %error, "dropping undecodable message");
                    if sender.send(Err(TransportFault::Decode(error))).is_err() {
                        break;
                    }
                }
            },
            Err(TransportFault::Closed) => {
                debug!(target: ADAPTER_TARGET, "elaborator closed its output");
                break;
            }
            Err(fault) => {
                let _ = sender.send(Err(fault));
                break;
            }
        }
    }
}

/// Waits for the child to exit, killing it after a short grace period.
fn terminate_child(child: &mut Child) {
    match child.try_wait() {
        Ok(Some(status)) => {
            debug!(target: ADAPTER_TARGET, ?status, "elaborator exited");
        }
        Ok(None) | Err(_) => {
            thread::sleep(Duration::from_millis(200));
            match child.try_wait() {
                Ok(Some(status)) => {
                    debug!(
                        target: ADAPTER_TARGET,
                        ?status,
                        "elaborator exited during grace period"
                    );
                }
                Ok(None) | Err(_) => {
                    warn!(target: ADAPTER_TARGET, "elaborator did not exit, killing");
                    let _ = child.kill();
                    let _ = child.wait();
                }
            }
        }
    }
}
