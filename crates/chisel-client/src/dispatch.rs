//! Correlation and delivery of calls against the elaborator.
//!
//! Synchronous calls block on the channel until their own return envelope
//! arrives. Asynchronous calls register a [`PendingCall`] and return at
//! once; their continuations only ever run from [`Dispatcher::pump`], so a
//! continuation is never invoked inside the call that registered it.
//! Envelopes for other handles observed while blocked are parked in the
//! ready queue, and unsolicited notices are queued for the next pump.

use std::collections::{HashMap, VecDeque};

use tracing::{debug, warn};

use crate::channel::Channel;
use crate::editor::{DiagnosticsSink, Presenter};
use crate::errors::{ClientError, Operation};
use crate::session::Session;
use chisel_wire::{CallHandle, Command, Envelope, Notice, Outcome, Request, Value};

/// Log target for dispatch operations.
const DISPATCH_TARGET: &str = "chisel_client::dispatch";

/// Success continuation of an asynchronous call.
pub(crate) type SuccessFn = Box<dyn FnOnce(&mut Effects<'_>, Value)>;

/// Failure continuation of an asynchronous call.
pub(crate) type FailureFn = Box<dyn FnOnce(&mut Effects<'_>, String)>;

/// Mutable state a delivered continuation or notice may act on.
pub(crate) struct Effects<'a> {
    /// Session load/staleness state.
    pub session: &'a mut Session,
    /// Presentation surface.
    pub presenter: &'a mut dyn Presenter,
    /// Diagnostics collector.
    pub diagnostics: &'a mut dyn DiagnosticsSink,
}

/// Bookkeeping for one outstanding asynchronous call. Exactly one of the
/// two continuations runs, exactly once, when the terminal response
/// arrives; the record is removed at that point and never reused.
struct PendingCall {
    on_success: SuccessFn,
    on_failure: FailureFn,
}

enum ReadyContinuation {
    Success(SuccessFn, Value),
    Failure(FailureFn, String),
}

/// Issues calls and demultiplexes the incoming envelope stream.
#[derive(Default)]
pub(crate) struct Dispatcher {
    next_handle: u64,
    pending: HashMap<u64, PendingCall>,
    ready: VecDeque<ReadyContinuation>,
    notices: VecDeque<Notice>,
    protocol_version: Option<u64>,
}

impl Dispatcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Protocol version announced by the elaborator, once seen.
    pub(crate) fn protocol_version(&self) -> Option<u64> {
        self.protocol_version
    }

    fn allocate(&mut self) -> CallHandle {
        self.next_handle += 1;
        CallHandle::new(self.next_handle)
    }

    /// Issues `command` and blocks until its own return envelope arrives.
    ///
    /// Server rejection surfaces as [`ClientError::CallFailed`] labelled
    /// with `operation`; callers with a more specific failure meaning
    /// (loading) translate it.
    pub(crate) fn call_sync(
        &mut self,
        channel: &mut dyn Channel,
        operation: Operation,
        command: Command,
    ) -> Result<Value, ClientError> {
        if !channel.is_running() {
            return Err(ClientError::ProcessUnavailable);
        }
        let handle = self.allocate();
        debug!(target: DISPATCH_TARGET, %operation, %handle, tag = command.tag(), "issuing call");
        channel.submit(&Request::new(command, handle))?;
        loop {
            match channel.wait()? {
                Envelope::Return {
                    handle: arrived,
                    outcome,
                } if arrived == handle => {
                    return outcome
                        .into_result()
                        .map_err(|diagnostic| ClientError::call_failed(operation, diagnostic));
                }
                other => self.absorb(other),
            }
        }
    }

    /// Registers a pending call for `command` and returns immediately.
    ///
    /// Neither continuation runs before this method returns; delivery
    /// happens on a later [`pump`](Self::pump).
    pub(crate) fn call_async(
        &mut self,
        channel: &mut dyn Channel,
        command: Command,
        on_success: SuccessFn,
        on_failure: FailureFn,
    ) -> Result<CallHandle, ClientError> {
        if !channel.is_running() {
            return Err(ClientError::ProcessUnavailable);
        }
        let handle = self.allocate();
        debug!(target: DISPATCH_TARGET, %handle, tag = command.tag(), "issuing asynchronous call");
        channel.submit(&Request::new(command, handle))?;
        self.pending.insert(
            handle.raw(),
            PendingCall {
                on_success,
                on_failure,
            },
        );
        Ok(handle)
    }

    /// Routes one envelope into the ready or notice queue.
    fn absorb(&mut self, envelope: Envelope) {
        match envelope {
            Envelope::Return { handle, outcome } => match self.pending.remove(&handle.raw()) {
                Some(call) => {
                    let continuation = match outcome {
                        Outcome::Success(value) => {
                            ReadyContinuation::Success(call.on_success, value)
                        }
                        Outcome::Failure(diagnostic) => {
                            ReadyContinuation::Failure(call.on_failure, diagnostic)
                        }
                    };
                    self.ready.push_back(continuation);
                }
                None => {
                    warn!(target: DISPATCH_TARGET, %handle, "return for unknown call handle");
                }
            },
            Envelope::Notice(notice) => self.notices.push_back(notice),
        }
    }

    /// Drains the channel and delivers queued notices and continuations.
    pub(crate) fn pump(
        &mut self,
        channel: &mut dyn Channel,
        effects: &mut Effects<'_>,
    ) -> Result<(), ClientError> {
        if channel.is_running() {
            while let Some(envelope) = channel.poll()? {
                self.absorb(envelope);
            }
        }
        self.deliver_notices(effects);
        self.run_ready(effects);
        Ok(())
    }

    /// Delivers queued notices without touching the channel. Used after
    /// synchronous calls so notices observed while blocked reach their
    /// observers promptly. Ready continuations stay parked until the next
    /// [`pump`](Self::pump): they belong to the host's event processing,
    /// not to whichever command happened to observe their envelopes.
    pub(crate) fn deliver_notices(&mut self, effects: &mut Effects<'_>) {
        while let Some(notice) = self.notices.pop_front() {
            self.route_notice(notice, effects);
        }
    }

    fn run_ready(&mut self, effects: &mut Effects<'_>) {
        while let Some(continuation) = self.ready.pop_front() {
            match continuation {
                ReadyContinuation::Success(run, value) => run(effects, value),
                ReadyContinuation::Failure(run, diagnostic) => run(effects, diagnostic),
            }
        }
    }

    fn route_notice(&mut self, notice: Notice, effects: &mut Effects<'_>) {
        match notice {
            Notice::Output(text) => effects.presenter.message(&text),
            Notice::Warning {
                file,
                line,
                message,
            } => effects.diagnostics.record(&file, line, &message),
            Notice::ProtocolVersion(version) => {
                debug!(target: DISPATCH_TARGET, version, "elaborator announced protocol version");
                self.protocol_version = Some(version);
            }
        }
    }

    /// Discards all pending calls without invoking their continuations.
    /// Used on process termination.
    pub(crate) fn discard_pending(&mut self) {
        let dropped = self.pending.len() + self.ready.len();
        if dropped > 0 {
            debug!(target: DISPATCH_TARGET, dropped, "discarding outstanding calls");
        }
        self.pending.clear();
        self.ready.clear();
        self.notices.clear();
    }
}
