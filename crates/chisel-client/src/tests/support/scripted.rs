//! Scripted channel double that records every submitted request.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::channel::{Channel, ProcessLifecycle, TransportFault};
use chisel_wire::{Envelope, Notice, Outcome, Request, Value};

/// Reply the scripted channel gives to the next submitted request.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// A successful return carrying this payload.
    Success(Value),
    /// A failed return carrying this diagnostic.
    Failure(String),
}

impl ScriptedReply {
    /// Convenience success reply carrying a string payload.
    pub fn text(body: &str) -> Self {
        Self::Success(Value::str(body))
    }
}

struct ScriptState {
    running: bool,
    spawns: u32,
    sent: Vec<Request>,
    script: VecDeque<ScriptedReply>,
    inbox: VecDeque<Envelope>,
}

/// Test double implementing the channel seam against a fixed reply script.
///
/// Each submitted request immediately queues its scripted return envelope,
/// correlated by the request's own handle; delivery still waits for the
/// dispatcher to `wait` or `poll`, mirroring the real transport.
#[derive(Clone)]
pub struct ScriptedChannel {
    shared: Arc<Mutex<ScriptState>>,
}

impl ScriptedChannel {
    /// Builds a channel (not yet running) that will answer from `replies`.
    pub fn new(replies: Vec<ScriptedReply>) -> Self {
        Self {
            shared: Arc::new(Mutex::new(ScriptState {
                running: false,
                spawns: 0,
                sent: Vec::new(),
                script: replies.into_iter().collect(),
                inbox: VecDeque::new(),
            })),
        }
    }

    /// Queues an unsolicited notice for the next receive.
    pub fn push_notice(&self, notice: Notice) {
        self.with_state(|state| state.inbox.push_back(Envelope::Notice(notice)));
    }

    /// All requests submitted so far.
    pub fn sent(&self) -> Vec<Request> {
        self.with_state(|state| state.sent.clone())
    }

    /// Wire tags of all requests submitted so far, in order.
    pub fn sent_tags(&self) -> Vec<&'static str> {
        self.with_state(|state| state.sent.iter().map(|request| request.command.tag()).collect())
    }

    /// How many times a request with the given tag was submitted.
    pub fn count_tag(&self, tag: &str) -> usize {
        self.sent_tags().into_iter().filter(|sent| *sent == tag).count()
    }

    /// How many times the process was (re)started.
    pub fn spawns(&self) -> u32 {
        self.with_state(|state| state.spawns)
    }

    fn with_state<R>(&self, action: impl FnOnce(&mut ScriptState) -> R) -> R {
        let mut guard = self
            .shared
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        action(&mut guard)
    }
}

impl ProcessLifecycle for ScriptedChannel {
    fn ensure_running(&mut self) -> Result<(), TransportFault> {
        self.with_state(|state| {
            if !state.running {
                state.running = true;
                state.spawns += 1;
            }
        });
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.with_state(|state| state.running)
    }

    fn terminate(&mut self) {
        self.with_state(|state| {
            state.running = false;
            state.inbox.clear();
        });
    }
}

impl Channel for ScriptedChannel {
    fn submit(&mut self, request: &Request) -> Result<(), TransportFault> {
        self.with_state(|state| {
            if !state.running {
                return Err(TransportFault::NotRunning);
            }
            state.sent.push(request.clone());
            let reply = state.script.pop_front().unwrap_or_else(|| {
                panic!("script exhausted at request '{}'", request.command.tag())
            });
            let outcome = match reply {
                ScriptedReply::Success(value) => Outcome::Success(value),
                ScriptedReply::Failure(diagnostic) => Outcome::Failure(diagnostic),
            };
            state.inbox.push_back(Envelope::Return {
                handle: request.handle,
                outcome,
            });
            Ok(())
        })
    }

    fn wait(&mut self) -> Result<Envelope, TransportFault> {
        self.with_state(|state| state.inbox.pop_front().ok_or(TransportFault::Closed))
    }

    fn poll(&mut self) -> Result<Option<Envelope>, TransportFault> {
        self.with_state(|state| Ok(state.inbox.pop_front()))
    }
}
