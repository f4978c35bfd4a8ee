//! Request envelopes and incoming message classification.

use std::fmt;

use thiserror::Error;

use crate::command::Command;
use crate::value::{ParseError, Value};

/// Correlation handle binding a return envelope to the request that
/// produced it. Handles are explicit data on the wire, never implied by
/// arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallHandle(u64);

impl CallHandle {
    /// Wraps a raw handle value.
    #[must_use]
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw handle value.
    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CallHandle {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// An outgoing request: a command plus its correlation handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// The command body.
    pub command: Command,
    /// Handle echoed back by the elaborator's return envelope.
    pub handle: CallHandle,
}

impl Request {
    /// Builds a request for the given command and handle.
    #[must_use]
    pub fn new(command: Command, handle: CallHandle) -> Self {
        Self { command, handle }
    }

    /// Encodes the request as its textual wire form.
    #[must_use]
    pub fn encode(&self) -> String {
        Value::List(vec![
            self.command.to_value(),
            Value::Num(i64::try_from(self.handle.raw()).unwrap_or(i64::MAX)),
        ])
        .to_string()
    }
}

/// Terminal result of a single call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The elaborator accepted the command and produced a payload.
    Success(Value),
    /// The elaborator rejected the command with a diagnostic.
    Failure(String),
}

impl Outcome {
    /// Converts the outcome into a plain result.
    ///
    /// # Errors
    ///
    /// Returns the server diagnostic when the outcome is a failure.
    pub fn into_result(self) -> Result<Value, String> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Failure(diagnostic) => Err(diagnostic),
        }
    }
}

/// An unsolicited message from the elaborator. Notices are routed to
/// observers; they never resolve a pending call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Free-form output text.
    Output(String),
    /// A source-located warning.
    Warning {
        /// File the warning refers to.
        file: String,
        /// 1-based line number.
        line: u32,
        /// Warning text.
        message: String,
    },
    /// Protocol version announced once at startup.
    ProtocolVersion(u64),
}

/// A decoded incoming message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    /// The correlated terminal response of a call.
    Return {
        /// Handle of the request this responds to.
        handle: CallHandle,
        /// Success payload or failure diagnostic.
        outcome: Outcome,
    },
    /// An unsolicited notice.
    Notice(Notice),
}

impl Envelope {
    /// Decodes one incoming message from its textual wire form.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] when the text is not a well-formed envelope.
    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        let value = Value::parse(text)?;
        let items = value
            .as_list()
            .ok_or_else(|| DecodeError::malformed("envelope is not a list"))?;
        let head = items
            .first()
            .and_then(Value::as_atom)
            .ok_or_else(|| DecodeError::malformed("envelope head is not an atom"))?;
        match head {
            "return" => decode_return(items),
            "output" => decode_output(items),
            "warning" => decode_warning(items),
            "protocol-version" => decode_protocol_version(items),
            other => Err(DecodeError::UnknownHead {
                head: other.to_owned(),
            }),
        }
    }
}

fn decode_return(items: &[Value]) -> Result<Envelope, DecodeError> {
    let (result, raw_handle) = match items {
        [_, result, Value::Num(raw_handle)] => (result, *raw_handle),
        _ => return Err(DecodeError::malformed("return envelope arity")),
    };
    let handle = u64::try_from(raw_handle)
        .map(CallHandle::new)
        .map_err(|_| DecodeError::malformed("negative correlation handle"))?;
    let result_items = result
        .as_list()
        .ok_or_else(|| DecodeError::malformed("return payload is not a list"))?;
    let outcome = match result_items {
        [tag, payload] if tag.as_atom() == Some("ok") => Outcome::Success(payload.clone()),
        [tag, diagnostic] if tag.as_atom() == Some("error") => {
            let text = diagnostic
                .as_str()
                .ok_or_else(|| DecodeError::malformed("error diagnostic is not a string"))?;
            Outcome::Failure(text.to_owned())
        }
        _ => return Err(DecodeError::malformed("return payload shape")),
    };
    Ok(Envelope::Return { handle, outcome })
}

fn decode_output(items: &[Value]) -> Result<Envelope, DecodeError> {
    match items {
        [_, Value::Str(text)] => Ok(Envelope::Notice(Notice::Output(text.clone()))),
        _ => Err(DecodeError::malformed("output notice shape")),
    }
}

fn decode_warning(items: &[Value]) -> Result<Envelope, DecodeError> {
    let body = match items {
        [_, body] => body
            .as_list()
            .ok_or_else(|| DecodeError::malformed("warning body is not a list"))?,
        _ => return Err(DecodeError::malformed("warning notice arity")),
    };
    match body {
        [Value::Str(file), Value::Num(line), Value::Str(message)] => {
            let line = u32::try_from(*line)
                .map_err(|_| DecodeError::malformed("warning line out of range"))?;
            Ok(Envelope::Notice(Notice::Warning {
                file: file.clone(),
                line,
                message: message.clone(),
            }))
        }
        _ => Err(DecodeError::malformed("warning body shape")),
    }
}

fn decode_protocol_version(items: &[Value]) -> Result<Envelope, DecodeError> {
    match items {
        [_, Value::Num(version)] => {
            let version = u64::try_from(*version)
                .map_err(|_| DecodeError::malformed("negative protocol version"))?;
            Ok(Envelope::Notice(Notice::ProtocolVersion(version)))
        }
        _ => Err(DecodeError::malformed("protocol-version notice shape")),
    }
}

/// Errors raised while decoding an incoming envelope.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The text was not a well-formed value.
    #[error("unparseable envelope: {0}")]
    Parse(#[from] ParseError),
    /// The head atom names no known envelope kind.
    #[error("unknown envelope head ':{head}'")]
    UnknownHead {
        /// The unrecognised head atom.
        head: String,
    },
    /// A known envelope kind with the wrong internal shape.
    #[error("malformed envelope: {detail}")]
    Malformed {
        /// What was wrong with the shape.
        detail: String,
    },
}

impl DecodeError {
    fn malformed(detail: impl Into<String>) -> Self {
        Self::Malformed {
            detail: detail.into(),
        }
    }
}
