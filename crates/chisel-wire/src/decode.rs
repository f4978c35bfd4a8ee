//! Shape-checked decoding of call payloads.
//!
//! Each interactive protocol expects a particular payload shape inside the
//! `:ok` value. The helpers here turn a [`Value`] into the typed payload and
//! report a [`ShapeError`] when the elaborator sent something else.

use thiserror::Error;

use crate::value::Value;

/// A payload that did not have the expected shape.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("expected {expected}, found {found}")]
pub struct ShapeError {
    /// Shape the caller required.
    pub expected: &'static str,
    /// Rendered form of the actual payload.
    pub found: String,
}

impl ShapeError {
    fn new(expected: &'static str, found: &Value) -> Self {
        Self {
            expected,
            found: found.to_string(),
        }
    }
}

/// Decodes a plain text payload.
///
/// # Errors
///
/// Returns [`ShapeError`] when the payload is not a string.
pub fn text(value: &Value) -> Result<String, ShapeError> {
    value
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| ShapeError::new("a string", value))
}

/// Decodes a text payload with an optional formatting annotation.
///
/// Plain strings carry no annotation; a list whose first element is the
/// text carries the remaining elements as presentation metadata, passed
/// through to the presenter untouched.
///
/// # Errors
///
/// Returns [`ShapeError`] when the payload is neither form.
pub fn styled_text(value: &Value) -> Result<(String, Option<Value>), ShapeError> {
    if let Some(plain) = value.as_str() {
        return Ok((plain.to_owned(), None));
    }
    match value.as_list() {
        Some([body, rest @ ..]) if body.as_str().is_some() && !rest.is_empty() => Ok((
            body.as_str().unwrap_or_default().to_owned(),
            Some(Value::List(rest.to_vec())),
        )),
        _ => Err(ShapeError::new("text with optional formatting", value)),
    }
}

/// Decodes a list of identifier names.
///
/// # Errors
///
/// Returns [`ShapeError`] when the payload is not a list of strings.
pub fn names(value: &Value) -> Result<Vec<String>, ShapeError> {
    let items = value
        .as_list()
        .ok_or_else(|| ShapeError::new("a list of names", value))?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_owned)
                .ok_or_else(|| ShapeError::new("a list of names", value))
        })
        .collect()
}

/// One round of the recursive disambiguation protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefineRound {
    /// The server needs another choice from the candidate list.
    MoreChoices(Vec<String>),
    /// Disambiguation finished with the refined expression.
    Final(String),
}

/// Decodes a recursive disambiguation reply.
///
/// # Errors
///
/// Returns [`ShapeError`] when the payload is neither a `:more-choices`
/// round nor a `:final` expression.
pub fn refine_round(value: &Value) -> Result<RefineRound, ShapeError> {
    let expected = "(:more-choices ...) or (:final ...)";
    let items = value
        .as_list()
        .ok_or_else(|| ShapeError::new(expected, value))?;
    match items {
        [tag, candidates] if tag.as_atom() == Some("more-choices") => {
            Ok(RefineRound::MoreChoices(names(candidates)?))
        }
        [tag, expression] if tag.as_atom() == Some("final") => expression
            .as_str()
            .map(|body| RefineRound::Final(body.to_owned()))
            .ok_or_else(|| ShapeError::new(expected, value)),
        _ => Err(ShapeError::new(expected, value)),
    }
}
