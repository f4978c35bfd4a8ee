//! Mediates between textual command results and buffer edits.
//!
//! Commands decide *where* a result lands (an [`EditShape`]); the
//! configured applier decides *how*: [`TemplateApplier`] rewrites residual
//! placeholders into numbered editable fields and hands the templated text
//! to the host's expansion capability, while [`PlainApplier`] inserts the
//! text verbatim.

use crate::editor::{Presenter, SourceBuffer};

/// Where a textual result lands in the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditShape {
    /// Replace the entire current line.
    ReplaceLine,
    /// Insert as a new line immediately below the current line.
    InsertBelow,
    /// Replace the byte range `start..end` of the current line.
    ReplaceSpan {
        /// Start byte offset within the current line.
        start: usize,
        /// End byte offset within the current line.
        end: usize,
    },
}

/// Applies a textual command result to the buffer.
pub trait ResultApplier {
    /// Lands `text` at the location described by `shape`.
    fn apply(
        &self,
        buffer: &mut dyn SourceBuffer,
        presenter: &mut dyn Presenter,
        text: &str,
        shape: EditShape,
    );
}

/// Applier that turns residual placeholders into editable template fields.
#[derive(Debug, Default)]
pub struct TemplateApplier;

impl ResultApplier for TemplateApplier {
    fn apply(
        &self,
        buffer: &mut dyn SourceBuffer,
        presenter: &mut dyn Presenter,
        text: &str,
        shape: EditShape,
    ) {
        match number_placeholders(text) {
            Some(template) => {
                // Open the target location, then let the expansion
                // capability insert the fields there.
                perform_edit(buffer, shape, "");
                presenter.expand_template(&template);
            }
            None => perform_edit(buffer, shape, text),
        }
    }
}

/// Applier that inserts results verbatim.
#[derive(Debug, Default)]
pub struct PlainApplier;

impl ResultApplier for PlainApplier {
    fn apply(
        &self,
        buffer: &mut dyn SourceBuffer,
        _presenter: &mut dyn Presenter,
        text: &str,
        shape: EditShape,
    ) {
        perform_edit(buffer, shape, text);
    }
}

fn perform_edit(buffer: &mut dyn SourceBuffer, shape: EditShape, text: &str) {
    match shape {
        EditShape::ReplaceLine => buffer.replace_current_line(text),
        EditShape::InsertBelow => buffer.insert_line_below(text),
        EditShape::ReplaceSpan { start, end } => {
            buffer.replace_in_current_line(start, end, text);
        }
    }
}

fn is_identifier_char(character: char) -> bool {
    character.is_ascii_alphanumeric() || character == '_'
}

/// Byte span of the hole under the cursor: the nearest `?` at or before the
/// cursor through the end of the identifier run that follows it.
pub(crate) fn hole_span(line: &str, cursor: usize) -> Option<(usize, usize)> {
    let search_end = line
        .char_indices()
        .map(|(index, character)| index + character.len_utf8())
        .find(|&end| end > cursor)
        .unwrap_or(line.len());
    let start = line[..search_end].rfind('?')?;
    let mut end = start + 1;
    for (index, character) in line[start + 1..].char_indices() {
        if is_identifier_char(character) {
            end = start + 1 + index + character.len_utf8();
        } else {
            break;
        }
    }
    Some((start, end))
}

/// Rewrites `?name` placeholders and literal `(_)` markers into `${N:default}`
/// fields, numbered by first occurrence starting at 1. Returns `None` when
/// the text contains no placeholders.
pub(crate) fn number_placeholders(text: &str) -> Option<String> {
    let mut output = String::with_capacity(text.len());
    let mut field = 0u32;
    let mut chars = text.char_indices().peekable();
    while let Some((index, character)) = chars.next() {
        if character == '?' {
            let mut name = String::new();
            while let Some((_, candidate)) = chars.peek().copied() {
                if is_identifier_char(candidate) {
                    name.push(candidate);
                    chars.next();
                } else {
                    break;
                }
            }
            if name.is_empty() {
                output.push('?');
            } else {
                field += 1;
                output.push_str(&format!("${{{field}:{name}}}"));
            }
        } else if character == '(' && text[index..].starts_with("(_)") {
            chars.next();
            chars.next();
            field += 1;
            output.push_str(&format!("(${{{field}:_}})"));
        } else {
            output.push(character);
        }
    }
    (field > 0).then_some(output)
}
