//! Abstractions over the host editor surface.
//!
//! The host editor owns the text and the UI; the client core only holds
//! trait objects through which it reads the buffer, mutates it, and talks
//! to the user. Tests inject lightweight recording implementations without
//! a real editor behind them.

use std::fmt;

use camino::Utf8Path;

use chisel_wire::Value;

/// Cursor location within a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// 1-based source line.
    pub line: u32,
    /// Byte offset within the current line's text.
    pub column: usize,
}

/// Behaviour required from an editable text unit.
///
/// The core compares buffers by [`file_path`](SourceBuffer::file_path) and
/// never copies content speculatively; one `&mut dyn SourceBuffer` is handed
/// in per command invocation. Column arguments are byte offsets into
/// [`current_line_text`](SourceBuffer::current_line_text).
pub trait SourceBuffer {
    /// Absolute path of the file backing this buffer.
    fn file_path(&self) -> &Utf8Path;

    /// Directory containing the buffer's file.
    fn directory(&self) -> &Utf8Path;

    /// Text of the line the cursor is on, without its terminator.
    fn current_line_text(&self) -> String;

    /// Current cursor location.
    fn cursor(&self) -> Position;

    /// The identifier under the cursor and its 1-based line, if any.
    fn identifier_at_cursor(&self) -> Option<(String, u32)>;

    /// Replaces the entire current line with `text`.
    fn replace_current_line(&mut self, text: &str);

    /// Inserts `text` as a new line immediately below the current line.
    fn insert_line_below(&mut self, text: &str);

    /// Replaces the byte range `start..end` of the current line with `text`.
    fn replace_in_current_line(&mut self, start: usize, end: usize, text: &str);
}

impl fmt::Debug for dyn SourceBuffer {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SourceBuffer")
            .field("file_path", &self.file_path())
            .finish()
    }
}

/// Presentation capabilities consumed by the client core.
pub trait Presenter {
    /// Renders a read-only informational result, optionally with the
    /// elaborator's formatting annotation passed through untouched.
    fn show_info(&mut self, text: &str, style: Option<&Value>);

    /// Offers a choice between candidates; `None` means the user dismissed
    /// the menu.
    fn choose(&mut self, prompt: &str, candidates: &[String]) -> Option<String>;

    /// Expands templated text with numbered editable fields into the buffer
    /// at the location the preceding edit prepared.
    fn expand_template(&mut self, template: &str);

    /// Shows a transient one-line message.
    fn message(&mut self, text: &str);
}

/// Collector for compiler diagnostics.
///
/// The core resets the sink before every load, records located warnings as
/// they arrive, and signals availability after a failed load; rendering is
/// the host's concern.
pub trait DiagnosticsSink {
    /// Discards all recorded diagnostics for the coming load.
    fn reset(&mut self);

    /// Records one located warning.
    fn record(&mut self, file: &str, line: u32, message: &str);

    /// Signals that diagnostics for a failed load are ready to render.
    fn surface(&mut self);
}
