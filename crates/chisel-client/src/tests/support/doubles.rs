//! Recording implementations of the editor capability traits.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use camino::{Utf8Path, Utf8PathBuf};

use crate::editor::{DiagnosticsSink, Position, Presenter, SourceBuffer};
use chisel_wire::Value;

fn is_identifier_char(character: char) -> bool {
    character.is_ascii_alphanumeric() || character == '_'
}

/// In-memory buffer with an explicit cursor.
pub struct RecordingBuffer {
    path: Utf8PathBuf,
    directory: Utf8PathBuf,
    lines: Vec<String>,
    cursor_line: u32,
    cursor_column: usize,
}

impl RecordingBuffer {
    /// Builds a buffer over `content`, cursor at the first column of the
    /// first line.
    pub fn new(path: Utf8PathBuf, content: &str) -> Self {
        let directory = path
            .parent()
            .map_or_else(|| Utf8PathBuf::from("."), Utf8Path::to_owned);
        let lines = if content.is_empty() {
            vec![String::new()]
        } else {
            content.lines().map(str::to_owned).collect()
        };
        Self {
            path,
            directory,
            lines,
            cursor_line: 1,
            cursor_column: 0,
        }
    }

    /// Moves the cursor to a 1-based line and byte column.
    pub fn place_cursor(&mut self, line: u32, column: usize) {
        self.cursor_line = line;
        self.cursor_column = column;
    }

    /// Text of the 1-based line.
    pub fn line(&self, number: u32) -> &str {
        &self.lines[number as usize - 1]
    }

    /// All lines joined by newlines.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    fn current_index(&self) -> usize {
        self.cursor_line as usize - 1
    }
}

impl SourceBuffer for RecordingBuffer {
    fn file_path(&self) -> &Utf8Path {
        &self.path
    }

    fn directory(&self) -> &Utf8Path {
        &self.directory
    }

    fn current_line_text(&self) -> String {
        self.lines[self.current_index()].clone()
    }

    fn cursor(&self) -> Position {
        Position {
            line: self.cursor_line,
            column: self.cursor_column,
        }
    }

    fn identifier_at_cursor(&self) -> Option<(String, u32)> {
        let line = &self.lines[self.current_index()];
        let column = self.cursor_column.min(line.len());
        let start = line[..column]
            .char_indices()
            .rev()
            .take_while(|(_, character)| is_identifier_char(*character))
            .last()
            .map_or(column, |(index, _)| index);
        let end = column
            + line[column..]
                .char_indices()
                .take_while(|(_, character)| is_identifier_char(*character))
                .last()
                .map_or(0, |(index, character)| index + character.len_utf8());
        if start == end {
            return None;
        }
        Some((line[start..end].to_owned(), self.cursor_line))
    }

    fn replace_current_line(&mut self, text: &str) {
        let index = self.current_index();
        self.lines[index] = text.to_owned();
    }

    fn insert_line_below(&mut self, text: &str) {
        self.lines.insert(self.current_index() + 1, text.to_owned());
    }

    fn replace_in_current_line(&mut self, start: usize, end: usize, text: &str) {
        let index = self.current_index();
        self.lines[index].replace_range(start..end, text);
    }
}

#[derive(Default)]
struct PresenterState {
    infos: Vec<(String, bool)>,
    messages: Vec<String>,
    templates: Vec<String>,
    prompts: Vec<Vec<String>>,
    selections: VecDeque<String>,
}

/// Presenter double that records every interaction and answers choice
/// prompts from a queue of scripted selections.
#[derive(Clone, Default)]
pub struct RecordingPresenter {
    shared: Arc<Mutex<PresenterState>>,
}

impl RecordingPresenter {
    /// Builds a presenter with no scripted selections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a selection for a future choice prompt.
    pub fn queue_selection(&self, selection: &str) {
        self.with_state(|state| state.selections.push_back(selection.to_owned()));
    }

    /// Recorded informational displays: text plus whether formatting was
    /// attached.
    pub fn infos(&self) -> Vec<(String, bool)> {
        self.with_state(|state| state.infos.clone())
    }

    /// Recorded transient messages.
    pub fn messages(&self) -> Vec<String> {
        self.with_state(|state| state.messages.clone())
    }

    /// Recorded template expansions.
    pub fn templates(&self) -> Vec<String> {
        self.with_state(|state| state.templates.clone())
    }

    /// Candidate lists offered to the user, in order.
    pub fn prompts(&self) -> Vec<Vec<String>> {
        self.with_state(|state| state.prompts.clone())
    }

    fn with_state<R>(&self, action: impl FnOnce(&mut PresenterState) -> R) -> R {
        let mut guard = self
            .shared
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        action(&mut guard)
    }
}

impl Presenter for RecordingPresenter {
    fn show_info(&mut self, text: &str, style: Option<&Value>) {
        self.with_state(|state| state.infos.push((text.to_owned(), style.is_some())));
    }

    fn choose(&mut self, _prompt: &str, candidates: &[String]) -> Option<String> {
        self.with_state(|state| {
            state.prompts.push(candidates.to_vec());
            state.selections.pop_front()
        })
    }

    fn expand_template(&mut self, template: &str) {
        self.with_state(|state| state.templates.push(template.to_owned()));
    }

    fn message(&mut self, text: &str) {
        self.with_state(|state| state.messages.push(text.to_owned()));
    }
}

#[derive(Default)]
struct DiagnosticsState {
    resets: u32,
    surfaced: u32,
    recorded: Vec<(String, u32, String)>,
}

/// Diagnostics sink double counting resets and surfacing signals.
#[derive(Clone, Default)]
pub struct RecordingDiagnostics {
    shared: Arc<Mutex<DiagnosticsState>>,
}

impl RecordingDiagnostics {
    /// Builds an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times the sink was reset.
    pub fn resets(&self) -> u32 {
        self.with_state(|state| state.resets)
    }

    /// How many times diagnostics were surfaced.
    pub fn surfaced(&self) -> u32 {
        self.with_state(|state| state.surfaced)
    }

    /// Recorded warnings as (file, line, message).
    pub fn recorded(&self) -> Vec<(String, u32, String)> {
        self.with_state(|state| state.recorded.clone())
    }

    fn with_state<R>(&self, action: impl FnOnce(&mut DiagnosticsState) -> R) -> R {
        let mut guard = self
            .shared
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        action(&mut guard)
    }
}

impl DiagnosticsSink for RecordingDiagnostics {
    fn reset(&mut self) {
        self.with_state(|state| state.resets += 1);
    }

    fn record(&mut self, file: &str, line: u32, message: &str) {
        self.with_state(|state| {
            state
                .recorded
                .push((file.to_owned(), line, message.to_owned()));
        });
    }

    fn surface(&mut self) {
        self.with_state(|state| state.surfaced += 1);
    }
}
