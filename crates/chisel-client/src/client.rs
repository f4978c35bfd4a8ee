//! Client facade that mediates between the editor and the elaborator.

use camino::Utf8Path;
use tracing::debug;

use crate::adapter::{ElabConfig, ProcessChannel};
use crate::channel::Channel;
use crate::dispatch::{Dispatcher, Effects};
use crate::edit::{EditShape, PlainApplier, ResultApplier, TemplateApplier, hole_span};
use crate::editor::{DiagnosticsSink, Presenter, SourceBuffer};
use crate::errors::{ClientError, Operation};
use crate::session::Session;
use chisel_config::EditStyle;
use chisel_wire::{Command, decode};

/// Log target for client operations.
const CLIENT_TARGET: &str = "chisel_client::client";

/// Whether a load blocks the caller or completes through the pump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Block until the elaborator accepts or rejects the buffer.
    Sync,
    /// Register continuations and return immediately.
    Async,
}

/// A matched completion span with its candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Start byte offset of the identifier run within the current line.
    pub start: usize,
    /// End byte offset (the cursor column).
    pub end: usize,
    /// Candidate identifiers.
    pub candidates: Vec<String>,
}

/// One editor-side session against one elaborator process.
///
/// The client owns the session state machine and the dispatcher; the host
/// editor supplies the channel, the presentation surface, the diagnostics
/// sink, and (per command) the buffer being operated on. Multiple projects
/// are multiple `ElabClient` values, not shared globals.
pub struct ElabClient {
    channel: Box<dyn Channel>,
    dispatcher: Dispatcher,
    session: Session,
    presenter: Box<dyn Presenter>,
    diagnostics: Box<dyn DiagnosticsSink>,
    applier: Box<dyn ResultApplier>,
}

impl ElabClient {
    /// Builds a client over an explicit channel and capability set.
    #[must_use]
    pub fn new(
        channel: Box<dyn Channel>,
        presenter: Box<dyn Presenter>,
        diagnostics: Box<dyn DiagnosticsSink>,
        applier: Box<dyn ResultApplier>,
    ) -> Self {
        Self {
            channel,
            dispatcher: Dispatcher::new(),
            session: Session::new(),
            presenter,
            diagnostics,
            applier,
        }
    }

    /// Builds a client that spawns the configured elaborator binary and
    /// applies results in the configured edit style.
    #[must_use]
    pub fn from_settings(
        settings: &chisel_config::Config,
        presenter: Box<dyn Presenter>,
        diagnostics: Box<dyn DiagnosticsSink>,
    ) -> Self {
        let applier: Box<dyn ResultApplier> = match settings.edit_style {
            EditStyle::Template => Box::new(TemplateApplier),
            EditStyle::Plain => Box::new(PlainApplier),
        };
        Self::new(
            Box::new(ProcessChannel::new(ElabConfig::from_settings(settings))),
            presenter,
            diagnostics,
            applier,
        )
    }

    /// Read access to the session state machine.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Marks a buffer as modified; the next buffer-scoped command reloads it.
    pub fn note_buffer_modified(&mut self, buffer: &dyn SourceBuffer) {
        self.session.mark_dirty(buffer.file_path());
    }

    /// Protocol version announced by the elaborator, once seen.
    #[must_use]
    pub fn protocol_version(&self) -> Option<u64> {
        self.dispatcher.protocol_version()
    }

    /// Starts the elaborator if it is not already running.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] when spawning fails.
    pub fn ensure_process(&mut self) -> Result<(), ClientError> {
        self.channel.ensure_running()?;
        Ok(())
    }

    /// Drains the channel and delivers queued notices and asynchronous
    /// continuations. The host calls this from its event loop.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] when the channel fails.
    pub fn pump(&mut self) -> Result<(), ClientError> {
        let mut effects = Effects {
            session: &mut self.session,
            presenter: self.presenter.as_mut(),
            diagnostics: self.diagnostics.as_mut(),
        };
        self.dispatcher.pump(self.channel.as_mut(), &mut effects)
    }

    /// Terminates the elaborator, discards all outstanding calls without
    /// invoking their continuations, and resets the session.
    pub fn quit(&mut self) {
        self.dispatcher.discard_pending();
        self.channel.terminate();
        self.session.note_quit();
    }

    /// Evaluates REPL input and shows the result.
    ///
    /// # Errors
    ///
    /// Fails with [`ClientError::CallFailed`] when the elaborator rejects
    /// the input.
    pub fn interpret(&mut self, input: &str) -> Result<String, ClientError> {
        self.ensure_process()?;
        let value = self.dispatcher.call_sync(
            self.channel.as_mut(),
            Operation::Interpret,
            Command::Interpret {
                input: input.to_owned(),
            },
        )?;
        self.flush();
        let (text, style) = decode::styled_text(&value)
            .map_err(|source| ClientError::unexpected_reply(Operation::Interpret, source))?;
        self.presenter.show_info(&text, style.as_ref());
        Ok(text)
    }

    /// Ensures the elaborator has this buffer loaded, reloading only when
    /// the buffer is stale.
    ///
    /// # Errors
    ///
    /// Fails with [`ClientError::LoadFailed`] when the elaborator rejects
    /// the buffer (synchronous mode), leaving no buffer recorded as loaded.
    pub fn load_if_needed(
        &mut self,
        buffer: &mut dyn SourceBuffer,
        mode: LoadMode,
    ) -> Result<(), ClientError> {
        let path = buffer.file_path().to_owned();
        if !self.session.is_stale(&path) {
            debug!(target: CLIENT_TARGET, %path, "buffer already current, skipping load");
            return Ok(());
        }
        self.ensure_process()?;
        self.diagnostics.reset();
        self.switch_working_directory(&buffer.directory().to_owned())?;
        // A load in flight must not be mistaken for a finished one.
        self.session.invalidate_loaded();
        let file = path
            .file_name()
            .map_or_else(|| path.as_str().to_owned(), str::to_owned);
        match mode {
            LoadMode::Sync => self.load_sync(&path, file),
            LoadMode::Async => self.load_async(&path, file),
        }
    }

    fn load_sync(&mut self, path: &Utf8Path, file: String) -> Result<(), ClientError> {
        let outcome = self.dispatcher.call_sync(
            self.channel.as_mut(),
            Operation::Load,
            Command::LoadFile { path: file },
        );
        self.flush();
        match outcome {
            Ok(_) => {
                self.session.mark_clean(path);
                Ok(())
            }
            Err(ClientError::CallFailed { diagnostic, .. }) => {
                self.diagnostics.surface();
                Err(ClientError::LoadFailed { diagnostic })
            }
            Err(other) => Err(other),
        }
    }

    fn load_async(&mut self, path: &Utf8Path, file: String) -> Result<(), ClientError> {
        let loaded_path = path.to_owned();
        let failed_file = file.clone();
        self.dispatcher.call_async(
            self.channel.as_mut(),
            Command::LoadFile { path: file },
            Box::new(move |effects, _value| {
                effects.session.mark_clean(&loaded_path);
            }),
            Box::new(move |effects, diagnostic| {
                effects.diagnostics.surface();
                effects
                    .presenter
                    .message(&format!("failed to load {failed_file}: {diagnostic}"));
            }),
        )?;
        Ok(())
    }

    /// Shows the type of the identifier under the cursor.
    ///
    /// # Errors
    ///
    /// Fails with [`ClientError::NoTargetAtPoint`] when the cursor is not
    /// on an identifier.
    pub fn type_at_point(&mut self, buffer: &mut dyn SourceBuffer) -> Result<(), ClientError> {
        let (name, _line) = buffer
            .identifier_at_cursor()
            .ok_or(ClientError::NoTargetAtPoint)?;
        self.type_of_name(buffer, &name)
    }

    /// Shows the type of an explicitly named identifier.
    ///
    /// # Errors
    ///
    /// Fails with [`ClientError::CallFailed`] when the name is unknown.
    pub fn type_of_name(
        &mut self,
        buffer: &mut dyn SourceBuffer,
        name: &str,
    ) -> Result<(), ClientError> {
        self.load_if_needed(buffer, LoadMode::Sync)?;
        let value = self.dispatcher.call_sync(
            self.channel.as_mut(),
            Operation::TypeOf,
            Command::TypeOf {
                name: name.to_owned(),
            },
        )?;
        self.flush();
        let (text, style) = decode::styled_text(&value)
            .map_err(|source| ClientError::unexpected_reply(Operation::TypeOf, source))?;
        self.presenter.show_info(&text, style.as_ref());
        Ok(())
    }

    /// Splits the pattern variable under the cursor into its constructor
    /// cases, replacing the current line with the result.
    ///
    /// # Errors
    ///
    /// Fails with [`ClientError::NoTargetAtPoint`] or the load/call errors
    /// of the underlying protocol.
    pub fn case_split(&mut self, buffer: &mut dyn SourceBuffer) -> Result<(), ClientError> {
        let text = self.point_command(buffer, Operation::CaseSplit, |line, name| {
            Command::CaseSplit { line, name }
        })?;
        let body = text.strip_suffix('\n').unwrap_or(&text).to_owned();
        self.apply(buffer, &body, EditShape::ReplaceLine);
        Ok(())
    }

    /// Inserts an initial clause for the declaration under the cursor on
    /// the next line.
    ///
    /// # Errors
    ///
    /// Fails with [`ClientError::NoTargetAtPoint`] or the load/call errors
    /// of the underlying protocol.
    pub fn add_clause(&mut self, buffer: &mut dyn SourceBuffer) -> Result<(), ClientError> {
        let text = self.point_command(buffer, Operation::AddClause, |line, name| {
            Command::AddClause { line, name }
        })?;
        self.apply(buffer, &text, EditShape::InsertBelow);
        Ok(())
    }

    /// Inserts an initial clause in proof style on the next line.
    ///
    /// # Errors
    ///
    /// Fails with [`ClientError::NoTargetAtPoint`] or the load/call errors
    /// of the underlying protocol.
    pub fn add_proof_clause(&mut self, buffer: &mut dyn SourceBuffer) -> Result<(), ClientError> {
        let text = self.point_command(buffer, Operation::AddProofClause, |line, name| {
            Command::AddProofClause { line, name }
        })?;
        self.apply(buffer, &text, EditShape::InsertBelow);
        Ok(())
    }

    /// Inserts clauses for the missing cases starting on the next line.
    ///
    /// # Errors
    ///
    /// Fails with [`ClientError::NoTargetAtPoint`] or the load/call errors
    /// of the underlying protocol.
    pub fn add_missing(&mut self, buffer: &mut dyn SourceBuffer) -> Result<(), ClientError> {
        let text = self.point_command(buffer, Operation::AddMissing, |line, name| {
            Command::AddMissing { line, name }
        })?;
        self.apply(buffer, &text, EditShape::InsertBelow);
        Ok(())
    }

    /// Rewrites the clause under the cursor into a `with` block.
    ///
    /// # Errors
    ///
    /// Fails with [`ClientError::NoTargetAtPoint`] or the load/call errors
    /// of the underlying protocol.
    pub fn make_with(&mut self, buffer: &mut dyn SourceBuffer) -> Result<(), ClientError> {
        let text = self.point_command(buffer, Operation::MakeWith, |line, name| {
            Command::MakeWith { line, name }
        })?;
        self.apply(buffer, &text, EditShape::ReplaceLine);
        Ok(())
    }

    /// Searches for an expression filling the hole under the cursor and
    /// replaces the hole marker with the result.
    ///
    /// # Errors
    ///
    /// Fails with [`ClientError::NoTargetAtPoint`] when the cursor is not
    /// on a hole, or with the load/call errors of the underlying protocol.
    pub fn proof_search(
        &mut self,
        buffer: &mut dyn SourceBuffer,
        hints: &[String],
    ) -> Result<(), ClientError> {
        let (name, line) = buffer
            .identifier_at_cursor()
            .ok_or(ClientError::NoTargetAtPoint)?;
        self.load_if_needed(buffer, LoadMode::Sync)?;
        let value = self.dispatcher.call_sync(
            self.channel.as_mut(),
            Operation::ProofSearch,
            Command::ProofSearch {
                line,
                name,
                hints: hints.to_vec(),
            },
        )?;
        self.flush();
        let text = decode::text(&value)
            .map_err(|source| ClientError::unexpected_reply(Operation::ProofSearch, source))?;
        let (start, end) = hole_span(&buffer.current_line_text(), buffer.cursor().column)
            .ok_or(ClientError::NoTargetAtPoint)?;
        self.apply(buffer, &text, EditShape::ReplaceSpan { start, end });
        Ok(())
    }

    /// Completion candidates for the identifier run ending at the cursor.
    ///
    /// Never forces a load: completing against a half-edited buffer must
    /// not trigger compilation. Returns `None` without error when no
    /// process is running, the run is empty, or there are no candidates.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] when an issued call fails at the
    /// channel level.
    pub fn complete_at(
        &mut self,
        buffer: &dyn SourceBuffer,
    ) -> Result<Option<Completion>, ClientError> {
        if !self.channel.is_running() {
            return Ok(None);
        }
        let line = buffer.current_line_text();
        let cursor = buffer.cursor().column.min(line.len());
        let start = line[..cursor]
            .char_indices()
            .rev()
            .take_while(|(_, character)| {
                character.is_ascii_alphanumeric() || *character == '_'
            })
            .last()
            .map_or(cursor, |(index, _)| index);
        if start == cursor {
            return Ok(None);
        }
        let prefix = line[start..cursor].to_owned();
        let value = self.dispatcher.call_sync(
            self.channel.as_mut(),
            Operation::Completion,
            Command::ReplCompletions { prefix },
        )?;
        self.flush();
        let candidates = decode::names(&value)
            .map_err(|source| ClientError::unexpected_reply(Operation::Completion, source))?;
        if candidates.is_empty() {
            return Ok(None);
        }
        Ok(Some(Completion {
            start,
            end: cursor,
            candidates,
        }))
    }

    /// Issues the synchronous change-directory command when `dir` differs
    /// from the session's cached working directory.
    fn switch_working_directory(&mut self, dir: &Utf8Path) -> Result<(), ClientError> {
        if self.session.working_dir() == Some(dir) {
            return Ok(());
        }
        self.ensure_process()?;
        self.dispatcher.call_sync(
            self.channel.as_mut(),
            Operation::ChangeDirectory,
            Command::Interpret {
                input: format!(":cd {dir}"),
            },
        )?;
        self.session.set_working_dir(dir);
        Ok(())
    }

    fn point_command(
        &mut self,
        buffer: &mut dyn SourceBuffer,
        operation: Operation,
        build: impl FnOnce(u32, String) -> Command,
    ) -> Result<String, ClientError> {
        let (name, line) = buffer
            .identifier_at_cursor()
            .ok_or(ClientError::NoTargetAtPoint)?;
        self.load_if_needed(buffer, LoadMode::Sync)?;
        let value =
            self.dispatcher
                .call_sync(self.channel.as_mut(), operation, build(line, name))?;
        self.flush();
        decode::text(&value).map_err(|source| ClientError::unexpected_reply(operation, source))
    }

    pub(crate) fn apply(&mut self, buffer: &mut dyn SourceBuffer, text: &str, shape: EditShape) {
        self.applier
            .apply(buffer, self.presenter.as_mut(), text, shape);
    }

    /// Delivers notices queued while a synchronous call was blocked.
    pub(crate) fn flush(&mut self) {
        let mut effects = Effects {
            session: &mut self.session,
            presenter: self.presenter.as_mut(),
            diagnostics: self.diagnostics.as_mut(),
        };
        self.dispatcher.deliver_notices(&mut effects);
    }

    pub(crate) fn call_sync_for(
        &mut self,
        operation: Operation,
        command: Command,
    ) -> Result<chisel_wire::Value, ClientError> {
        self.dispatcher
            .call_sync(self.channel.as_mut(), operation, command)
    }

    pub(crate) fn presenter_mut(&mut self) -> &mut dyn Presenter {
        self.presenter.as_mut()
    }

    pub(crate) fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    #[cfg(test)]
    pub(crate) fn call_async_for(
        &mut self,
        command: Command,
        on_success: crate::dispatch::SuccessFn,
        on_failure: crate::dispatch::FailureFn,
    ) -> Result<chisel_wire::CallHandle, ClientError> {
        self.dispatcher
            .call_async(self.channel.as_mut(), command, on_success, on_failure)
    }
}
