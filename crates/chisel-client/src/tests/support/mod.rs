//! Shared fixtures and recording doubles for client tests.

mod doubles;
mod scripted;

use camino::Utf8PathBuf;

pub use doubles::{RecordingBuffer, RecordingDiagnostics, RecordingPresenter};
pub use scripted::{ScriptedChannel, ScriptedReply};

use crate::client::ElabClient;
use crate::edit::{PlainApplier, ResultApplier, TemplateApplier};

/// A client wired to recording doubles, with the shared halves kept for
/// assertions.
pub struct World {
    pub client: ElabClient,
    pub channel: ScriptedChannel,
    pub presenter: RecordingPresenter,
    pub diagnostics: RecordingDiagnostics,
}

impl World {
    /// Builds a world whose channel answers calls from `replies`, applying
    /// results verbatim.
    pub fn new(replies: Vec<ScriptedReply>) -> Self {
        Self::with_applier(replies, Box::new(PlainApplier))
    }

    /// Builds a world that routes results through template expansion.
    pub fn with_template_expansion(replies: Vec<ScriptedReply>) -> Self {
        Self::with_applier(replies, Box::new(TemplateApplier))
    }

    fn with_applier(replies: Vec<ScriptedReply>, applier: Box<dyn ResultApplier>) -> Self {
        let channel = ScriptedChannel::new(replies);
        let presenter = RecordingPresenter::new();
        let diagnostics = RecordingDiagnostics::new();
        let client = ElabClient::new(
            Box::new(channel.clone()),
            Box::new(presenter.clone()),
            Box::new(diagnostics.clone()),
            applier,
        );
        Self {
            client,
            channel,
            presenter,
            diagnostics,
        }
    }
}

/// Builds a buffer over `content` with the cursor at the given 1-based
/// line and byte column.
pub fn buffer_at(path: &str, content: &str, line: u32, column: usize) -> RecordingBuffer {
    let mut buffer = RecordingBuffer::new(Utf8PathBuf::from(path), content);
    buffer.place_cursor(line, column);
    buffer
}
