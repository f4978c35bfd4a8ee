//! Load and staleness tracking for the single elaborator session.

use std::collections::BTreeSet;

use camino::{Utf8Path, Utf8PathBuf};

/// Per-session record of which buffer the elaborator has loaded, which
/// buffers are dirty, and the working directory the process believes it is
/// in.
///
/// A buffer never seen before counts as dirty; only a confirmed successful
/// load marks it clean. The invariant maintained here is that
/// [`loaded`](Session::loaded) names a buffer only while that buffer is
/// clean and was the last file the elaborator accepted.
#[derive(Debug, Default)]
pub struct Session {
    working_dir: Option<Utf8PathBuf>,
    loaded: Option<Utf8PathBuf>,
    clean: BTreeSet<Utf8PathBuf>,
}

impl Session {
    /// Builds a session with no loaded buffer and no working directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The working directory last confirmed by the elaborator.
    #[must_use]
    pub fn working_dir(&self) -> Option<&Utf8Path> {
        self.working_dir.as_deref()
    }

    /// Records a confirmed working-directory switch.
    pub(crate) fn set_working_dir(&mut self, dir: &Utf8Path) {
        self.working_dir = Some(dir.to_owned());
    }

    /// The buffer currently loaded, if any.
    #[must_use]
    pub fn loaded(&self) -> Option<&Utf8Path> {
        self.loaded.as_deref()
    }

    /// Marks the buffer as modified since its last load.
    pub fn mark_dirty(&mut self, path: &Utf8Path) {
        self.clean.remove(path);
    }

    /// Marks the buffer clean and records it as the loaded buffer.
    pub fn mark_clean(&mut self, path: &Utf8Path) {
        self.clean.insert(path.to_owned());
        self.loaded = Some(path.to_owned());
    }

    /// Whether a reload is required before any buffer-scoped command.
    ///
    /// True when the buffer is dirty or when some other buffer (or none)
    /// is the one the elaborator has loaded.
    #[must_use]
    pub fn is_stale(&self, path: &Utf8Path) -> bool {
        !self.clean.contains(path) || self.loaded.as_deref() != Some(path)
    }

    /// Forgets the loaded buffer while a load is in flight, so a load
    /// failure cannot leave a half-loaded buffer looking current.
    pub(crate) fn invalidate_loaded(&mut self) {
        self.loaded = None;
    }

    /// Resets all session state after process termination.
    pub fn note_quit(&mut self) {
        self.working_dir = None;
        self.loaded = None;
        self.clean.clear();
    }
}
