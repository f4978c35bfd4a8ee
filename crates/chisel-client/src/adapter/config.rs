//! Configuration for spawning the elaborator process.

use camino::Utf8PathBuf;

/// Spawn settings for the elaborator.
#[derive(Debug, Clone)]
pub struct ElabConfig {
    /// The executable path or command name.
    pub command: Utf8PathBuf,
    /// Arguments to pass on startup.
    pub args: Vec<String>,
    /// Working directory for the spawned process.
    pub working_dir: Option<Utf8PathBuf>,
}

impl ElabConfig {
    /// Builds spawn settings for an explicit command and argument list.
    #[must_use]
    pub fn new(command: impl Into<Utf8PathBuf>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            working_dir: None,
        }
    }

    /// Derives spawn settings from the editor-facing configuration.
    #[must_use]
    pub fn from_settings(settings: &chisel_config::Config) -> Self {
        Self::new(settings.command.clone(), settings.args.clone())
    }

    /// Sets a custom working directory.
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

impl Default for ElabConfig {
    fn default() -> Self {
        Self::from_settings(&chisel_config::Config::default())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn derives_command_and_args_from_settings() {
        let settings = chisel_config::Config::default();
        let config = ElabConfig::from_settings(&settings);

        assert_eq!(config.command, Utf8PathBuf::from("elab"));
        assert_eq!(config.args, vec!["--ide"]);
        assert_eq!(config.working_dir, None);
    }

    #[rstest]
    fn builder_methods_work() {
        let config = ElabConfig::default().with_working_dir("/workspace");

        assert_eq!(config.working_dir, Some(Utf8PathBuf::from("/workspace")));
    }
}
