//! Default values shared by the configuration surface.

use camino::Utf8PathBuf;

/// Default elaborator command name, resolved through `PATH`.
pub const DEFAULT_COMMAND: &str = "elab";

/// Default log filter expression.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default elaborator command as an owned path.
pub(crate) fn default_command() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_COMMAND)
}

/// Default startup arguments: the structured interaction mode flag.
pub(crate) fn default_args() -> Vec<String> {
    vec!["--ide".to_owned()]
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub(crate) fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}
