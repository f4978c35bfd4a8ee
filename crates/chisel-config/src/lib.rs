//! Settings model for the chisel editor client.
#![deny(missing_docs)]
//!
//! The embedding editor deserialises a [`Config`] from whatever
//! configuration source it owns (a settings file, editor variables) and
//! hands it to the client when constructing a session. Every field has a
//! default so an empty document yields a working configuration.

mod defaults;
mod edit_style;
mod logging;

pub use edit_style::{EditStyle, EditStyleParseError};
pub use logging::{LogFormat, LogFormatParseError};

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// Editor-facing configuration for one elaborator session.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Config {
    /// Elaborator executable path or command name.
    #[serde(default = "defaults::default_command")]
    pub command: Utf8PathBuf,

    /// Arguments passed to the elaborator on startup.
    #[serde(default = "defaults::default_args")]
    pub args: Vec<String>,

    /// How textual command results are inserted into the buffer.
    #[serde(default)]
    pub edit_style: EditStyle,

    /// Log filter expression handed to the host's subscriber.
    #[serde(default = "defaults::default_log_filter_string")]
    pub log_filter: String,

    /// Log output format for the host's subscriber.
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            command: defaults::default_command(),
            args: defaults::default_args(),
            edit_style: EditStyle::default(),
            log_filter: defaults::default_log_filter_string(),
            log_format: LogFormat::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn empty_document_yields_defaults() {
        let config: Config = serde_json::from_str("{}").expect("deserialise failed");
        assert_eq!(config, Config::default());
        assert_eq!(config.command, Utf8PathBuf::from("elab"));
        assert_eq!(config.args, vec!["--ide".to_owned()]);
        assert_eq!(config.edit_style, EditStyle::Template);
        assert_eq!(config.log_filter, "info");
        assert_eq!(config.log_format, LogFormat::Compact);
    }

    #[rstest]
    fn explicit_fields_override_defaults() {
        let document = r#"{
            "command": "/opt/elab/bin/elab",
            "args": ["--ide", "--no-colour"],
            "edit_style": "plain",
            "log_format": "json"
        }"#;
        let config: Config = serde_json::from_str(document).expect("deserialise failed");
        assert_eq!(config.command, Utf8PathBuf::from("/opt/elab/bin/elab"));
        assert_eq!(config.args.len(), 2);
        assert_eq!(config.edit_style, EditStyle::Plain);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[rstest]
    fn round_trips_through_serialisation() {
        let config = Config::default();
        let rendered = serde_json::to_string(&config).expect("serialise failed");
        let restored: Config = serde_json::from_str(&rendered).expect("deserialise failed");
        assert_eq!(restored, config);
    }
}
