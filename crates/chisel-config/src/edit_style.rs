//! Selection of the result-insertion strategy.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How textual command results reach the buffer.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum EditStyle {
    /// Rewrite residual placeholders into numbered editable fields and hand
    /// the result to the host's template-expansion capability.
    #[default]
    Template,
    /// Insert the result text verbatim.
    Plain,
}

/// Errors encountered while parsing an [`EditStyle`] from text.
pub type EditStyleParseError = strum::ParseError;
