//! Log output selection for the daemon's stderr stream.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Output formats accepted via `LECTERN_LOG_FORMAT` or `--log-format`.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Newline-delimited JSON; the default, since the daemon normally runs
    /// under a supervisor that ships its stderr to a log aggregator.
    #[default]
    Json,
    /// Single-line human-readable output for interactive runs.
    Compact,
}

/// Errors encountered while parsing a [`LogFormat`] from text.
pub type LogFormatParseError = strum::ParseError;
