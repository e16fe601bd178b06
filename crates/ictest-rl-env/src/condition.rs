//! Device condition as declared by the agent or read from the labels

use serde::{Deserialize, Serialize};
use std::fmt;

use ictest_rl_core::StepInfo;

/// Info key carrying the agent's declared (predicted) condition
pub const PREDICTED_CONDITION_KEY: &str = "PC";
/// Info key carrying the true condition of the DUT
pub const TRUE_CONDITION_KEY: &str = "TC";

/// Label value marking a good device; every other value marks a bad one
pub const GOOD_LABEL: f64 = 1.0;

/// Tri-state device condition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    /// Not decided yet
    #[default]
    Unknown,
    /// Device passes
    Good,
    /// Device fails
    Bad,
}

impl Condition {
    /// Condition encoded by a label column value
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn from_label(label: f64) -> Self {
        if label == GOOD_LABEL {
            Self::Good
        } else {
            Self::Bad
        }
    }

    /// Whether the condition has been decided
    #[must_use]
    pub fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Read a condition stored in step info under `key`
    #[must_use]
    pub fn from_info(info: &StepInfo, key: &str) -> Option<Self> {
        info.get(key)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "unknown",
            Self::Good => "good",
            Self::Bad => "bad",
        };
        f.write_str(name)
    }
}
