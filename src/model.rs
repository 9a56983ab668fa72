use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Lower bound (unix seconds) of the next poll window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cursor(pub i64);

impl Cursor {
    /// Cursor covering one retry period back from `now`.
    pub fn starting_at(now: i64, retry_period_secs: u64) -> Self {
        let period = i64::try_from(retry_period_secs).unwrap_or(i64::MAX);
        Cursor(now.saturating_sub(period))
    }

    pub fn now() -> Self {
        Cursor(Utc::now().timestamp())
    }

    pub fn as_secs(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// When the poll loop moves the cursor forward to "now".
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum CursorPolicy {
    /// After every cycle, whatever its outcome.
    #[default]
    EveryCycle,
    /// Only after a cycle that finished without an error.
    SuccessOnly,
    /// Keep the startup cursor for the whole process lifetime.
    Never,
}

impl CursorPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CursorPolicy::EveryCycle => "every-cycle",
            CursorPolicy::SuccessOnly => "success-only",
            CursorPolicy::Never => "never",
        }
    }

    pub fn should_advance(&self, cycle_succeeded: bool) -> bool {
        match self {
            CursorPolicy::EveryCycle => true,
            CursorPolicy::SuccessOnly => cycle_succeeded,
            CursorPolicy::Never => false,
        }
    }
}

/// One entry of the `homeworks` list as the tracking API returns it.
///
/// Both fields are optional at this stage: presence is checked when the
/// entry is rendered. `status` stays untyped so that any unexpected value
/// is reported as an unknown status rather than a malformed response.
/// Other keys are ignored.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Homework {
    #[serde(default)]
    pub homework_name: Option<String>,
    #[serde(default)]
    pub status: Option<Value>,
}

/// A validated submission: name plus a known status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRecord {
    pub name: String,
    pub status: crate::verdict::HomeworkStatus,
}
