//! Status codes of the tracking API and the sentences sent for them.
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::error;

use crate::model::{Homework, SubmissionRecord};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatusError {
    #[error("field \"{0}\" not found in homework entry")]
    MissingField(&'static str),
    #[error("unexpected homework status: {0}")]
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HomeworkStatus {
    Reviewing,
    Approved,
    Rejected,
}

impl HomeworkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HomeworkStatus::Reviewing => "reviewing",
            HomeworkStatus::Approved => "approved",
            HomeworkStatus::Rejected => "rejected",
        }
    }

    pub fn verdict(&self) -> &'static str {
        match self {
            HomeworkStatus::Approved => "Работа проверена: ревьюеру всё понравилось. Ура!",
            HomeworkStatus::Reviewing => "Работа взята на проверку ревьюером.",
            HomeworkStatus::Rejected => "Работа проверена: у ревьюера есть замечания.",
        }
    }
}

impl fmt::Display for HomeworkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HomeworkStatus {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reviewing" => Ok(HomeworkStatus::Reviewing),
            "approved" => Ok(HomeworkStatus::Approved),
            "rejected" => Ok(HomeworkStatus::Rejected),
            other => Err(StatusError::Unknown(other.to_string())),
        }
    }
}

/// Check required fields and the status code of a raw entry.
pub fn parse_status(homework: &Homework) -> Result<SubmissionRecord, StatusError> {
    let name = homework
        .homework_name
        .as_deref()
        .ok_or(StatusError::MissingField("homework_name"))?;
    let status = match homework.status.as_ref() {
        None => return Err(StatusError::MissingField("status")),
        Some(Value::String(raw)) => raw.parse::<HomeworkStatus>(),
        Some(other) => Err(StatusError::Unknown(other.to_string())),
    }
    .map_err(|err| {
        error!(%err, "unexpected homework status");
        err
    })?;
    Ok(SubmissionRecord {
        name: name.to_string(),
        status,
    })
}

pub fn message_for(record: &SubmissionRecord) -> String {
    format!(
        "Изменился статус проверки работы \"{}\". {}",
        record.name,
        record.status.verdict()
    )
}

/// Render the notification text for a raw entry.
pub fn render(homework: &Homework) -> Result<String, StatusError> {
    parse_status(homework).map(|record| message_for(&record))
}
