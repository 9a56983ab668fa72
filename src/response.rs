//! Shape checks for tracking-API payloads.
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::model::Homework;

#[derive(Debug, Error)]
pub enum ShapeError {
    #[error("response is not a mapping")]
    NotAMapping,
    #[error("response has no \"homeworks\" key")]
    MissingHomeworks,
    #[error("\"homeworks\" is not a list")]
    HomeworksNotAList,
    #[error("invalid homework entry: {0}")]
    InvalidEntry(#[source] serde_json::Error),
}

/// Extract the newest homework entry from a payload.
///
/// The API returns entries newest first; only the first one is looked at.
/// An empty list is the normal "nothing changed" answer and yields `None`.
pub fn extract(payload: &Value) -> Result<Option<Homework>, ShapeError> {
    let obj = payload.as_object().ok_or(ShapeError::NotAMapping)?;
    let homeworks = obj
        .get("homeworks")
        .ok_or(ShapeError::MissingHomeworks)?
        .as_array()
        .ok_or(ShapeError::HomeworksNotAList)?;

    if let Some(date) = current_date(payload) {
        debug!(current_date = date, count = homeworks.len(), "statuses response");
    }

    let Some(first) = homeworks.first() else {
        info!("response contains no homework updates");
        return Ok(None);
    };

    let homework: Homework =
        serde_json::from_value(first.clone()).map_err(ShapeError::InvalidEntry)?;
    Ok(Some(homework))
}

/// Server-side timestamp the API reports alongside the list, if any.
pub fn current_date(payload: &Value) -> Option<i64> {
    payload.get("current_date").and_then(Value::as_i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_list_means_no_record() {
        assert!(extract(&json!({ "homeworks": [] })).unwrap().is_none());
        assert!(extract(&json!({ "homeworks": [], "current_date": 1700000000 }))
            .unwrap()
            .is_none());
    }

    #[test]
    fn returns_first_entry() {
        let payload = json!({
            "homeworks": [
                { "homework_name": "newest", "status": "approved" },
                { "homework_name": "older", "status": "rejected" }
            ],
            "current_date": 1700000000
        });
        let hw = extract(&payload).unwrap().unwrap();
        assert_eq!(hw.homework_name.as_deref(), Some("newest"));
        assert_eq!(hw.status, Some(json!("approved")));
        assert_eq!(current_date(&payload), Some(1700000000));
    }

    #[test]
    fn missing_homeworks_key() {
        let err = extract(&json!({ "current_date": 1 })).unwrap_err();
        assert!(matches!(err, ShapeError::MissingHomeworks));
    }

    #[test]
    fn not_a_mapping() {
        assert!(matches!(
            extract(&json!([1, 2, 3])).unwrap_err(),
            ShapeError::NotAMapping
        ));
        assert!(matches!(
            extract(&json!("homeworks")).unwrap_err(),
            ShapeError::NotAMapping
        ));
    }

    #[test]
    fn homeworks_not_a_list() {
        let err = extract(&json!({ "homeworks": { "homework_name": "hw1" } })).unwrap_err();
        assert!(matches!(err, ShapeError::HomeworksNotAList));
    }

    #[test]
    fn invalid_entries_are_shape_errors() {
        let err = extract(&json!({ "homeworks": ["hw1"] })).unwrap_err();
        assert!(matches!(err, ShapeError::InvalidEntry(_)));

        let err = extract(&json!({ "homeworks": [{ "homework_name": 7, "status": "approved" }] }))
            .unwrap_err();
        assert!(matches!(err, ShapeError::InvalidEntry(_)));
    }

    #[test]
    fn extra_fields_of_any_type_are_ignored() {
        let payload = json!({
            "homeworks": [{
                "id": 124,
                "homework_name": "hw1",
                "status": "approved",
                "reviewer_comment": { "text": "ok", "lines": [1, 2] },
                "date_updated": 1700000000,
                "lesson_name": null
            }]
        });
        let hw = extract(&payload).unwrap().unwrap();
        assert_eq!(hw.homework_name.as_deref(), Some("hw1"));
        assert_eq!(hw.status, Some(json!("approved")));
    }

    #[test]
    fn non_string_status_is_left_for_rendering() {
        let payload = json!({ "homeworks": [{ "homework_name": "hw1", "status": 5 }] });
        let hw = extract(&payload).unwrap().unwrap();
        assert_eq!(hw.status, Some(json!(5)));
    }

    #[test]
    fn entry_with_missing_fields_still_extracts() {
        let hw = extract(&json!({ "homeworks": [{ "id": 1 }] })).unwrap().unwrap();
        assert_eq!(hw, Homework::default());
    }
}
