use chrono::{DateTime, NaiveDate};
use std::fmt;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Opaque identifier of a task, assigned by the server on creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Creation date of a stored task, kept exactly as it was written.
///
/// Older clients stored whatever string they were given, so the raw form is
/// preserved for write-back and the calendar date is read from it leniently:
/// `YYYY-MM-DD`, or the date part of an RFC 3339 timestamp. Anything else
/// counts as no date.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(from = "String", into = "String")
)]
pub struct CreatedDate {
    raw: String,
    date: Option<NaiveDate>,
}

impl CreatedDate {
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let date = parse_calendar_date(raw.trim());
        Self { raw, date }
    }

    /// The calendar date, if the stored form holds one.
    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|timestamp| timestamp.date_naive())
        })
}

impl From<NaiveDate> for CreatedDate {
    fn from(date: NaiveDate) -> Self {
        Self {
            raw: date.format(DATE_FORMAT).to_string(),
            date: Some(date),
        }
    }
}

impl From<String> for CreatedDate {
    fn from(raw: String) -> Self {
        Self::parse(raw)
    }
}

impl From<CreatedDate> for String {
    fn from(created_date: CreatedDate) -> Self {
        created_date.raw
    }
}

impl fmt::Display for CreatedDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// A single to-do item.
///
/// `disabled` is the completion flag. Documents written by older clients may
/// lack `priority` or `createdDate`; those decode as `false` and `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub disabled: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub priority: bool,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub created_date: Option<CreatedDate>,
}

impl Task {
    /// Returns true when the task has not been completed yet.
    pub fn is_active(&self) -> bool {
        !self.disabled
    }

    /// The calendar date the task was created on, when one is known.
    pub fn created_on(&self) -> Option<NaiveDate> {
        self.created_date.as_ref().and_then(CreatedDate::date)
    }
}

/// Validation failures for task payloads.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ValidationError {
    #[error("Invalid task: text is required and must be a string")]
    MissingText,
    #[error("Invalid task: text must not be blank")]
    BlankText,
    #[error("Please provide the disabled or priority status in the request body")]
    EmptyPatch,
}

/// Payload for creating a task. Every field is optional on the wire so that
/// a missing `text` is reported as a validation failure rather than a
/// decoding failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase", default)
)]
pub struct NewTask {
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub text: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub priority: Option<bool>,
    #[cfg_attr(
        feature = "serde",
        serde(with = "calendar_date", skip_serializing_if = "Option::is_none")
    )]
    pub created_date: Option<NaiveDate>,
}

impl NewTask {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn with_priority(mut self, priority: bool) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_created_date(mut self, created_date: NaiveDate) -> Self {
        self.created_date = Some(created_date);
        self
    }

    /// Returns the task text if it is present and not blank.
    pub fn validated_text(&self) -> Result<&str, ValidationError> {
        let text = self.text.as_deref().ok_or(ValidationError::MissingText)?;
        if text.trim().is_empty() {
            return Err(ValidationError::BlankText);
        }
        Ok(text)
    }
}

/// Partial update of a task. Only supplied fields are applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase", default)
)]
pub struct TaskPatch {
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub disabled: Option<bool>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub priority: Option<bool>,
}

impl TaskPatch {
    pub fn disabled(disabled: bool) -> Self {
        Self {
            disabled: Some(disabled),
            priority: None,
        }
    }

    pub fn priority(priority: bool) -> Self {
        Self {
            disabled: None,
            priority: Some(priority),
        }
    }

    /// Rejects patches that would not change anything.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.disabled.is_none() && self.priority.is_none() {
            return Err(ValidationError::EmptyPatch);
        }
        Ok(())
    }

    /// Applies the supplied fields to `task`.
    pub fn apply(&self, task: &mut Task) {
        if let Some(disabled) = self.disabled {
            task.disabled = disabled;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
    }
}

/// Strict `YYYY-MM-DD` dates for new tasks, where an absent or empty value
/// means "no date".
#[cfg(feature = "serde")]
mod calendar_date {
    use super::DATE_FORMAT as FORMAT;
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(date) => serializer.collect_str(&date.format(FORMAT)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => NaiveDate::parse_from_str(value, FORMAT)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str) -> Task {
        Task {
            id: TaskId::from(id),
            text: "walk the dog".to_string(),
            disabled: false,
            priority: false,
            created_date: None,
        }
    }

    #[test]
    fn can_reject_missing_text() {
        let new_task = NewTask::default();

        assert_eq!(
            new_task.validated_text(),
            Err(ValidationError::MissingText)
        );
    }

    #[test]
    fn can_reject_blank_text() {
        assert_eq!(
            NewTask::new("").validated_text(),
            Err(ValidationError::BlankText)
        );
        assert_eq!(
            NewTask::new("   ").validated_text(),
            Err(ValidationError::BlankText)
        );
    }

    #[test]
    fn can_accept_text() {
        assert_eq!(NewTask::new("buy milk").validated_text(), Ok("buy milk"));
    }

    #[test]
    fn can_reject_empty_patch() {
        assert_eq!(
            TaskPatch::default().validate(),
            Err(ValidationError::EmptyPatch)
        );
        assert_eq!(TaskPatch::disabled(true).validate(), Ok(()));
    }

    #[test]
    fn can_read_calendar_date_from_stored_forms() {
        let plain = CreatedDate::parse("2024-01-05");
        let timestamp = CreatedDate::parse("2024-01-05T10:00:00.000Z");
        let garbage = CreatedDate::parse("next tuesday");

        assert_eq!(plain.date(), NaiveDate::from_ymd_opt(2024, 1, 5));
        assert_eq!(timestamp.date(), NaiveDate::from_ymd_opt(2024, 1, 5));
        assert_eq!(timestamp.as_str(), "2024-01-05T10:00:00.000Z");
        assert_eq!(garbage.date(), None);
        assert_eq!(CreatedDate::parse("").date(), None);
    }

    #[test]
    fn can_format_date_created_from_calendar_date() {
        let created = CreatedDate::from(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());

        assert_eq!(created.as_str(), "2024-03-01");
        assert_eq!(created.to_string(), "2024-03-01");
    }

    #[test]
    fn can_apply_only_supplied_fields() {
        let mut target = task("1");
        target.priority = true;

        TaskPatch::disabled(true).apply(&mut target);

        assert!(target.disabled);
        assert!(target.priority);
    }

    #[cfg(feature = "serde")]
    mod serde_tests {
        use super::*;

        #[test]
        fn can_serialize_with_camel_case_fields() {
            let mut target = task("abc");
            target.created_date = NaiveDate::from_ymd_opt(2024, 3, 1).map(CreatedDate::from);

            let json = serde_json::to_string(&target).unwrap();

            assert_eq!(
                json,
                r#"{"id":"abc","text":"walk the dog","disabled":false,"priority":false,"createdDate":"2024-03-01"}"#
            );
        }

        #[test]
        fn can_read_legacy_task_without_date_or_priority() {
            let json = r#"{"id":"abc","text":"old","disabled":true}"#;

            let parsed: Task = serde_json::from_str(json).unwrap();

            assert!(parsed.disabled);
            assert!(!parsed.priority);
            assert_eq!(parsed.created_date, None);
        }

        #[test]
        fn can_keep_empty_date_on_write_back() {
            let json = r#"{"id":"abc","text":"old","disabled":false,"priority":false,"createdDate":""}"#;

            let parsed: Task = serde_json::from_str(json).unwrap();

            assert_eq!(parsed.created_on(), None);
            assert_eq!(serde_json::to_string(&parsed).unwrap(), json);
        }

        #[test]
        fn can_read_stored_timestamp_leniently() {
            let json = r#"{"id":"abc","text":"old","createdDate":"2024-01-05T10:00:00.000Z"}"#;

            let parsed: Task = serde_json::from_str(json).unwrap();

            assert_eq!(parsed.created_on(), NaiveDate::from_ymd_opt(2024, 1, 5));
        }

        #[test]
        fn can_reject_timestamp_on_new_task() {
            let json = r#"{"text":"buy milk","createdDate":"2024-01-05T10:00:00.000Z"}"#;

            assert!(serde_json::from_str::<NewTask>(json).is_err());
        }

        #[test]
        fn can_reject_non_boolean_priority() {
            let json = r#"{"text":"buy milk","priority":"yes"}"#;

            assert!(serde_json::from_str::<NewTask>(json).is_err());
        }

        #[test]
        fn can_read_new_task_with_null_text() {
            let parsed: NewTask = serde_json::from_str(r#"{"text":null}"#).unwrap();

            assert_eq!(parsed.validated_text(), Err(ValidationError::MissingText));
        }

        #[test]
        fn can_skip_unset_patch_fields() {
            let json = serde_json::to_string(&TaskPatch::priority(true)).unwrap();

            assert_eq!(json, r#"{"priority":true}"#);
        }
    }
}
