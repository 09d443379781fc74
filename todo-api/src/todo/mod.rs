use crate::entities::todo;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sea_orm::ActiveValue;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

pub mod api;
pub mod filter;
pub mod repository;

pub use filter::{Pagination, TodoFilter};
pub use repository::{TodoRepository, TodoRepositoryError};

/// Error type for values that are not acceptable on a todo.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// An enumeration field holds a value outside its set of members.
    #[error("invalid value field \"{field}\": {value}")]
    InvalidField { field: &'static str, value: String },
    /// A due date that is neither a calendar date nor an RFC 3339 timestamp.
    #[error("invalid due date \"{0}\", expected YYYY-MM-DD or an RFC 3339 timestamp")]
    InvalidDueDate(String),
}

/// How urgent a todo is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Urgent,
    ];

    /// Returns the value stored in the `priority` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .into_iter()
            .find(|priority| priority.as_str() == value)
            .ok_or_else(|| ValidationError::InvalidField {
                field: "Priority",
                value: value.to_string(),
            })
    }
}

/// Where a todo is in its life. Any status may follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Planned,
    InProgress,
    Completed,
    Canceled,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Planned,
        Status::InProgress,
        Status::Completed,
        Status::Canceled,
    ];

    /// Returns the value stored in the `status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Planned => "planned",
            Status::InProgress => "in_progress",
            Status::Completed => "completed",
            Status::Canceled => "canceled",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| ValidationError::InvalidField {
                field: "Status",
                value: value.to_string(),
            })
    }
}

/// A single todo item.
///
/// An `id` of `0` means the todo has not been stored yet; the repository
/// assigns the real id on create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Todo {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub tags: Vec<String>,
    pub priority: Priority,
    pub status: Status,
    pub overdue: bool,
}

impl Todo {
    /// Creates an unsaved todo with no due date, no tags and the overdue flag cleared.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        priority: Priority,
        status: Status,
    ) -> Self {
        Self {
            id: 0,
            title: title.into(),
            description: description.into(),
            due_date: None,
            tags: Vec::new(),
            priority,
            status,
            overdue: false,
        }
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_overdue(mut self, overdue: bool) -> Self {
        self.overdue = overdue;
        self
    }

    /// Builds the active model for an insert or a full-row update. The id is
    /// left unset so the store keeps ownership of it.
    pub(crate) fn to_active_model(&self) -> todo::ActiveModel {
        todo::ActiveModel {
            id: ActiveValue::NotSet,
            title: ActiveValue::Set(self.title.clone()),
            description: ActiveValue::Set(self.description.clone()),
            due_date: ActiveValue::Set(self.due_date),
            tags: ActiveValue::Set(self.tags.clone()),
            priority: ActiveValue::Set(self.priority.as_str().to_string()),
            status: ActiveValue::Set(self.status.as_str().to_string()),
            overdue: ActiveValue::Set(self.overdue),
        }
    }
}

impl TryFrom<todo::Model> for Todo {
    type Error = ValidationError;

    fn try_from(model: todo::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            title: model.title,
            description: model.description,
            due_date: model.due_date,
            tags: model.tags,
            priority: model.priority.parse()?,
            status: model.status.parse()?,
            overdue: model.overdue,
        })
    }
}

/// Truncates a timestamp to its calendar date in UTC.
pub fn normalize_due_date<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> NaiveDate {
    timestamp.with_timezone(&Utc).date_naive()
}

/// Parses a raw due date.
///
/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp, which is truncated to its UTC
/// calendar date. Blank input means "no due date".
pub fn parse_due_date(raw: &str) -> Result<Option<NaiveDate>, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(Some(date));
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|timestamp| Some(normalize_due_date(&timestamp)))
        .map_err(|_| ValidationError::InvalidDueDate(raw.to_string()))
}
