use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Kind of practice a task asks for.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Practice,
    Review,
    Test,
    Homework,
    Exam,
}

impl TaskType {
    pub const ALL: [TaskType; 5] = [
        TaskType::Practice,
        TaskType::Review,
        TaskType::Test,
        TaskType::Homework,
        TaskType::Exam,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Practice => "practice",
            TaskType::Review => "review",
            TaskType::Test => "test",
            TaskType::Homework => "homework",
            TaskType::Exam => "exam",
        }
    }
}

/// How a task recurs.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CycleType {
    Once,
    Daily,
    Weekly,
}

impl CycleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleType::Once => "once",
            CycleType::Daily => "daily",
            CycleType::Weekly => "weekly",
        }
    }
}

/// Lifecycle status of a task. Only ever changed explicitly.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    /// The status that follows this one when cycling through them in the TUI.
    pub fn next(&self) -> TaskStatus {
        match self {
            TaskStatus::Pending => TaskStatus::InProgress,
            TaskStatus::InProgress => TaskStatus::Completed,
            TaskStatus::Completed => TaskStatus::Cancelled,
            TaskStatus::Cancelled => TaskStatus::Pending,
        }
    }
}

macro_rules! str_enum_impls {
    ($ty:ident, $field:literal, $expected:literal, [$($variant:ident),+]) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                $(
                    if s.eq_ignore_ascii_case($ty::$variant.as_str()) {
                        return Ok($ty::$variant);
                    }
                )+
                Err(Error::InvalidValue {
                    field: $field,
                    value: s.to_string(),
                    expected: $expected,
                })
            }
        }
    };
}

str_enum_impls!(TaskType, "task_type", "practice, review, test, homework, exam", [Practice, Review, Test, Homework, Exam]);
str_enum_impls!(CycleType, "cycle_type", "once, daily, weekly", [Once, Daily, Weekly]);
str_enum_impls!(TaskStatus, "task_status", "pending, in_progress, completed, cancelled", [Pending, InProgress, Completed, Cancelled]);

/// A recurring or one-off practice assignment.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Task {
    /// Opaque, globally unique identifier (UUID v4).
    pub id: String,
    /// Owning user.
    pub user_id: String,
    /// Resource copied onto every generated item.
    #[serde(default)]
    pub resource_id: Option<String>,
    pub task_type: TaskType,
    pub cycle_type: CycleType,
    /// Weekday selectors as entered, only kept for weekly cycles.
    #[serde(default)]
    pub week_days: Option<String>,
    /// Plan start date.
    pub task_plan_date: DateTime<Utc>,
    /// Plan end date; stamped automatically when the status is set to completed.
    #[serde(default)]
    pub task_finish_date: Option<DateTime<Utc>>,
    /// Number of items produced by expansion at creation time.
    pub task_num: u32,
    /// Number of items that have been scored at least once.
    #[serde(default)]
    pub finished_task_num: u32,
    #[serde(default)]
    pub task_status: TaskStatus,
    pub create_date: DateTime<Utc>,
    pub update_date: DateTime<Utc>,
}

impl Task {
    /// Completion ratio in `0.0..=1.0`.
    pub fn progress(&self) -> f64 {
        if self.task_num == 0 {
            return 0.0;
        }
        f64::from(self.finished_task_num) / f64::from(self.task_num)
    }
}

/// One scheduled occurrence of a task.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TaskItem {
    pub id: u64,
    /// Copy of the parent task's owner.
    pub user_id: String,
    pub task_id: String,
    /// Copy of the parent task's resource.
    #[serde(default)]
    pub resource_id: Option<String>,
    pub plan_time: DateTime<Utc>,
    #[serde(default)]
    pub begin_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// Set once the learner's attempt has been scored.
    #[serde(default)]
    pub score: Option<f64>,
    /// Whether this item has already been added to the parent's `finished_task_num`.
    #[serde(default)]
    pub counted: bool,
    pub create_date: DateTime<Utc>,
    pub update_date: DateTime<Utc>,
}

impl TaskItem {
    pub fn is_scored(&self) -> bool {
        self.score.is_some()
    }
}

/// A task item before the store has assigned it an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTaskItem {
    pub user_id: String,
    pub task_id: String,
    pub resource_id: Option<String>,
    pub plan_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl NewTaskItem {
    pub(crate) fn into_item(self, id: u64) -> TaskItem {
        TaskItem {
            id,
            user_id: self.user_id,
            task_id: self.task_id,
            resource_id: self.resource_id,
            plan_time: self.plan_time,
            begin_time: None,
            end_time: None,
            score: None,
            counted: false,
            create_date: self.created_at,
            update_date: self.created_at,
        }
    }
}

/// Parses a date or timestamp as accepted from callers.
///
/// Accepts RFC 3339 (`2025-03-03T08:00:00Z`), a naive timestamp
/// (`2025-03-03T08:00:00`, taken as UTC) or a plain date (`2025-03-03`, midnight UTC).
pub fn parse_datetime(field: &'static str, value: &str) -> Result<DateTime<Utc>, Error> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }
    Err(Error::InvalidDate { field, value: value.to_string() })
}
