//! Task creation and progress tracking.
//!
//! `task_num` is fixed when a task is created from the length of its expansion.
//! `finished_task_num` is bumped once per item, the first time that item gets a score.
//! Clearing, changing or re-setting a score later leaves the counter alone, and so does
//! deleting an item.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::models::{parse_datetime, CycleType, NewTaskItem, Task, TaskItem, TaskStatus, TaskType};
use crate::recurrence::{expand, Cycle};
use crate::storage::Store;

/// Task creation input as received from a presentation layer.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct TaskDraft {
    pub task_type: Option<String>,
    /// Defaults to `once`.
    pub cycle_type: Option<String>,
    pub week_days: Option<String>,
    pub task_plan_date: Option<String>,
    pub task_finish_date: Option<String>,
    /// Defaults to `pending`.
    pub task_status: Option<String>,
    pub resource_id: Option<String>,
}

/// A validated [`TaskDraft`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub task_type: TaskType,
    pub task_status: TaskStatus,
    pub resource_id: Option<String>,
    pub cycle: Cycle,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl TaskDraft {
    /// Checks every field. Nothing is written when this fails.
    pub fn validate(&self) -> Result<NewTask> {
        let task_type: TaskType = non_empty(&self.task_type)
            .ok_or(Error::MissingField("task_type"))?
            .parse()?;
        let plan_date = non_empty(&self.task_plan_date).ok_or(Error::MissingField("task_plan_date"))?;
        let start = parse_datetime("task_plan_date", plan_date)?;
        let end = non_empty(&self.task_finish_date)
            .map(|s| parse_datetime("task_finish_date", s))
            .transpose()?;
        if let Some(end) = end {
            if end.date_naive() < start.date_naive() {
                return Err(Error::EndBeforeStart { start: start.to_rfc3339(), end: end.to_rfc3339() });
            }
        }

        let cycle_type = match non_empty(&self.cycle_type) {
            Some(s) => s.parse()?,
            None => CycleType::Once,
        };
        let task_status = match non_empty(&self.task_status) {
            Some(s) => s.parse()?,
            None => TaskStatus::Pending,
        };

        // An empty or unparsable list is accepted and simply expands to nothing.
        let week_days = match cycle_type {
            CycleType::Weekly => Some(self.week_days.clone().ok_or(Error::MissingField("week_days"))?),
            _ => None,
        };

        Ok(NewTask {
            task_type,
            task_status,
            resource_id: non_empty(&self.resource_id).map(str::to_string),
            cycle: Cycle { cycle_type, week_days, start, end },
        })
    }
}

/// Creates a task for `user_id` together with every item its cycle expands to.
///
/// The task and its items are committed in one unit of work: on failure neither exists.
pub fn create_task(store: &dyn Store, user_id: &str, draft: &TaskDraft, now: DateTime<Utc>) -> Result<Task> {
    let new = draft.validate()?;
    let dates = expand(&new.cycle, now);
    debug!(cycle = %new.cycle.cycle_type, occurrences = dates.len(), "expanded cycle");
    if dates.is_empty() {
        warn!(cycle = %new.cycle.cycle_type, week_days = ?new.cycle.week_days, "cycle has no occurrences");
    }

    let task = Task {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        resource_id: new.resource_id,
        task_type: new.task_type,
        cycle_type: new.cycle.cycle_type,
        week_days: new.cycle.week_days,
        task_plan_date: new.cycle.start,
        task_finish_date: new.cycle.end,
        task_num: dates.len() as u32,
        finished_task_num: 0,
        task_status: new.task_status,
        create_date: now,
        update_date: now,
    };

    let items = dates
        .into_iter()
        .map(|plan_time| NewTaskItem {
            user_id: task.user_id.clone(),
            task_id: task.id.clone(),
            resource_id: task.resource_id.clone(),
            plan_time,
            created_at: now,
        })
        .collect();

    store.create_task_with_items(task.clone(), items)?;
    info!(task_id = %task.id, user_id, task_num = task.task_num, "task created");
    Ok(task)
}

/// Changes to apply to a task item. `None` leaves a field untouched,
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPatch {
    pub resource_id: Option<Option<String>>,
    pub begin_time: Option<Option<DateTime<Utc>>>,
    pub end_time: Option<Option<DateTime<Utc>>>,
    pub score: Option<Option<f64>>,
}

impl ItemPatch {
    pub fn score(score: f64) -> ItemPatch {
        ItemPatch { score: Some(Some(score)), ..ItemPatch::default() }
    }
}

/// Applies `patch` to one of `user_id`'s items.
///
/// The first time an item receives a score, the parent task's `finished_task_num`
/// goes up by one in the same unit of work.
pub fn update_item(store: &dyn Store, user_id: &str, item_id: u64, patch: ItemPatch, now: DateTime<Utc>) -> Result<TaskItem> {
    if let Some(Some(score)) = patch.score {
        if !score.is_finite() {
            return Err(Error::InvalidScore(score));
        }
    }

    let mut tx = store.begin()?;
    let mut item = tx
        .item(item_id)?
        .filter(|i| i.user_id == user_id)
        .ok_or_else(|| Error::item_not_found(item_id))?;

    if let Some(resource_id) = patch.resource_id {
        item.resource_id = resource_id;
    }
    if let Some(begin_time) = patch.begin_time {
        item.begin_time = begin_time;
    }
    if let Some(end_time) = patch.end_time {
        item.end_time = end_time;
    }
    if let Some(score) = patch.score {
        item.score = score;
    }
    item.update_date = now;

    if item.is_scored() && !item.counted {
        item.counted = true;
        if !tx.increment_finished_count(&item.task_id)? {
            return Err(Error::task_not_found(item.task_id.clone()));
        }
        debug!(task_id = %item.task_id, item_id, "finished count incremented");
    }
    if !tx.update_item(&item)? {
        return Err(Error::item_not_found(item_id));
    }
    tx.commit()?;
    info!(item_id, score = ?item.score, "task item updated");
    Ok(item)
}

/// Records a score for one of `user_id`'s items.
pub fn score_item(store: &dyn Store, user_id: &str, item_id: u64, score: f64, now: DateTime<Utc>) -> Result<TaskItem> {
    update_item(store, user_id, item_id, ItemPatch::score(score), now)
}
