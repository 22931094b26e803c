//! Queries and edits on tasks and task items, always scoped to one user.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::{Error, Result};
use crate::models::{Task, TaskItem, TaskStatus, TaskType};
use crate::storage::Store;

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: usize,
    pub per_page: usize,
}

impl Default for Page {
    fn default() -> Self {
        Page { page: 1, per_page: 10 }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub pages: usize,
    pub current_page: usize,
}

fn paginate<T>(all: Vec<T>, page: Page) -> Paged<T> {
    let per_page = page.per_page.max(1);
    let current_page = page.page.max(1);
    let total = all.len();
    let items = all
        .into_iter()
        .skip((current_page - 1).saturating_mul(per_page))
        .take(per_page)
        .collect();
    Paged { items, total, pages: total.div_ceil(per_page), current_page }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub task_type: Option<TaskType>,
}

/// Explicit edits to a task. Items and progress counters are never touched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub task_type: Option<TaskType>,
    pub task_status: Option<TaskStatus>,
    pub resource_id: Option<Option<String>>,
    pub task_plan_date: Option<DateTime<Utc>>,
    pub task_finish_date: Option<Option<DateTime<Utc>>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskStats {
    pub total: usize,
    pub by_status: Vec<(TaskStatus, usize)>,
    pub by_type: Vec<(TaskType, usize)>,
}

pub fn get_task(store: &dyn Store, user_id: &str, task_id: &str) -> Result<Task> {
    store
        .snapshot()?
        .task(task_id)
        .filter(|t| t.user_id == user_id)
        .cloned()
        .ok_or_else(|| Error::task_not_found(task_id))
}

/// Lists the user's tasks, newest first.
pub fn list_tasks(store: &dyn Store, user_id: &str, filter: TaskFilter, page: Page) -> Result<Paged<Task>> {
    let mut tasks: Vec<Task> = store
        .snapshot()?
        .tasks
        .into_iter()
        .filter(|t| t.user_id == user_id)
        .filter(|t| filter.status.map_or(true, |s| t.task_status == s))
        .filter(|t| filter.task_type.map_or(true, |ty| t.task_type == ty))
        .collect();
    tasks.sort_by(|a, b| b.create_date.cmp(&a.create_date));
    Ok(paginate(tasks, page))
}

pub fn update_task(store: &dyn Store, user_id: &str, task_id: &str, patch: TaskPatch, now: DateTime<Utc>) -> Result<Task> {
    let mut tx = store.begin()?;
    let mut task = tx
        .task(task_id)?
        .filter(|t| t.user_id == user_id)
        .ok_or_else(|| Error::task_not_found(task_id))?;

    if let Some(task_type) = patch.task_type {
        task.task_type = task_type;
    }
    if let Some(status) = patch.task_status {
        task.task_status = status;
        if status == TaskStatus::Completed && task.task_finish_date.is_none() {
            task.task_finish_date = Some(now);
        }
    }
    if let Some(resource_id) = patch.resource_id {
        task.resource_id = resource_id;
    }
    if let Some(plan_date) = patch.task_plan_date {
        task.task_plan_date = plan_date;
    }
    if let Some(finish_date) = patch.task_finish_date {
        task.task_finish_date = finish_date;
    }
    task.update_date = now;

    tx.update_task(&task)?;
    tx.commit()?;
    info!(task_id, status = %task.task_status, "task updated");
    Ok(task)
}

/// Deletes a task and, with it, all of its items.
pub fn delete_task(store: &dyn Store, user_id: &str, task_id: &str) -> Result<()> {
    delete_tasks(store, user_id, &[task_id.to_string()]).map(|_| ())
}

/// Deletes every listed task owned by the user and returns how many were removed.
///
/// Fails with not-found when none of the ids match.
pub fn delete_tasks(store: &dyn Store, user_id: &str, task_ids: &[String]) -> Result<usize> {
    let mut tx = store.begin()?;
    let mut deleted = 0;
    for id in task_ids {
        if tx.task(id)?.is_some_and(|t| t.user_id == user_id) && tx.delete_task(id)? {
            deleted += 1;
        }
    }
    if deleted == 0 {
        return Err(Error::task_not_found(task_ids.join(", ")));
    }
    tx.commit()?;
    info!(deleted, "tasks deleted");
    Ok(deleted)
}

pub fn task_stats(store: &dyn Store, user_id: &str) -> Result<TaskStats> {
    let db = store.snapshot()?;
    let tasks: Vec<&Task> = db.tasks.iter().filter(|t| t.user_id == user_id).collect();
    Ok(TaskStats {
        total: tasks.len(),
        by_status: TaskStatus::ALL
            .iter()
            .map(|s| (*s, tasks.iter().filter(|t| t.task_status == *s).count()))
            .collect(),
        by_type: TaskType::ALL
            .iter()
            .map(|ty| (*ty, tasks.iter().filter(|t| t.task_type == *ty).count()))
            .collect(),
    })
}

pub fn get_item(store: &dyn Store, user_id: &str, item_id: u64) -> Result<TaskItem> {
    store
        .snapshot()?
        .item(item_id)
        .filter(|i| i.user_id == user_id)
        .cloned()
        .ok_or_else(|| Error::item_not_found(item_id))
}

/// Lists the user's items, newest first, optionally for one task only.
pub fn list_items(store: &dyn Store, user_id: &str, task_id: Option<&str>, page: Page) -> Result<Paged<TaskItem>> {
    let mut items: Vec<TaskItem> = store
        .snapshot()?
        .task_items
        .into_iter()
        .filter(|i| i.user_id == user_id)
        .filter(|i| task_id.map_or(true, |id| i.task_id == id))
        .collect();
    items.sort_by(|a, b| b.create_date.cmp(&a.create_date).then(a.id.cmp(&b.id)));
    Ok(paginate(items, page))
}

/// Returns a task together with a page of its items in plan order.
pub fn task_items(store: &dyn Store, user_id: &str, task_id: &str, page: Page) -> Result<(Task, Paged<TaskItem>)> {
    let db = store.snapshot()?;
    let task = db
        .task(task_id)
        .filter(|t| t.user_id == user_id)
        .cloned()
        .ok_or_else(|| Error::task_not_found(task_id))?;
    let mut items: Vec<TaskItem> = db.items_of(task_id).filter(|i| i.user_id == user_id).cloned().collect();
    items.sort_by(|a, b| a.plan_time.cmp(&b.plan_time));
    Ok((task, paginate(items, page)))
}

/// Items planned on or before the UTC calendar day of `now` that have neither an
/// end time nor a score, latest plan first.
pub fn uncompleted_items(store: &dyn Store, user_id: &str, now: DateTime<Utc>) -> Result<Vec<TaskItem>> {
    let today = now.date_naive();
    let mut items: Vec<TaskItem> = store
        .snapshot()?
        .task_items
        .into_iter()
        .filter(|i| i.user_id == user_id)
        .filter(|i| i.end_time.is_none() && i.score.is_none())
        .filter(|i| i.plan_time.date_naive() <= today)
        .collect();
    items.sort_by(|a, b| b.plan_time.cmp(&a.plan_time));
    Ok(items)
}

/// Deletes one item. The parent's `task_num` and `finished_task_num` are left as they are.
pub fn delete_item(store: &dyn Store, user_id: &str, item_id: u64) -> Result<()> {
    let mut tx = store.begin()?;
    if !tx.item(item_id)?.is_some_and(|i| i.user_id == user_id) {
        return Err(Error::item_not_found(item_id));
    }
    tx.delete_item(item_id)?;
    tx.commit()?;
    info!(item_id, "task item deleted");
    Ok(())
}
