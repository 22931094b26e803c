use std::io::{self, Write};

use chrono::{DateTime, Utc};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::error::{Error, Result};
use crate::models::{Task, TaskItem, TaskStatus};
use crate::storage::{JsonStore, Store};
use crate::tasks::{self, Page, TaskFilter, TaskPatch};
use crate::tracker::{self, ItemPatch, TaskDraft};

fn fmt_time(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%d %H:%M").to_string()
}

fn fmt_opt_time(t: Option<DateTime<Utc>>) -> String {
    t.map(fmt_time).unwrap_or_else(|| "-".into())
}

fn header(cells: &[&str]) -> Vec<Cell> {
    cells.iter().map(|c| Cell::new(c).add_attribute(Attribute::Bold)).collect()
}

fn status_color(status: TaskStatus) -> Color {
    match status {
        TaskStatus::Pending => Color::Yellow,
        TaskStatus::InProgress => Color::Cyan,
        TaskStatus::Completed => Color::Green,
        TaskStatus::Cancelled => Color::Grey,
    }
}

/// Renders task progress as `done/total (pct%)`.
pub fn fmt_progress(task: &Task) -> String {
    format!("{}/{} ({:.0}%)", task.finished_task_num, task.task_num, task.progress() * 100.0)
}

fn print_tasks(tasks: &[Task]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(&["ID", "Type", "Cycle", "Days", "Start", "End", "Progress", "Status"]));
    for t in tasks {
        table.add_row(vec![
            Cell::new(&t.id),
            Cell::new(t.task_type),
            Cell::new(t.cycle_type),
            Cell::new(t.week_days.clone().unwrap_or_else(|| "-".into())),
            Cell::new(t.task_plan_date.date_naive()),
            Cell::new(t.task_finish_date.map(|d| d.date_naive().to_string()).unwrap_or_else(|| "-".into())),
            Cell::new(fmt_progress(t)),
            Cell::new(t.task_status).fg(status_color(t.task_status)),
        ]);
    }
    println!("{table}");
}

fn print_items(items: &[TaskItem]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(&["ID", "Task", "Planned", "Begin", "End", "Score"]));
    for i in items {
        let score = match i.score {
            Some(s) => Cell::new(format!("{:.1}", s)).fg(Color::Green),
            None => Cell::new("-").fg(Color::Yellow),
        };
        table.add_row(vec![
            Cell::new(i.id),
            Cell::new(&i.task_id),
            Cell::new(fmt_time(i.plan_time)),
            Cell::new(fmt_opt_time(i.begin_time)),
            Cell::new(fmt_opt_time(i.end_time)),
            score,
        ]);
    }
    println!("{table}");
}

fn print_page_footer(total: usize, current_page: usize, pages: usize) {
    println!("{} total, page {} of {}", total, current_page, pages.max(1));
}

/// Creates a task and all of its scheduled items.
pub fn cmd_add(store: &dyn Store, user_id: &str, draft: TaskDraft, silent: bool) -> Result<Task> {
    let task = tracker::create_task(store, user_id, &draft, Utc::now())?;
    if !silent {
        println!("Task added (id = {}, {} items scheduled)", task.id, task.task_num);
    }
    Ok(task)
}

/// Lists the user's tasks, newest first.
pub fn cmd_list(store: &dyn Store, user_id: &str, filter: TaskFilter, page: Page) -> Result<()> {
    let paged = tasks::list_tasks(store, user_id, filter, page)?;
    if paged.items.is_empty() {
        println!("No tasks found.");
        return Ok(());
    }
    print_tasks(&paged.items);
    print_page_footer(paged.total, paged.current_page, paged.pages);
    Ok(())
}

/// Shows one task followed by a page of its items in plan order.
pub fn cmd_show(store: &dyn Store, user_id: &str, task_id: &str, page: Page) -> Result<()> {
    let (task, items) = tasks::task_items(store, user_id, task_id, page)?;
    print_tasks(std::slice::from_ref(&task));
    if let Some(resource) = &task.resource_id {
        println!("Resource: {}", resource);
    }
    if items.items.is_empty() {
        println!("No items scheduled.");
        return Ok(());
    }
    print_items(&items.items);
    print_page_footer(items.total, items.current_page, items.pages);
    Ok(())
}

/// Edits an existing task's details.
pub fn cmd_edit(store: &dyn Store, user_id: &str, task_id: &str, patch: TaskPatch, silent: bool) -> Result<Task> {
    let task = tasks::update_task(store, user_id, task_id, patch, Utc::now())?;
    if !silent {
        println!("Task {} updated.", task.id);
    }
    Ok(task)
}

/// Removes one or more tasks together with their items.
pub fn cmd_remove(store: &dyn Store, user_id: &str, task_ids: &[String], silent: bool) -> Result<usize> {
    let deleted = tasks::delete_tasks(store, user_id, task_ids)?;
    if !silent {
        println!("{} task(s) removed.", deleted);
    }
    Ok(deleted)
}

/// Prints task counts per status and per type.
pub fn cmd_stats(store: &dyn Store, user_id: &str) -> Result<()> {
    let stats = tasks::task_stats(store, user_id)?;
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header(&["", "Count"]));
    table.add_row(vec![Cell::new("total").add_attribute(Attribute::Bold), Cell::new(stats.total)]);
    for (status, n) in &stats.by_status {
        table.add_row(vec![Cell::new(status).fg(status_color(*status)), Cell::new(n)]);
    }
    for (task_type, n) in &stats.by_type {
        table.add_row(vec![Cell::new(task_type), Cell::new(n)]);
    }
    println!("{table}");
    Ok(())
}

/// Lists the user's items, optionally restricted to one task.
pub fn cmd_items(store: &dyn Store, user_id: &str, task_id: Option<&str>, page: Page) -> Result<()> {
    let paged = tasks::list_items(store, user_id, task_id, page)?;
    if paged.items.is_empty() {
        println!("No items found.");
        return Ok(());
    }
    print_items(&paged.items);
    print_page_footer(paged.total, paged.current_page, paged.pages);
    Ok(())
}

/// Lists items that are due today or overdue and not yet done.
pub fn cmd_due(store: &dyn Store, user_id: &str) -> Result<()> {
    let items = tasks::uncompleted_items(store, user_id, Utc::now())?;
    if items.is_empty() {
        println!("Nothing due. Well done!");
        return Ok(());
    }
    print_items(&items);
    println!("{} item(s) due", items.len());
    Ok(())
}

/// Records a score for an item.
pub fn cmd_score(store: &dyn Store, user_id: &str, item_id: u64, score: f64, silent: bool) -> Result<TaskItem> {
    let item = tracker::score_item(store, user_id, item_id, score, Utc::now())?;
    if !silent {
        let task = tasks::get_task(store, user_id, &item.task_id)?;
        println!("Item {} scored {:.1}. Task progress: {}", item.id, score, fmt_progress(&task));
    }
    Ok(item)
}

/// Applies arbitrary changes to an item.
pub fn cmd_update_item(store: &dyn Store, user_id: &str, item_id: u64, patch: ItemPatch, silent: bool) -> Result<TaskItem> {
    let item = tracker::update_item(store, user_id, item_id, patch, Utc::now())?;
    if !silent {
        println!("Item {} updated.", item.id);
    }
    Ok(item)
}

/// Removes a single item.
pub fn cmd_remove_item(store: &dyn Store, user_id: &str, item_id: u64, silent: bool) -> Result<()> {
    tasks::delete_item(store, user_id, item_id)?;
    if !silent {
        println!("Item {} removed.", item_id);
    }
    Ok(())
}

/// Resets the database by deleting all tasks and items.
pub fn cmd_reset(store: &JsonStore, force: bool) -> Result<()> {
    if !force {
        print!("Are you sure you want to delete all tasks and items? This cannot be undone. [y/N] ");
        io::stdout().flush().map_err(Error::Terminal)?;
        let mut input = String::new();
        io::stdin().read_line(&mut input).map_err(Error::Terminal)?;
        if input.trim().to_lowercase() != "y" {
            println!("Aborted.");
            return Ok(());
        }
    }

    store.reset()?;
    println!("Database reset successfully.");
    Ok(())
}

/// Runs the interactive browser until the user quits.
pub fn cmd_ui(store: &dyn Store, user_id: &str) -> Result<()> {
    crate::tui::run_tui(store, user_id).map_err(Error::Terminal)
}
