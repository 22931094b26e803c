use chrono::Utc;
use ratatui::widgets::TableState;

use crate::models::{Task, TaskItem};
use crate::storage::Store;
use crate::tasks::{self, Page, TaskFilter, TaskPatch};
use crate::tracker;

#[derive(PartialEq)]
pub enum InputMode {
    Normal,
    Scoring,
}

#[derive(PartialEq)]
pub enum ViewMode {
    Tasks,
    /// Items of the task with this id.
    Items(String),
    Due,
}

/// Enough for every item a task without an end date can have.
const ALL: Page = Page { page: 1, per_page: usize::MAX };

pub struct App<'a> {
    store: &'a dyn Store,
    user_id: String,
    pub tasks: Vec<Task>,
    pub items: Vec<TaskItem>,
    pub state: TableState,
    pub item_state: TableState,
    pub view_mode: ViewMode,
    pub input_mode: InputMode,
    pub input_buffer: String,
    /// Last error or confirmation, shown in the help bar.
    pub message: Option<String>,
}

impl<'a> App<'a> {
    /// Creates a new App instance and loads initial data.
    pub fn new(store: &'a dyn Store, user_id: &str) -> App<'a> {
        let mut app = App {
            store,
            user_id: user_id.to_string(),
            tasks: Vec::new(),
            items: Vec::new(),
            state: TableState::default(),
            item_state: TableState::default(),
            view_mode: ViewMode::Tasks,
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
            message: None,
        };
        app.reload();
        app
    }

    fn report<T>(&mut self, result: crate::Result<T>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                self.message = Some(e.to_string());
                None
            }
        }
    }

    fn current_len(&self) -> usize {
        match self.view_mode {
            ViewMode::Tasks => self.tasks.len(),
            _ => self.items.len(),
        }
    }

    fn current_state(&mut self) -> &mut TableState {
        match self.view_mode {
            ViewMode::Tasks => &mut self.state,
            _ => &mut self.item_state,
        }
    }

    /// Selects the next row in the current list.
    pub fn next(&mut self) {
        let len = self.current_len();
        if len == 0 { return; }
        let state = self.current_state();
        let i = match state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        state.select(Some(i));
    }

    /// Selects the previous row in the current list.
    pub fn previous(&mut self) {
        let len = self.current_len();
        if len == 0 { return; }
        let state = self.current_state();
        let i = match state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        state.select(Some(i));
    }

    fn selected_task(&self) -> Option<&Task> {
        self.state.selected().and_then(|i| self.tasks.get(i))
    }

    fn selected_item(&self) -> Option<&TaskItem> {
        self.item_state.selected().and_then(|i| self.items.get(i))
    }

    /// Reloads tasks and items from storage.
    pub fn reload(&mut self) {
        let listed = tasks::list_tasks(self.store, &self.user_id, TaskFilter::default(), ALL);
        if let Some(paged) = self.report(listed) {
            self.tasks = paged.items;
        }
        clamp(&mut self.state, self.tasks.len());

        let items = match &self.view_mode {
            ViewMode::Tasks => Ok(Vec::new()),
            ViewMode::Items(task_id) => {
                tasks::task_items(self.store, &self.user_id, task_id, ALL).map(|(_, paged)| paged.items)
            }
            ViewMode::Due => tasks::uncompleted_items(self.store, &self.user_id, Utc::now()),
        };
        if let Some(items) = self.report(items) {
            self.items = items;
        }
        clamp(&mut self.item_state, self.items.len());
    }

    /// Opens the items of the selected task.
    pub fn open_selected(&mut self) {
        if self.view_mode != ViewMode::Tasks { return; }
        if let Some(id) = self.selected_task().map(|t| t.id.clone()) {
            self.view_mode = ViewMode::Items(id);
            self.item_state.select(None);
            self.reload();
        }
    }

    /// Goes back to the task list.
    pub fn back(&mut self) {
        self.view_mode = ViewMode::Tasks;
        self.items.clear();
        self.reload();
    }

    /// Switches between the task list and the items due today.
    pub fn toggle_due(&mut self) {
        self.view_mode = match self.view_mode {
            ViewMode::Due => ViewMode::Tasks,
            _ => ViewMode::Due,
        };
        self.item_state.select(None);
        self.reload();
    }

    /// Advances the selected task to its next status.
    pub fn cycle_status(&mut self) {
        if self.view_mode != ViewMode::Tasks { return; }
        let Some(task) = self.selected_task() else { return };
        let (id, status) = (task.id.clone(), task.task_status.next());
        let patch = TaskPatch { task_status: Some(status), ..TaskPatch::default() };
        let result = tasks::update_task(self.store, &self.user_id, &id, patch, Utc::now());
        if self.report(result).is_some() {
            self.message = Some(format!("Status set to {}", status));
        }
        self.reload();
    }

    /// Deletes the selected task, or the selected item in an item view.
    pub fn delete_selected(&mut self) {
        let result = match self.view_mode {
            ViewMode::Tasks => match self.selected_task() {
                Some(t) => tasks::delete_task(self.store, &self.user_id, &t.id),
                None => return,
            },
            _ => match self.selected_item() {
                Some(i) => tasks::delete_item(self.store, &self.user_id, i.id),
                None => return,
            },
        };
        self.report(result);
        self.reload();
    }

    /// Stamps the selected item's begin time with the current time.
    pub fn begin_selected(&mut self) {
        let Some(id) = self.selected_item().map(|i| i.id) else { return };
        let patch = tracker::ItemPatch { begin_time: Some(Some(Utc::now())), ..Default::default() };
        let result = tracker::update_item(self.store, &self.user_id, id, patch, Utc::now());
        self.report(result);
        self.reload();
    }

    /// Opens the score popup for the selected item.
    pub fn start_scoring(&mut self) {
        if self.selected_item().is_some() {
            self.input_mode = InputMode::Scoring;
            self.input_buffer.clear();
        }
    }

    pub fn cancel_input(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input_buffer.clear();
    }

    /// Submits the score popup.
    pub fn handle_input(&mut self) {
        let Some(id) = self.selected_item().map(|i| i.id) else {
            self.cancel_input();
            return;
        };
        match self.input_buffer.trim().parse::<f64>() {
            Ok(score) => {
                let result = tracker::score_item(self.store, &self.user_id, id, score, Utc::now());
                if self.report(result).is_some() {
                    self.message = Some(format!("Item {} scored {:.1}", id, score));
                }
            }
            Err(_) => self.message = Some(format!("'{}' is not a number", self.input_buffer)),
        }
        self.cancel_input();
        self.reload();
    }

    /// Title of the current view.
    pub fn title(&self) -> String {
        match &self.view_mode {
            ViewMode::Tasks => "practask - Tasks".to_string(),
            ViewMode::Items(id) => match self.tasks.iter().find(|t| &t.id == id) {
                Some(t) => format!("practask - {} {} ({})", t.cycle_type, t.task_type, crate::commands::fmt_progress(t)),
                None => "practask - Items".to_string(),
            },
            ViewMode::Due => "practask - Due".to_string(),
        }
    }
}

fn clamp(state: &mut TableState, len: usize) {
    if len == 0 {
        state.select(None);
    } else if let Some(i) = state.selected() {
        if i >= len {
            state.select(Some(len - 1));
        }
    } else {
        state.select(Some(0));
    }
}
