//! # practask
//!
//! Schedule and track language practice from the terminal. A task such as
//! "review the dictation resource every Monday, Wednesday and Friday" is expanded
//! up front into dated task items; scoring an item advances the task's progress.
//!
//! ## Usage
//!
//! ### Interactive Mode (TUI)
//!
//! ```bash
//! practask
//! # or explicitly
//! practask ui
//! ```
//!
//! ### Command Line Interface (CLI)
//!
//! **Adding Tasks**
//! ```bash
//! # Daily practice for 30 days (no end date)
//! practask add practice --cycle daily --start 2025-03-03
//!
//! # Weekly review on Mon/Wed/Fri until the end of March
//! practask add review --cycle weekly --days 0,2,4 --start 2025-03-03 --end 2025-03-31
//!
//! # One-off exam bound to a resource
//! practask add exam --start 2025-04-01 --resource lesson-12.mp3
//! ```
//!
//! Weekdays are numbered 0 (Monday) to 6 (Sunday). Without `--end`, daily tasks get
//! 30 items and weekly tasks 12 weeks of items.
//!
//! **Practising**
//! ```bash
//! practask due              # items planned up to today that are not done yet
//! practask score 42 87.5    # score item 42; bumps the task's progress
//! practask show <TASK-ID>   # task details and its items
//! ```
//!
//! ## Configuration
//!
//! `~/.config/practask/config.toml` (or `--config`) may set `db_path`, `user_id`
//! and `log_filter`. `PRACTASK_DB` / `PRACTASK_USER` and the `--db` / `--user` flags
//! override it. Logging goes to stderr and honours `RUST_LOG`.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::EnvFilter;

use practask::commands::*;
use practask::config::Config;
use practask::models::{parse_datetime, TaskStatus, TaskType};
use practask::storage::JsonStore;
use practask::tasks::{Page, TaskFilter, TaskPatch};
use practask::tracker::{ItemPatch, TaskDraft};

#[derive(Parser)]
#[command(name = "practask", version)]
#[command(about = "Language practice task scheduler", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Database file (overrides config and PRACTASK_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Act as this user (overrides config and PRACTASK_USER)
    #[arg(short, long, global = true)]
    user: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new task and schedule its items
    Add {
        /// Task type (practice, review, test, homework, exam)
        task_type: String,
        /// Cycle (once, daily, weekly)
        #[arg(short, long, default_value = "once")]
        cycle: String,
        /// Weekdays for weekly cycles, e.g. 0,2,4 (0 = Monday)
        #[arg(short, long)]
        days: Option<String>,
        /// Plan start date in YYYY-MM-DD or RFC 3339
        #[arg(short, long)]
        start: String,
        /// Plan end date in YYYY-MM-DD or RFC 3339
        #[arg(short, long)]
        end: Option<String>,
        /// Resource to practise with
        #[arg(short, long)]
        resource: Option<String>,
        /// Initial status
        #[arg(long)]
        status: Option<String>,
    },
    /// List tasks, newest first
    List {
        /// Only tasks with this status
        #[arg(short, long)]
        status: Option<TaskStatus>,
        /// Only tasks of this type
        #[arg(short = 't', long = "type")]
        task_type: Option<TaskType>,
        #[arg(short, long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = 10)]
        per_page: usize,
    },
    /// Show a task and its items
    Show {
        id: String,
        #[arg(short, long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = 50)]
        per_page: usize,
    },
    /// Edit a task (items are not rescheduled)
    Edit {
        id: String,
        /// New task type
        #[arg(short = 't', long = "type")]
        task_type: Option<TaskType>,
        /// New status; `completed` stamps the finish date if unset
        #[arg(short, long)]
        status: Option<TaskStatus>,
        /// New resource
        #[arg(short, long)]
        resource: Option<String>,
        /// Detach the resource
        #[arg(long, conflicts_with = "resource")]
        clear_resource: bool,
        /// New plan start date
        #[arg(long)]
        start: Option<String>,
        /// New plan end date
        #[arg(long)]
        end: Option<String>,
        /// Remove the plan end date
        #[arg(long, conflicts_with = "end")]
        clear_end: bool,
    },
    /// Remove one or more tasks and their items
    Remove {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Task counts per status and type
    Stats,
    /// List task items, newest first
    Items {
        /// Only items of this task
        #[arg(short, long)]
        task: Option<String>,
        #[arg(short, long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = 10)]
        per_page: usize,
    },
    /// Items planned up to today that are not done yet
    Due,
    /// Score a task item
    Score {
        id: u64,
        score: f64,
    },
    /// Update a task item
    UpdateItem {
        id: u64,
        /// Begin timestamp, or `now`
        #[arg(short, long)]
        begin: Option<String>,
        /// End timestamp, or `now`
        #[arg(short, long)]
        end: Option<String>,
        /// Score
        #[arg(short, long)]
        score: Option<f64>,
        /// Clear the score (progress is not rolled back)
        #[arg(long, conflicts_with = "score")]
        clear_score: bool,
        /// Resource
        #[arg(short, long)]
        resource: Option<String>,
    },
    /// Remove a single task item
    RemoveItem {
        id: u64,
    },
    /// Reset the database (delete all tasks and items)
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
    /// Open interactive TUI
    Ui,
}

fn parse_item_time(field: &'static str, value: Option<String>) -> practask::Result<Option<Option<chrono::DateTime<chrono::Utc>>>> {
    match value.as_deref() {
        None => Ok(None),
        Some("now") => Ok(Some(Some(chrono::Utc::now()))),
        Some(v) => Ok(Some(Some(parse_datetime(field, v)?))),
    }
}

fn run(cli: Cli, config: Config, store: &JsonStore) -> practask::Result<()> {
    let user = config.user_id.as_str();
    match cli.command {
        Some(Commands::Add { task_type, cycle, days, start, end, resource, status }) => {
            let draft = TaskDraft {
                task_type: Some(task_type),
                cycle_type: Some(cycle),
                week_days: days,
                task_plan_date: Some(start),
                task_finish_date: end,
                task_status: status,
                resource_id: resource,
            };
            cmd_add(store, user, draft, false).map(|_| ())
        }
        Some(Commands::List { status, task_type, page, per_page }) => {
            cmd_list(store, user, TaskFilter { status, task_type }, Page { page, per_page })
        }
        Some(Commands::Show { id, page, per_page }) => cmd_show(store, user, &id, Page { page, per_page }),
        Some(Commands::Edit { id, task_type, status, resource, clear_resource, start, end, clear_end }) => {
            let patch = TaskPatch {
                task_type,
                task_status: status,
                resource_id: if clear_resource { Some(None) } else { resource.map(Some) },
                task_plan_date: start.map(|s| parse_datetime("task_plan_date", &s)).transpose()?,
                task_finish_date: if clear_end {
                    Some(None)
                } else {
                    end.map(|s| parse_datetime("task_finish_date", &s).map(Some)).transpose()?
                },
            };
            cmd_edit(store, user, &id, patch, false).map(|_| ())
        }
        Some(Commands::Remove { ids }) => cmd_remove(store, user, &ids, false).map(|_| ()),
        Some(Commands::Stats) => cmd_stats(store, user),
        Some(Commands::Items { task, page, per_page }) => cmd_items(store, user, task.as_deref(), Page { page, per_page }),
        Some(Commands::Due) => cmd_due(store, user),
        Some(Commands::Score { id, score }) => cmd_score(store, user, id, score, false).map(|_| ()),
        Some(Commands::UpdateItem { id, begin, end, score, clear_score, resource }) => {
            let patch = ItemPatch {
                resource_id: resource.map(Some),
                begin_time: parse_item_time("begin_time", begin)?,
                end_time: parse_item_time("end_time", end)?,
                score: if clear_score { Some(None) } else { score.map(Some) },
            };
            cmd_update_item(store, user, id, patch, false).map(|_| ())
        }
        Some(Commands::RemoveItem { id }) => cmd_remove_item(store, user, id, false),
        Some(Commands::Reset { force }) => cmd_reset(store, force),
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "practask", &mut io::stdout());
            Ok(())
        }
        Some(Commands::Ui) | None => cmd_ui(store, user),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    if let Some(user) = &cli.user {
        config.user_id = user.clone();
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter)))
        .with_writer(io::stderr)
        .init();

    let store = match JsonStore::open(&config.db_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to open database {}: {}", config.db_path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    match run(cli, config, &store) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
