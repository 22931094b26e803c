//! # practask
//!
//! Practice-task scheduling for a language-learning backend.
//!
//! A task describes a recurring (`daily`, `weekly`) or one-off (`once`) practice
//! assignment. When it is created, its cycle is expanded into concrete dated
//! task items, and the task keeps two progress counters:
//!
//! *   `task_num`: how many items the expansion produced.
//! *   `finished_task_num`: how many of them have been scored.
//!
//! The crate is split into:
//!
//! *   [`recurrence`]: the pure cycle expander.
//! *   [`tracker`]: task creation and item scoring with counter bookkeeping.
//! *   [`tasks`]: user-scoped queries, edits and deletion.
//! *   [`storage`]: the transactional store (a JSON document on disk).
//! *   [`commands`] and [`tui`]: the `practask` command line and terminal UI.

pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod recurrence;
pub mod storage;
pub mod tasks;
pub mod tracker;
pub mod tui;

pub use error::{Error, Result};
