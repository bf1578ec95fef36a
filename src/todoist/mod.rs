//! Todoist import module
//!
//! Handles Todoist project CSV exports. Sections become notebooks, tasks
//! become todo notes with labels and priority as tags.

mod import;

pub use import::*;
