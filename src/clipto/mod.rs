//! Clipto import module
//!
//! Handles clipto backup files (JSON) exported from the Android app.
//! Tags live in a separate filter list and are referenced from notes by id.

mod import;

pub use import::*;
