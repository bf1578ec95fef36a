//! Normalize note-taking and task app exports into one notebook tree.
//!
//! Each source format has a [`Converter`] that builds an
//! [`intermediate`] fragment: notebooks, notes, tags, attachments and
//! unresolved links to other notes. Fragments from several inputs share a
//! single root; resolving links across them is left to the exporter.

pub mod cherrytree;
pub mod clipto;
pub mod common;
pub mod config;
pub mod converter;
pub mod error;
pub mod intermediate;
pub mod obsidian;
pub mod todoist;

pub use config::ConvertConfig;
pub use converter::{convert_into, converter_for, Conversion, Converter};
pub use error::{ImportError, Result};
pub use intermediate::{Note, NoteLink, Notebook, Resource, SourceApplication, Tag};
