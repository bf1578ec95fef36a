//! Intermediate representation shared by all converters.
//!
//! A converter fills a tree of [`Notebook`]s holding [`Note`]s. Notes keep
//! the raw inline text of every attachment ([`Resource`]) and cross-note
//! reference ([`NoteLink`]) so an exporter can substitute them later.
//! Link targets stay unresolved here; see [`index`] for the second phase.

pub mod index;
mod models;

pub use index::{collect_note_links, fold_tags, join_tag_ids, NoteIndex};
pub use models::*;
