//! Clipto backup import implementation

use std::fs;
use std::path::Path;

use log::debug;
use serde::Deserialize;

use crate::common::iso_to_unix_ms;
use crate::converter::{has_extension, Conversion, Converter};
use crate::error::Result;
use crate::intermediate::{Note, SourceApplication, Tag};

/// Top level of a clipto backup file
#[derive(Debug, Deserialize)]
struct CliptoBackup {
    #[serde(default)]
    filters: Vec<CliptoFilter>,
    #[serde(default)]
    notes: Vec<CliptoNote>,
}

/// A filter doubles as a tag definition
#[derive(Debug, Deserialize)]
struct CliptoFilter {
    uid: String,
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliptoNote {
    #[serde(default)]
    title: String,
    #[serde(default)]
    text: String,
    created: Option<String>,
    updated: Option<String>,
    #[serde(default)]
    tag_ids: Vec<String>,
}

/// Clipto has nothing configurable
pub struct CliptoConverter;

impl Converter for CliptoConverter {
    fn source_application(&self) -> SourceApplication {
        SourceApplication::Clipto
    }

    fn accepts(&self, input: &Path) -> bool {
        has_extension(input, "json")
    }

    fn convert(&mut self, input: &Path) -> Result<Conversion> {
        let content = fs::read_to_string(input)?;
        convert_backup(&content)
    }
}

/// Convert the JSON text of a backup.
///
/// Notes keep their tag references in `tag_ids`; the filter list comes back
/// as unattached tags to be joined by identifier.
pub fn convert_backup(content: &str) -> Result<Conversion> {
    let backup: CliptoBackup = serde_json::from_str(content)?;

    let tags = backup
        .filters
        .into_iter()
        .map(|filter| Tag::with_identifier(filter.name, filter.uid))
        .collect();

    let notes = backup
        .notes
        .into_iter()
        .map(|clip| {
            debug!("new note: {}", clip.title);
            Note {
                user_created_time: clip.created.as_deref().and_then(iso_to_unix_ms),
                user_updated_time: clip.updated.as_deref().and_then(iso_to_unix_ms),
                tag_ids: clip.tag_ids,
                ..Note::new(clip.title, clip.text, SourceApplication::Clipto)
            }
        })
        .collect();

    Ok(Conversion {
        notebooks: Vec::new(),
        notes,
        tags,
    })
}
