//! Converter contract and input detection.

use std::path::Path;

use log::info;

use crate::cherrytree::CherrytreeConverter;
use crate::clipto::CliptoConverter;
use crate::config::ConvertConfig;
use crate::error::{ImportError, Result};
use crate::intermediate::{Note, Notebook, SourceApplication, Tag};
use crate::obsidian::ObsidianConverter;
use crate::todoist::TodoistConverter;

/// Output of one converter run, not yet attached to any tree
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversion {
    pub notebooks: Vec<Notebook>,
    pub notes: Vec<Note>,
    /// Tags defined apart from any note, joined by identifier later
    pub tags: Vec<Tag>,
}

impl Conversion {
    /// Move the converted notebooks and notes into `parent`, returning the
    /// unattached tags.
    pub fn append_to(self, parent: &mut Notebook) -> Vec<Tag> {
        parent.child_notebooks.extend(self.notebooks);
        parent.child_notes.extend(self.notes);
        self.tags
    }

    pub fn note_count(&self) -> usize {
        self.notes.len() + self.notebooks.iter().map(Notebook::note_count).sum::<usize>()
    }
}

/// One source format.
///
/// `convert` reads `input` without modifying it and builds a detached
/// [`Conversion`]; nothing is attached to a tree until it succeeds.
pub trait Converter {
    fn source_application(&self) -> SourceApplication;

    fn accepts(&self, input: &Path) -> bool;

    fn convert(&mut self, input: &Path) -> Result<Conversion>;
}

/// Pick the converter for `input` by its shape.
pub fn converter_for(input: &Path, config: &ConvertConfig) -> Result<Box<dyn Converter>> {
    if !input.exists() {
        return Err(ImportError::NotFound(input.to_path_buf()));
    }
    let candidates: Vec<Box<dyn Converter>> = vec![
        Box::new(CliptoConverter),
        Box::new(ObsidianConverter::new(config.clone())),
        Box::new(TodoistConverter::new(config.clone())),
        Box::new(CherrytreeConverter::new(config.clone())),
    ];
    candidates
        .into_iter()
        .find(|c| c.accepts(input))
        .ok_or_else(|| ImportError::UnsupportedInput(input.to_path_buf()))
}

/// Run `converter` on `input` and append the result to `root`.
///
/// On error `root` is left untouched.
pub fn convert_into(
    converter: &mut dyn Converter,
    input: &Path,
    root: &mut Notebook,
) -> Result<Vec<Tag>> {
    let conversion = converter.convert(input)?;
    info!(
        "Converted {} from {}: {} notes, {} notebooks",
        input.display(),
        converter.source_application(),
        conversion.note_count(),
        conversion.notebooks.len()
    );
    Ok(conversion.append_to(root))
}

pub(crate) fn has_extension(input: &Path, extension: &str) -> bool {
    input.is_file()
        && input
            .extension()
            .is_some_and(|e| e.to_string_lossy().eq_ignore_ascii_case(extension))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_converter_for_detects_formats() {
        let dir = TempDir::new().unwrap();
        let config = ConvertConfig::default();
        for (name, expected) in [
            ("backup.json", SourceApplication::Clipto),
            ("project.csv", SourceApplication::Todoist),
            ("tree.ctd", SourceApplication::Cherrytree),
        ] {
            let path = dir.path().join(name);
            fs::write(&path, "").unwrap();
            let converter = converter_for(&path, &config).unwrap();
            assert_eq!(converter.source_application(), expected);
        }
        let converter = converter_for(dir.path(), &config).unwrap();
        assert_eq!(converter.source_application(), SourceApplication::Obsidian);
    }

    #[test]
    fn test_converter_for_rejects_unknown_and_missing() {
        let dir = TempDir::new().unwrap();
        let config = ConvertConfig::default();
        let path = dir.path().join("notes.docx");
        fs::write(&path, "").unwrap();

        assert!(matches!(
            converter_for(&path, &config),
            Err(ImportError::UnsupportedInput(_))
        ));
        assert!(matches!(
            converter_for(&dir.path().join("missing.csv"), &config),
            Err(ImportError::NotFound(_))
        ));
    }

    #[test]
    fn test_failed_conversion_leaves_root_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let mut root = Notebook::root();
        root.child_notebooks.push(Notebook::new("earlier"));
        let before = root.clone();

        let mut converter = converter_for(&path, &ConvertConfig::default()).unwrap();
        assert!(convert_into(converter.as_mut(), &path, &mut root).is_err());
        assert_eq!(root, before);
    }
}
