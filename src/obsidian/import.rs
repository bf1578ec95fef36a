//! Obsidian vault import implementation
//!
//! Converts an Obsidian vault folder to a notebook tree.
//!
//! A page's `original_id` is its file stem, since that is what wikilinks
//! name. When several pages share a stem, the one nearest the vault root
//! keeps the stem (the first in traversal order on a tie) and the others
//! get their vault-relative path without `.md`, e.g. `Archive/Note`.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::common::{
    classify_destination, file_times_ms, find_file_recursively, markdown_links, strip_fragment,
    wikilink_links, InlineTagMatcher, LinkTarget,
};
use crate::config::ConvertConfig;
use crate::converter::{Conversion, Converter};
use crate::error::Result;
use crate::intermediate::{Note, NoteLink, Notebook, Resource, SourceApplication, Tag};

pub struct ObsidianConverter {
    config: ConvertConfig,
    tag_matcher: InlineTagMatcher,
}

impl ObsidianConverter {
    pub fn new(config: ConvertConfig) -> Self {
        let tag_matcher = InlineTagMatcher::new(&config.inline_tag_markers);
        Self {
            config,
            tag_matcher,
        }
    }

    /// Convert the contents of `folder` into `parent`.
    ///
    /// Entries are visited in file name order so repeated runs build the
    /// same tree.
    fn convert_folder(&self, folder: &Path, parent: &mut Notebook, root_folder: &Path) -> Result<()> {
        let mut entries: Vec<PathBuf> = fs::read_dir(folder)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<_>>()?;
        entries.sort();

        for path in entries {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();

            if path.is_dir() {
                if self.config.ignored_folders.iter().any(|ignored| *ignored == name) {
                    continue;
                }
                let times = file_times_ms(&path);
                let mut notebook = Notebook {
                    user_created_time: times.created,
                    user_updated_time: times.modified,
                    ..Notebook::new(name)
                };
                debug!("new notebook: {}, parent: {}", notebook.title, parent.title);
                self.convert_folder(&path, &mut notebook, root_folder)?;
                parent.child_notebooks.push(notebook);
            } else if is_markdown(&path) {
                if let Some(note) = self.convert_note(&path, root_folder) {
                    debug!("new note: {}, parent: {}", note.title, parent.title);
                    parent.child_notes.push(note);
                }
            }
        }
        Ok(())
    }

    fn convert_note(&self, path: &Path, root_folder: &Path) -> Option<Note> {
        let body = match fs::read_to_string(path) {
            Ok(body) => body,
            Err(e) => {
                warn!("Skipping unreadable page {}: {}", path.display(), e);
                return None;
            }
        };
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "Untitled".to_string());

        let (mut resources, mut note_links) = wikilink_references(&body, root_folder);
        let (markdown_resources, markdown_note_links) = markdown_references(&body, root_folder);
        resources.extend(markdown_resources);
        note_links.extend(markdown_note_links);

        let tags = self
            .tag_matcher
            .tags(&body)
            .into_iter()
            .map(|tag| Tag::with_identifier(tag.clone(), tag))
            .collect();

        let times = file_times_ms(path);
        Some(Note {
            user_created_time: times.created,
            user_updated_time: times.modified,
            original_id: Some(relative_page_path(path, root_folder)),
            tags,
            resources,
            note_links,
            ..Note::new(title, body, SourceApplication::Obsidian)
        })
    }
}

impl Converter for ObsidianConverter {
    fn source_application(&self) -> SourceApplication {
        SourceApplication::Obsidian
    }

    fn accepts(&self, input: &Path) -> bool {
        input.is_dir()
    }

    fn convert(&mut self, input: &Path) -> Result<Conversion> {
        let mut fragment = Notebook::root();
        self.convert_folder(input, &mut fragment, input)?;
        assign_page_ids(&mut fragment);
        Ok(Conversion {
            notebooks: fragment.child_notebooks,
            notes: fragment.child_notes,
            tags: Vec::new(),
        })
    }
}

fn is_markdown(path: &Path) -> bool {
    path.is_file() && path.extension().is_some_and(|e| e == "md")
}

/// `path` relative to the vault, `/`-separated, without `.md`
fn relative_page_path(path: &Path, root_folder: &Path) -> String {
    let relative = path.strip_prefix(root_folder).unwrap_or(path).with_extension("");
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Replace the relative paths set by `convert_note` with page ids.
fn assign_page_ids(fragment: &mut Notebook) {
    // stem -> (folder depth, relative path) of the page that keeps the stem
    let mut owners: HashMap<String, (usize, String)> = HashMap::new();
    fragment.walk_notes(&mut |_, note| {
        let Some(relative) = note.original_id.as_deref() else {
            return;
        };
        let depth = relative.matches('/').count();
        let stem = relative.rsplit('/').next().unwrap_or(relative);
        match owners.entry(stem.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert((depth, relative.to_string()));
            }
            Entry::Occupied(mut slot) => {
                if depth < slot.get().0 {
                    slot.insert((depth, relative.to_string()));
                }
            }
        }
    });

    fragment.walk_notes_mut(&mut |note| {
        let Some(relative) = note.original_id.take() else {
            return;
        };
        let stem = relative.rsplit('/').next().unwrap_or(&relative).to_string();
        let owns_stem = owners.get(&stem).is_some_and(|(_, owner)| *owner == relative);
        if owns_stem {
            note.original_id = Some(stem);
        } else {
            warn!(
                "Page name '{}' is used more than once, {} gets id '{}'",
                stem, note.title, relative
            );
            note.original_id = Some(relative);
        }
    });
}

/// Page id a wikilink points at: `[[folder/Page#Heading]]` -> `Page`
fn wikilink_target_id(destination: &str) -> String {
    let without_anchor = strip_fragment(destination);
    let name = without_anchor.rsplit('/').next().unwrap_or(without_anchor);
    name.strip_suffix(".md").unwrap_or(name).trim().to_string()
}

/// Resources and note links written as wikilinks.
///
/// Embeds (`![[...]]`) are attachments, everything else links to a page.
pub fn wikilink_references(body: &str, root_folder: &Path) -> (Vec<Resource>, Vec<NoteLink>) {
    let mut resources = Vec::new();
    let mut note_links = Vec::new();

    for link in wikilink_links(body) {
        let title = if link.description.trim().is_empty() {
            link.destination
        } else {
            link.description
        };
        if link.is_embed() {
            match find_file_recursively(root_folder, strip_fragment(link.destination)) {
                Some(path) => resources.push(Resource::new(path, link.text, title)),
                None => debug!("Unresolved attachment '{}'", link.destination),
            }
        } else {
            note_links.push(NoteLink::new(
                link.text,
                wikilink_target_id(link.destination),
                title,
            ));
        }
    }
    (resources, note_links)
}

/// Resources and note links written as markdown links. Web links are skipped.
pub fn markdown_references(body: &str, root_folder: &Path) -> (Vec<Resource>, Vec<NoteLink>) {
    let mut resources = Vec::new();
    let mut note_links = Vec::new();

    for link in markdown_links(body) {
        match classify_destination(link.destination) {
            LinkTarget::Web => continue,
            LinkTarget::Note => {
                let target = strip_fragment(link.destination);
                let decoded = urlencoding::decode(target)
                    .map(|s| s.into_owned())
                    .unwrap_or_else(|_| target.to_string());
                let Some(id) = Path::new(&decoded).file_stem() else {
                    continue;
                };
                note_links.push(NoteLink::new(
                    link.text,
                    id.to_string_lossy(),
                    link.description,
                ));
            }
            LinkTarget::Resource => {
                let Some(path) = find_file_recursively(root_folder, strip_fragment(link.destination))
                else {
                    debug!("Unresolved attachment '{}'", link.destination);
                    continue;
                };
                let title = if link.description.is_empty() {
                    path.file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_default()
                } else {
                    link.description.to_string()
                };
                resources.push(Resource::new(path, link.text, title));
            }
        }
    }
    (resources, note_links)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_wikilink_target_id() {
        assert_eq!(wikilink_target_id("note-id"), "note-id");
        assert_eq!(wikilink_target_id("folder/Page#Heading"), "Page");
        assert_eq!(wikilink_target_id("Page.md"), "Page");
    }

    #[test]
    fn test_wikilink_round_trip() {
        let dir = TempDir::new().unwrap();
        let body = "Before [[note-id|Shown Text]] after";
        let (resources, links) = wikilink_references(body, dir.path());

        assert!(resources.is_empty());
        assert_eq!(links, vec![NoteLink::new("[[note-id|Shown Text]]", "note-id", "Shown Text")]);
    }

    #[test]
    fn test_wikilink_embed_resolves_resource() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("assets")).unwrap();
        fs::write(dir.path().join("assets/pic.png"), b"png").unwrap();

        let (resources, links) =
            wikilink_references("![[pic.png]] and ![[gone.png]]", dir.path());
        assert!(links.is_empty());
        assert_eq!(
            resources,
            vec![Resource::new(dir.path().join("assets/pic.png"), "![[pic.png]]", "pic.png")]
        );
    }

    #[test]
    fn test_markdown_references() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("my file.pdf"), b"pdf").unwrap();
        let body = "[web](https://example.com) [other](sub/Other%20Page.md) ![](my%20file.pdf)";

        let (resources, links) = markdown_references(body, dir.path());
        assert_eq!(
            links,
            vec![NoteLink::new("[other](sub/Other%20Page.md)", "Other Page", "other")]
        );
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].filename, dir.path().join("my file.pdf"));
        assert_eq!(resources[0].original_text, "![](my%20file.pdf)");
        assert_eq!(resources[0].title, "my file.pdf");
    }

    #[test]
    fn test_markdown_links_with_fragments() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("doc.pdf"), b"pdf").unwrap();
        let body = "[see](Other.md#Heading.v2) [page](doc.pdf#page=2)";

        let (resources, links) = markdown_references(body, dir.path());
        assert_eq!(
            links,
            vec![NoteLink::new("[see](Other.md#Heading.v2)", "Other", "see")]
        );
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].filename, dir.path().join("doc.pdf"));
    }

    #[test]
    fn test_shared_page_names_get_unique_ids() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("A")).unwrap();
        fs::create_dir_all(dir.path().join("B/C")).unwrap();
        fs::write(dir.path().join("A/Note.md"), "deep").unwrap();
        fs::write(dir.path().join("Note.md"), "top").unwrap();
        fs::write(dir.path().join("B/C/Note.md"), "deeper").unwrap();
        fs::write(dir.path().join("B/Other.md"), "other").unwrap();

        let conversion = ObsidianConverter::new(ConvertConfig::default())
            .convert(dir.path())
            .unwrap();
        let mut root = Notebook::root();
        conversion.append_to(&mut root);

        let mut ids = Vec::new();
        root.walk_notes(&mut |_, note| {
            ids.push((note.body.clone(), note.original_id.clone().unwrap()));
        });
        ids.sort();
        assert_eq!(
            ids,
            vec![
                ("deep".to_string(), "A/Note".to_string()),
                ("deeper".to_string(), "B/C/Note".to_string()),
                ("other".to_string(), "Other".to_string()),
                ("top".to_string(), "Note".to_string()),
            ]
        );
    }

    #[test]
    fn test_relative_page_path() {
        let root = Path::new("/vault");
        assert_eq!(relative_page_path(Path::new("/vault/a/b/Page.md"), root), "a/b/Page");
        assert_eq!(relative_page_path(Path::new("/vault/Page.md"), root), "Page");
    }

    #[test]
    fn test_only_web_links_yield_nothing() {
        let dir = TempDir::new().unwrap();
        let body = "[a](https://a.example) ![b](http://b.example/img.png)";
        let (resources, links) = markdown_references(body, dir.path());
        assert!(resources.is_empty());
        assert!(links.is_empty());
    }
}
