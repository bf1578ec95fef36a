//! Cherrytree `.ctd` import implementation

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use log::{debug, warn};

use super::xml::{parse_document, XmlElement};
use crate::common::files::{provision_scratch_folder, write_scratch_file};
use crate::common::time::unix_seconds_to_ms;
use crate::config::ConvertConfig;
use crate::converter::{has_extension, Conversion, Converter};
use crate::error::{ImportError, Result};
use crate::intermediate::{Note, NoteLink, Notebook, Resource, SourceApplication, Tag};

/// Wrap the visible part of `text` in `marker`, keeping surrounding
/// whitespace outside so `**bold\n**` can't happen.
fn wrap_trimmed(text: &str, marker: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return text.to_string();
    }
    let start = text.len() - text.trim_start().len();
    let end = start + trimmed.len();
    format!("{}{}{}{}{}", &text[..start], marker, trimmed, marker, &text[end..])
}

/// Markdown for one `<rich_text>` run, plus the note link it may hold.
fn convert_rich_text(run: &XmlElement) -> (String, Option<NoteLink>) {
    let text = run.text.as_str();

    if let Some(link) = run.attr("link") {
        if let Some(url) = link.strip_prefix("webs ") {
            let markdown = if text == url {
                format!("<{}>", url)
            } else {
                format!("[{}]({})", text, url)
            };
            return (markdown, None);
        }
        if let Some(target) = link.strip_prefix("node ") {
            // "node <id> [anchor]"; the anchor has no counterpart
            let id = target.split_whitespace().next().unwrap_or_default();
            let markdown = format!("[{}]({})", text, id);
            let note_link = NoteLink::new(markdown.clone(), id, text);
            return (markdown, Some(note_link));
        }
        return (format!("[{}]({})", text, link), None);
    }

    let mut markdown = text.to_string();
    if run.attr("family") == Some("monospace") {
        markdown = wrap_trimmed(&markdown, "`");
    }
    if run.attr("weight") == Some("heavy") {
        markdown = wrap_trimmed(&markdown, "**");
    }
    if run.attr("style") == Some("italic") {
        markdown = wrap_trimmed(&markdown, "*");
    }
    if run.attr("strikethrough") == Some("true") {
        markdown = wrap_trimmed(&markdown, "~~");
    }
    (markdown, None)
}

fn convert_codebox(codebox: &XmlElement) -> String {
    let language = codebox
        .attr("syntax_highlighting")
        .filter(|lang| !lang.is_empty() && *lang != "plain-text")
        .unwrap_or_default();
    format!("```{}\n{}\n```\n", language, codebox.text)
}

/// Markdown table from `<row>`s of `<cell>`s. The first row is the header.
fn convert_table(table: &XmlElement) -> String {
    let mut lines = Vec::new();
    let rows = table.children.iter().filter(|row| {
        if row.name != "row" {
            warn!("ignoring tag {} in table", row.name);
        }
        row.name == "row"
    });

    for (index, row) in rows.enumerate() {
        let cells: Vec<String> = row
            .children
            .iter()
            .filter(|cell| cell.name == "cell")
            .map(|cell| cell.text.replace('\n', "<br>"))
            .collect();
        lines.push(format!("| {} |", cells.join(" | ")));
        if index == 0 {
            let separator = vec!["---"; cells.len()];
            lines.push(format!("| {} |", separator.join(" | ")));
        }
    }
    lines.join("\n")
}

/// Cherrytree writes bullets as glyphs.
fn fix_list(body: &str) -> String {
    body.replace('•', "-")
}

pub struct CherrytreeConverter {
    config: ConvertConfig,
    scratch_folder: Option<PathBuf>,
}

impl CherrytreeConverter {
    pub fn new(config: ConvertConfig) -> Self {
        Self {
            config,
            scratch_folder: None,
        }
    }

    /// Convert the text of a `.ctd` document.
    ///
    /// Embedded files are written to `scratch_folder`, which must exist.
    pub fn convert_document(&self, content: &str, scratch_folder: &Path) -> Result<Conversion> {
        let document = parse_document(content)?;

        // Bookmarks are gathered first so they apply wherever they appear.
        let bookmarks: HashSet<&str> = document
            .children
            .iter()
            .filter(|child| child.name == "bookmarks")
            .filter_map(|child| child.attr("list"))
            .flat_map(|list| list.split(','))
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .collect();

        let walker = NodeWalker {
            config: &self.config,
            scratch_folder,
            bookmarks: &bookmarks,
        };

        let mut fragment = Notebook::root();
        for child in &document.children {
            match child.name.as_str() {
                "bookmarks" => {}
                "node" => walker.convert_node(child, &mut fragment)?,
                other => warn!("ignoring tag {}", other),
            }
        }

        Ok(Conversion {
            notebooks: fragment.child_notebooks,
            notes: fragment.child_notes,
            tags: Vec::new(),
        })
    }

    fn scratch_folder(&mut self) -> Result<PathBuf> {
        if let Some(folder) = &self.scratch_folder {
            return Ok(folder.clone());
        }
        let folder = provision_scratch_folder(self.config.scratch_dir.as_deref())?;
        self.scratch_folder = Some(folder.clone());
        Ok(folder)
    }
}

impl Converter for CherrytreeConverter {
    fn source_application(&self) -> SourceApplication {
        SourceApplication::Cherrytree
    }

    fn accepts(&self, input: &Path) -> bool {
        has_extension(input, "ctd")
    }

    fn convert(&mut self, input: &Path) -> Result<Conversion> {
        let content = fs::read_to_string(input)?;
        let scratch_folder = self.scratch_folder()?;
        self.convert_document(&content, &scratch_folder)
    }
}

/// State shared while walking the node tree of one document
struct NodeWalker<'a> {
    config: &'a ConvertConfig,
    scratch_folder: &'a Path,
    bookmarks: &'a HashSet<&'a str>,
}

impl NodeWalker<'_> {
    /// Convert `node` into a note in `parent`.
    ///
    /// Child nodes are converted into a buffer first. Only when that buffer
    /// is non-empty does a notebook named after the node get created.
    fn convert_node(&self, node: &XmlElement, parent: &mut Notebook) -> Result<()> {
        let name = node.attr("name").unwrap_or_default();
        let unique_id = node
            .attr("unique_id")
            .ok_or_else(|| ImportError::MissingAttribute {
                element: node.name.clone(),
                attribute: "unique_id".to_string(),
            })?;

        let mut children = Notebook::root();
        let mut body = String::new();
        let mut resources = Vec::new();
        let mut note_links = Vec::new();

        for child in &node.children {
            match child.name.as_str() {
                "rich_text" => {
                    let (markdown, note_link) = convert_rich_text(child);
                    body.push_str(&markdown);
                    note_links.extend(note_link);
                }
                "node" => self.convert_node(child, &mut children)?,
                "codebox" => body.push_str(&convert_codebox(child)),
                "encoded_png" => {
                    if let Some((markdown, resource)) = self.convert_encoded_file(child)? {
                        body.push_str(&markdown);
                        resources.push(resource);
                    }
                }
                "table" => {
                    body.push_str(&convert_table(child));
                    body.push('\n');
                }
                other => warn!("ignoring tag {}", other),
            }
        }

        if !children.is_empty() {
            debug!("new notebook: {}, parent: {}", name, parent.title);
            parent.child_notebooks.push(Notebook {
                title: name.to_string(),
                child_notebooks: children.child_notebooks,
                child_notes: children.child_notes,
                ..Default::default()
            });
        }

        let mut tags = Vec::new();
        if self.bookmarks.contains(unique_id) {
            tags.push(Tag::with_identifier(
                self.config.bookmark_tag.clone(),
                self.config.bookmark_tag.clone(),
            ));
        }

        debug!("new note: {}, parent: {}", name, parent.title);
        parent.child_notes.push(Note {
            user_created_time: node.attr("ts_creation").and_then(unix_seconds_to_ms),
            user_updated_time: node.attr("ts_lastsave").and_then(unix_seconds_to_ms),
            original_id: Some(unique_id.to_string()),
            tags,
            resources,
            note_links,
            ..Note::new(name, fix_list(&body), SourceApplication::Cherrytree)
        });
        Ok(())
    }

    /// Decode an embedded file to the scratch folder.
    ///
    /// `<encoded_png>` holds any attachment type, not only PNG. Anchors
    /// share the tag but carry no data.
    fn convert_encoded_file(&self, element: &XmlElement) -> Result<Option<(String, Resource)>> {
        if element.attr("anchor").is_some() {
            return Ok(None);
        }
        let encoded: String = element.text.split_whitespace().collect();
        if encoded.is_empty() {
            warn!("ignoring empty embedded file");
            return Ok(None);
        }
        let data = BASE64.decode(encoded.as_bytes())?;
        let path = write_scratch_file(self.scratch_folder, &data)?;

        let display_name = element
            .attr("filename")
            .map(str::to_string)
            .or_else(|| path.file_name().map(|n| n.to_string_lossy().to_string()))
            .unwrap_or_default();
        let markdown = format!("![{}]({})", display_name, path.display());
        let resource = Resource::new(path, markdown.clone(), display_name);
        Ok(Some((markdown, resource)))
    }
}
