use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Application a note was converted from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SourceApplication {
    Clipto,
    Obsidian,
    Todoist,
    Cherrytree,
}

impl SourceApplication {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clipto => "clipto",
            Self::Obsidian => "obsidian",
            Self::Todoist => "todoist",
            Self::Cherrytree => "cherrytree",
        }
    }
}

impl fmt::Display for SourceApplication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A label attached to a note.
///
/// Two tags with the same `identifier` are the same logical tag, even when
/// their titles differ. Converters don't deduplicate; see
/// [`fold_tags`](super::fold_tags).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Tag {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

impl Tag {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            identifier: None,
        }
    }

    pub fn with_identifier(title: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            identifier: Some(identifier.into()),
        }
    }

    /// Key used to match this tag against others: the identifier, or the title.
    pub fn key(&self) -> &str {
        self.identifier.as_deref().unwrap_or(&self.title)
    }
}

/// An attachment referenced from a note body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    /// Location of the actual bytes on disk
    pub filename: PathBuf,
    /// Inline text in the body that referenced the attachment
    pub original_text: String,
    /// Human readable name
    pub title: String,
}

impl Resource {
    pub fn new(
        filename: impl Into<PathBuf>,
        original_text: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            original_text: original_text.into(),
            title: title.into(),
        }
    }
}

/// An unresolved reference from a note body to another note.
///
/// `original_id` is the identifier of the target in the source application.
/// Resolution to a converted note happens only once the whole tree exists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NoteLink {
    pub original_text: String,
    pub original_id: String,
    pub title: String,
}

impl NoteLink {
    pub fn new(
        original_text: impl Into<String>,
        original_id: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            original_text: original_text.into(),
            original_id: original_id.into(),
            title: title.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub title: String,
    /// Markdown body. Link and resource texts are left in place.
    pub body: String,
    /// Unix milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_created_time: Option<i64>,
    /// Unix milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_updated_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub is_todo: bool,
    /// Unix milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub todo_due: Option<i64>,
    pub source_application: SourceApplication,
    /// Identifier in the source dataset. Only used to resolve note links.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    /// Tag identifiers not yet joined against a tag list
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tag_ids: Vec<String>,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub note_links: Vec<NoteLink>,
}

impl Note {
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        source_application: SourceApplication,
    ) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            user_created_time: None,
            user_updated_time: None,
            author: None,
            is_todo: false,
            todo_due: None,
            source_application,
            original_id: None,
            tags: Vec::new(),
            tag_ids: Vec::new(),
            resources: Vec::new(),
            note_links: Vec::new(),
        }
    }
}

/// A named container of notebooks and notes.
///
/// The tree is built by value: every child is owned by exactly one parent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Notebook {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_created_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_updated_time: Option<i64>,
    #[serde(default)]
    pub child_notebooks: Vec<Notebook>,
    #[serde(default)]
    pub child_notes: Vec<Note>,
}

impl Notebook {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// The synthetic root of a conversion
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.child_notebooks.is_empty() && self.child_notes.is_empty()
    }

    /// Number of notes in this notebook and all descendants
    pub fn note_count(&self) -> usize {
        self.child_notes.len()
            + self
                .child_notebooks
                .iter()
                .map(Notebook::note_count)
                .sum::<usize>()
    }

    /// Number of descendant notebooks, not counting `self`
    pub fn notebook_count(&self) -> usize {
        self.child_notebooks.len()
            + self
                .child_notebooks
                .iter()
                .map(Notebook::notebook_count)
                .sum::<usize>()
    }

    /// Visit every note depth-first, passing the titles of the enclosing notebooks.
    pub fn walk_notes<'a, F>(&'a self, visit: &mut F)
    where
        F: FnMut(&[&'a str], &'a Note),
    {
        let mut path = Vec::new();
        self.walk_notes_inner(&mut path, visit);
    }

    fn walk_notes_inner<'a, F>(&'a self, path: &mut Vec<&'a str>, visit: &mut F)
    where
        F: FnMut(&[&'a str], &'a Note),
    {
        for note in &self.child_notes {
            visit(path.as_slice(), note);
        }
        for notebook in &self.child_notebooks {
            path.push(&notebook.title);
            notebook.walk_notes_inner(path, visit);
            path.pop();
        }
    }

    /// Mutable depth-first visit of every note
    pub fn walk_notes_mut<F>(&mut self, visit: &mut F)
    where
        F: FnMut(&mut Note),
    {
        for note in &mut self.child_notes {
            visit(note);
        }
        for notebook in &mut self.child_notebooks {
            notebook.walk_notes_mut(visit);
        }
    }

    /// Depth-first search for a child notebook by title
    pub fn find_notebook(&self, title: &str) -> Option<&Notebook> {
        self.child_notebooks.iter().find_map(|nb| {
            if nb.title == title {
                Some(nb)
            } else {
                nb.find_notebook(title)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> Notebook {
        let mut inner = Notebook::new("inner");
        inner
            .child_notes
            .push(Note::new("deep", "", SourceApplication::Obsidian));
        let mut outer = Notebook::new("outer");
        outer
            .child_notes
            .push(Note::new("shallow", "", SourceApplication::Obsidian));
        outer.child_notebooks.push(inner);
        let mut root = Notebook::root();
        root.child_notebooks.push(outer);
        root
    }

    #[test]
    fn test_counts() {
        let root = sample_tree();
        assert_eq!(root.note_count(), 2);
        assert_eq!(root.notebook_count(), 2);
        assert!(!root.is_empty());
        assert!(Notebook::new("x").is_empty());
    }

    #[test]
    fn test_walk_notes_reports_path() {
        let root = sample_tree();
        let mut seen = Vec::new();
        root.walk_notes(&mut |path, note| {
            seen.push(format!("{}/{}", path.join("/"), note.title));
        });
        assert_eq!(seen, vec!["outer/shallow", "outer/inner/deep"]);
    }

    #[test]
    fn test_find_notebook() {
        let root = sample_tree();
        assert!(root.find_notebook("inner").is_some());
        assert!(root.find_notebook("missing").is_none());
    }

    #[test]
    fn test_tag_key_prefers_identifier() {
        assert_eq!(Tag::with_identifier("Work", "f-1").key(), "f-1");
        assert_eq!(Tag::new("home").key(), "home");
    }

    #[test]
    fn test_note_serializes_camel_case() {
        let mut note = Note::new("t", "b", SourceApplication::Todoist);
        note.is_todo = true;
        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["isTodo"], true);
        assert_eq!(json["sourceApplication"], "todoist");
        assert!(json.get("todoDue").is_none());
    }
}
