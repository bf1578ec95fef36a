//! Second-phase helpers run over a finished tree.
//!
//! Converters only record `original_id`s. Once every input is converted,
//! an exporter builds a [`NoteIndex`] over the complete tree to resolve
//! [`NoteLink`]s, since a note may link forward to one converted later.

use std::collections::{BTreeMap, HashMap, HashSet};

use log::warn;

use super::models::{Note, NoteLink, Notebook, Tag};

/// Lookup from source identifier to converted note
#[derive(Debug, Default)]
pub struct NoteIndex<'a> {
    by_id: HashMap<&'a str, &'a Note>,
    duplicates: Vec<String>,
}

impl<'a> NoteIndex<'a> {
    /// Index every note of `root` that carries an `original_id`.
    ///
    /// On a duplicate id the first note in depth-first order wins and the
    /// id is recorded in [`duplicates`](Self::duplicates).
    pub fn build(root: &'a Notebook) -> Self {
        let mut index = Self::default();
        root.walk_notes(&mut |_, note| {
            let Some(id) = note.original_id.as_deref() else {
                return;
            };
            if index.by_id.contains_key(id) {
                warn!("Duplicate note id '{}' (note '{}')", id, note.title);
                index.duplicates.push(id.to_string());
            } else {
                index.by_id.insert(id, note);
            }
        });
        index
    }

    pub fn get(&self, original_id: &str) -> Option<&'a Note> {
        self.by_id.get(original_id).copied()
    }

    /// Target of a link, or `None` for a broken link
    pub fn resolve(&self, link: &NoteLink) -> Option<&'a Note> {
        self.get(&link.original_id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn duplicates(&self) -> &[String] {
        &self.duplicates
    }
}

/// All note links in the tree, grouped by target id
pub fn collect_note_links(root: &Notebook) -> BTreeMap<&str, Vec<&NoteLink>> {
    let mut links: BTreeMap<&str, Vec<&NoteLink>> = BTreeMap::new();
    root.walk_notes(&mut |_, note| {
        for link in &note.note_links {
            links.entry(link.original_id.as_str()).or_default().push(link);
        }
    });
    links
}

/// Deduplicate tags by [`Tag::key`], keeping the first occurrence.
pub fn fold_tags<I>(tags: I) -> Vec<Tag>
where
    I: IntoIterator<Item = Tag>,
{
    let mut seen = HashSet::new();
    tags.into_iter()
        .filter(|tag| seen.insert(tag.key().to_string()))
        .collect()
}

/// Attach tags referenced through `Note::tag_ids`.
///
/// Matched ids are moved from `tag_ids` into `tags`; unknown ids stay in
/// `tag_ids`. Returns the number of tags attached.
pub fn join_tag_ids(root: &mut Notebook, tags: &[Tag]) -> usize {
    let by_id: HashMap<&str, &Tag> = tags
        .iter()
        .filter_map(|tag| tag.identifier.as_deref().map(|id| (id, tag)))
        .collect();

    let mut joined = 0;
    root.walk_notes_mut(&mut |note| {
        let mut unresolved = Vec::new();
        for id in note.tag_ids.drain(..) {
            match by_id.get(id.as_str()) {
                Some(tag) => {
                    if !note.tags.iter().any(|t| t.key() == tag.key()) {
                        note.tags.push((*tag).clone());
                        joined += 1;
                    }
                }
                None => {
                    warn!("Note '{}' references unknown tag id '{}'", note.title, id);
                    unresolved.push(id);
                }
            }
        }
        note.tag_ids = unresolved;
    });
    joined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intermediate::SourceApplication;

    fn note(title: &str, id: &str) -> Note {
        let mut note = Note::new(title, "", SourceApplication::Cherrytree);
        note.original_id = Some(id.to_string());
        note
    }

    #[test]
    fn test_index_resolves_forward_links() {
        let mut first = note("first", "1");
        first
            .note_links
            .push(NoteLink::new("[second](2)", "2", "second"));
        let mut nested = Notebook::new("nested");
        nested.child_notes.push(note("second", "2"));
        let mut root = Notebook::root();
        root.child_notes.push(first);
        root.child_notebooks.push(nested);

        let index = NoteIndex::build(&root);
        assert_eq!(index.len(), 2);
        let link = &root.child_notes[0].note_links[0];
        assert_eq!(index.resolve(link).map(|n| n.title.as_str()), Some("second"));
        assert!(index.get("3").is_none());
    }

    #[test]
    fn test_index_reports_duplicates() {
        let mut root = Notebook::root();
        root.child_notes.push(note("a", "same"));
        root.child_notes.push(note("b", "same"));

        let index = NoteIndex::build(&root);
        assert_eq!(index.get("same").map(|n| n.title.as_str()), Some("a"));
        assert_eq!(index.duplicates(), ["same".to_string()]);
    }

    #[test]
    fn test_collect_note_links_groups_by_target() {
        let mut a = note("a", "a");
        a.note_links.push(NoteLink::new("[[c]]", "c", "c"));
        let mut b = note("b", "b");
        b.note_links.push(NoteLink::new("[[c|see]]", "c", "see"));
        let mut root = Notebook::root();
        root.child_notes.extend([a, b]);

        let links = collect_note_links(&root);
        assert_eq!(links.len(), 1);
        assert_eq!(links["c"].len(), 2);
    }

    #[test]
    fn test_fold_tags_by_identifier() {
        let folded = fold_tags(vec![
            Tag::with_identifier("Work", "1"),
            Tag::with_identifier("Work (renamed)", "1"),
            Tag::new("home"),
            Tag::new("home"),
        ]);
        assert_eq!(folded, vec![Tag::with_identifier("Work", "1"), Tag::new("home")]);
    }

    #[test]
    fn test_join_tag_ids() {
        let mut n = note("n", "n");
        n.tag_ids = vec!["t1".to_string(), "missing".to_string()];
        let mut root = Notebook::root();
        root.child_notes.push(n);

        let joined = join_tag_ids(&mut root, &[Tag::with_identifier("Tag one", "t1")]);
        assert_eq!(joined, 1);
        let n = &root.child_notes[0];
        assert_eq!(n.tags, vec![Tag::with_identifier("Tag one", "t1")]);
        assert_eq!(n.tag_ids, vec!["missing".to_string()]);
    }
}
