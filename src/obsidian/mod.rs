//! Obsidian import module
//!
//! Handles importing Obsidian vault folders.
//! Supports:
//! - Folder structure preservation (folders become notebooks)
//! - Wiki-links `[[page|alias]]` and markdown links to other pages
//! - Embedded attachments `![[file]]` and `![alt](file)`
//! - Inline `#tags`
//!
//! YAML frontmatter is kept in the body as-is; its tags are not read.

mod import;

pub use import::*;
