//! Cherrytree import module
//!
//! Handles `.ctd` documents (cherrytree's XML format). Nodes with child
//! nodes also become notebooks holding those children. Supports:
//! - Rich text with bold, italic, strikethrough and monospace runs
//! - Web links and links to other nodes
//! - Code boxes, simple tables and embedded images/files (base64)
//! - Bookmarks as a tag

mod import;
mod xml;

pub use import::*;
