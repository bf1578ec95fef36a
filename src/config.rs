use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Settings shared by all converters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "snake_case")]
pub struct ConvertConfig {
    /// Folder for decoded attachments. A temp folder is created when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scratch_dir: Option<PathBuf>,
    /// Prefixes marking inline tags in markdown bodies
    pub inline_tag_markers: Vec<String>,
    /// Prefix marking labels in task titles
    pub label_marker: char,
    /// Prefix of the tag derived from a task priority
    pub priority_tag_prefix: String,
    /// Tag given to bookmarked nodes
    pub bookmark_tag: String,
    /// Folder names skipped when walking a vault
    pub ignored_folders: Vec<String>,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            scratch_dir: None,
            inline_tag_markers: vec!["#".to_string()],
            label_marker: '@',
            priority_tag_prefix: "priority-".to_string(),
            bookmark_tag: "cherrytree-bookmarked".to_string(),
            ignored_folders: vec![".obsidian".to_string()],
        }
    }
}

impl ConvertConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}
