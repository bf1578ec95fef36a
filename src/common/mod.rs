//! Utilities shared by the converters: link extraction, file lookup and
//! timestamp conversion.

pub mod files;
pub mod links;
pub mod time;

pub use files::{file_times_ms, find_file_recursively, provision_scratch_folder, FileTimes};
pub use links::{
    classify_destination, inline_tags, markdown_links, strip_fragment, wikilink_links,
    InlineTagMatcher, LinkMatch, LinkTarget,
};
pub use time::iso_to_unix_ms;
