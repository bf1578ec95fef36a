use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::UNIX_EPOCH;

use log::debug;
use uuid::Uuid;
use walkdir::WalkDir;

use crate::error::Result;

/// Find the file a link refers to somewhere below `root_folder`.
///
/// `requested` may be percent-encoded, relative to the note rather than the
/// root, or a bare file name. Lookup order:
/// 1. `root_folder/requested`, only when `requested` stays inside the root
/// 2. the first file, by sorted traversal, whose path ends with `requested`
/// 3. the first file with the same file name
///
/// Files outside `root_folder` are never returned.
pub fn find_file_recursively(root_folder: &Path, requested: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(requested)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| requested.to_string());
    let requested_path = Path::new(&decoded);

    let stays_inside = requested_path
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if stays_inside {
        let direct = root_folder.join(requested_path);
        if direct.is_file() {
            return Some(direct);
        }
    }

    // Drop roots, "./" and "../" so the rest can be matched as a path suffix
    let suffix: PathBuf = requested_path
        .components()
        .skip_while(|c| !matches!(c, Component::Normal(_)))
        .collect();
    let file_name = suffix.file_name()?.to_owned();

    let mut name_match = None;
    for entry in WalkDir::new(root_folder)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        if path.ends_with(&suffix) {
            return Some(path.to_path_buf());
        }
        if name_match.is_none() && path.file_name() == Some(file_name.as_os_str()) {
            name_match = Some(path.to_path_buf());
        }
    }

    if name_match.is_none() {
        debug!("No file for '{}' below {}", requested, root_folder.display());
    }
    name_match
}

/// Creation and modification time of a filesystem entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileTimes {
    /// Unix milliseconds, when the platform records it
    pub created: Option<i64>,
    /// Unix milliseconds
    pub modified: Option<i64>,
}

pub fn file_times_ms(path: &Path) -> FileTimes {
    let Ok(metadata) = fs::metadata(path) else {
        return FileTimes::default();
    };
    let to_ms = |time: std::io::Result<std::time::SystemTime>| {
        time.ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .and_then(|d| i64::try_from(d.as_millis()).ok())
    };
    FileTimes {
        created: to_ms(metadata.created()),
        modified: to_ms(metadata.modified()),
    }
}

/// Create the folder decoded attachments are written to.
///
/// Uses `configured` when given, otherwise a fresh folder under the system
/// temp dir. The folder is left in place for the exporter.
pub fn provision_scratch_folder(configured: Option<&Path>) -> Result<PathBuf> {
    let folder = match configured {
        Some(dir) => dir.to_path_buf(),
        None => std::env::temp_dir().join(format!("notefold-{}", Uuid::new_v4())),
    };
    fs::create_dir_all(&folder)?;
    debug!("Scratch folder: {}", folder.display());
    Ok(folder)
}

/// Write `data` to a new, uniquely named file in `folder`.
pub fn write_scratch_file(folder: &Path, data: &[u8]) -> Result<PathBuf> {
    let path = folder.join(Uuid::new_v4().to_string());
    fs::write(&path, data)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn vault() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("attachments/img")).unwrap();
        fs::create_dir_all(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("attachments/img/photo one.png"), b"a").unwrap();
        fs::write(dir.path().join("b/photo one.png"), b"b").unwrap();
        fs::write(dir.path().join("b/report.pdf"), b"c").unwrap();
        dir
    }

    #[test]
    fn test_find_direct_relative_path() {
        let dir = vault();
        let found = find_file_recursively(dir.path(), "b/report.pdf").unwrap();
        assert_eq!(found, dir.path().join("b/report.pdf"));
    }

    #[test]
    fn test_find_decodes_and_matches_suffix() {
        let dir = vault();
        let found = find_file_recursively(dir.path(), "../img/photo%20one.png").unwrap();
        assert_eq!(found, dir.path().join("attachments/img/photo one.png"));
    }

    #[test]
    fn test_find_by_name_is_deterministic() {
        let dir = vault();
        let first = find_file_recursively(dir.path(), "photo one.png").unwrap();
        let second = find_file_recursively(dir.path(), "photo one.png").unwrap();
        assert_eq!(first, second);
        assert_eq!(first, dir.path().join("attachments/img/photo one.png"));
    }

    #[test]
    fn test_find_never_leaves_root() {
        let outer = TempDir::new().unwrap();
        let root = outer.path().join("vault");
        fs::create_dir_all(&root).unwrap();
        fs::write(outer.path().join("img.png"), b"outside").unwrap();
        fs::write(root.join("img.png"), b"inside").unwrap();

        let found = find_file_recursively(&root, "../img.png").unwrap();
        assert_eq!(fs::read(&found).unwrap(), b"inside");

        let absolute = outer.path().join("img.png");
        let found = find_file_recursively(&root, &absolute.to_string_lossy()).unwrap();
        assert_eq!(fs::read(&found).unwrap(), b"inside");

        fs::remove_file(root.join("img.png")).unwrap();
        assert!(find_file_recursively(&root, "../img.png").is_none());
        assert!(find_file_recursively(&root, &absolute.to_string_lossy()).is_none());
    }

    #[test]
    fn test_find_missing_returns_none() {
        let dir = vault();
        assert!(find_file_recursively(dir.path(), "nope.png").is_none());
        assert!(find_file_recursively(dir.path(), "").is_none());
    }

    #[test]
    fn test_scratch_folder_and_file() {
        let dir = TempDir::new().unwrap();
        let scratch = provision_scratch_folder(Some(&dir.path().join("scratch"))).unwrap();
        let file = write_scratch_file(&scratch, b"bytes").unwrap();
        assert_eq!(fs::read(file).unwrap(), b"bytes");
    }

    #[test]
    fn test_file_times() {
        let dir = vault();
        let times = file_times_ms(&dir.path().join("b/report.pdf"));
        assert!(times.modified.is_some());
        assert_eq!(file_times_ms(&dir.path().join("missing")), FileTimes::default());
    }
}
