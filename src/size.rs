use std::fs;
use std::path::{Path, PathBuf};
use log::debug;
use walkdir::WalkDir;

/// Total size in bytes of the files under `path`.
///
/// Files that disappear or cannot be inspected while walking are left out of
/// the total rather than failing it. A missing `path` has size 0.
#[must_use]
pub fn dir_size(path: &Path) -> u64 {
    let files = WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Skipping entry while sizing {}: {e}", path.display());
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path);

    total_size(files)
}

/// Sum the sizes of `files`, skipping any that no longer exist.
fn total_size<I: IntoIterator<Item = PathBuf>>(files: I) -> u64 {
    files
        .into_iter()
        .filter_map(|file| match fs::metadata(&file) {
            Ok(metadata) => Some(metadata.len()),
            Err(e) => {
                debug!("Skipping {}: {e}", file.display());
                None
            }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use std::fs;
    use tempfile::TempDir;
    use super::{dir_size, total_size};

    #[test]
    fn sums_nested_files() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("a/b")).unwrap();
        fs::write(tmp.path().join("one"), [0u8; 10]).unwrap();
        fs::write(tmp.path().join("a/two"), [0u8; 20]).unwrap();
        fs::write(tmp.path().join("a/b/three"), [0u8; 30]).unwrap();

        assert_eq!(dir_size(tmp.path()), 60);
    }

    #[test]
    fn missing_directory_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(dir_size(&tmp.path().join("gone")), 0);
    }

    #[test]
    fn vanished_file_is_left_out() {
        let tmp = TempDir::new().unwrap();
        let stays = tmp.path().join("stays");
        let goes = tmp.path().join("goes");
        fs::write(&stays, [0u8; 8]).unwrap();
        fs::write(&goes, [0u8; 100]).unwrap();

        // Listed, then removed before it is measured
        let listed = vec![stays, goes.clone()];
        fs::remove_file(&goes).unwrap();

        assert_eq!(total_size(listed), 8);
        assert_eq!(dir_size(tmp.path()), 8);
    }
}
