use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use crate::error::SteamrateError;

/// A path that was a directory when it was checked.
///
/// Nothing here ever creates directories; steamrate only reads.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExistingDirectory {
    path: PathBuf
}

impl ExistingDirectory {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Display for ExistingDirectory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.path.display(), f)
    }
}

impl TryFrom<PathBuf> for ExistingDirectory {
    type Error = SteamrateError;

    fn try_from(path: PathBuf) -> Result<Self, Self::Error> {
        if path.exists() {
            if !path.is_dir() {
                return Err(SteamrateError::NotADirectory(path));
            }

            return Ok(Self { path });
        }

        Err(SteamrateError::DirectoryNotFound(path))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use tempfile::TempDir;
    use crate::error::SteamrateError;
    use super::ExistingDirectory;

    #[test]
    fn displays_as_its_path() {
        let tmp = TempDir::new().unwrap();
        let dir = ExistingDirectory::try_from(tmp.path().to_owned()).unwrap();
        assert_eq!(dir.path(), tmp.path());
        assert_eq!(dir.to_string(), tmp.path().display().to_string());
    }

    #[test]
    fn accepts_directories_only() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("file");
        fs::write(&file, "x").unwrap();

        assert!(ExistingDirectory::try_from(tmp.path().to_owned()).is_ok());
        assert!(matches!(ExistingDirectory::try_from(file), Err(SteamrateError::NotADirectory(_))));
        assert!(matches!(
            ExistingDirectory::try_from(tmp.path().join("missing")),
            Err(SteamrateError::DirectoryNotFound(_))
        ));
    }
}
