use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};
use log::{debug, warn};
use steamrate_vdf::Block;
use unicase::UniCase;
use crate::error::SteamrateError;
use crate::steam::read_vdf;

static MANIFEST_PREFIX: &str = "appmanifest_";
static MANIFEST_EXTENSION: &str = "acf";

/// The `StateFlags` bitmask of an app manifest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateFlags(u32);

impl StateFlags {
    pub const PAUSED: u32 = 1 << 9;
    pub const DOWNLOADING: u32 = 1 << 20;

    #[must_use]
    pub const fn new(bits: u32) -> Self {
        Self(bits)
    }

    #[must_use]
    pub const fn is_downloading(self) -> bool {
        self.0 & Self::DOWNLOADING != 0
    }

    #[must_use]
    pub const fn is_paused(self) -> bool {
        self.0 & Self::PAUSED != 0
    }

    #[must_use]
    pub const fn status(self) -> Status {
        if self.is_paused() {
            Status::Paused
        } else {
            Status::Downloading
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Downloading,
    Paused,
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Status::Downloading => "Downloading",
            Status::Paused => "Paused",
        })
    }
}

/// One installed or downloading title, read from its `appmanifest_<appid>.acf`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppManifest {
    appid: String,
    name: String,
    state_flags: StateFlags,
    library: PathBuf,
}

impl AppManifest {
    /// Build a title from a parsed manifest found in `library`.
    pub fn from_block(manifest: &Block, library: &Path) -> Result<Self, SteamrateError> {
        let state = manifest
            .get_block("AppState")
            .ok_or(SteamrateError::FieldMissing("AppState"))?;

        let appid = state
            .get_str("appid")
            .ok_or(SteamrateError::FieldMissing("appid"))?;

        let state_flags = match state.get_str("StateFlags") {
            Some(flags) => flags.trim().parse().map_err(|_| SteamrateError::FieldUnparsable {
                field: "StateFlags",
                value: flags.to_owned(),
            })?,
            None => 0,
        };

        Ok(Self {
            appid: appid.to_owned(),
            name: state.get_str("name").unwrap_or("Unknown").to_owned(),
            state_flags: StateFlags::new(state_flags),
            library: library.to_owned(),
        })
    }

    pub fn read(path: &Path, library: &Path) -> Result<Self, SteamrateError> {
        Self::from_block(&read_vdf(path)?, library)
    }

    #[must_use]
    pub fn appid(&self) -> &str {
        &self.appid
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn state_flags(&self) -> StateFlags {
        self.state_flags
    }

    #[must_use]
    pub fn library(&self) -> &Path {
        &self.library
    }

    /// Where steam stages the files of an update in progress
    #[must_use]
    pub fn download_dir(&self) -> PathBuf {
        self.library.join("steamapps/downloading").join(&self.appid)
    }
}

fn is_manifest(path: &Path) -> bool {
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return false;
    };

    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();

    stem.starts_with(MANIFEST_PREFIX) && UniCase::new(extension) == UniCase::new(MANIFEST_EXTENSION)
}

/// The app manifests in `<library>/steamapps`, sorted by path.
/// A library without a `steamapps` directory has none.
#[must_use]
pub fn manifest_paths(library: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(library.join("steamapps")) else {
        debug!("No steamapps directory in {}", library.display());
        return Vec::new();
    };

    let mut paths = entries
        .filter_map(|entry| Some(entry.ok()?.path()))
        .filter(|path| path.is_file() && is_manifest(path))
        .collect::<Vec<_>>();
    paths.sort();
    paths
}

/// Read every title in every library.
///
/// A manifest that cannot be read or lacks the fields a title needs is
/// skipped; the rest are still returned.
#[must_use]
pub fn discover(libraries: &[PathBuf]) -> Vec<AppManifest> {
    let mut apps = Vec::new();
    for library in libraries {
        for path in manifest_paths(library) {
            match AppManifest::read(&path, library) {
                Ok(app) => apps.push(app),
                Err(e) => warn!("Skipping {}: {e}", path.display()),
            }
        }
    }

    apps
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;
    use crate::error::SteamrateError;
    use super::*;

    fn manifest(appid: &str, name: &str, flags: u32) -> String {
        format!(
            "\"AppState\"\n{{\n\t\"appid\"\t\t\"{appid}\"\n\t\"Universe\"\t\t\"1\"\n\t\"name\"\t\t\"{name}\"\n\t\"StateFlags\"\t\t\"{flags}\"\n\t\"InstalledDepots\"\n\t{{\n\t\t\"228988\"\n\t\t{{\n\t\t\t\"manifest\"\t\t\"1\"\n\t\t}}\n\t}}\n}}\n"
        )
    }

    #[test]
    fn state_flags() {
        let flags = StateFlags::new(1048576);
        assert!(flags.is_downloading());
        assert!(!flags.is_paused());
        assert_eq!(flags.status(), Status::Downloading);

        let flags = StateFlags::new(1048576 | 512 | 4);
        assert!(flags.is_downloading());
        assert_eq!(flags.status(), Status::Paused);

        assert!(!StateFlags::new(4).is_downloading());
        assert_eq!(Status::Paused.to_string(), "Paused");
    }

    #[test]
    fn from_block() {
        let block = steamrate_vdf::parse(r#""AppState" { "appid" "100" "name" "Test Game" "StateFlags" "1048576" }"#).unwrap();
        let app = AppManifest::from_block(&block, Path::new("/lib")).unwrap();

        assert_eq!(app.appid(), "100");
        assert_eq!(app.name(), "Test Game");
        assert!(app.state_flags().is_downloading());
        assert_eq!(app.download_dir(), Path::new("/lib/steamapps/downloading/100"));
    }

    #[test]
    fn defaults() {
        let block = steamrate_vdf::parse(r#""AppState" { "appid" "7" }"#).unwrap();
        let app = AppManifest::from_block(&block, Path::new("/lib")).unwrap();

        assert_eq!(app.name(), "Unknown");
        assert_eq!(app.state_flags(), StateFlags::default());
    }

    #[test]
    fn missing_fields() {
        let block = steamrate_vdf::parse(r#""AppState" { "name" "x" }"#).unwrap();
        assert!(matches!(
            AppManifest::from_block(&block, Path::new("/lib")),
            Err(SteamrateError::FieldMissing("appid"))
        ));

        let block = steamrate_vdf::parse(r#""appid" "7""#).unwrap();
        assert!(matches!(
            AppManifest::from_block(&block, Path::new("/lib")),
            Err(SteamrateError::FieldMissing("AppState"))
        ));
    }

    #[test]
    fn unparsable_flags() {
        let block = steamrate_vdf::parse(r#""AppState" { "appid" "7" "StateFlags" "lots" }"#).unwrap();
        match AppManifest::from_block(&block, Path::new("/lib")) {
            Err(SteamrateError::FieldUnparsable { field, value }) => {
                assert_eq!(field, "StateFlags");
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn manifest_names() {
        assert!(is_manifest(Path::new("appmanifest_100.acf")));
        assert!(is_manifest(Path::new("appmanifest_100.ACF")));
        assert!(!is_manifest(Path::new("appmanifest_100.acf.bak")));
        assert!(!is_manifest(Path::new("libraryfolders.vdf")));
        assert!(!is_manifest(Path::new("AppManifest_100.acf")));
    }

    #[test]
    fn discover_skips_bad_manifests() {
        let library = TempDir::new().unwrap();
        let steamapps = library.path().join("steamapps");
        fs::create_dir(&steamapps).unwrap();
        fs::write(steamapps.join("appmanifest_20.acf"), manifest("20", "Second", 4)).unwrap();
        fs::write(steamapps.join("appmanifest_10.acf"), manifest("10", "First", 1048576)).unwrap();
        fs::write(steamapps.join("appmanifest_30.acf"), "\"AppState\" { \"appid\" \"30\"").unwrap();
        fs::write(steamapps.join("appmanifest_40.acf"), manifest("40", "Bad", 4).replace("\"4\"", "\"x\"")).unwrap();
        fs::write(steamapps.join("libraryfolders.vdf"), "").unwrap();

        let libraries = [library.path().to_owned(), PathBuf::from("/does/not/exist")];
        let apps = discover(&libraries);
        let names = apps.iter().map(AppManifest::name).collect::<Vec<_>>();
        assert_eq!(names, ["First", "Second"]);
        assert_eq!(apps[0].library(), library.path());
    }
}
