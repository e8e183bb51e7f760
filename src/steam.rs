use std::fs::File;
use std::path::{Path, PathBuf};
use log::{info, warn};
use steamrate_vdf::{Block, Value};
use crate::error::SteamrateError;
use crate::existing_directory::ExistingDirectory;

/// Where `libraryfolders.vdf` lives, relative to the steam root.
/// Newer clients keep it in `steamapps`, older ones in `config`.
static LIBRARYFOLDERS_VDF: [&str; 2] = ["steamapps/libraryfolders.vdf", "config/libraryfolders.vdf"];

/// Directories that may hold a steam installation, most likely first.
///
/// An explicitly configured root is the only candidate when given.
#[must_use]
pub fn steam_root_candidates(configured: Option<&Path>) -> Vec<PathBuf> {
    if let Some(root) = configured {
        return vec![root.to_owned()];
    }

    let mut candidates = Vec::new();
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".steam/root"));
        candidates.push(home.join(".steam/steam"));
        candidates.push(home.join(".local/share/Steam"));
        candidates.push(home.join(".var/app/com.valvesoftware.Steam/.local/share/Steam"));
        candidates.push(home.join("Library/Application Support/Steam"));
    }

    if cfg!(windows) {
        candidates.push(PathBuf::from(r"C:\Program Files (x86)\Steam"));
        candidates.push(PathBuf::from(r"C:\Program Files\Steam"));
    }

    candidates
}

pub fn find_steam_root(candidates: &[PathBuf]) -> Result<ExistingDirectory, SteamrateError> {
    candidates
        .iter()
        .find_map(|path| ExistingDirectory::try_from(path.clone()).ok())
        .ok_or(SteamrateError::SteamNotFound)
}

pub fn libraryfolders_vdf(root: &ExistingDirectory) -> Result<PathBuf, SteamrateError> {
    LIBRARYFOLDERS_VDF
        .iter()
        .map(|relative| root.path().join(relative))
        .find(|path| path.is_file())
        .ok_or_else(|| SteamrateError::LibraryFoldersNotFound(root.path().to_owned()))
}

/// Read and parse a manifest or `.vdf` file.
pub fn read_vdf(path: &Path) -> Result<Block, SteamrateError> {
    let mut file = File::open(path)?;
    steamrate_vdf::from_reader(&mut file).map_err(|source| SteamrateError::Manifest {
        path: path.to_owned(),
        source,
    })
}

// Library paths are written with doubled backslashes on windows
fn library_path(raw: &str) -> PathBuf {
    PathBuf::from(raw.replace(r"\\", r"\"))
}

/// Every library root: the steam root itself, each numbered entry of
/// `libraryfolders`, then `extra`. Duplicates keep their first position.
#[must_use]
pub fn library_roots(root: &Path, libraryfolders: &Block, extra: &[PathBuf]) -> Vec<PathBuf> {
    let mut roots = vec![root.to_owned()];

    match libraryfolders.get_block("libraryfolders") {
        Some(folders) => {
            for (key, value) in folders.iter() {
                if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
                    continue;
                }

                // Old clients store the path directly under the number
                let path = match value {
                    Value::Block(folder) => folder.get_str("path"),
                    Value::Leaf(path) => Some(path.as_str()),
                };

                if let Some(path) = path {
                    roots.push(library_path(path));
                }
            }
        }
        None => warn!("libraryfolders.vdf has no \"libraryfolders\" block"),
    }

    roots.extend(extra.iter().cloned());

    let mut unique = Vec::with_capacity(roots.len());
    for root in roots {
        if !unique.contains(&root) {
            unique.push(root);
        }
    }

    unique
}

/// Locate steam among `candidates` and list its library roots.
///
/// Both failures are fatal to a monitoring run: without a steam root or its
/// `libraryfolders.vdf` there is nothing to watch.
pub fn discover_libraries(candidates: &[PathBuf], extra: &[PathBuf]) -> Result<Vec<PathBuf>, SteamrateError> {
    let root = find_steam_root(candidates)?;
    info!("Found steam at {root}");

    let vdf = libraryfolders_vdf(&root)?;
    let libraryfolders = read_vdf(&vdf)?;
    let roots = library_roots(root.path(), &libraryfolders, extra);
    for library in &roots {
        info!("Library: {}", library.display());
    }

    Ok(roots)
}
