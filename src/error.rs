use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SteamrateError {
    #[error("could not find a steam installation")]
    SteamNotFound,

    #[error("library folders file not found under \"{0:?}\"")]
    LibraryFoldersNotFound(PathBuf),

    #[error("failed to parse \"{path:?}\"")]
    Manifest {
        path: PathBuf,
        #[source]
        source: steamrate_vdf::Error,
    },

    #[error("manifest has no \"{0}\" field")]
    FieldMissing(&'static str),

    #[error("manifest field \"{field}\" has unusable value \"{value}\"")]
    FieldUnparsable { field: &'static str, value: String },

    #[error("the path is not a directory")]
    NotADirectory(PathBuf),

    #[error("the directory \"{0:?}\" could not found")]
    DirectoryNotFound(PathBuf),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("IO Error")]
    IOError(#[from] io::Error),
}
