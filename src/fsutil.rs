use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

/// Error that occurs when opening a file fails.
#[derive(Debug, thiserror::Error)]
#[error("failed to open file `{path}`: {source}")]
pub struct FileOpenError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Errors returned by [`read_json_file`].
#[derive(Debug, thiserror::Error)]
pub enum JsonFileError {
    #[error(transparent)]
    Open(#[from] FileOpenError),
    #[error("failed to decode json file `{path}`: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Opens a file at the given path and wraps it in a [`BufReader`].
///
/// # Errors
///
/// Returns a [`FileOpenError`] if the file cannot be opened.
///
/// # Example
/// ```no_run
/// # use creo_discovery::fsutil;
/// let reader = fsutil::open_file_reader("/etc/hosts")?;
/// # Ok::<(), fsutil::FileOpenError>(())
/// ```
pub fn open_file_reader(path: impl AsRef<Path>) -> Result<BufReader<File>, FileOpenError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| FileOpenError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file))
}

/// Opens and decodes a JSON document, e.g. a runtime's per-container state file.
///
/// # Errors
///
/// Returns [`JsonFileError::Open`] if the file cannot be opened and
/// [`JsonFileError::Decode`] if its content does not decode into `T`.
pub fn read_json_file<T>(path: impl AsRef<Path>) -> Result<T, JsonFileError>
where
    T: serde::de::DeserializeOwned,
{
    let path = path.as_ref();
    let reader = open_file_reader(path)?;
    serde_json::from_reader(reader).map_err(|source| JsonFileError::Decode {
        path: path.to_path_buf(),
        source,
    })
}
