//! Path checks run before any file is parsed.

use std::{
  ffi::OsString,
  path::{Path, PathBuf},
};

/// Fails unless `path` points to an existing regular file.
pub fn validate_path<P: AsRef<Path>>(path: P) -> Result<(), ValidationError> {
  let path = path.as_ref();
  if path.is_file() {
    Ok(())
  } else {
    Err(ValidationError::FileNotFound(path.to_path_buf()))
  }
}

/// Absolute form of `path`, with symlinks and `..` resolved.
pub fn canonicalize_path<P: AsRef<Path>>(path: P) -> Result<PathBuf, ValidationError> {
  let path = path.as_ref();
  std::fs::canonicalize(path).map_err(|source| ValidationError::Canonicalize {
    path: path.to_path_buf(),
    source,
  })
}

/// `path` with `suffix` appended to its file name, e.g. `fr.ini.generated`.
pub fn generated_path<P: AsRef<Path>>(path: P, suffix: &str) -> PathBuf {
  let mut name = OsString::from(path.as_ref().as_os_str());
  name.push(suffix);
  PathBuf::from(name)
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
  #[error("The file {0} doesn't exist")]
  FileNotFound(PathBuf),
  #[error("Could not resolve {path}: {source}")]
  Canonicalize {
    path: PathBuf,
    source: std::io::Error,
  },
}
