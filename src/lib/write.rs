//! Serialization of a [`ParsedFile`] back to disk.
//!
//! Output is UTF-8 without a byte-order mark and always uses the format's
//! line terminator. A well-formed file that is parsed and written back comes
//! out byte for byte identical.

use std::{
  fmt,
  fs::OpenOptions,
  io::Write,
  path::{Path, PathBuf},
};

#[cfg(feature = "tracing")]
use tracing::debug;

use crate::{format::Format, model::ParsedFile};

#[derive(Debug, Clone, Default)]
pub struct FileWriter {
  format: Format,
}

impl FileWriter {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_format(format: Format) -> Self {
    Self { format }
  }

  pub fn render(&self, file: &ParsedFile) -> String {
    let eol = self.format.eol;
    let mut out = String::with_capacity(file.file_header.len());
    out.push_str(&file.file_header);

    for (_, section) in file.iter() {
      if !section.section_comment.is_empty() {
        out.push_str(&section.section_comment);
        out.push_str(eol);
      }
      out.push_str(&section.title);
      out.push_str(eol);
      for (_, line) in section.iter() {
        out.push_str(&line.display_string(eol));
        out.push_str(eol);
      }
      out.push_str(&section.section_suffix);
    }

    out
  }

  /// Writes `file` to `destination`, replacing any existing file.
  pub fn write<P: AsRef<Path>>(&self, file: &ParsedFile, destination: P) -> Result<(), WriteError> {
    self.write_with(file, destination.as_ref(), false)
  }

  /// Writes `file` to `destination`, refusing to touch an existing file.
  pub fn write_new<P: AsRef<Path>>(
    &self,
    file: &ParsedFile,
    destination: P,
  ) -> Result<(), WriteError> {
    self.write_with(file, destination.as_ref(), true)
  }

  fn write_with(
    &self,
    file: &ParsedFile,
    destination: &Path,
    create_new: bool,
  ) -> Result<(), WriteError> {
    let directory = match destination.parent() {
      Some(parent) if !parent.as_os_str().is_empty() => parent,
      _ => Path::new("."),
    };
    if !directory.is_dir() {
      return Err(WriteError::MissingDirectory(directory.to_path_buf()));
    }
    if create_new && destination.exists() {
      return Err(WriteError::AlreadyExists(destination.to_path_buf()));
    }

    #[cfg(feature = "tracing")]
    debug!(?destination, sections = file.len(), "Writing translation file");

    let content = self.render(file);

    let mut options = OpenOptions::new();
    options.write(true);
    if create_new {
      options.create_new(true);
    } else {
      options.create(true).truncate(true);
    }

    let mut handle = options.open(destination).map_err(|source| {
      if source.kind() == std::io::ErrorKind::AlreadyExists {
        WriteError::AlreadyExists(destination.to_path_buf())
      } else {
        WriteError::Io {
          path: destination.to_path_buf(),
          source,
        }
      }
    })?;

    handle
      .write_all(content.as_bytes())
      .map_err(|source| WriteError::Io {
        path: destination.to_path_buf(),
        source,
      })
  }
}

impl fmt::Display for ParsedFile {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&FileWriter::new().render(self))
  }
}

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
  #[error("Directory {0} doesn't exist")]
  MissingDirectory(PathBuf),
  #[error("File {0} already exists")]
  AlreadyExists(PathBuf),
  #[error("Could not write {path}: {source}")]
  Io {
    path: PathBuf,
    source: std::io::Error,
  },
}
