//! Detection and removal of duplicated sections and translation keys.
//!
//! Duplicates are legal in the format but almost always a mistake: the game
//! only ever reads one of them. [`DuplicatesChecker::remove_duplicates`]
//! writes a cleaned copy next to the analyzed file:
//!
//! - a section that appears several times is kept at its first position and
//!   receives the lines of every occurrence, in file order;
//! - a key that appears several times in a section keeps its first line;
//! - everything else is copied untouched, comments included.

use std::{
  fmt,
  path::{Path, PathBuf},
};

#[cfg(feature = "tracing")]
use tracing::{debug, info};

use crate::{
  format::Format,
  model::{ParsedFile, Section},
  parse::{FileParser, ParseError},
  validation::{self, ValidationError},
  write::{FileWriter, WriteError},
};

/// What a duplicates analysis found in a file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DuplicatesReport {
  /// Absolute path of the analyzed file.
  pub file_path: PathBuf,
  /// Titles of sections appearing more than once.
  pub duplicated_sections: Vec<String>,
  /// `(section title, translation key)` pairs appearing more than once.
  pub duplicated_lines: Vec<(String, String)>,
}

impl DuplicatesReport {
  pub fn issues_found(&self) -> bool {
    !self.duplicated_sections.is_empty() || !self.duplicated_lines.is_empty()
  }
}

impl fmt::Display for DuplicatesReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "= Duplicates Report =")?;
    writeln!(f)?;

    writeln!(f, "== Duplicated Section(s) Found ==")?;
    if self.duplicated_sections.is_empty() {
      writeln!(f, "No duplicate found !")?;
    }
    for section in &self.duplicated_sections {
      writeln!(f, "{}", section)?;
    }
    writeln!(f)?;

    writeln!(f, "== Duplicated Line(s) Found ==")?;
    if self.duplicated_lines.is_empty() {
      writeln!(f, "No duplicate found !")?;
    }
    for (section, key) in &self.duplicated_lines {
      writeln!(f, "{}::{}", section, key)?;
    }
    writeln!(f)
  }
}

struct Analysis {
  report: DuplicatesReport,
  file: ParsedFile,
}

/// Finds duplicates in one file and can write a de-duplicated copy of it.
///
/// The checker remembers its last analysis, which `remove_duplicates` works from.
#[derive(Default)]
pub struct DuplicatesChecker {
  parser: FileParser,
  writer: FileWriter,
  analysis: Option<Analysis>,
}

impl DuplicatesChecker {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_format(format: Format) -> Self {
    Self {
      parser: FileParser::with_format(format.clone()),
      writer: FileWriter::with_format(format),
      analysis: None,
    }
  }

  pub fn report(&self) -> Option<&DuplicatesReport> {
    self.analysis.as_ref().map(|analysis| &analysis.report)
  }

  pub fn parsed_file(&self) -> Option<&ParsedFile> {
    self.analysis.as_ref().map(|analysis| &analysis.file)
  }

  /// Parses `path` and lists its duplicates. Never modifies the file.
  pub fn run_analyzer<P: AsRef<Path>>(
    &mut self,
    path: P,
  ) -> Result<&DuplicatesReport, DuplicatesError> {
    let path = path.as_ref();
    self.analysis = None;
    validation::validate_path(path).map_err(DuplicatesError::InvalidFile)?;
    let file_path = validation::canonicalize_path(path).map_err(DuplicatesError::InvalidFile)?;

    #[cfg(feature = "tracing")]
    info!(?file_path, "Checking for duplicates");

    let file = self.parser.parse_file(&file_path)?;
    let mut report = Self::analyze(&file);
    report.file_path = file_path;

    #[cfg(feature = "tracing")]
    debug!(
      sections = report.duplicated_sections.len(),
      lines = report.duplicated_lines.len(),
      "Duplicates analysis done"
    );

    let analysis = self.analysis.insert(Analysis { report, file });
    Ok(&analysis.report)
  }

  /// Writes the de-duplicated file to `<path>.generated` and returns its path.
  ///
  /// Returns `None` when the last analysis found nothing to remove.
  pub fn remove_duplicates(&self) -> Result<Option<PathBuf>, DuplicatesError> {
    let analysis = self.analysis.as_ref().ok_or(DuplicatesError::NotAnalyzed)?;
    if !analysis.report.issues_found() {
      return Ok(None);
    }

    let destination = validation::generated_path(
      &analysis.report.file_path,
      self.parser.format().generated_suffix,
    );
    if destination.exists() {
      return Err(WriteError::AlreadyExists(destination).into());
    }

    let deduplicated = Self::deduplicate(&analysis.file);
    self.writer.write_new(&deduplicated, &destination)?;

    #[cfg(feature = "tracing")]
    info!(?destination, "Wrote de-duplicated file");

    Ok(Some(destination))
  }

  /// Lists duplicated section titles and duplicated keys of `file`.
  /// The report's `file_path` is left empty.
  pub fn analyze(file: &ParsedFile) -> DuplicatesReport {
    let mut report = DuplicatesReport::default();

    for (header, section) in file.iter() {
      if header.is_duplicate() && !report.duplicated_sections.contains(&section.title) {
        report.duplicated_sections.push(section.title.clone());
      }

      for key in section.duplicated_keys() {
        let pair = (section.title.clone(), key.to_string());
        if !report.duplicated_lines.contains(&pair) {
          report.duplicated_lines.push(pair);
        }
      }
    }

    report
  }

  /// Builds a copy of `file` with every duplicated section merged into its
  /// first occurrence and every duplicated key reduced to its first line.
  pub fn deduplicate(file: &ParsedFile) -> ParsedFile {
    let mut result = ParsedFile::with_header(file.file_header.clone());

    for (header, section) in file.iter() {
      if header.is_duplicate() {
        #[cfg(feature = "tracing")]
        debug!(%header, "Dropping repeated section");
        continue;
      }

      let occurrences: Vec<&Section> = file
        .occurrences(&header.key)
        .map(|(_, section)| section)
        .collect();

      if occurrences.len() == 1 && section.duplicated_keys().is_empty() {
        result.add_section(section.clone());
      } else {
        result.add_section(Self::merge_occurrences(&occurrences));
      }
    }

    result
  }

  fn merge_occurrences(occurrences: &[&Section]) -> Section {
    let first = occurrences[0];
    let mut merged = Section::new(first.title.clone());
    merged.section_comment = first.section_comment.clone();
    merged.section_suffix = first.section_suffix.clone();

    for (index, occurrence) in occurrences.iter().enumerate() {
      for (_, line) in occurrence.iter() {
        let keep = if line.is_blank() {
          index == 0
        } else {
          !merged.contains_key(&line.translation_key)
        };
        if keep {
          merged.add_line(line.clone());
        }
      }
    }

    merged
  }
}

#[derive(Debug, thiserror::Error)]
pub enum DuplicatesError {
  #[error("Error while checking for duplicates: {0}")]
  InvalidFile(ValidationError),
  #[error("Report is empty, please run the analyzer first")]
  NotAnalyzed,
  #[error("Error while checking for duplicates: {0}")]
  Parse(#[from] ParseError),
  #[error("Could not write the de-duplicated file: {0}")]
  Write(#[from] WriteError),
}
