//! Translation file synchronization.
//!
//! Compares a reference file (usually the English one) against a target
//! (a translation) and rewrites the target to match the reference's structure.
//!
//! # Sync Logic
//!
//! The synchronized file:
//! 1. Follows the reference's section order, and drops target-only sections
//! 2. Copies sections missing from the target straight from the reference
//! 3. For sections whose keys differ, walks the reference lines:
//!    - keys known by the target keep the target line (value and comment)
//!    - new keys take the reference line
//!    - blank lines follow the reference
//!    - target-only keys are dropped
//! 4. Keeps every other section exactly as the target has it
//! 5. Keeps the target's file header
//!
//! Sections and keys are matched by name only: when names repeat, the first
//! occurrence is the one used. Repeated reference sections are ignored by both
//! the comparison and the synchronized file.
//!
//! # Examples
//!
//! ```rust,no_run
//! use section_sync::sync::FileSynchronizer;
//!
//! let mut synchronizer = FileSynchronizer::new();
//! let report = synchronizer.run_analyzer("en.ini", "fr.ini").unwrap();
//! println!("{}", report);
//!
//! if let Some(path) = synchronizer.synchronize_file().unwrap() {
//!     println!("Synchronized file written to {}", path.display());
//! }
//! ```

use std::{
  fmt,
  path::{Path, PathBuf},
};

#[cfg(feature = "tracing")]
use tracing::{debug, info, trace};

use crate::{
  format::Format,
  model::{Line, ParsedFile, Section},
  parse::{FileParser, ParseError},
  validation::{self, ValidationError},
  write::{FileWriter, WriteError},
};

/// Differences between a reference file and a target file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChangesReport {
  pub reference_path: PathBuf,
  pub target_path: PathBuf,
  /// Sections in the reference but not in the target.
  pub new_sections: Vec<String>,
  /// Sections in the target but not in the reference.
  pub deleted_sections: Vec<String>,
  /// `(section title, key)` pairs in the reference but not in the target.
  pub new_lines: Vec<(String, String)>,
  /// `(section title, key)` pairs in the target but not in the reference.
  pub deleted_lines: Vec<(String, String)>,
}

impl ChangesReport {
  pub fn issues_found(&self) -> bool {
    !self.new_sections.is_empty()
      || !self.deleted_sections.is_empty()
      || !self.new_lines.is_empty()
      || !self.deleted_lines.is_empty()
  }

  fn section_changed(&self, title: &str) -> bool {
    self
      .new_lines
      .iter()
      .chain(&self.deleted_lines)
      .any(|(section, _)| section == title)
  }
}

impl fmt::Display for ChangesReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fn sections(f: &mut fmt::Formatter<'_>, items: &[String], empty: &str) -> fmt::Result {
      if items.is_empty() {
        writeln!(f, "{}", empty)?;
      }
      for item in items {
        writeln!(f, "{}", item)?;
      }
      Ok(())
    }

    fn lines(f: &mut fmt::Formatter<'_>, items: &[(String, String)], empty: &str) -> fmt::Result {
      if items.is_empty() {
        writeln!(f, "{}", empty)?;
      }
      for (section, key) in items {
        writeln!(f, "{}::{}", section, key)?;
      }
      Ok(())
    }

    writeln!(f, "= Changes Report =")?;
    writeln!(f)?;

    writeln!(f, "== New section(s) available in reference but absent in target ==")?;
    sections(f, &self.new_sections, "Nothing missing :)")?;
    writeln!(f, "== Deleted section(s) in reference but still in target ==")?;
    sections(f, &self.deleted_sections, "No deletion found :)")?;
    writeln!(f)?;

    writeln!(f, "== New line(s) available in reference but absent in target ==")?;
    lines(f, &self.new_lines, "Nothing missing :)")?;
    writeln!(f, "== Deleted line(s) in reference but still in target ==")?;
    lines(f, &self.deleted_lines, "No deletion found :)")?;
    writeln!(f)
  }
}

struct Analysis {
  report: ChangesReport,
  reference: ParsedFile,
  target: ParsedFile,
}

/// Compares two files and can write a synchronized copy of the target.
///
/// The synchronizer remembers its last comparison, which `synchronize_file`
/// works from.
#[derive(Default)]
pub struct FileSynchronizer {
  parser: FileParser,
  writer: FileWriter,
  analysis: Option<Analysis>,
}

impl FileSynchronizer {
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

  pub fn report(&self) -> Option<&ChangesReport> {
    self.analysis.as_ref().map(|analysis| &analysis.report)
  }

  pub fn reference(&self) -> Option<&ParsedFile> {
    self.analysis.as_ref().map(|analysis| &analysis.reference)
  }

  pub fn target(&self) -> Option<&ParsedFile> {
    self.analysis.as_ref().map(|analysis| &analysis.target)
  }

  /// Parses both files and lists their differences. Never modifies either file.
  pub fn run_analyzer<R: AsRef<Path>, T: AsRef<Path>>(
    &mut self,
    reference_path: R,
    target_path: T,
  ) -> Result<&ChangesReport, SyncError> {
    let reference_path = reference_path.as_ref();
    let target_path = target_path.as_ref();
    self.analysis = None;

    validation::validate_path(reference_path).map_err(SyncError::InvalidReference)?;
    validation::validate_path(target_path).map_err(SyncError::InvalidTarget)?;
    let reference_path =
      validation::canonicalize_path(reference_path).map_err(SyncError::InvalidReference)?;
    let target_path =
      validation::canonicalize_path(target_path).map_err(SyncError::InvalidTarget)?;

    #[cfg(feature = "tracing")]
    info!(?reference_path, ?target_path, "Comparing files");

    let reference = self
      .parser
      .parse_file(&reference_path)
      .map_err(SyncError::ReferenceParse)?;
    let target = self
      .parser
      .parse_file(&target_path)
      .map_err(SyncError::TargetParse)?;

    let mut report = Self::compare(&reference, &target);
    report.reference_path = reference_path;
    report.target_path = target_path;

    #[cfg(feature = "tracing")]
    debug!(
      new_sections = report.new_sections.len(),
      deleted_sections = report.deleted_sections.len(),
      new_lines = report.new_lines.len(),
      deleted_lines = report.deleted_lines.len(),
      "Comparison done"
    );

    let analysis = self.analysis.insert(Analysis {
      report,
      reference,
      target,
    });
    Ok(&analysis.report)
  }

  /// Writes the synchronized target to `<target>.generated` and returns its path.
  ///
  /// Returns `None` when the last comparison found no difference.
  pub fn synchronize_file(&self) -> Result<Option<PathBuf>, SyncError> {
    let analysis = self.analysis.as_ref().ok_or(SyncError::NotAnalyzed)?;
    if !analysis.report.issues_found() {
      return Ok(None);
    }

    let destination = validation::generated_path(
      &analysis.report.target_path,
      self.parser.format().generated_suffix,
    );
    if destination.exists() {
      return Err(WriteError::AlreadyExists(destination).into());
    }

    let synchronized = Self::synchronize(&analysis.reference, &analysis.target, &analysis.report);
    self.writer.write_new(&synchronized, &destination)?;

    #[cfg(feature = "tracing")]
    info!(?destination, "Wrote synchronized file");

    Ok(Some(destination))
  }

  /// Lists sections and keys present on one side only. Paths are left empty.
  pub fn compare(reference: &ParsedFile, target: &ParsedFile) -> ChangesReport {
    let mut report = ChangesReport::default();

    for (header, reference_section) in reference.iter() {
      if header.is_duplicate() {
        continue;
      }

      let title = &reference_section.title;
      let Some((_, target_section)) = target.first_by_title(title) else {
        push_unique(&mut report.new_sections, title.clone());
        continue;
      };

      for key in keys_missing_from(reference_section, target_section) {
        push_unique(&mut report.new_lines, (title.clone(), key));
      }
      for key in keys_missing_from(target_section, reference_section) {
        push_unique(&mut report.deleted_lines, (title.clone(), key));
      }
    }

    for (_, target_section) in target.iter() {
      if !reference.contains_title(&target_section.title) {
        push_unique(&mut report.deleted_sections, target_section.title.clone());
      }
    }

    report
  }

  /// Builds the synchronized version of `target` described in the module docs.
  pub fn synchronize(
    reference: &ParsedFile,
    target: &ParsedFile,
    report: &ChangesReport,
  ) -> ParsedFile {
    let mut result = ParsedFile::with_header(target.file_header.clone());

    for (header, reference_section) in reference.iter() {
      if header.is_duplicate() {
        continue;
      }

      let section = match target.first_by_title(&reference_section.title) {
        None => {
          #[cfg(feature = "tracing")]
          trace!(title = %reference_section.title, "Adding new section");
          reference_section.clone()
        }
        Some((_, target_section)) if report.section_changed(&reference_section.title) => {
          #[cfg(feature = "tracing")]
          trace!(title = %reference_section.title, "Rebuilding section");
          Self::synchronize_section(reference_section, target_section)
        }
        Some((_, target_section)) => target_section.clone(),
      };
      result.add_section(section);
    }

    result
  }

  fn synchronize_section(reference: &Section, target: &Section) -> Section {
    let mut section = Section::new(target.title.clone());
    section.section_comment = target.section_comment.clone();
    section.section_suffix = target.section_suffix.clone();

    for (_, line) in reference.iter() {
      if line.is_blank() {
        section.add_line(Line::blank(line.comment.clone()));
        continue;
      }

      let kept = target
        .first_by_key(&line.translation_key)
        .map_or(line, |(_, target_line)| target_line);
      section.add_line(kept.clone());
    }

    section
  }
}

fn keys_missing_from(source: &Section, other: &Section) -> Vec<String> {
  source
    .iter()
    .filter(|(_, line)| !line.is_blank() && !other.contains_key(&line.translation_key))
    .map(|(_, line)| line.translation_key.clone())
    .collect()
}

fn push_unique<T: PartialEq>(items: &mut Vec<T>, item: T) {
  if !items.contains(&item) {
    items.push(item);
  }
}

/// Errors that can occur while comparing or synchronizing files.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
  /// The reference file failed validation
  #[error("The provided reference file is wrong: {0}")]
  InvalidReference(ValidationError),
  /// The target file failed validation
  #[error("The provided target file is wrong: {0}")]
  InvalidTarget(ValidationError),
  /// `synchronize_file` was called before `run_analyzer`
  #[error("Report is empty, please run the analyzer first")]
  NotAnalyzed,
  /// Error parsing the reference file
  #[error("Reference file parse error: {0}")]
  ReferenceParse(ParseError),
  /// Error parsing the target file
  #[error("Target file parse error: {0}")]
  TargetParse(ParseError),
  /// Error writing the synchronized file
  #[error("Write error: {0}")]
  Write(#[from] WriteError),
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parse(input: &str) -> ParsedFile {
    FileParser::new().parse_str(input).unwrap()
  }

  const TARGET: &str = "[Common]\nYes=Oui\nNo=Non\n\n[OptionNames]\nFast=Rapide\nSlow=Lent\n";

  #[test]
  fn test_compare_new_section() {
    let reference = parse(
      "[Common]\nYes=Yes\nNo=No\n\n[OptionNames]\nFast=Fast\nSlow=Slow\n\n[NewSection]\nA=1\n",
    );
    let report = FileSynchronizer::compare(&reference, &parse(TARGET));

    assert_eq!(report.new_sections, vec!["[NewSection]"]);
    assert!(report.deleted_sections.is_empty());
    assert!(report.new_lines.is_empty());
    assert!(report.deleted_lines.is_empty());
    assert!(report.issues_found());
  }

  #[test]
  fn test_compare_deleted_section() {
    let reference = parse("[Common]\nYes=Yes\nNo=No\n");
    let report = FileSynchronizer::compare(&reference, &parse(TARGET));

    assert_eq!(report.deleted_sections, vec!["[OptionNames]"]);
    assert!(report.new_sections.is_empty());
    assert!(report.new_lines.is_empty());
    assert!(report.deleted_lines.is_empty());
  }

  #[test]
  fn test_compare_new_and_deleted_lines() {
    let reference = parse("[Common]\nYes=Yes\nNo=No\n\n[OptionNames]\nFast=Fast\nExtra=Extra\n");
    let report = FileSynchronizer::compare(&reference, &parse(TARGET));

    assert_eq!(
      report.new_lines,
      vec![("[OptionNames]".to_string(), "Extra".to_string())]
    );
    assert_eq!(
      report.deleted_lines,
      vec![("[OptionNames]".to_string(), "Slow".to_string())]
    );
    assert!(report.new_sections.is_empty());
    assert!(report.deleted_sections.is_empty());
  }

  #[test]
  fn test_compare_ignores_blank_lines_and_values() {
    let reference = parse("[Common]\n\nYes=Yes\n\n\nNo=No\n\n[OptionNames]\nFast=x\nSlow=y\n");
    let report = FileSynchronizer::compare(&reference, &parse(TARGET));
    assert!(!report.issues_found());
  }

  #[test]
  fn test_synchronize_keeps_translations() {
    let reference = parse(
      "[Common]\nYes=Yes\n\nMaybe=Maybe\nNo=No\n\n[OptionNames]\nFast=Fast\nSlow=Slow\n",
    );
    let target = parse("# fr banner\n[Common]\n# polite\nYes=Oui\nNo=Non\nOld=Vieux\n\n[OptionNames]\nFast=Rapide\nSlow=Lent\n\n");
    let report = FileSynchronizer::compare(&reference, &target);
    let synchronized = FileSynchronizer::synchronize(&reference, &target, &report);

    assert_eq!(
      synchronized.to_string(),
      "# fr banner\n[Common]\n# polite\nYes=Oui\n\nMaybe=Maybe\nNo=Non\n\n[OptionNames]\nFast=Rapide\nSlow=Lent\n\n"
    );
  }

  #[test]
  fn test_synchronize_follows_reference_order() {
    let reference = parse("[B]\nb=1\n[New]\nn=1\n[A]\na=1\n");
    let target = parse("[A]\na=translated\n[Gone]\ng=1\n[B]\nb=translated\n");
    let report = FileSynchronizer::compare(&reference, &target);
    let synchronized = FileSynchronizer::synchronize(&reference, &target, &report);

    assert_eq!(
      synchronized.to_string(),
      "[B]\nb=translated\n[New]\nn=1\n[A]\na=translated\n"
    );
    let positions: Vec<_> = synchronized.headers().map(|h| h.position).collect();
    assert_eq!(positions, vec![0, 1, 2]);
  }

  #[test]
  fn test_synchronized_file_matches_reference() {
    let reference = parse("[Common]\nA=1\nB=2\n\n[Extra]\nC=3\n");
    let target = parse("[Common]\nB=deux\nZ=old\n\n[Old]\nD=4\n");
    let report = FileSynchronizer::compare(&reference, &target);
    let synchronized = FileSynchronizer::synchronize(&reference, &target, &report);
    let synchronized = parse(&synchronized.to_string());

    assert!(!FileSynchronizer::compare(&reference, &synchronized).issues_found());
  }

  #[test]
  fn test_repeated_reference_section_is_ignored() {
    let reference = parse("[X]\na=1\nd=1\n[Y]\nb=1\n[X]\nc=1\n");
    let target = parse("[X]\na=A\n[Y]\nb=B\n");
    let report = FileSynchronizer::compare(&reference, &target);

    assert!(report.new_sections.is_empty());
    assert_eq!(report.new_lines, vec![("[X]".to_string(), "d".to_string())]);
    assert!(report.deleted_lines.is_empty());

    let synchronized = FileSynchronizer::synchronize(&reference, &target, &report);
    assert_eq!(synchronized.to_string(), "[X]\na=A\nd=1\n[Y]\nb=B\n");

    let synchronized = parse(&synchronized.to_string());
    assert!(!FileSynchronizer::compare(&reference, &synchronized).issues_found());
  }

  #[test]
  fn test_repeated_reference_section_alone_reports_nothing() {
    let reference = parse("[X]\na=1\n[Y]\nb=1\n[X]\nc=1\n");
    let target = parse("[X]\na=A\n[Y]\nb=B\n");

    assert!(!FileSynchronizer::compare(&reference, &target).issues_found());
  }

  #[test]
  fn test_synchronize_file_before_analysis() {
    let synchronizer = FileSynchronizer::new();
    assert!(matches!(
      synchronizer.synchronize_file(),
      Err(SyncError::NotAnalyzed)
    ));
  }

  #[test]
  fn test_run_analyzer_names_the_failing_side() {
    let mut synchronizer = FileSynchronizer::new();
    let result = synchronizer.run_analyzer("missing-reference.ini", "missing-target.ini");
    assert!(matches!(result, Err(SyncError::InvalidReference(_))));
  }

  #[test]
  fn test_report_display() {
    let report = ChangesReport {
      new_sections: vec!["[NewSection]".to_string()],
      deleted_lines: vec![("[Common]".to_string(), "Old".to_string())],
      ..Default::default()
    };
    let rendered = report.to_string();

    assert!(rendered.starts_with("= Changes Report =\n"));
    assert!(rendered.contains("[NewSection]\n"));
    assert!(rendered.contains("No deletion found :)\n"));
    assert!(rendered.contains("[Common]::Old\n"));
  }
}
