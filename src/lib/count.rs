//! Translation progress: how many reference lines the target translates.

use std::{fmt, path::Path};

#[cfg(feature = "tracing")]
use tracing::{debug, trace};

use crate::{
  format::Format,
  model::ParsedFile,
  parse::{FileParser, ParseError},
  validation::{self, ValidationError},
};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CountReport {
  /// Keyed lines in the reference, native language section excluded.
  pub total_lines: usize,
  /// Reference lines whose target value differs from the reference value.
  pub translated_lines: usize,
}

impl CountReport {
  /// Share of translated lines, rounded to two decimals.
  pub fn percentage(&self) -> f64 {
    if self.total_lines == 0 {
      return 0.0;
    }
    let raw = self.translated_lines as f64 * 100.0 / self.total_lines as f64;
    (raw * 100.0).round() / 100.0
  }
}

impl fmt::Display for CountReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "= Count Report =")?;
    writeln!(f)?;
    writeln!(f, "Found {} lines in the reference file.", self.total_lines)?;
    writeln!(
      f,
      "Found {} lines translated in the target file.",
      self.translated_lines
    )?;
    writeln!(f)?;
    writeln!(f, ">>>> {}% of lines translated <<<<", self.percentage())?;
    writeln!(f)?;
    writeln!(
      f,
      "Note: lines translated to the same text as the reference are counted as untranslated."
    )
  }
}

/// Counts how much of a reference file a target file translates.
#[derive(Debug, Clone, Default)]
pub struct LinesCounter {
  parser: FileParser,
}

impl LinesCounter {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_format(format: Format) -> Self {
    Self {
      parser: FileParser::with_format(format),
    }
  }

  pub fn run_analyzer<R: AsRef<Path>, T: AsRef<Path>>(
    &self,
    reference_path: R,
    target_path: T,
  ) -> Result<CountReport, CountError> {
    let reference_path = reference_path.as_ref();
    let target_path = target_path.as_ref();

    validation::validate_path(reference_path).map_err(CountError::InvalidReference)?;
    validation::validate_path(target_path).map_err(CountError::InvalidTarget)?;

    #[cfg(feature = "tracing")]
    debug!(?reference_path, ?target_path, "Counting translated lines");

    let reference = self
      .parser
      .parse_file(reference_path)
      .map_err(CountError::ReferenceParse)?;
    let target = self
      .parser
      .parse_file(target_path)
      .map_err(CountError::TargetParse)?;

    Ok(self.count(&reference, &target))
  }

  pub fn count(&self, reference: &ParsedFile, target: &ParsedFile) -> CountReport {
    let mut report = CountReport::default();

    for (header, reference_section) in reference.iter() {
      if header.key == self.parser.format().native_language_section {
        #[cfg(feature = "tracing")]
        trace!(section = %header.key, "Skipping native language section");
        continue;
      }

      let keyed = || reference_section.iter().filter(|(_, line)| !line.is_blank());
      report.total_lines += keyed().count();

      let Some((_, target_section)) = target.first_by_title(&header.key) else {
        continue;
      };

      report.translated_lines += keyed()
        .filter(|(_, line)| {
          target_section
            .first_by_key(&line.translation_key)
            .is_some_and(|(_, target_line)| target_line.translated_value != line.translated_value)
        })
        .count();
    }

    report
  }
}

#[derive(Debug, thiserror::Error)]
pub enum CountError {
  #[error("The provided reference file is wrong: {0}")]
  InvalidReference(ValidationError),
  #[error("The provided target file is wrong: {0}")]
  InvalidTarget(ValidationError),
  #[error("Reference file parse error: {0}")]
  ReferenceParse(ParseError),
  #[error("Target file parse error: {0}")]
  TargetParse(ParseError),
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parse(input: &str) -> ParsedFile {
    FileParser::new().parse_str(input).unwrap()
  }

  const REFERENCE: &str = "[Common]\nA=One\nB=Two\n\nC=Three\n\n[Menu]\nD=Four\n";

  #[test]
  fn test_fully_translated() {
    let target = parse("[Common]\nA=Un\nB=Deux\nC=Trois\n[Menu]\nD=Quatre\n");
    let report = LinesCounter::new().count(&parse(REFERENCE), &target);

    assert_eq!(report.total_lines, 4);
    assert_eq!(report.translated_lines, 4);
    assert_eq!(report.percentage(), 100.0);
  }

  #[test]
  fn test_partially_translated() {
    let target = parse("[Common]\nA=Un\nB=Two\n\n[Other]\nD=Quatre\n");
    let report = LinesCounter::new().count(&parse(REFERENCE), &target);

    assert_eq!(report.total_lines, 4);
    assert_eq!(report.translated_lines, 1);
    assert_eq!(report.percentage(), 25.0);
  }

  #[test]
  fn test_percentage_rounding() {
    let report = CountReport {
      total_lines: 7,
      translated_lines: 4,
    };
    assert_eq!(report.percentage(), 57.14);
    assert_eq!(CountReport::default().percentage(), 0.0);
  }

  #[test]
  fn test_native_language_section_is_skipped() {
    let reference = parse("[NativeLanguageNames]\nfr=Français\nja=日本語\n[Menu]\nD=Four\n");
    let target = parse("[NativeLanguageNames]\nfr=French\nja=Japanese\n[Menu]\nD=Quatre\n");
    let report = LinesCounter::new().count(&reference, &target);

    assert_eq!(report.total_lines, 1);
    assert_eq!(report.translated_lines, 1);
  }

  #[test]
  fn test_missing_files() {
    let result = LinesCounter::new().run_analyzer("missing-reference.ini", "missing-target.ini");
    assert!(matches!(result, Err(CountError::InvalidReference(_))));
  }
}
