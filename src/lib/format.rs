//! Dialect settings shared by the parser, the writer and the checkers.

/// Describes the textual conventions of a translation file.
///
/// `Format::default()` is the StepMania dialect: Unix line endings, `#`, `//`
/// and `;` comments, and `[Title]` section headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Format {
  /// Terminator written after every line of generated output.
  pub eol: &'static str,
  /// Prefix marking a section title line.
  pub title_prefix: &'static str,
  /// Prefixes marking a comment line, checked after leading whitespace is trimmed.
  pub comment_prefixes: &'static [&'static str],
  /// Appended to a source path to name generated output.
  pub generated_suffix: &'static str,
  /// Section holding language names in their own language, never translated.
  pub native_language_section: &'static str,
}

impl Format {
  pub const STEPMANIA: Format = Format {
    eol: "\n",
    title_prefix: "[",
    comment_prefixes: &["#", "//", ";"],
    generated_suffix: ".generated",
    native_language_section: "[NativeLanguageNames]",
  };

  pub fn is_title(&self, line: &str) -> bool {
    line.starts_with(self.title_prefix)
  }

  pub fn is_comment(&self, line: &str) -> bool {
    self
      .comment_prefixes
      .iter()
      .any(|prefix| line.starts_with(prefix))
  }
}

impl Default for Format {
  fn default() -> Self {
    Self::STEPMANIA
  }
}
