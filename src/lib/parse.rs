use std::{
  mem,
  path::{Path, PathBuf},
};

#[cfg(feature = "tracing")]
use tracing::{debug, trace};

use crate::{
  format::Format,
  model::{ASSIGNMENT_OPERATOR, Line, ParsedFile, Section},
};

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Turns the raw lines of one section into a [`Section`].
///
/// Comments left over after a section's last line belong to whatever comes
/// next, so [`SectionParser::parse_section`] takes the comment carried over
/// from the previous call and hands back the one it leaves behind.
#[derive(Debug, Clone, Default)]
pub struct SectionParser {
  format: Format,
}

impl SectionParser {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_format(format: Format) -> Self {
    Self { format }
  }

  /// Parses a block starting with (or containing) a title line.
  ///
  /// `carried_comment` becomes the section comment. The returned string is
  /// the comment still pending once every line was read.
  ///
  /// Trailing blank lines are not stored as lines: they go to the section
  /// suffix so the gap before the next title is written back unchanged.
  pub fn parse_section<S: AsRef<str>>(
    &self,
    lines: &[S],
    carried_comment: String,
  ) -> Result<(Section, String), ParseError> {
    if lines.is_empty() {
      return Err(ParseError::EmptySection);
    }

    let title_index = lines
      .iter()
      .position(|line| self.format.is_title(line.as_ref()))
      .ok_or(ParseError::MissingTitle)?;

    let mut section = Section::new(lines[title_index].as_ref());
    section.section_comment = carried_comment;

    #[cfg(feature = "tracing")]
    trace!(title = %section.title, "Parsing section");

    let mut comment = String::new();
    let mut pending_blanks = Vec::new();

    for raw in &lines[title_index + 1..] {
      let line = raw.as_ref().trim_start();

      if line.is_empty() {
        pending_blanks.push(Line::blank(mem::take(&mut comment)));
        continue;
      }

      if self.format.is_comment(line) {
        if !comment.is_empty() {
          comment.push_str(self.format.eol);
        }
        comment.push_str(line);
        continue;
      }

      match line.split_once(ASSIGNMENT_OPERATOR) {
        Some((key, value)) if !key.is_empty() => {
          for blank in pending_blanks.drain(..) {
            section.add_line(blank);
          }
          section.add_line(Line::new(key, value, mem::take(&mut comment)));
        }
        _ => {
          #[cfg(feature = "tracing")]
          debug!(title = %section.title, line, "Dropping malformed line");
        }
      }
    }

    for blank in pending_blanks {
      section
        .section_suffix
        .push_str(&blank.display_string(self.format.eol));
      section.section_suffix.push_str(self.format.eol);
    }

    #[cfg(feature = "tracing")]
    trace!(
      title = %section.title,
      lines = section.len(),
      has_leftover_comment = !comment.is_empty(),
      "Parsed section"
    );

    Ok((section, comment))
  }
}

/// Splits a whole file into its header text and sections.
#[derive(Debug, Clone, Default)]
pub struct FileParser {
  format: Format,
}

impl FileParser {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_format(format: Format) -> Self {
    Self { format }
  }

  pub fn format(&self) -> &Format {
    &self.format
  }

  pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<ParsedFile, ParseError> {
    let path = path.as_ref();

    #[cfg(feature = "tracing")]
    debug!(?path, "Reading translation file");

    let content = std::fs::read_to_string(path).map_err(|source| ParseError::Read {
      path: path.to_path_buf(),
      source,
    })?;

    self.parse_str(&content)
  }

  pub fn parse_str(&self, content: &str) -> Result<ParsedFile, ParseError> {
    let content = content.strip_prefix(BYTE_ORDER_MARK).unwrap_or(content);
    let lines: Vec<&str> = content.lines().collect();
    self.process_file_into_sections(&lines)
  }

  /// Builds a [`ParsedFile`] out of already split lines.
  ///
  /// Everything before the first title is kept verbatim as the file header.
  /// A file without any title therefore has no sections at all.
  pub fn process_file_into_sections<S: AsRef<str>>(
    &self,
    lines: &[S],
  ) -> Result<ParsedFile, ParseError> {
    #[cfg(feature = "tracing")]
    debug!("Parsing translation file with {} lines", lines.len());

    let first_title = lines
      .iter()
      .position(|line| self.format.is_title(line.as_ref()))
      .unwrap_or(lines.len());

    let mut file_header = String::new();
    for line in &lines[..first_title] {
      file_header.push_str(line.as_ref());
      file_header.push_str(self.format.eol);
    }
    let mut file = ParsedFile::with_header(file_header);

    let section_parser = SectionParser::with_format(self.format.clone());
    let mut carried_comment = String::new();
    let mut previous: Option<Section> = None;
    let mut start = first_title;

    while start < lines.len() {
      let end = lines[start + 1..]
        .iter()
        .position(|line| self.format.is_title(line.as_ref()))
        .map_or(lines.len(), |offset| start + 1 + offset);

      let (section, leftover) =
        section_parser.parse_section(&lines[start..end], mem::take(&mut carried_comment))?;
      carried_comment = leftover;

      if let Some(done) = previous.replace(section) {
        file.add_section(done);
      }
      start = end;
    }

    if let Some(mut last) = previous {
      if !carried_comment.is_empty() {
        last.section_suffix.push_str(&carried_comment);
        last.section_suffix.push_str(self.format.eol);
      }
      file.add_section(last);
    }

    #[cfg(feature = "tracing")]
    debug!("Parsed {} sections", file.len());

    Ok(file)
  }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
  #[error("Tried to parse a section but no lines were provided")]
  EmptySection,
  #[error("Tried to parse a section but no section title was found")]
  MissingTitle,
  #[error("Could not read {path}: {source}")]
  Read {
    path: PathBuf,
    source: std::io::Error,
  },
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::Header;

  fn parse(input: &str) -> ParsedFile {
    FileParser::new().parse_str(input).unwrap()
  }

  #[test]
  fn test_parse_section_simple() {
    let lines = ["[Common]", "Yes=Oui", "No=Non"];
    let (section, leftover) = SectionParser::new()
      .parse_section(&lines, String::new())
      .unwrap();

    assert_eq!(section.title, "[Common]");
    assert_eq!(section.len(), 2);
    assert_eq!(section.get(0), Some(&Line::new("Yes", "Oui", "")));
    assert_eq!(section.get(1), Some(&Line::new("No", "Non", "")));
    assert_eq!(section.section_suffix, "");
    assert_eq!(leftover, "");
  }

  #[test]
  fn test_parse_section_rejects_empty_input() {
    let lines: [&str; 0] = [];
    let result = SectionParser::new().parse_section(&lines, String::new());
    assert!(matches!(result, Err(ParseError::EmptySection)));
  }

  #[test]
  fn test_parse_section_requires_title() {
    let lines = ["Yes=Oui", "No=Non"];
    let result = SectionParser::new().parse_section(&lines, String::new());
    assert!(matches!(result, Err(ParseError::MissingTitle)));
  }

  #[test]
  fn test_parse_section_skips_lines_before_title() {
    let lines = ["garbage", "[Common]", "Yes=Oui"];
    let (section, _) = SectionParser::new()
      .parse_section(&lines, String::new())
      .unwrap();

    assert_eq!(section.title, "[Common]");
    assert_eq!(section.len(), 1);
  }

  #[test]
  fn test_parse_section_comment_prefixes() {
    let lines = [
      "[Common]",
      "# hash comment",
      "First=1",
      "// slash comment",
      "Second=2",
      "; semicolon comment",
      "  # indented",
      "Third=3",
    ];
    let (section, _) = SectionParser::new()
      .parse_section(&lines, String::new())
      .unwrap();

    assert_eq!(section.len(), 3);
    assert_eq!(section.get(0).unwrap().comment, "# hash comment");
    assert_eq!(section.get(1).unwrap().comment, "// slash comment");
    assert_eq!(
      section.get(2).unwrap().comment,
      "; semicolon comment\n# indented"
    );
  }

  #[test]
  fn test_parse_section_value_keeps_equal_signs() {
    let lines = ["[Common]", "Formula=a=b=c", "  Indented=value "];
    let (section, _) = SectionParser::new()
      .parse_section(&lines, String::new())
      .unwrap();

    assert_eq!(section.get(0), Some(&Line::new("Formula", "a=b=c", "")));
    assert_eq!(section.get(1), Some(&Line::new("Indented", "value ", "")));
  }

  #[test]
  fn test_parse_section_drops_malformed_lines() {
    let lines = ["[Common]", "no equals sign", "=no key", "Valid=1"];
    let (section, _) = SectionParser::new()
      .parse_section(&lines, String::new())
      .unwrap();

    assert_eq!(section.len(), 1);
    assert_eq!(section.get(0), Some(&Line::new("Valid", "1", "")));
  }

  #[test]
  fn test_parse_section_blank_lines() {
    let lines = ["[Common]", "A=1", "", "# about B", "B=2", "   ", "C=3", "", ""];
    let (section, _) = SectionParser::new()
      .parse_section(&lines, String::new())
      .unwrap();

    let headers: Vec<_> = section.headers().cloned().collect();
    assert_eq!(
      headers,
      vec![
        Header::new("A", 0, 0),
        Header::new("", 0, 1),
        Header::new("B", 0, 2),
        Header::new("", 1, 3),
        Header::new("C", 0, 4),
      ]
    );
    assert_eq!(section.get(2).unwrap().comment, "# about B");
    assert_eq!(section.section_suffix, "\n\n");
  }

  #[test]
  fn test_parse_section_comment_on_blank_line() {
    let lines = ["[Common]", "A=1", "# detached", "", "B=2"];
    let (section, _) = SectionParser::new()
      .parse_section(&lines, String::new())
      .unwrap();

    assert_eq!(section.get(1), Some(&Line::blank("# detached")));
    assert_eq!(section.get(2), Some(&Line::new("B", "2", "")));
  }

  #[test]
  fn test_parse_section_threads_leftover_comment() {
    let parser = SectionParser::new();

    let first = ["[First]", "A=1", "", "# About the second section"];
    let (first_section, leftover) = parser.parse_section(&first, String::new()).unwrap();
    assert_eq!(first_section.section_suffix, "\n");
    assert_eq!(leftover, "# About the second section");

    let second = ["[Second]", "B=2"];
    let (second_section, leftover) = parser.parse_section(&second, leftover).unwrap();
    assert_eq!(second_section.section_comment, "# About the second section");
    assert_eq!(leftover, "");
  }

  #[test]
  fn test_parse_empty_file() {
    let lines: Vec<String> = Vec::new();
    let file = FileParser::new()
      .process_file_into_sections(&lines)
      .unwrap();

    assert!(file.is_empty());
    assert_eq!(file.file_header, "");
  }

  #[test]
  fn test_parse_file_without_title() {
    let file = parse("Yes=Oui\n# comment\nNo=Non\n");

    assert!(file.is_empty());
    assert_eq!(file.len(), 0);
    assert_eq!(file.file_header, "Yes=Oui\n# comment\nNo=Non\n");
  }

  #[test]
  fn test_parse_file_header() {
    let file = parse("// Language pack v2\n\n// Maintained by volunteers\n\n[Common]\nYes=Oui\n");

    assert_eq!(
      file.file_header,
      "// Language pack v2\n\n// Maintained by volunteers\n\n"
    );
    assert_eq!(file.len(), 1);
  }

  #[test]
  fn test_parse_file_sections_and_suffixes() {
    let input = "[Common]\nA=1\nB=2\n\n[Screen]\nC=3\n\n[Last]\nD=4\n";
    let file = parse(input);

    assert_eq!(file.len(), 3);
    for (header, section) in file.iter() {
      assert_eq!(header.key, section.title);
    }
    assert_eq!(file.get(0).unwrap().len(), 2);
    assert_eq!(file.get(0).unwrap().section_suffix, "\n");
    assert_eq!(file.get(1).unwrap().len(), 1);
    assert_eq!(file.get(1).unwrap().section_suffix, "\n");
    assert_eq!(file.get(2).unwrap().len(), 1);
    assert_eq!(file.get(2).unwrap().section_suffix, "");
  }

  #[test]
  fn test_parse_file_section_comment() {
    let input = "[First]\nA=1\n\n# Time to manage each screen's options\n[Second]\nHelpText=Back\n# Trailing note\n\n";
    let file = parse(input);

    let second = file.get(1).unwrap();
    assert_eq!(second.section_comment, "# Time to manage each screen's options");
    assert_eq!(second.get(0), Some(&Line::new("HelpText", "Back", "")));
    assert_eq!(second.section_suffix, "# Trailing note\n\n");
  }

  #[test]
  fn test_parse_file_keeps_trailing_comment() {
    let file = parse("[Only]\nA=1\n# last words\n");
    assert_eq!(file.get(0).unwrap().section_suffix, "# last words\n");
  }

  #[test]
  fn test_parse_file_duplicate_sections() {
    let file = parse("[A]\nX=1\n[B]\nY=2\n[A]\nZ=3\n");

    let headers: Vec<_> = file.headers().cloned().collect();
    assert_eq!(
      headers,
      vec![
        Header::new("[A]", 0, 0),
        Header::new("[B]", 0, 1),
        Header::new("[A]", 1, 2),
      ]
    );
  }

  #[test]
  fn test_parse_file_strips_byte_order_mark_and_crlf() {
    let file = parse("\u{feff}[Common]\r\nYes=Oui\r\n");

    assert_eq!(file.file_header, "");
    assert_eq!(file.get(0).unwrap().title, "[Common]");
    assert_eq!(file.get(0).unwrap().get(0), Some(&Line::new("Yes", "Oui", "")));
  }

  #[test]
  fn test_parse_missing_file() {
    let result = FileParser::new().parse_file("definitely/not/here.ini");
    assert!(matches!(result, Err(ParseError::Read { .. })));
  }
}
