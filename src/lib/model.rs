//! In-memory representation of a parsed translation file.
//!
//! Both the sections of a file and the lines of a section live in an
//! [`Entries`] collection: an insertion-ordered list that tolerates duplicate
//! keys and tags each entry with a [`Header`] so duplicates stay addressable.

use std::{collections::HashMap, fmt};

use crate::format::Format;

pub(crate) const ASSIGNMENT_OPERATOR: char = '=';

/// Identity of a line or a section inside its scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Header {
  /// Section title (brackets included) or translation key. Empty for blank lines.
  pub key: String,
  /// How many entries with the same key precede this one in the scope.
  pub occurrence_index: usize,
  /// 0-based order of the entry in its scope.
  pub position: usize,
}

impl Header {
  pub fn new(key: impl Into<String>, occurrence_index: usize, position: usize) -> Self {
    Self {
      key: key.into(),
      occurrence_index,
      position,
    }
  }

  pub fn is_duplicate(&self) -> bool {
    self.occurrence_index != 0
  }
}

impl fmt::Display for Header {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "[Key:{}|OccurrenceIndex:{}|Index:{}]",
      self.key, self.occurrence_index, self.position
    )
  }
}

/// Ordered, duplicate-tolerant map of `Header -> T`.
///
/// Positions are assigned densely from 0 on insertion, so lookup by position
/// is a plain index. A side table maps each key to the positions holding it,
/// in occurrence order.
#[derive(Debug, Clone, PartialEq)]
pub struct Entries<T> {
  items: Vec<(Header, T)>,
  positions_by_key: HashMap<String, Vec<usize>>,
}

impl<T> Default for Entries<T> {
  fn default() -> Self {
    Self {
      items: Vec::new(),
      positions_by_key: HashMap::new(),
    }
  }
}

impl<T> Entries<T> {
  pub fn new() -> Self {
    Self::default()
  }

  /// Appends `value` at the next position and returns the header it received.
  pub fn push(&mut self, key: impl Into<String>, value: T) -> &Header {
    let key = key.into();
    let position = self.items.len();
    let slots = self.positions_by_key.entry(key.clone()).or_default();
    let occurrence_index = slots.len();
    slots.push(position);

    self
      .items
      .push((Header::new(key, occurrence_index, position), value));
    &self.items[position].0
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn get(&self, position: usize) -> Option<&T> {
    self.items.get(position).map(|(_, value)| value)
  }

  /// Looks an entry up by its full identity. A header whose key or
  /// occurrence does not match the entry at its position finds nothing.
  pub fn get_by_header(&self, header: &Header) -> Option<&T> {
    self
      .items
      .get(header.position)
      .filter(|(stored, _)| stored == header)
      .map(|(_, value)| value)
  }

  /// Returns the `occurrence_index`-th entry registered under `key`.
  pub fn get_occurrence(&self, key: &str, occurrence_index: usize) -> Option<(&Header, &T)> {
    let position = *self.positions_by_key.get(key)?.get(occurrence_index)?;
    self.items.get(position).map(|(header, value)| (header, value))
  }

  pub fn first(&self, key: &str) -> Option<(&Header, &T)> {
    self.get_occurrence(key, 0)
  }

  pub fn contains_key(&self, key: &str) -> bool {
    self.positions_by_key.contains_key(key)
  }

  /// Every entry registered under `key`, in occurrence order.
  pub fn occurrences<'a>(
    &'a self,
    key: &str,
  ) -> impl Iterator<Item = (&'a Header, &'a T)> + use<'a, T> {
    self
      .positions_by_key
      .get(key)
      .into_iter()
      .flatten()
      .map(|&position| {
        let (header, value) = &self.items[position];
        (header, value)
      })
  }

  pub fn iter(&self) -> impl Iterator<Item = (&Header, &T)> {
    self.items.iter().map(|(header, value)| (header, value))
  }

  pub fn headers(&self) -> impl Iterator<Item = &Header> {
    self.items.iter().map(|(header, _)| header)
  }
}

/// One translatable entry, or a blank-line placeholder when the key is empty.
///
/// The comment covers every comment line sitting right above the entry,
/// joined by the line terminator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Line {
  pub translation_key: String,
  pub translated_value: String,
  pub comment: String,
}

impl Line {
  pub fn new(
    translation_key: impl Into<String>,
    translated_value: impl Into<String>,
    comment: impl Into<String>,
  ) -> Self {
    Self {
      translation_key: translation_key.into(),
      translated_value: translated_value.into(),
      comment: comment.into(),
    }
  }

  pub fn blank(comment: impl Into<String>) -> Self {
    Self::new("", "", comment)
  }

  pub fn is_blank(&self) -> bool {
    self.translation_key.is_empty()
  }

  /// Renders the line without its own trailing terminator.
  ///
  /// A blank line renders as its comment plus `eol`, or as nothing, so that
  /// the terminator the writer appends produces the empty line itself.
  pub fn display_string(&self, eol: &str) -> String {
    let mut out = String::new();
    if !self.comment.is_empty() {
      out.push_str(&self.comment);
      out.push_str(eol);
    }
    if !self.is_blank() {
      out.push_str(&self.translation_key);
      out.push(ASSIGNMENT_OPERATOR);
      out.push_str(&self.translated_value);
    }
    out
  }
}

impl fmt::Display for Line {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.display_string(Format::STEPMANIA.eol))
  }
}

/// A `[Title]` block and the lines under it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Section {
  /// Raw title line, brackets included.
  pub title: String,
  /// Comment block sitting right above the title.
  pub section_comment: String,
  /// Blank lines and comments after the last line, written verbatim.
  pub section_suffix: String,
  lines: Entries<Line>,
}

impl Section {
  pub fn new(title: impl Into<String>) -> Self {
    Self {
      title: title.into(),
      ..Default::default()
    }
  }

  /// Appends a line. Its occurrence index counts earlier lines with the
  /// same key; blank lines share the empty key.
  pub fn add_line(&mut self, line: Line) -> &Header {
    let key = line.translation_key.clone();
    self.lines.push(key, line)
  }

  pub fn add_empty_line(&mut self, comment: impl Into<String>) -> &Header {
    self.add_line(Line::blank(comment))
  }

  pub fn len(&self) -> usize {
    self.lines.len()
  }

  pub fn is_empty(&self) -> bool {
    self.lines.is_empty()
  }

  pub fn get(&self, position: usize) -> Option<&Line> {
    self.lines.get(position)
  }

  pub fn get_by_header(&self, header: &Header) -> Option<&Line> {
    self.lines.get_by_header(header)
  }

  pub fn first_by_key(&self, key: &str) -> Option<(&Header, &Line)> {
    self.lines.first(key)
  }

  pub fn contains_key(&self, key: &str) -> bool {
    self.lines.contains_key(key)
  }

  pub fn occurrences<'a>(
    &'a self,
    key: &str,
  ) -> impl Iterator<Item = (&'a Header, &'a Line)> + use<'a> {
    self.lines.occurrences(key)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&Header, &Line)> {
    self.lines.iter()
  }

  pub fn headers(&self) -> impl Iterator<Item = &Header> {
    self.lines.headers()
  }

  /// Translation keys, blank lines excluded, that occur more than once.
  pub fn duplicated_keys(&self) -> Vec<&str> {
    let mut keys: Vec<&str> = Vec::new();
    for header in self.headers() {
      if header.is_duplicate() && !header.key.is_empty() && !keys.contains(&header.key.as_str()) {
        keys.push(&header.key);
      }
    }
    keys
  }
}

/// A whole translation file: the free text before the first title, then
/// its sections in file order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedFile {
  /// Raw text preceding the first section title, terminators included.
  pub file_header: String,
  sections: Entries<Section>,
}

impl ParsedFile {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_header(file_header: impl Into<String>) -> Self {
    Self {
      file_header: file_header.into(),
      ..Default::default()
    }
  }

  /// Appends a section, keyed by its title.
  pub fn add_section(&mut self, section: Section) -> &Header {
    let key = section.title.clone();
    self.sections.push(key, section)
  }

  /// Number of sections. The file header does not count.
  pub fn len(&self) -> usize {
    self.sections.len()
  }

  pub fn is_empty(&self) -> bool {
    self.sections.is_empty()
  }

  pub fn get(&self, position: usize) -> Option<&Section> {
    self.sections.get(position)
  }

  pub fn get_by_header(&self, header: &Header) -> Option<&Section> {
    self.sections.get_by_header(header)
  }

  pub fn first_by_title(&self, title: &str) -> Option<(&Header, &Section)> {
    self.sections.first(title)
  }

  pub fn contains_title(&self, title: &str) -> bool {
    self.sections.contains_key(title)
  }

  pub fn occurrences<'a>(
    &'a self,
    title: &str,
  ) -> impl Iterator<Item = (&'a Header, &'a Section)> + use<'a> {
    self.sections.occurrences(title)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&Header, &Section)> {
    self.sections.iter()
  }

  pub fn headers(&self) -> impl Iterator<Item = &Header> {
    self.sections.headers()
  }
}
