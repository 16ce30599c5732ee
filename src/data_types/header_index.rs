
use indexmap::IndexMap;
use itertools::Itertools;
use log::warn;
use rustc_hash::FxHashSet;
use std::fmt;

use crate::data_types::header_section::{extract_line_id, CanonicalSection, LineId, SectionName, SectionTracker, META_PREFIX};
use crate::data_types::record::FORMAT;

/// Errors raised while interpreting a header
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum HeaderError {
    #[error("header has no #CHROM column line")]
    MissingColumnHeader,
    #[error("expected samples {}, found columns {}", .expected.join(", "), .found.join(", "))]
    MissingColumns { expected: Vec<String>, found: Vec<String> }
}

/// A single raw header line with its derived location.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HeaderLine {
    /// Raw text, no trailing newline
    text: String,
    /// Section the line was classified into
    section: SectionName,
    /// Identifier within the section
    id: LineId
}

impl HeaderLine {
    pub fn new(text: String, section: SectionName, id: LineId) -> Self {
        Self { text, section, id }
    }

    /// Builds `##{key}=<k=v,...>` from an ordered attribute map; values are written verbatim
    pub fn from_structured(key: &str, attributes: &IndexMap<String, String>) -> String {
        let body = attributes.iter()
            .map(|(k, v)| format!("{k}={v}"))
            .join(",");
        format!("{META_PREFIX}{key}=<{body}>")
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn section(&self) -> &SectionName {
        &self.section
    }

    pub fn id(&self) -> &LineId {
        &self.id
    }

    /// Text between `##` and the first `=`, None for the column line
    pub fn key(&self) -> Option<&str> {
        let body = self.text.strip_prefix(META_PREFIX)?;
        Some(body.split_once('=').map(|(k, _v)| k).unwrap_or(body))
    }

    /// Everything after the first `=`
    pub fn value(&self) -> Option<&str> {
        self.text.strip_prefix(META_PREFIX)?
            .split_once('=')
            .map(|(_k, v)| v)
    }

    /// Parses a `<K=V,...>` value into an ordered map.
    /// Commas inside double quotes do not split, and quotes are kept as part of the value.
    pub fn structured(&self) -> Option<IndexMap<String, String>> {
        let inner = self.value()?
            .strip_prefix('<')?
            .strip_suffix('>')?;

        let mut attributes = IndexMap::new();
        let mut in_quotes = false;
        let mut start = 0;
        let mut pieces = vec![];
        for (i, c) in inner.char_indices() {
            match c {
                '"' => in_quotes = !in_quotes,
                ',' if !in_quotes => {
                    pieces.push(&inner[start..i]);
                    start = i + 1;
                },
                _ => {}
            }
        }
        pieces.push(&inner[start..]);

        for piece in pieces.into_iter().filter(|p| !p.is_empty()) {
            let (k, v) = piece.split_once('=').unwrap_or((piece, ""));
            attributes.insert(k.to_string(), v.to_string());
        }
        Some(attributes)
    }
}

/// All lines belonging to one logical section, keyed by line identifier.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Section {
    lines: IndexMap<LineId, HeaderLine>
}

impl Section {
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn get(&self, id: &LineId) -> Option<&HeaderLine> {
        self.lines.get(id)
    }

    pub fn contains(&self, id: &LineId) -> bool {
        self.lines.contains_key(id)
    }

    /// Lines in serialization order.
    /// Purely counter-keyed sections sort numerically, anything with a real ID sorts by the string form of every key.
    pub fn ordered_lines(&self) -> Vec<&HeaderLine> {
        if self.lines.keys().all(|k| k.is_counter()) {
            self.lines.values()
                .sorted_by_key(|l| match l.id() {
                    LineId::Counter(c) => *c,
                    LineId::Id(_) => usize::MAX
                })
                .collect()
        } else {
            self.lines.values()
                .sorted_by_key(|l| l.id().to_string())
                .collect()
        }
    }

    /// Next free counter id
    fn next_counter(&self) -> usize {
        self.lines.keys()
            .filter_map(|k| match k {
                LineId::Counter(c) => Some(*c + 1),
                LineId::Id(_) => None
            })
            .max()
            .unwrap_or(0)
    }

    fn insert(&mut self, line: HeaderLine) -> Option<HeaderLine> {
        self.lines.insert(line.id().clone(), line)
    }
}

/// Ordered collection of header sections.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct HeaderIndex {
    sections: IndexMap<SectionName, Section>
}

impl HeaderIndex {
    /// Builds the index from every header line, including the `#CHROM` line.
    /// Consecutive lines with the same classification form a run; runs sharing a name are merged in arrival order.
    /// # Arguments
    /// * `lines` - raw header lines without newline terminators
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>
    {
        let mut tracker = SectionTracker::new();
        let mut runs: Vec<(SectionName, Vec<String>)> = vec![];
        let mut current_run: Vec<String> = vec![];
        let mut current_name: Option<SectionName> = None;

        for line in lines.into_iter() {
            let line: String = line.into();
            let section = tracker.classify(&line);
            if tracker.section_changed(&section) {
                if let Some(name) = current_name.take() {
                    runs.push((name, std::mem::take(&mut current_run)));
                }
                tracker.update_section(section.clone());
            }
            current_name = Some(section);
            current_run.push(line);
        }
        if let Some(name) = current_name {
            runs.push((name, current_run));
        }

        // same-named runs that were not adjacent are concatenated in arrival order
        let mut merged: IndexMap<SectionName, Vec<String>> = IndexMap::new();
        for (name, run_lines) in runs.into_iter() {
            merged.entry(name).or_default().extend(run_lines);
        }

        let mut id_tracker = SectionTracker::new();
        let mut sections = IndexMap::new();
        for (name, section_lines) in merged.into_iter() {
            id_tracker.update_section(name.clone());
            let mut section = Section::default();
            for text in section_lines.into_iter() {
                let id = id_tracker.line_id(&text, &name);
                if let Some(previous) = section.insert(HeaderLine::new(text, name.clone(), id)) {
                    warn!("Duplicate header ID {} in section {}, keeping the later line", previous.id(), name);
                }
            }
            sections.insert(name, section);
        }

        Self { sections }
    }

    pub fn sections(&self) -> impl Iterator<Item = (&SectionName, &Section)> {
        self.sections.iter()
    }

    pub fn section(&self, name: &SectionName) -> Option<&Section> {
        self.sections.get(name)
    }

    pub fn contains_section(&self, name: &SectionName) -> bool {
        self.sections.contains_key(name)
    }

    pub fn get_line(&self, name: &SectionName, id: &LineId) -> Option<&HeaderLine> {
        self.sections.get(name)?.get(id)
    }

    /// Every line in output order: sections in order, lines sorted within each section
    pub fn header_lines(&self) -> impl Iterator<Item = &HeaderLine> {
        self.sections.values()
            .flat_map(|s| s.ordered_lines())
    }

    /// Adds a line to a section, deriving its identifier the same way the builder does.
    /// An existing line with the same identifier is replaced in place.
    /// Missing sections are created immediately before the column line.
    /// Returns the identifier the line was stored under.
    pub fn insert_line(&mut self, name: &SectionName, text: impl Into<String>) -> LineId {
        let text: String = text.into();
        let section = self.section_entry(name);
        let id = match extract_line_id(&text) {
            Some(id) if name.is_id_bearing() => LineId::Id(id.to_string()),
            _ => LineId::Counter(section.next_counter())
        };
        section.insert(HeaderLine::new(text, name.clone(), id.clone()));
        id
    }

    /// Swaps the text of an existing line, keeping its identifier.
    /// Returns the previous line, or None (and inserts nothing) if the identifier was not present.
    pub fn replace_line(&mut self, name: &SectionName, id: &LineId, text: impl Into<String>) -> Option<HeaderLine> {
        let section = self.sections.get_mut(name)?;
        if !section.contains(id) {
            return None;
        }
        section.insert(HeaderLine::new(text.into(), name.clone(), id.clone()))
    }

    pub fn remove_line(&mut self, name: &SectionName, id: &LineId) -> Option<HeaderLine> {
        self.sections.get_mut(name)?
            .lines
            .shift_remove(id)
    }

    /// Keeps only the lines matching the predicate; sections left empty are dropped
    pub fn retain_lines<F>(&mut self, mut predicate: F)
    where
        F: FnMut(&HeaderLine) -> bool
    {
        for section in self.sections.values_mut() {
            section.lines.retain(|_k, line| predicate(line));
        }
        self.sections.retain(|_k, section| !section.is_empty());
    }

    /// Allocates the next misc section name that is not already in use; the section itself is not created
    pub fn new_misc_section(&self) -> SectionName {
        let next = self.sections.keys()
            .filter_map(|k| match k {
                SectionName::Misc(n) => Some(*n + 1),
                _ => None
            })
            .max()
            .unwrap_or(0);
        SectionName::Misc(next)
    }

    /// Creates an empty section positioned right after `anchor`.
    /// If the anchor does not exist the section goes before the column line instead.
    /// Existing sections are left where they are.
    pub fn insert_section_after(&mut self, anchor: &SectionName, name: SectionName) {
        if self.sections.contains_key(&name) {
            return;
        }
        match self.sections.get_index_of(anchor) {
            Some(index) => {
                self.sections.shift_insert(index + 1, name, Section::default());
            },
            None => {
                self.section_entry(&name);
            }
        }
    }

    /// Adds `##FILTER=<ID={id},Description="{description}">`
    pub fn declare_filter(&mut self, id: &str, description: &str) -> LineId {
        self.insert_line(
            &CanonicalSection::Filter.into(),
            format!("{META_PREFIX}FILTER=<ID={id},Description=\"{description}\">")
        )
    }

    /// Adds an `##INFO` definition
    pub fn declare_info(&mut self, id: &str, number: &str, value_type: &str, description: &str) -> LineId {
        self.insert_line(
            &CanonicalSection::Info.into(),
            format!("{META_PREFIX}INFO=<ID={id},Number={number},Type={value_type},Description=\"{description}\">")
        )
    }

    /// Adds a `##FORMAT` definition
    pub fn declare_format(&mut self, id: &str, number: &str, value_type: &str, description: &str) -> LineId {
        self.insert_line(
            &CanonicalSection::Format.into(),
            format!("{META_PREFIX}FORMAT=<ID={id},Number={number},Type={value_type},Description=\"{description}\">")
        )
    }

    /// IDs declared in the contig section
    pub fn contig_names(&self) -> Vec<&str> {
        self.section_ids(CanonicalSection::Contig)
    }

    /// IDs declared in the FILTER section
    pub fn filter_ids(&self) -> FxHashSet<&str> {
        self.section_ids(CanonicalSection::Filter).into_iter().collect()
    }

    fn section_ids(&self, canonical: CanonicalSection) -> Vec<&str> {
        match self.sections.get(&SectionName::Canonical(canonical)) {
            Some(section) => section.lines.keys()
                .filter_map(|k| match k {
                    LineId::Id(id) => Some(id.as_str()),
                    LineId::Counter(_) => None
                })
                .collect(),
            None => vec![]
        }
    }

    /// Column names from the `#CHROM` line, without the leading `#`
    pub fn column_names(&self) -> Result<Vec<String>, HeaderError> {
        let line = self.sections.get(&SectionName::ColumnNames)
            .and_then(|s| s.lines.values().next())
            .ok_or(HeaderError::MissingColumnHeader)?;
        Ok(line.text()
            .trim_start_matches('#')
            .split('\t')
            .map(String::from)
            .collect())
    }

    /// Sample columns, i.e. everything after FORMAT
    pub fn sample_names(&self) -> Result<Vec<String>, HeaderError> {
        let columns = self.column_names()?;
        Ok(match columns.iter().position(|c| c == FORMAT) {
            Some(index) => columns[index + 1..].to_vec(),
            None => vec![]
        })
    }

    /// Verifies that every expected sample is a column
    pub fn require_samples(&self, expected: &[&str]) -> Result<(), HeaderError> {
        let found = self.sample_names()?;
        if expected.iter().all(|e| found.iter().any(|f| f == e)) {
            Ok(())
        } else {
            Err(HeaderError::MissingColumns {
                expected: expected.iter().map(|e| e.to_string()).collect(),
                found
            })
        }
    }

    /// Returns the section, creating it before the column line when absent
    fn section_entry(&mut self, name: &SectionName) -> &mut Section {
        let index = match self.sections.get_index_of(name) {
            Some(i) => i,
            None => {
                let index = match self.sections.get_index_of(&SectionName::ColumnNames) {
                    Some(i) if *name != SectionName::ColumnNames => i,
                    _ => self.sections.len()
                };
                self.sections.shift_insert(index, name.clone(), Section::default());
                index
            }
        };
        &mut self.sections[index]
    }
}

impl fmt::Display for HeaderIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.header_lines() {
            writeln!(f, "{}", line.text())?;
        }
        Ok(())
    }
}
