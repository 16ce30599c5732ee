
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use strum_macros::{EnumString, IntoStaticStr};

lazy_static! {
    /// Matches an `ID=` attribute inside a structured header line, e.g. `<ID=LowQual,...>`
    static ref LINE_ID_REGEX: Regex = Regex::new(r"[<,]ID=([-_.A-Za-z0-9]+)[>,]").unwrap();
}

/// Prefix on every meta-information line
pub const META_PREFIX: &str = "##";
/// Prefix on the column header line
pub const COLUMN_HEADER_PREFIX: &str = "#CHROM";
/// Prefix used for synthetic section names
const MISC_PREFIX: &str = "misc_";
/// Display name for the column header section
const COLUMN_NAMES_LABEL: &str = "COLUMN_NAMES";

/// The header sections that are always recognized by name.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, EnumString, IntoStaticStr)]
pub enum CanonicalSection {
    #[strum(serialize = "fileformat")]
    FileFormat,
    #[strum(serialize = "FILTER")]
    Filter,
    #[strum(serialize = "FORMAT")]
    Format,
    #[strum(serialize = "INFO")]
    Info,
    #[strum(serialize = "INDIVIDUAL")]
    Individual,
    #[strum(serialize = "SAMPLE")]
    Sample,
    #[strum(serialize = "contig")]
    Contig
}

impl CanonicalSection {
    /// Returns true if lines in this section are keyed by their `ID=` attribute
    pub fn is_id_bearing(&self) -> bool {
        !matches!(self, CanonicalSection::FileFormat)
    }

    /// The header key exactly as it appears in a file
    pub fn key(&self) -> &'static str {
        self.into()
    }
}

impl fmt::Display for CanonicalSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Logical section a header line belongs to.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum SectionName {
    /// One of the fixed, recognized sections
    Canonical(CanonicalSection),
    /// A run of unrecognized lines, numbered in order of discovery
    Misc(usize),
    /// The `#CHROM` line
    ColumnNames
}

impl SectionName {
    pub fn is_misc(&self) -> bool {
        matches!(self, SectionName::Misc(_))
    }

    /// Returns true if lines in this section are keyed by their `ID=` attribute
    pub fn is_id_bearing(&self) -> bool {
        match self {
            SectionName::Canonical(c) => c.is_id_bearing(),
            SectionName::Misc(_) |
            SectionName::ColumnNames => false
        }
    }
}

impl From<CanonicalSection> for SectionName {
    fn from(value: CanonicalSection) -> Self {
        SectionName::Canonical(value)
    }
}

impl fmt::Display for SectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionName::Canonical(c) => write!(f, "{c}"),
            SectionName::Misc(n) => write!(f, "{MISC_PREFIX}{n}"),
            SectionName::ColumnNames => write!(f, "{COLUMN_NAMES_LABEL}")
        }
    }
}

impl FromStr for SectionName {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == COLUMN_NAMES_LABEL {
            return Ok(SectionName::ColumnNames);
        }
        if let Some(number) = s.strip_prefix(MISC_PREFIX) {
            return Ok(SectionName::Misc(number.parse()?));
        }
        let canonical = CanonicalSection::from_str(s)
            .map_err(|_e| anyhow::anyhow!("Unrecognized section name: {s:?}"))?;
        Ok(SectionName::Canonical(canonical))
    }
}

/// Identifier of a single line within its section.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum LineId {
    /// Value of the `ID=` attribute
    Id(String),
    /// Zero-based position among the lines of a section that had no usable ID
    Counter(usize)
}

impl LineId {
    pub fn is_counter(&self) -> bool {
        matches!(self, LineId::Counter(_))
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineId::Id(id) => write!(f, "{id}"),
            LineId::Counter(c) => write!(f, "{c}")
        }
    }
}

impl From<&str> for LineId {
    fn from(value: &str) -> Self {
        LineId::Id(value.to_string())
    }
}

/// Extracts the `ID=` attribute of a structured header line, if there is a well-formed one
/// # Arguments
/// * `line` - the raw header line
pub fn extract_line_id(line: &str) -> Option<&str> {
    LINE_ID_REGEX.captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Tracks the current header section while scanning lines top-to-bottom.
/// This is the classifier that assigns section names and per-line identifiers.
#[derive(Debug, Default)]
pub struct SectionTracker {
    /// The section of the most recent run, None before the first line
    current_section: Option<SectionName>,
    /// Next number to hand out for a misc section
    misc_section_counter: usize,
    /// Next counter identifier inside the current section
    section_id_counter: usize
}

impl SectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Determines the section of a header line.
    /// Canonical keys are returned as-is, `#CHROM` is always `COLUMN_NAMES`, and anything else either continues the
    /// current misc section or opens a new one.
    /// # Arguments
    /// * `line` - the raw header line, including the leading `#` characters
    pub fn classify(&mut self, line: &str) -> SectionName {
        if line.starts_with(COLUMN_HEADER_PREFIX) {
            return SectionName::ColumnNames;
        }

        let body = line.get(META_PREFIX.len()..).unwrap_or_default();
        let candidate = body.split_once('=').map(|(k, _v)| k).unwrap_or(body);
        if let Ok(canonical) = CanonicalSection::from_str(candidate) {
            return SectionName::Canonical(canonical);
        }

        match self.current_section.as_ref() {
            Some(current) if current.is_misc() => current.clone(),
            _ => {
                let section = SectionName::Misc(self.misc_section_counter);
                self.misc_section_counter += 1;
                section
            }
        }
    }

    /// Returns an identifier for the line: the `ID=` attribute for ID-bearing sections, otherwise the next counter value.
    /// # Arguments
    /// * `line` - the raw header line
    /// * `section` - the section the line was assigned to
    pub fn line_id(&mut self, line: &str, section: &SectionName) -> LineId {
        match extract_line_id(line) {
            Some(id) if section.is_id_bearing() => LineId::Id(id.to_string()),
            _ => {
                let line_id = LineId::Counter(self.section_id_counter);
                self.section_id_counter += 1;
                line_id
            }
        }
    }

    /// Switches to a new section and resets the per-section counter
    pub fn update_section(&mut self, section: SectionName) {
        self.current_section = Some(section);
        self.section_id_counter = 0;
    }

    /// Returns true if `section` differs from the tracked one.
    /// The first call initializes the tracked section, so it never reports a change.
    pub fn section_changed(&mut self, section: &SectionName) -> bool {
        if self.current_section.is_none() {
            self.update_section(section.clone());
        }
        self.current_section.as_ref() != Some(section)
    }

    pub fn current_section(&self) -> Option<&SectionName> {
        self.current_section.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_sections() {
        let mut tracker = SectionTracker::new();
        assert_eq!(tracker.classify("##FILTER=<ID=a>"), SectionName::Canonical(CanonicalSection::Filter));
        assert_eq!(tracker.classify("##fileformat=VCFv4.2"), SectionName::Canonical(CanonicalSection::FileFormat));
        assert_eq!(tracker.classify("##contig=<ID=chr1>"), CanonicalSection::Contig.into());
        assert_eq!(tracker.classify("#CHROM\tPOS"), SectionName::ColumnNames);

        // none of these touched the misc counter
        assert_eq!(tracker.classify("##UNEXPECTED=1"), SectionName::Misc(0));
    }

    #[test]
    fn test_misc_continuation() {
        let mut tracker = SectionTracker::new();
        tracker.update_section(SectionName::Misc(0));
        assert_eq!(tracker.classify("##UNEXPECTED=1"), SectionName::Misc(0));
        assert_eq!(tracker.classify("##OTHER=1"), SectionName::Misc(0));
    }

    #[test]
    fn test_section_continuity() {
        let lines = [
            "##INFO=<ID=A>",
            "##FOO=bar",
            "##FOO=baz",
            "##INFO=<ID=B>",
            "##FOO=qux"
        ];
        let mut tracker = SectionTracker::new();
        let mut sections = vec![];
        for line in lines {
            let section = tracker.classify(line);
            if tracker.section_changed(&section) {
                tracker.update_section(section.clone());
            }
            sections.push(section.to_string());
        }
        assert_eq!(sections, vec!["INFO", "misc_0", "misc_0", "INFO", "misc_1"]);
    }

    #[test]
    fn test_line_ids() {
        let mut tracker = SectionTracker::new();
        let filter = SectionName::Canonical(CanonicalSection::Filter);
        let contig = SectionName::Canonical(CanonicalSection::Contig);
        assert_eq!(
            tracker.line_id("##FILTER=<ID=LowQual,Description=\"x\">", &filter),
            LineId::Id("LowQual".to_string())
        );
        assert_eq!(tracker.line_id("##contig=<ID=chr1,length=100>", &contig), LineId::from("chr1"));

        // no ID, or a section that ignores IDs
        assert_eq!(tracker.line_id("##FILTER=<>", &filter), LineId::Counter(0));
        assert_eq!(tracker.line_id("##FILTER=<ID=,Description=\"x\">", &filter), LineId::Counter(1));
        tracker.update_section(SectionName::Misc(0));
        assert_eq!(tracker.line_id("##gdcWorkflow=<ID=abc>", &SectionName::Misc(0)), LineId::Counter(0));
    }

    #[test]
    fn test_section_changed_initializes() {
        let mut tracker = SectionTracker::new();
        assert!(tracker.current_section().is_none());
        let info = SectionName::Canonical(CanonicalSection::Info);
        assert!(!tracker.section_changed(&info));
        assert_eq!(tracker.current_section(), Some(&info));
        assert!(tracker.section_changed(&SectionName::Misc(0)));
    }

    #[test]
    fn test_section_name_parsing() {
        assert_eq!("misc_12".parse::<SectionName>().unwrap(), SectionName::Misc(12));
        assert_eq!("COLUMN_NAMES".parse::<SectionName>().unwrap(), SectionName::ColumnNames);
        assert_eq!("SAMPLE".parse::<SectionName>().unwrap(), CanonicalSection::Sample.into());
        assert!("sample".parse::<SectionName>().is_err());
        assert_eq!(SectionName::Misc(3).to_string(), "misc_3");
    }
}
