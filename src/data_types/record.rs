
use itertools::Itertools;
use std::sync::Arc;

/// Fixed VCF column names, in file order
pub const CHROM: &str = "CHROM";
pub const POS: &str = "POS";
pub const ID: &str = "ID";
pub const REF: &str = "REF";
pub const ALT: &str = "ALT";
pub const QUAL: &str = "QUAL";
pub const FILTER: &str = "FILTER";
pub const INFO: &str = "INFO";
pub const FORMAT: &str = "FORMAT";

/// The eight mandatory columns of a sites-only VCF
pub const SITE_COLUMNS: [&str; 8] = [CHROM, POS, ID, REF, ALT, QUAL, FILTER, INFO];

/// Placeholder for an empty VCF field
pub const MISSING_VALUE: &str = ".";
/// Filter value for records that passed everything
pub const PASS_FILTER: &str = "PASS";

/// Errors tied to field access on a single record
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum RecordError {
    #[error("record is missing field {name} (found {found} of {expected} columns)")]
    MissingField { name: String, found: usize, expected: usize },
    #[error("column {name} is not present in the column header")]
    UnknownColumn { name: String },
    #[error("record has {found} fields but the column header has {expected}")]
    ColumnCountMismatch { found: usize, expected: usize },
    #[error("sample {sample} has no value for FORMAT key {key}")]
    MissingFormatKey { sample: String, key: String },
    #[error("INFO is missing key {key}: {info}")]
    MissingInfoKey { key: String, info: String },
    #[error("invalid {name} value: {value:?}")]
    InvalidValue { name: String, value: String }
}

/// One data line, split into positional values against a shared column list.
/// Values are only ever changed through [`Record::replace`], which builds a new record.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
    columns: Arc<Vec<String>>,
    values: Vec<String>
}

impl Record {
    /// Splits a data line on tabs and zips it with the columns.
    /// Short lines are accepted here and only fail once a missing field is accessed.
    /// # Arguments
    /// * `line` - a data line with no newline terminator
    /// * `columns` - column names from the `#CHROM` line
    pub fn decode(line: &str, columns: &Arc<Vec<String>>) -> Self {
        Self {
            columns: columns.clone(),
            values: line.split('\t').map(String::from).collect()
        }
    }

    /// Builds a record from explicit values, requiring one value per column
    pub fn from_values(columns: &Arc<Vec<String>>, values: Vec<String>) -> Result<Self, RecordError> {
        if values.len() != columns.len() {
            return Err(RecordError::ColumnCountMismatch { found: values.len(), expected: columns.len() });
        }
        Ok(Self {
            columns: columns.clone(),
            values
        })
    }

    /// Joins the values back into a tab-delimited line.
    /// An unmodified record encodes to exactly the line it was decoded from.
    pub fn encode(&self) -> Result<String, RecordError> {
        if self.values.len() != self.columns.len() {
            return Err(RecordError::ColumnCountMismatch { found: self.values.len(), expected: self.columns.len() });
        }
        Ok(self.values.iter().join("\t"))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Position of a column in the column list
    pub fn column_index(&self, name: &str) -> Result<usize, RecordError> {
        self.columns.iter()
            .position(|c| c == name)
            .ok_or_else(|| RecordError::UnknownColumn { name: name.to_string() })
    }

    /// Value of a named field
    pub fn get(&self, name: &str) -> Result<&str, RecordError> {
        let index = self.column_index(name)?;
        self.values.get(index)
            .map(|v| v.as_str())
            .ok_or_else(|| RecordError::MissingField {
                name: name.to_string(),
                found: self.values.len(),
                expected: self.columns.len()
            })
    }

    /// Returns a new record with the given fields substituted; the original is untouched.
    /// # Errors
    /// * if a name is not a column, or refers to a field past the end of a short line
    pub fn replace<'a, I, V>(&self, overrides: I) -> Result<Self, RecordError>
    where
        I: IntoIterator<Item = (&'a str, V)>,
        V: Into<String>
    {
        let mut values = self.values.clone();
        for (name, value) in overrides.into_iter() {
            let index = self.column_index(name)?;
            let slot = values.get_mut(index)
                .ok_or_else(|| RecordError::MissingField {
                    name: name.to_string(),
                    found: self.values.len(),
                    expected: self.columns.len()
                })?;
            *slot = value.into();
        }
        Ok(Self {
            columns: self.columns.clone(),
            values
        })
    }

    pub fn chrom(&self) -> Result<&str, RecordError> {
        self.get(CHROM)
    }

    /// POS as a 1-based coordinate
    pub fn pos(&self) -> Result<u64, RecordError> {
        let value = self.get(POS)?;
        value.parse()
            .map_err(|_e| RecordError::InvalidValue { name: POS.to_string(), value: value.to_string() })
    }

    pub fn ref_allele(&self) -> Result<&str, RecordError> {
        self.get(REF)
    }

    /// ALT alleles, empty when the field is `.`
    pub fn alt_alleles(&self) -> Result<Vec<&str>, RecordError> {
        let alt = self.get(ALT)?;
        Ok(if alt == MISSING_VALUE {
            vec![]
        } else {
            alt.split(',').collect()
        })
    }

    /// REF followed by every ALT allele
    pub fn alleles(&self) -> Result<Vec<&str>, RecordError> {
        let mut alleles = vec![self.ref_allele()?];
        alleles.extend(self.alt_alleles()?);
        Ok(alleles)
    }

    pub fn filter(&self) -> Result<&str, RecordError> {
        self.get(FILTER)
    }

    pub fn info(&self) -> Result<&str, RecordError> {
        self.get(INFO)
    }

    pub fn format(&self) -> Result<&str, RecordError> {
        self.get(FORMAT)
    }

    /// Filter IDs on this record, ignoring `.`
    pub fn filter_ids(&self) -> Result<Vec<&str>, RecordError> {
        Ok(self.filter()?
            .split(';')
            .filter(|f| !f.is_empty() && *f != MISSING_VALUE)
            .collect())
    }
}

/// Adds a tag to a FILTER value.
/// `PASS` and `.` are replaced by the tag, and a tag that is already present is not repeated.
pub fn add_filter_tag(filter: &str, tag: &str) -> String {
    let mut tags: Vec<&str> = filter.split(';')
        .filter(|f| !f.is_empty() && *f != MISSING_VALUE && *f != PASS_FILTER)
        .collect();
    if !tags.contains(&tag) {
        tags.push(tag);
    }
    tags.join(";")
}
