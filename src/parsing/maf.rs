
use anyhow::Context;
use rustc_hash::FxHashMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use crate::parsing::vcf_reader::open_text_file;

/// A MAF row keyed by column name
pub type MafRow = FxHashMap<String, String>;

/// Streams the rows of a tab-delimited MAF; `#` lines are skipped and the first remaining line is the header.
pub struct MafReader {
    filename: PathBuf,
    csv_reader: csv::Reader<Box<dyn BufRead>>,
    headers: Vec<String>
}

impl MafReader {
    pub fn from_path(filename: &Path) -> anyhow::Result<Self> {
        let reader = open_text_file(filename)?;
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .comment(Some(b'#'))
            .quoting(false)
            .flexible(true)
            .has_headers(true)
            .from_reader(reader);
        let headers = csv_reader.headers()
            .with_context(|| format!("Error while reading MAF header from {filename:?}:"))?
            .iter()
            .map(String::from)
            .collect();
        Ok(Self {
            filename: filename.to_path_buf(),
            csv_reader,
            headers
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Iterates rows; short rows only carry the columns they have
    pub fn rows(&mut self) -> impl Iterator<Item = anyhow::Result<MafRow>> + '_ {
        let headers = &self.headers;
        let filename = &self.filename;
        self.csv_reader.records().map(move |result| {
            let record = result
                .with_context(|| format!("Error while reading MAF row from {filename:?}:"))?;
            Ok(headers.iter()
                .zip(record.iter())
                .map(|(h, v)| (h.clone(), v.to_string()))
                .collect())
        })
    }
}
