
use anyhow::{bail, Context};
use log::debug;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::data_types::header_index::{HeaderError, HeaderIndex};
use crate::data_types::header_section::{COLUMN_HEADER_PREFIX, META_PREFIX};
use crate::data_types::record::Record;

/// Returns true if the path ends in `.gz`
pub fn is_gzipped(filename: &Path) -> bool {
    filename.extension().unwrap_or_default() == "gz"
}

/// Opens a text file for buffered reading, transparently decoding gzip (including BGZF) when the name ends in `.gz`.
/// # Arguments
/// * `filename` - path to the file to open
pub fn open_text_file(filename: &Path) -> anyhow::Result<Box<dyn BufRead>> {
    let file = File::open(filename)
        .with_context(|| format!("Error while opening {filename:?}:"))?;
    let reader: Box<dyn BufRead> = if is_gzipped(filename) {
        Box::new(BufReader::new(flate2::read::MultiGzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    Ok(reader)
}

/// Strips any `\n` / `\r\n` terminator
fn trim_line_ending(line: &mut String) {
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
}

/// Reads the header of a VCF up front and then streams its data records.
pub struct VcfReader {
    /// Label used in errors, usually the file path
    source: PathBuf,
    /// The header, including the column line
    header: HeaderIndex,
    /// Shared column list for every decoded record
    columns: Arc<Vec<String>>,
    /// Byte offset of the first data line; only known for uncompressed inputs
    records_offset: Option<u64>,
    /// The underlying reader, positioned at the first data line
    reader: Box<dyn BufRead>,
    /// 1-based line number of the last line read
    line_number: usize
}

impl VcfReader {
    /// Opens a VCF file and reads its header
    /// # Arguments
    /// * `filename` - plain or gzip-compressed VCF
    pub fn from_path(filename: &Path) -> anyhow::Result<Self> {
        debug!("Opening {filename:?}...");
        let reader = open_text_file(filename)?;
        Self::from_reader(reader, filename.to_path_buf(), !is_gzipped(filename))
    }

    /// Reads the header from an already opened reader.
    /// # Arguments
    /// * `reader` - positioned at the start of the file
    /// * `source` - label for error messages
    /// * `seekable` - if true, the byte offset of the first record is recorded
    pub fn from_reader(mut reader: Box<dyn BufRead>, source: PathBuf, seekable: bool) -> anyhow::Result<Self> {
        let mut header_lines = vec![];
        let mut offset: u64 = 0;
        let mut line_number = 0;
        let mut found_columns = false;
        loop {
            let mut line = String::new();
            let bytes_read = reader.read_line(&mut line)
                .with_context(|| format!("Error while reading header of {source:?}:"))?;
            if bytes_read == 0 {
                break;
            }
            offset += bytes_read as u64;
            line_number += 1;
            trim_line_ending(&mut line);

            if line.starts_with(META_PREFIX) {
                header_lines.push(line);
            } else if line.starts_with(COLUMN_HEADER_PREFIX) {
                header_lines.push(line);
                found_columns = true;
                break;
            } else {
                bail!("Error while reading header of {source:?}: line {line_number} is not a header line before #CHROM");
            }
        }
        if !found_columns {
            return Err(HeaderError::MissingColumnHeader)
                .with_context(|| format!("Error while reading header of {source:?}:"));
        }

        let header = HeaderIndex::from_lines(header_lines);
        let columns = Arc::new(header.column_names()?);
        debug!("Loaded {} header lines with {} columns from {source:?}", line_number, columns.len());

        Ok(Self {
            source,
            header,
            columns,
            records_offset: if seekable { Some(offset) } else { None },
            reader,
            line_number
        })
    }

    pub fn header(&self) -> &HeaderIndex {
        &self.header
    }

    pub fn columns(&self) -> &Arc<Vec<String>> {
        &self.columns
    }

    pub fn records_offset(&self) -> Option<u64> {
        self.records_offset
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Lazily decodes the remaining data lines; blank lines are skipped
    pub fn records(&mut self) -> Records<'_> {
        Records { vcf: self }
    }
}

/// Iterator over the data records of a [`VcfReader`]
pub struct Records<'a> {
    vcf: &'a mut VcfReader
}

impl Iterator for Records<'_> {
    type Item = anyhow::Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let mut line = String::new();
            match self.vcf.reader.read_line(&mut line) {
                Ok(0) => return None,
                Ok(_) => {
                    self.vcf.line_number += 1;
                    trim_line_ending(&mut line);
                    if line.is_empty() {
                        continue;
                    }
                    return Some(Ok(Record::decode(&line, &self.vcf.columns)));
                },
                Err(e) => {
                    return Some(Err(anyhow::Error::new(e).context(format!(
                        "Error while reading line {} of {:?}:", self.vcf.line_number + 1, self.vcf.source
                    ))));
                }
            }
        }
    }
}
