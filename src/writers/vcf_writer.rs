
use anyhow::Context;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::data_types::header_index::HeaderIndex;
use crate::data_types::record::Record;

/// Returns true if the output should end up bgzip-compressed
pub fn is_compressed_target(filename: &Path) -> bool {
    filename.extension().unwrap_or_default() == "gz"
}

/// Path that plain text is written to before compression, i.e. the target without `.gz`
pub fn plain_output_path(filename: &Path) -> PathBuf {
    if is_compressed_target(filename) {
        filename.with_extension("")
    } else {
        filename.to_path_buf()
    }
}

/// Plain-text VCF writer
pub struct VcfWriter<W: Write> {
    writer: W,
    records_written: u64
}

impl VcfWriter<BufWriter<File>> {
    /// Creates (or truncates) a plain-text file
    pub fn from_path(filename: &Path) -> anyhow::Result<Self> {
        let file = File::create(filename)
            .with_context(|| format!("Error while creating {filename:?}:"))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> VcfWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            records_written: 0
        }
    }

    /// Writes every header line in section order
    pub fn write_header(&mut self, header: &HeaderIndex) -> anyhow::Result<()> {
        for line in header.header_lines() {
            writeln!(self.writer, "{}", line.text())?;
        }
        Ok(())
    }

    /// Writes pre-built header lines verbatim, in the given order
    pub fn write_header_lines(&mut self, lines: &[String]) -> anyhow::Result<()> {
        for line in lines {
            writeln!(self.writer, "{line}")?;
        }
        Ok(())
    }

    pub fn write_record(&mut self, record: &Record) -> anyhow::Result<()> {
        let line = record.encode()
            .with_context(|| format!("Error while encoding record {:?}:", record.values()))?;
        writeln!(self.writer, "{line}")?;
        self.records_written += 1;
        Ok(())
    }

    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Flushes and hands back the inner writer so flush failures are reported
    pub fn finish(mut self) -> anyhow::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_plain_output_path() {
        assert_eq!(plain_output_path(Path::new("out/calls.vcf.gz")), PathBuf::from("out/calls.vcf"));
        assert_eq!(plain_output_path(Path::new("out/calls.vcf")), PathBuf::from("out/calls.vcf"));
        assert!(is_compressed_target(Path::new("a.vcf.gz")));
        assert!(!is_compressed_target(Path::new("a.vcf")));
    }

    #[test]
    fn test_write() {
        let header = HeaderIndex::from_lines(vec!["##fileformat=VCFv4.2", "#CHROM\tPOS"]);
        let columns = Arc::new(header.column_names().unwrap());
        let mut writer = VcfWriter::new(vec![]);
        writer.write_header(&header).unwrap();
        writer.write_record(&Record::decode("chr1\t10", &columns)).unwrap();
        // wrong arity is refused
        assert!(writer.write_record(&Record::decode("chr1", &columns)).is_err());
        assert_eq!(writer.records_written(), 1);
        let bytes = writer.finish().unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "##fileformat=VCFv4.2\n#CHROM\tPOS\nchr1\t10\n");
    }
}
