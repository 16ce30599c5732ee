
/*!
# Rewriter module
Streams a VCF through a [`RecordTransform`], writing the possibly modified header and the surviving records.
*/

use anyhow::Context;
use log::{debug, info, warn};
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::data_types::header_index::HeaderIndex;
use crate::data_types::record::Record;
use crate::parsing::vcf_reader::VcfReader;
use crate::util::progress_bar::record_spinner;
use crate::writers::vcf_writer::{plain_output_path, VcfWriter};

/// What to do with a record after transformation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordAction {
    /// Write the (possibly modified) record
    Write(Record),
    /// Write the record and count it as tagged
    Tag(Record),
    /// Drop the record
    Drop
}

/// A per-caller rewrite policy
pub trait RecordTransform {
    /// Short name used in log messages
    fn label(&self) -> &str;

    /// Called once before the header is written. This is where header lines get added or removed and where
    /// required sample columns are checked.
    fn prepare_header(&mut self, header: &mut HeaderIndex) -> anyhow::Result<()> {
        let _ = header;
        Ok(())
    }

    /// Decides the fate of one record
    fn transform(&mut self, record: Record) -> anyhow::Result<RecordAction>;
}

/// Record counts for a single rewrite
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RewriteSummary {
    /// Records read from the input
    pub processed: u64,
    /// Records dropped
    pub removed: u64,
    /// Records written with a new filter tag or forced change
    pub tagged: u64,
    /// Records written
    pub written: u64
}

/// Lifecycle of a rewrite
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RewriteState {
    Init,
    HeaderRead,
    Streaming,
    Done,
    Failed
}

/// Drives a single input VCF through a transform into an output VCF.
pub struct VcfRewriter {
    input: PathBuf,
    output: PathBuf,
    state: RewriteState,
    show_progress: bool
}

impl VcfRewriter {
    /// # Arguments
    /// * `input` - plain or `.gz` input VCF
    /// * `output` - target; for `.gz` targets, plain text is written next to it without the suffix
    pub fn new(input: &Path, output: &Path) -> Self {
        Self {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            state: RewriteState::Init,
            show_progress: false
        }
    }

    /// Enables the record spinner
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn state(&self) -> RewriteState {
        self.state
    }

    /// The file actually written, which is the target minus any `.gz`
    pub fn plain_output(&self) -> PathBuf {
        plain_output_path(&self.output)
    }

    /// Runs the full rewrite. On failure the partially written output is removed.
    /// # Errors
    /// * if the input cannot be read or the header is malformed
    /// * if the transform fails on the header or on any record
    /// * if writing fails
    pub fn run<T: RecordTransform>(&mut self, transform: &mut T) -> anyhow::Result<RewriteSummary> {
        match self.run_stages(transform) {
            Ok(summary) => {
                self.state = RewriteState::Done;
                Ok(summary)
            },
            Err(e) => {
                let failed_state = self.state;
                self.state = RewriteState::Failed;
                if failed_state != RewriteState::Init && failed_state != RewriteState::HeaderRead {
                    let plain = self.plain_output();
                    if let Err(remove_error) = std::fs::remove_file(&plain) {
                        debug!("Failed to remove partial output {plain:?}: {remove_error}");
                    }
                }
                Err(e)
            }
        }
    }

    fn run_stages<T: RecordTransform>(&mut self, transform: &mut T) -> anyhow::Result<RewriteSummary> {
        let label = transform.label().to_string();
        self.state = RewriteState::Init;
        let mut reader = VcfReader::from_path(&self.input)?;
        self.state = RewriteState::HeaderRead;

        let mut header = reader.header().clone();
        transform.prepare_header(&mut header)
            .with_context(|| format!("[{label}] Error while preparing header for {:?}:", self.input))?;

        let plain = self.plain_output();
        self.state = RewriteState::Streaming;
        let mut writer = VcfWriter::from_path(&plain)?;
        writer.write_header(&header)?;

        let spinner = record_spinner(self.show_progress, &label);
        let summary = stream_records(&mut reader, &header, &mut writer, transform, || spinner.inc(1))?;
        spinner.finish();
        writer.finish()
            .with_context(|| format!("Error while flushing output to {plain:?}:"))?;

        info!(
            "[{label}] Processed {} records, wrote {} records, tagged {} records, and removed {} records",
            summary.processed, summary.written, summary.tagged, summary.removed
        );
        Ok(summary)
    }
}

/// Core streaming loop, shared by file-backed and in-memory rewrites.
/// The header must already be written.
/// # Arguments
/// * `reader` - positioned at the first record
/// * `header` - the header that was written, used to check FILTER declarations
/// * `writer` - destination
/// * `transform` - the policy
/// * `on_record` - called once per record read
pub fn stream_records<T, W, F>(
    reader: &mut VcfReader, header: &HeaderIndex, writer: &mut VcfWriter<W>, transform: &mut T, mut on_record: F
) -> anyhow::Result<RewriteSummary>
where
    T: RecordTransform,
    W: Write,
    F: FnMut()
{
    let label = transform.label().to_string();
    let declared_filters: FxHashSet<String> = header.filter_ids().into_iter().map(String::from).collect();
    let mut warned_filters: FxHashSet<String> = Default::default();
    let mut summary = RewriteSummary::default();

    for result in reader.records() {
        let record = result?;
        summary.processed += 1;
        on_record();

        let action = transform.transform(record)
            .with_context(|| format!("[{label}] Error while transforming record {}:", summary.processed))?;
        match action {
            RecordAction::Write(record) => {
                writer.write_record(&record)?;
                summary.written += 1;
            },
            RecordAction::Tag(record) => {
                for filter_id in record.filter_ids()? {
                    if !declared_filters.contains(filter_id) && warned_filters.insert(filter_id.to_string()) {
                        warn!("[{label}] Record uses FILTER {filter_id} which has no header declaration");
                    }
                }
                writer.write_record(&record)?;
                summary.tagged += 1;
                summary.written += 1;
            },
            RecordAction::Drop => {
                summary.removed += 1;
            }
        }
    }
    Ok(summary)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data_types::record::FILTER;
    use std::io::Cursor;

    /// Header shared by the transform tests
    pub const TEST_HEADER: &str = "##fileformat=VCFv4.2\n##FILTER=<ID=PASS,Description=\"All filters passed\">\n##contig=<ID=chr1,length=1000>\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tNORMAL\tTUMOR\n";

    /// Runs a transform over an in-memory VCF, returning the summary and the written text
    pub fn rewrite_text<T: RecordTransform>(text: &str, transform: &mut T) -> anyhow::Result<(RewriteSummary, String)> {
        let mut reader = VcfReader::from_reader(Box::new(Cursor::new(text.to_string())), PathBuf::from("memory"), true)?;
        let mut header = reader.header().clone();
        transform.prepare_header(&mut header)?;
        let mut writer = VcfWriter::new(vec![]);
        writer.write_header(&header)?;
        let summary = stream_records(&mut reader, &header, &mut writer, transform, || {})?;
        let text = String::from_utf8(writer.finish()?)?;
        Ok((summary, text))
    }

    /// Only the data lines of a rendered VCF
    pub fn data_lines(text: &str) -> Vec<&str> {
        text.lines().filter(|l| !l.starts_with('#')).collect()
    }

    struct DropOdd;

    impl RecordTransform for DropOdd {
        fn label(&self) -> &str {
            "drop_odd"
        }

        fn transform(&mut self, record: Record) -> anyhow::Result<RecordAction> {
            let pos = record.pos()?;
            Ok(if pos % 2 == 1 {
                RecordAction::Drop
            } else if pos % 4 == 0 {
                RecordAction::Tag(record.replace([(FILTER, "undeclared")])?)
            } else {
                RecordAction::Write(record)
            })
        }
    }

    fn input_text() -> String {
        let mut text = TEST_HEADER.to_string();
        for pos in 1..=6 {
            text.push_str(&format!("chr1\t{pos}\t.\tA\tC\t.\tPASS\t.\tGT\t0/0\t0/1\n"));
        }
        text
    }

    #[test]
    fn test_stream_counts() {
        let (summary, text) = rewrite_text(&input_text(), &mut DropOdd).unwrap();
        assert_eq!(summary, RewriteSummary { processed: 6, removed: 3, tagged: 1, written: 3 });
        assert!(text.starts_with(TEST_HEADER));
        let lines = data_lines(&text);
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("\tundeclared\t"));
    }

    #[test]
    fn test_file_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.vcf");
        let output = dir.path().join("output.vcf");
        std::fs::write(&input, input_text()).unwrap();

        let mut rewriter = VcfRewriter::new(&input, &output);
        assert_eq!(rewriter.state(), RewriteState::Init);
        let summary = rewriter.run(&mut DropOdd).unwrap();
        assert_eq!(rewriter.state(), RewriteState::Done);
        assert_eq!(summary.written, 3);
        let written = std::fs::read_to_string(&output).unwrap();
        assert_eq!(data_lines(&written).len(), 3);
    }

    #[test]
    fn test_gz_target_writes_plain() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.vcf");
        std::fs::write(&input, input_text()).unwrap();
        let mut rewriter = VcfRewriter::new(&input, &dir.path().join("output.vcf.gz"));
        rewriter.run(&mut DropOdd).unwrap();
        assert!(dir.path().join("output.vcf").exists());
        assert!(!dir.path().join("output.vcf.gz").exists());
    }

    #[test]
    fn test_failure_removes_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.vcf");
        let output = dir.path().join("output.vcf");
        let mut text = input_text();
        text.push_str("chr1\tnot_a_position\t.\tA\tC\t.\tPASS\t.\tGT\t0/0\t0/1\n");
        std::fs::write(&input, text).unwrap();

        let mut rewriter = VcfRewriter::new(&input, &output);
        assert!(rewriter.run(&mut DropOdd).is_err());
        assert_eq!(rewriter.state(), RewriteState::Failed);
        assert!(!output.exists());
    }

    #[test]
    fn test_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let mut rewriter = VcfRewriter::new(&dir.path().join("missing.vcf"), &dir.path().join("out.vcf"));
        assert!(rewriter.run(&mut DropOdd).is_err());
        assert_eq!(rewriter.state(), RewriteState::Failed);
    }
}
