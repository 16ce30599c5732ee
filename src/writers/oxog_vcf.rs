
use anyhow::anyhow;
use std::path::Path;
use std::sync::Arc;

use crate::data_types::header_section::META_PREFIX;
use crate::data_types::record::{Record, MISSING_VALUE, SITE_COLUMNS};
use crate::parsing::maf::{MafReader, MafRow};
use crate::parsing::reference::SequenceSource;
use crate::rewriter::RewriteSummary;
use crate::transforms::oxog::{OXOG_DESCRIPTION, OXOG_FILTER};
use crate::writers::vcf_writer::VcfWriter;

/// MAF column holding the dToxoG verdict; `1` means the site failed
const OXOG_CUT_COLUMN: &str = "oxoGCut";
const FAILED_VALUE: &str = "1";

/// Minimal header: file format, the oxog filter, and one contig line per reference sequence.
/// Lines are returned in output order, with contigs in reference order.
pub fn minimal_oxog_header(reference: &dyn SequenceSource) -> Vec<String> {
    let mut lines = vec![
        format!("{META_PREFIX}fileformat=VCFv4.2"),
        format!("{META_PREFIX}FILTER=<ID=PASS,Description=\"All filters passed\">"),
        format!("{META_PREFIX}FILTER=<ID={OXOG_FILTER},Description=\"{OXOG_DESCRIPTION}\">")
    ];
    for (contig, length) in reference.contig_lengths() {
        lines.push(format!("{META_PREFIX}contig=<ID={contig},length={length}>"));
    }
    lines.push(format!("#{}", SITE_COLUMNS.join("\t")));
    lines
}

fn required<'a>(row: &'a MafRow, column: &str) -> anyhow::Result<&'a str> {
    row.get(column)
        .map(|v| v.as_str())
        .ok_or_else(|| anyhow!("MAF row is missing column {column}"))
}

/// Builds the sites-only record for a failed MAF row
fn oxog_record(row: &MafRow, columns: &Arc<Vec<String>>) -> anyhow::Result<Record> {
    let values = vec![
        required(row, "Chromosome")?.to_string(),
        required(row, "Start_position")?.to_string(),
        MISSING_VALUE.to_string(),
        required(row, "Reference_Allele")?.to_string(),
        required(row, "Tumor_Seq_Allele1")?.to_string(),
        MISSING_VALUE.to_string(),
        OXOG_FILTER.to_string(),
        MISSING_VALUE.to_string()
    ];
    Ok(Record::from_values(columns, values)?)
}

/// Writes the dToxoG failures of a MAF as a minimal plain-text VCF
/// # Arguments
/// * `maf_fn` - annotated dToxoG MAF
/// * `reference` - supplies the contig lines
/// * `vcf_fn` - plain-text output path
pub fn dtoxog_maf_to_vcf(maf_fn: &Path, reference: &dyn SequenceSource, vcf_fn: &Path) -> anyhow::Result<RewriteSummary> {
    let columns: Arc<Vec<String>> = Arc::new(SITE_COLUMNS.iter().map(|c| c.to_string()).collect());

    let mut writer = VcfWriter::from_path(vcf_fn)?;
    writer.write_header_lines(&minimal_oxog_header(reference))?;

    let mut maf_reader = MafReader::from_path(maf_fn)?;
    let mut summary = RewriteSummary::default();
    for result in maf_reader.rows() {
        let row = result?;
        summary.processed += 1;
        if required(&row, OXOG_CUT_COLUMN)? == FAILED_VALUE {
            writer.write_record(&oxog_record(&row, &columns)?)?;
            summary.written += 1;
        } else {
            summary.removed += 1;
        }
    }
    writer.finish()?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::reference::ReferenceLookup;
    use rust_lib_reference_genome::reference_genome::ReferenceGenome;

    #[test]
    fn test_maf_to_vcf() {
        let mut genome = ReferenceGenome::empty_reference();
        genome.add_contig("chr1".to_string(), "ACGTACGTAC".into()).unwrap();
        let reference = ReferenceLookup::from_genome(genome);

        let dir = tempfile::tempdir().unwrap();
        let maf_fn = dir.path().join("dtoxog.maf");
        let vcf_fn = dir.path().join("dtoxog.vcf");
        std::fs::write(
            &maf_fn,
            "#version 2.4.1\nChromosome\tStart_position\tReference_Allele\tTumor_Seq_Allele1\toxoGCut\nchr1\t3\tG\tT\t1\nchr1\t4\tT\tA\t0\n"
        ).unwrap();

        let summary = dtoxog_maf_to_vcf(&maf_fn, &reference, &vcf_fn).unwrap();
        assert_eq!((summary.processed, summary.written, summary.removed), (2, 1, 1));
        let text = std::fs::read_to_string(&vcf_fn).unwrap();
        assert!(text.contains("##contig=<ID=chr1,length=10>\n"));
        assert!(text.contains("##FILTER=<ID=oxog,Description=\"Failed dToxoG\">\n"));
        assert!(text.ends_with("#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\nchr1\t3\t.\tG\tT\t.\toxog\t.\n"));
    }

    /// Fixed contig list, in a non-lexicographic order
    struct ContigList(Vec<(String, usize)>);

    impl SequenceSource for ContigList {
        fn fetch(&self, _contig: &str, _start: u64, _end: u64) -> Option<String> {
            None
        }

        fn contig_lengths(&self) -> Vec<(String, usize)> {
            self.0.clone()
        }
    }

    #[test]
    fn test_header_keeps_reference_order() {
        let reference = ContigList(vec![
            ("chr1".to_string(), 100),
            ("chr2".to_string(), 90),
            ("chr10".to_string(), 50)
        ]);
        let header = minimal_oxog_header(&reference);
        let contigs: Vec<&str> = header.iter()
            .filter(|l| l.starts_with("##contig"))
            .map(|l| l.as_str())
            .collect();
        assert_eq!(contigs, vec![
            "##contig=<ID=chr1,length=100>",
            "##contig=<ID=chr2,length=90>",
            "##contig=<ID=chr10,length=50>"
        ]);
        assert_eq!(header[0], "##fileformat=VCFv4.2");
        assert_eq!(header.last().unwrap(), "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO");

        let dir = tempfile::tempdir().unwrap();
        let maf_fn = dir.path().join("dtoxog.maf");
        let vcf_fn = dir.path().join("dtoxog.vcf");
        std::fs::write(&maf_fn, "Chromosome\tStart_position\tReference_Allele\tTumor_Seq_Allele1\toxoGCut\n").unwrap();
        dtoxog_maf_to_vcf(&maf_fn, &reference, &vcf_fn).unwrap();
        let text = std::fs::read_to_string(&vcf_fn).unwrap();
        assert_eq!(text, header.join("\n") + "\n");
    }
}
