
use anyhow::Context;
use log::{debug, warn};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::data_types::genotype::Genotype;
use crate::data_types::record::Record;
use crate::data_types::sample::{format_value, GT_KEY, TUMOR_SAMPLE};
use crate::parsing::metrics::{site_key, OxogMetricsTable, SiteCounts};
use crate::parsing::reference::SequenceSource;
use crate::parsing::vcf_reader::VcfReader;
use crate::rewriter::RewriteSummary;

/// First line of every dToxoG MAF
pub const MAF_VERSION_LINE: &str = "#version 2.4.1";
/// Columns of the dToxoG MAF, in order
pub const MAF_COLUMNS: [&str; 16] = [
    "Chromosome", "Start_position", "End_position", "Reference_Allele",
    "Tumor_Seq_Allele1", "Tumor_Seq_Allele2", "Tumor_Sample_Barcode", "Matched_Norm_Sample_Barcode",
    "ref_context", "i_t_ALT_F1R2", "i_t_ALT_F2R1", "i_t_REF_F1R2",
    "i_t_REF_F2R1", "i_t_Foxog", "Variant_Type", "i_picard_oxoQ"
];
/// Bases on either side of the variant in `ref_context`
pub const CONTEXT_FLANK: u64 = 10;
const TUMOR_BARCODE: &str = "i1-Tumor";
const NORMAL_BARCODE: &str = "i1-Normal";
const VARIANT_TYPE: &str = "SNP";
const VALID_BASES: [&str; 5] = ["A", "C", "G", "T", "N"];

/// One dToxoG MAF row
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DtoxogMafRow {
    #[serde(rename = "Chromosome")]
    pub chromosome: String,
    #[serde(rename = "Start_position")]
    pub start_position: u64,
    #[serde(rename = "End_position")]
    pub end_position: u64,
    #[serde(rename = "Reference_Allele")]
    pub reference_allele: String,
    #[serde(rename = "Tumor_Seq_Allele1")]
    pub tumor_seq_allele1: String,
    #[serde(rename = "Tumor_Seq_Allele2")]
    pub tumor_seq_allele2: String,
    #[serde(rename = "Tumor_Sample_Barcode")]
    pub tumor_sample_barcode: String,
    #[serde(rename = "Matched_Norm_Sample_Barcode")]
    pub matched_norm_sample_barcode: String,
    pub ref_context: String,
    #[serde(rename = "i_t_ALT_F1R2")]
    pub alt_f1r2: u64,
    #[serde(rename = "i_t_ALT_F2R1")]
    pub alt_f2r1: u64,
    #[serde(rename = "i_t_REF_F1R2")]
    pub ref_f1r2: u64,
    #[serde(rename = "i_t_REF_F2R1")]
    pub ref_f2r1: u64,
    #[serde(rename = "i_t_Foxog")]
    pub foxog: String,
    #[serde(rename = "Variant_Type")]
    pub variant_type: String,
    #[serde(rename = "i_picard_oxoQ")]
    pub picard_oxoq: String
}

/// Strand counts for the ref/alt pair at a site, plus the oxidation fraction
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OxogAlleleCounts {
    pub alt_f1r2: u64,
    pub alt_f2r1: u64,
    pub ref_f1r2: u64,
    pub ref_f2r1: u64,
    /// Fraction of alt reads in the oxidation orientation, -1 without alt reads
    pub foxog: f64
}

/// Pulls ref/alt strand counts from a site and computes Foxog.
/// The oxidation orientation is F2R1 for a C or A reference and F1R2 for G or T.
/// Returns None if either allele is not a countable base.
pub fn oxog_allele_counts(ref_allele: &str, alt_allele: &str, site: &SiteCounts) -> Option<OxogAlleleCounts> {
    let alt = site.base(alt_allele)?;
    let reference = site.base(ref_allele)?;
    let alt_total = alt.f1r2 + alt.f2r1;
    let oxidized = match ref_allele.to_ascii_uppercase().as_str() {
        "C" | "A" => alt.f2r1,
        _ => alt.f1r2
    };
    let foxog = if alt_total > 0 {
        oxidized as f64 / alt_total as f64
    } else {
        -1.0
    };
    Some(OxogAlleleCounts {
        alt_f1r2: alt.f1r2,
        alt_f2r1: alt.f2r1,
        ref_f1r2: reference.f1r2,
        ref_f2r1: reference.f2r1,
        foxog
    })
}

/// Formats a fraction the way downstream dToxoG tooling expects, always with a decimal point
fn format_fraction(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// Builds dToxoG MAF rows from VCF records
pub struct DtoxogMafBuilder<'a> {
    reference: &'a dyn SequenceSource,
    metrics: &'a OxogMetricsTable,
    oxoq_score: f64
}

impl<'a> DtoxogMafBuilder<'a> {
    pub fn new(reference: &'a dyn SequenceSource, metrics: &'a OxogMetricsTable, oxoq_score: f64) -> Self {
        Self { reference, metrics, oxoq_score }
    }

    /// Converts one record, or returns None (with a warning) when the record cannot be represented.
    /// # Errors
    /// * if the record is missing required fields
    pub fn maf_row(&self, record: &Record) -> anyhow::Result<Option<DtoxogMafRow>> {
        let chrom = record.chrom()?;
        let pos = record.pos()?;
        let alleles = record.alleles()?;
        let ref_allele = alleles[0];
        let location = format!("{chrom}:{pos}");

        let genotype: Genotype = format_value(record, TUMOR_SAMPLE, GT_KEY)?.parse()?;
        let alt_allele = match genotype.first_alt_index().and_then(|i| alleles.get(i)) {
            Some(alt) => *alt,
            None => {
                warn!("Unable to find a tumor alt allele at {location}");
                return Ok(None);
            }
        };

        if [ref_allele, alt_allele].iter().any(|a| !VALID_BASES.contains(a)) {
            warn!("Skipping {location} with alleles {ref_allele}/{alt_allele}");
            return Ok(None);
        }

        let start = pos.saturating_sub(CONTEXT_FLANK).max(1);
        let ref_context = match self.reference.fetch(chrom, start, pos + CONTEXT_FLANK) {
            Some(sequence) => sequence,
            None => {
                warn!("Unable to find reference context for {location}");
                return Ok(None);
            }
        };

        let key = site_key(chrom, pos);
        let counts = match self.metrics.get(&key).and_then(|site| oxog_allele_counts(ref_allele, alt_allele, site)) {
            Some(counts) => counts,
            None => {
                warn!("Unable to find key {key} in metrics");
                return Ok(None);
            }
        };

        Ok(Some(DtoxogMafRow {
            chromosome: chrom.to_string(),
            start_position: pos,
            end_position: pos,
            reference_allele: ref_allele.to_string(),
            tumor_seq_allele1: alt_allele.to_string(),
            tumor_seq_allele2: alt_allele.to_string(),
            tumor_sample_barcode: TUMOR_BARCODE.to_string(),
            matched_norm_sample_barcode: NORMAL_BARCODE.to_string(),
            ref_context,
            alt_f1r2: counts.alt_f1r2,
            alt_f2r1: counts.alt_f2r1,
            ref_f1r2: counts.ref_f1r2,
            ref_f2r1: counts.ref_f2r1,
            foxog: format_fraction(counts.foxog),
            variant_type: VARIANT_TYPE.to_string(),
            picard_oxoq: format!("{:.2}", self.oxoq_score)
        }))
    }
}

/// Writes the dToxoG MAF for every convertible record of a VCF
/// # Arguments
/// * `vcf_fn` - SNP VCF with a TUMOR sample
/// * `maf_fn` - output MAF path
/// * `builder` - reference, metrics, and oxoQ used to fill rows
pub fn write_dtoxog_maf(vcf_fn: &Path, maf_fn: &Path, builder: &DtoxogMafBuilder) -> anyhow::Result<RewriteSummary> {
    let mut reader = VcfReader::from_path(vcf_fn)?;
    reader.header().require_samples(&[TUMOR_SAMPLE])?;

    let file = File::create(maf_fn)
        .with_context(|| format!("Error while creating {maf_fn:?}:"))?;
    let mut buffer = BufWriter::new(file);
    writeln!(buffer, "{MAF_VERSION_LINE}")?;
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(csv::QuoteStyle::Never)
        .has_headers(false)
        .from_writer(buffer);
    csv_writer.write_record(MAF_COLUMNS)?;

    let mut summary = RewriteSummary::default();
    for result in reader.records() {
        let record = result?;
        summary.processed += 1;
        match builder.maf_row(&record)? {
            Some(row) => {
                csv_writer.serialize(&row)
                    .with_context(|| format!("Error while writing to {maf_fn:?}:"))?;
                summary.written += 1;
            },
            None => summary.removed += 1
        }
    }
    csv_writer.flush()
        .with_context(|| format!("Error while flushing output to {maf_fn:?}:"))?;
    debug!("Wrote {} MAF rows to {maf_fn:?}", summary.written);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::metrics::StrandCounts;
    use crate::parsing::reference::ReferenceLookup;
    use approx_eq::assert_approx_eq;
    use rust_lib_reference_genome::reference_genome::ReferenceGenome;
    use std::sync::Arc;

    fn counts(f1r2: u64, f2r1: u64) -> StrandCounts {
        StrandCounts { f1r2, f2r1 }
    }

    fn site() -> SiteCounts {
        SiteCounts::new(counts(3, 1), counts(20, 22), counts(0, 0), counts(1, 3))
    }

    #[test]
    fn test_oxog_allele_counts() {
        // C>A, oxidation orientation is F2R1
        let c = oxog_allele_counts("C", "A", &site()).unwrap();
        assert_eq!((c.alt_f1r2, c.alt_f2r1, c.ref_f1r2, c.ref_f2r1), (3, 1, 20, 22));
        assert_approx_eq!(c.foxog, 0.25);

        // G>T uses F1R2
        let g = oxog_allele_counts("G", "T", &site()).unwrap();
        assert_approx_eq!(g.foxog, 0.25);

        // no alt reads
        let none = oxog_allele_counts("A", "G", &site()).unwrap();
        assert_approx_eq!(none.foxog, -1.0);
        // N counts zero reads
        let n = oxog_allele_counts("A", "N", &site()).unwrap();
        assert_eq!((n.alt_f1r2, n.alt_f2r1, n.ref_f1r2, n.ref_f2r1), (0, 0, 3, 1));
        assert_approx_eq!(n.foxog, -1.0);
        assert!(oxog_allele_counts("A", "AC", &site()).is_none());
    }

    #[test]
    fn test_format_fraction() {
        assert_eq!(format_fraction(-1.0), "-1.0");
        assert_eq!(format_fraction(0.25), "0.25");
        assert_eq!(format_fraction(1.0), "1.0");
    }

    fn record(line: &str) -> Record {
        let columns: Vec<String> = ["CHROM", "POS", "ID", "REF", "ALT", "QUAL", "FILTER", "INFO", "FORMAT", "NORMAL", "TUMOR"]
            .iter().map(|s| s.to_string()).collect();
        Record::decode(line, &Arc::new(columns))
    }

    #[test]
    fn test_maf_row() {
        let mut genome = ReferenceGenome::empty_reference();
        genome.add_contig("chr1".to_string(), "ACCGTTACCAGGACTTGACAAACCG".into()).unwrap();
        let reference = ReferenceLookup::from_genome(genome);
        let mut metrics = OxogMetricsTable::default();
        metrics.insert(site_key("chr1", 3), site());
        let builder = DtoxogMafBuilder::new(&reference, &metrics, 35.5);

        let row = builder.maf_row(&record("chr1\t3\t.\tC\tG,A\t.\tPASS\t.\tGT\t0/0\t0/2")).unwrap().unwrap();
        assert_eq!(row.tumor_seq_allele1, "A");
        assert_eq!(row.ref_context, "ACCGTTACCAGGA");
        assert_eq!(row.foxog, "0.25");
        assert_eq!(row.picard_oxoq, "35.50");
        assert_eq!((row.start_position, row.end_position), (3, 3));

        // N alt is still written, with no alt reads
        let n_row = builder.maf_row(&record("chr1\t3\t.\tC\tN\t.\tPASS\t.\tGT\t0/0\t0/1")).unwrap().unwrap();
        assert_eq!(n_row.tumor_seq_allele1, "N");
        assert_eq!((n_row.alt_f1r2, n_row.alt_f2r1, n_row.ref_f1r2, n_row.ref_f2r1), (0, 0, 20, 22));
        assert_eq!(n_row.foxog, "-1.0");

        // no metrics at this site
        assert!(builder.maf_row(&record("chr1\t4\t.\tG\tT\t.\tPASS\t.\tGT\t0/0\t0/1")).unwrap().is_none());
        // indel
        assert!(builder.maf_row(&record("chr1\t3\t.\tC\tCA\t.\tPASS\t.\tGT\t0/0\t0/1")).unwrap().is_none());
        // unknown contig
        assert!(builder.maf_row(&record("chr9\t3\t.\tC\tA\t.\tPASS\t.\tGT\t0/0\t0/1")).unwrap().is_none());
    }
}
