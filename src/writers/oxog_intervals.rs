
use anyhow::Context;
use log::warn;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::parsing::metrics::site_key;
use crate::parsing::vcf_reader::VcfReader;
use crate::rewriter::RewriteSummary;

/// Writes one `contig:pos` interval per record, the format the OxoG metrics tool expects.
/// # Arguments
/// * `vcf_fn` - SNP-only VCF
/// * `interval_fn` - output interval list
pub fn write_oxog_intervals(vcf_fn: &Path, interval_fn: &Path) -> anyhow::Result<RewriteSummary> {
    warn!("Expects a SNP-only VCF");
    let mut reader = VcfReader::from_path(vcf_fn)?;
    let file = File::create(interval_fn)
        .with_context(|| format!("Error while creating {interval_fn:?}:"))?;
    let mut writer = BufWriter::new(file);

    let mut summary = RewriteSummary::default();
    for result in reader.records() {
        let record = result?;
        summary.processed += 1;
        writeln!(writer, "{}", site_key(record.chrom()?, record.pos()?))?;
        summary.written += 1;
    }
    writer.flush()
        .with_context(|| format!("Error while flushing output to {interval_fn:?}:"))?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intervals() {
        let dir = tempfile::tempdir().unwrap();
        let vcf_fn = dir.path().join("snps.vcf");
        let interval_fn = dir.path().join("snps.intervals");
        std::fs::write(
            &vcf_fn,
            "##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\nchr1\t10\t.\tA\tC\t.\tPASS\t.\nchrX\t2000\t.\tG\tT\t.\tPASS\t.\n"
        ).unwrap();
        let summary = write_oxog_intervals(&vcf_fn, &interval_fn).unwrap();
        assert_eq!(summary.processed, 2);
        assert_eq!(std::fs::read_to_string(&interval_fn).unwrap(), "chr1:10\nchrX:2000\n");
    }
}
