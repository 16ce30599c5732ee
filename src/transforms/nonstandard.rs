
use log::warn;

use crate::data_types::record::Record;
use crate::rewriter::{RecordAction, RecordTransform};

/// Bases a standard allele may contain
const STANDARD_BASES: [&str; 4] = ["A", "C", "G", "T"];

/// Drops records with any REF or ALT allele outside of A/C/G/T
#[derive(Default)]
pub struct NonstandardVariantFilter;

impl RecordTransform for NonstandardVariantFilter {
    fn label(&self) -> &str {
        "filter_nonstandard_variants"
    }

    fn transform(&mut self, record: Record) -> anyhow::Result<RecordAction> {
        let alleles = record.alleles()?;
        if alleles.iter().all(|a| STANDARD_BASES.contains(a)) {
            Ok(RecordAction::Write(record))
        } else {
            warn!("Removing {}:{}:{}", record.chrom()?, record.pos()?, alleles.join(","));
            Ok(RecordAction::Drop)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewriter::tests::{data_lines, rewrite_text, TEST_HEADER};

    #[test]
    fn test_nonstandard_filter() {
        let text = format!(
            "{TEST_HEADER}chr1\t5\t.\tA\tC,T\t.\tPASS\t.\tGT\t0/0\t0/1\nchr1\t6\t.\tN\tC\t.\tPASS\t.\tGT\t0/0\t0/1\nchr1\t7\t.\tAC\tA\t.\tPASS\t.\tGT\t0/0\t0/1\nchr1\t8\t.\tG\tR\t.\tPASS\t.\tGT\t0/0\t0/1\n"
        );
        let (summary, output) = rewrite_text(&text, &mut NonstandardVariantFilter).unwrap();
        assert_eq!(summary.removed, 3);
        assert_eq!(data_lines(&output).len(), 1);
        assert!(data_lines(&output)[0].starts_with("chr1\t5\t"));
    }
}
