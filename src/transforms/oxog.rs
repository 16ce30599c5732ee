
use log::debug;
use rustc_hash::FxHashMap;
use std::path::Path;

use crate::data_types::header_index::HeaderIndex;
use crate::data_types::record::{add_filter_tag, Record, FILTER};
use crate::parsing::metrics::site_key;
use crate::parsing::vcf_reader::VcfReader;
use crate::rewriter::{RecordAction, RecordTransform};

pub const OXOG_FILTER: &str = "oxog";
pub const OXOG_DESCRIPTION: &str = "Failed dToxoG";

/// Tags records that the dToxoG filter flagged.
/// The flagged sites are held in memory, keyed by `contig:pos`, with their upper-cased REF alleles.
#[derive(Default)]
pub struct OxogFilterTagger {
    sites: FxHashMap<String, Vec<String>>
}

impl OxogFilterTagger {
    /// Loads every record of the dToxoG output VCF
    /// # Arguments
    /// * `dtoxog_fn` - VCF of sites that failed dToxoG
    pub fn from_vcf(dtoxog_fn: &Path) -> anyhow::Result<Self> {
        let mut reader = VcfReader::from_path(dtoxog_fn)?;
        let mut tagger = Self::default();
        for result in reader.records() {
            let record = result?;
            tagger.add_site(record.chrom()?, record.pos()?, record.ref_allele()?);
        }
        debug!("Loaded {} dToxoG sites from {dtoxog_fn:?}", tagger.sites.len());
        Ok(tagger)
    }

    pub fn add_site(&mut self, chrom: &str, pos: u64, ref_allele: &str) {
        self.sites.entry(site_key(chrom, pos))
            .or_default()
            .push(ref_allele.to_uppercase());
    }

    fn is_flagged(&self, record: &Record) -> anyhow::Result<bool> {
        let key = site_key(record.chrom()?, record.pos()?);
        Ok(match self.sites.get(&key) {
            Some(refs) => {
                let ref_allele = record.ref_allele()?.to_uppercase();
                refs.iter().any(|r| *r == ref_allele)
            },
            None => false
        })
    }
}

impl RecordTransform for OxogFilterTagger {
    fn label(&self) -> &str {
        "add_oxog_filters"
    }

    fn prepare_header(&mut self, header: &mut HeaderIndex) -> anyhow::Result<()> {
        header.declare_filter(OXOG_FILTER, OXOG_DESCRIPTION);
        Ok(())
    }

    fn transform(&mut self, record: Record) -> anyhow::Result<RecordAction> {
        if self.is_flagged(&record)? {
            let filter = add_filter_tag(record.filter()?, OXOG_FILTER);
            Ok(RecordAction::Tag(record.replace([(FILTER, filter)])?))
        } else {
            Ok(RecordAction::Write(record))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewriter::tests::{data_lines, rewrite_text, TEST_HEADER};

    #[test]
    fn test_tagging() {
        let mut tagger = OxogFilterTagger::default();
        tagger.add_site("chr1", 5, "c");
        tagger.add_site("chr1", 9, "G");

        let text = format!(
            "{TEST_HEADER}chr1\t5\t.\tC\tA\t.\tPASS\t.\tGT\t0/0\t0/1\nchr1\t7\t.\tC\tA\t.\tPASS\t.\tGT\t0/0\t0/1\nchr1\t9\t.\tT\tA\t.\tq10\t.\tGT\t0/0\t0/1\n"
        );
        let (summary, output) = rewrite_text(&text, &mut tagger).unwrap();
        assert_eq!((summary.processed, summary.tagged, summary.written), (3, 1, 3));
        assert!(output.contains("##FILTER=<ID=oxog,Description=\"Failed dToxoG\">"));
        let filters: Vec<&str> = data_lines(&output).iter().map(|l| l.split('\t').nth(6).unwrap()).collect();
        // REF mismatch at 9 leaves it alone
        assert_eq!(filters, vec!["oxog", "PASS", "q10"]);
    }

    #[test]
    fn test_from_vcf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dtoxog.vcf");
        std::fs::write(&path, "##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\nchr2\t100\t.\tg\tT\t.\toxog\t.\n").unwrap();
        let tagger = OxogFilterTagger::from_vcf(&path).unwrap();
        assert_eq!(tagger.sites.get("chr2:100"), Some(&vec!["G".to_string()]));
    }
}
