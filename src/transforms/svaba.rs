
use crate::data_types::header_index::HeaderIndex;
use crate::data_types::record::Record;
use crate::rewriter::{RecordAction, RecordTransform};

const GQ_DESCRIPTION: &str = "Genotype quality (SvABA currently not supported. Always 0)";
const PL_DESCRIPTION: &str = "Normalized, Phred-scaled likelihoods for genotypes as defined in the VCF specification";

/// Fixes the SvABA FORMAT definitions of GQ and PL, which are declared with the wrong type
#[derive(Default)]
pub struct SvabaFormatter;

impl RecordTransform for SvabaFormatter {
    fn label(&self) -> &str {
        "format_svaba_vcf"
    }

    fn prepare_header(&mut self, header: &mut HeaderIndex) -> anyhow::Result<()> {
        // same IDs, so these replace the originals in place
        header.declare_format("GQ", "1", "Float", GQ_DESCRIPTION);
        header.declare_format("PL", "G", "Float", PL_DESCRIPTION);
        Ok(())
    }

    fn transform(&mut self, record: Record) -> anyhow::Result<RecordAction> {
        Ok(RecordAction::Write(record))
    }
}
