
use crate::data_types::genotype::Genotype;
use crate::data_types::header_index::HeaderIndex;
use crate::data_types::record::Record;
use crate::data_types::sample::{with_format_value, GT_KEY, NORMAL_SAMPLE, TUMOR_SAMPLE};
use crate::rewriter::{RecordAction, RecordTransform};

/// Sanger Pindel reports no useful genotypes; the tumor is set to 0/1 and the normal to 0/0
#[derive(Default)]
pub struct SangerPindelFormatter;

impl RecordTransform for SangerPindelFormatter {
    fn label(&self) -> &str {
        "format_sanger_pindel_vcf"
    }

    fn prepare_header(&mut self, header: &mut HeaderIndex) -> anyhow::Result<()> {
        header.require_samples(&[NORMAL_SAMPLE, TUMOR_SAMPLE])?;
        Ok(())
    }

    fn transform(&mut self, record: Record) -> anyhow::Result<RecordAction> {
        let tumor = with_format_value(&record, TUMOR_SAMPLE, GT_KEY, &Genotype::heterozygous().to_string())?;
        let normal = with_format_value(&record, NORMAL_SAMPLE, GT_KEY, &Genotype::homozygous_reference().to_string())?;
        Ok(RecordAction::Write(record.replace([(TUMOR_SAMPLE, tumor), (NORMAL_SAMPLE, normal)])?))
    }
}
