
use itertools::Itertools;
use lazy_static::lazy_static;
use std::collections::BTreeSet;

use crate::data_types::genotype::StrelkaGenotype;
use crate::data_types::header_index::HeaderIndex;
use crate::data_types::info::InfoField;
use crate::data_types::record::{add_filter_tag, Record, RecordError, FILTER, FORMAT};
use crate::data_types::sample::{prepend_value, GT_KEY, NORMAL_SAMPLE, TUMOR_SAMPLE};
use crate::rewriter::{RecordAction, RecordTransform};

/// Filter applied to indels with a weak somatic quality
pub const LOW_QSI_FILTER: &str = "LowQSI";
const LOW_QSI_DESCRIPTION: &str = "QSI value is at or below 10";
/// Indels with QSI at or below this are tagged
pub const MAX_LOW_QSI: i64 = 10;

lazy_static! {
    static ref COMMON_KEYS: BTreeSet<&'static str> = ["MQ", "MQ0", "NT", "SGT", "SOMATIC", "SomaticEVS"].into_iter().collect();
    static ref INDEL_KEYS: BTreeSet<&'static str> = ["IC", "IHP", "QSI", "OVERLAP", "QSI_NT", "RC", "RU", "TQSI", "TQSI_NT"].into_iter().collect();
    static ref SNV_KEYS: BTreeSet<&'static str> = [
        "ACGTNacgtnMINUS", "ACGTNacgtnPLUS", "DP", "QSS", "QSS_NT", "ReadPosRankSum", "SNVSB", "TQSS", "TQSS_NT"
    ].into_iter().collect();
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum StrelkaError {
    #[error("unable to classify record with INFO {info}; expected common keys {common} plus SNV keys {snv} or INDEL keys {indel}")]
    UnclassifiableRecord { info: String, common: String, snv: String, indel: String }
}

/// Strelka somatic record type, decided from the INFO keys
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrelkaVariantClass {
    Snv,
    Indel
}

/// Classifies a record: INFO keys minus the INDEL-only keys must be exactly the common keys for an INDEL,
/// and likewise with the SNV-only keys for an SNV.
pub fn classify_info(info: &InfoField, raw_info: &str) -> Result<StrelkaVariantClass, StrelkaError> {
    let keys = info.key_set();
    let remainder = |exclusive: &BTreeSet<&'static str>| -> BTreeSet<&str> {
        keys.iter().copied().filter(|k| !exclusive.contains(k)).collect()
    };
    let common: BTreeSet<&str> = COMMON_KEYS.iter().copied().collect();

    if remainder(&INDEL_KEYS) == common {
        Ok(StrelkaVariantClass::Indel)
    } else if remainder(&SNV_KEYS) == common {
        Ok(StrelkaVariantClass::Snv)
    } else {
        Err(StrelkaError::UnclassifiableRecord {
            info: raw_info.to_string(),
            common: COMMON_KEYS.iter().join(","),
            snv: SNV_KEYS.iter().join(","),
            indel: INDEL_KEYS.iter().join(",")
        })
    }
}

/// Reads a required INFO value
fn required_info<'a>(info: &'a InfoField, key: &str, raw_info: &str) -> Result<&'a str, RecordError> {
    info.value(key)
        .ok_or_else(|| RecordError::MissingInfoKey { key: key.to_string(), info: raw_info.to_string() })
}

/// Adds GT to Strelka somatic calls, deriving it from the NT and SGT INFO fields
#[derive(Default)]
pub struct StrelkaFormatter;

impl StrelkaFormatter {
    /// SNV: normal from NT, tumor always 0/1
    fn adjust_snv(&self, record: Record, info: &InfoField, raw_info: &str) -> anyhow::Result<RecordAction> {
        let normal_gt = StrelkaGenotype::parse(required_info(info, "NT", raw_info)?)?.vcf_genotype();
        let updated = self.prepend_genotypes(&record, normal_gt, StrelkaGenotype::Heterozygous.vcf_genotype())?;
        Ok(RecordAction::Write(updated))
    }

    /// INDEL: normal from NT, tumor from the SGT transition target, LowQSI for weak QSI
    fn adjust_indel(&self, record: Record, info: &InfoField, raw_info: &str) -> anyhow::Result<RecordAction> {
        let normal_gt = StrelkaGenotype::parse(required_info(info, "NT", raw_info)?)?.vcf_genotype();
        let sgt = required_info(info, "SGT", raw_info)?;
        let tumor_code = sgt.split_once("->")
            .map(|(_from, to)| to)
            .ok_or_else(|| RecordError::InvalidValue { name: "SGT".to_string(), value: sgt.to_string() })?;
        let tumor_gt = StrelkaGenotype::parse(tumor_code)?.vcf_genotype();

        let qsi_value = required_info(info, "QSI", raw_info)?;
        let qsi: i64 = qsi_value.parse()
            .map_err(|_e| RecordError::InvalidValue { name: "QSI".to_string(), value: qsi_value.to_string() })?;

        let updated = self.prepend_genotypes(&record, normal_gt, tumor_gt)?;
        if qsi <= MAX_LOW_QSI {
            let filter = add_filter_tag(updated.filter()?, LOW_QSI_FILTER);
            Ok(RecordAction::Tag(updated.replace([(FILTER, filter)])?))
        } else {
            Ok(RecordAction::Write(updated))
        }
    }

    fn prepend_genotypes(&self, record: &Record, normal_gt: &str, tumor_gt: &str) -> Result<Record, RecordError> {
        let format = prepend_value(record.format()?, GT_KEY);
        let normal = prepend_value(record.get(NORMAL_SAMPLE)?, normal_gt);
        let tumor = prepend_value(record.get(TUMOR_SAMPLE)?, tumor_gt);
        record.replace([(FORMAT, format), (NORMAL_SAMPLE, normal), (TUMOR_SAMPLE, tumor)])
    }
}

impl RecordTransform for StrelkaFormatter {
    fn label(&self) -> &str {
        "format_strelka_vcf"
    }

    fn prepare_header(&mut self, header: &mut HeaderIndex) -> anyhow::Result<()> {
        header.require_samples(&[NORMAL_SAMPLE, TUMOR_SAMPLE])?;
        header.declare_format(GT_KEY, "1", "String", "Genotype");
        header.declare_filter(LOW_QSI_FILTER, LOW_QSI_DESCRIPTION);
        Ok(())
    }

    fn transform(&mut self, record: Record) -> anyhow::Result<RecordAction> {
        let raw_info = record.info()?.to_string();
        let info = InfoField::parse(&raw_info);
        match classify_info(&info, &raw_info)? {
            StrelkaVariantClass::Snv => self.adjust_snv(record, &info, &raw_info),
            StrelkaVariantClass::Indel => self.adjust_indel(record, &info, &raw_info)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewriter::tests::{data_lines, rewrite_text, TEST_HEADER};

    const SNV_INFO: &str = "SOMATIC;QSS=33;TQSS=1;NT=ref;QSS_NT=33;TQSS_NT=1;SGT=CC->CT;DP=80;MQ=60.00;MQ0=0;ReadPosRankSum=0.1;SNVSB=0.00;SomaticEVS=7.1";
    const INDEL_INFO: &str = "SOMATIC;QSI=8;TQSI=1;NT=het;QSI_NT=8;TQSI_NT=1;SGT=ref->hom;MQ=60.00;MQ0=0;RU=A;RC=3;IC=2;IHP=4;SomaticEVS=5.2";

    #[test]
    fn test_classify() {
        assert_eq!(classify_info(&InfoField::parse(SNV_INFO), SNV_INFO), Ok(StrelkaVariantClass::Snv));
        assert_eq!(classify_info(&InfoField::parse(INDEL_INFO), INDEL_INFO), Ok(StrelkaVariantClass::Indel));

        let odd = "SOMATIC;NT=ref;SGT=ref->het;MQ=1;MQ0=0;SomaticEVS=1;UNKNOWN=1";
        let err = classify_info(&InfoField::parse(odd), odd).unwrap_err();
        let message = err.to_string();
        assert!(message.contains(odd));
        assert!(message.contains("MQ,MQ0,NT,SGT,SOMATIC,SomaticEVS"));
    }

    #[test]
    fn test_snv() {
        let text = format!("{TEST_HEADER}chr1\t5\t.\tC\tT\t.\tPASS\t{SNV_INFO}\tDP:FDP\t40:0\t40:1\n");
        let (_summary, output) = rewrite_text(&text, &mut StrelkaFormatter).unwrap();
        assert_eq!(
            data_lines(&output)[0],
            format!("chr1\t5\t.\tC\tT\t.\tPASS\t{SNV_INFO}\tGT:DP:FDP\t0/0:40:0\t0/1:40:1")
        );
        assert!(output.contains("##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">"));
        assert!(output.contains("##FILTER=<ID=LowQSI,Description=\"QSI value is at or below 10\">"));
    }

    #[test]
    fn test_indel_low_qsi() {
        let text = format!("{TEST_HEADER}chr1\t5\t.\tCA\tC\t.\tPASS\t{INDEL_INFO}\tDP:DP2\t40:40\t38:38\n");
        let (summary, output) = rewrite_text(&text, &mut StrelkaFormatter).unwrap();
        assert_eq!(summary.tagged, 1);
        let fields: Vec<&str> = data_lines(&output)[0].split('\t').collect();
        assert_eq!(fields[6], "LowQSI");
        assert_eq!(&fields[8..], &["GT:DP:DP2", "0/1:40:40", "1/1:38:38"]);
    }

    #[test]
    fn test_indel_passing_qsi() {
        let info = INDEL_INFO.replace("QSI=8;", "QSI=30;");
        let text = format!("{TEST_HEADER}chr1\t5\t.\tCA\tC\t.\tPASS\t{info}\tDP\t40\t38\n");
        let (summary, output) = rewrite_text(&text, &mut StrelkaFormatter).unwrap();
        assert_eq!(summary.tagged, 0);
        assert_eq!(data_lines(&output)[0].split('\t').nth(6), Some("PASS"));
    }

    #[test]
    fn test_unclassifiable_is_fatal() {
        let text = format!("{TEST_HEADER}chr1\t5\t.\tC\tT\t.\tPASS\tDP=3\tDP\t40\t38\n");
        let err = rewrite_text(&text, &mut StrelkaFormatter).unwrap_err();
        assert!(err.chain().any(|e| e.downcast_ref::<StrelkaError>().is_some()));
    }
}
