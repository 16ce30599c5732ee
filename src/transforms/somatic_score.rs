
use derive_builder::Builder;

use crate::data_types::header_index::HeaderIndex;
use crate::data_types::record::{add_filter_tag, Record, RecordError, FILTER};
use crate::data_types::sample::{format_value, TUMOR_SAMPLE};
use crate::rewriter::{RecordAction, RecordTransform};

/// FORMAT key holding the somatic score
pub const SOMATIC_SCORE_KEY: &str = "SSC";
pub const DEFAULT_DROP_SOMATIC_SCORE: i64 = 25;
pub const DEFAULT_MIN_SOMATIC_SCORE: i64 = 40;

/// Thresholds for the somatic score filter
#[derive(Builder, Clone, Debug)]
#[builder(default)]
pub struct SomaticScoreConfig {
    /// Sample column holding SSC
    tumor_sample_name: String,
    /// Records scoring below this are dropped
    drop_somatic_score: i64,
    /// Records scoring below this (and not dropped) are tagged
    min_somatic_score: i64
}

impl Default for SomaticScoreConfig {
    fn default() -> Self {
        Self {
            tumor_sample_name: TUMOR_SAMPLE.to_string(),
            drop_somatic_score: DEFAULT_DROP_SOMATIC_SCORE,
            min_somatic_score: DEFAULT_MIN_SOMATIC_SCORE
        }
    }
}

impl SomaticScoreConfig {
    pub fn tumor_sample_name(&self) -> &str {
        &self.tumor_sample_name
    }

    pub fn drop_somatic_score(&self) -> i64 {
        self.drop_somatic_score
    }

    pub fn min_somatic_score(&self) -> i64 {
        self.min_somatic_score
    }

    /// FILTER ID applied to low-scoring records
    pub fn filter_tag(&self) -> String {
        format!("ssc{}", self.min_somatic_score)
    }
}

/// Drops or tags records by the tumor sample's SSC
pub struct SomaticScoreFilter {
    config: SomaticScoreConfig,
    filter_tag: String
}

impl SomaticScoreFilter {
    pub fn new(config: SomaticScoreConfig) -> Self {
        let filter_tag = config.filter_tag();
        Self { config, filter_tag }
    }
}

impl RecordTransform for SomaticScoreFilter {
    fn label(&self) -> &str {
        "filter_somatic_score"
    }

    fn prepare_header(&mut self, header: &mut HeaderIndex) -> anyhow::Result<()> {
        header.require_samples(&[self.config.tumor_sample_name()])?;
        let description = format!("Somatic Score < {}", self.config.min_somatic_score());
        header.declare_filter(&self.filter_tag, &description);
        Ok(())
    }

    fn transform(&mut self, record: Record) -> anyhow::Result<RecordAction> {
        let value = format_value(&record, self.config.tumor_sample_name(), SOMATIC_SCORE_KEY)?;
        let score: f64 = value.parse()
            .map_err(|_e| RecordError::InvalidValue { name: SOMATIC_SCORE_KEY.to_string(), value: value.to_string() })?;

        if score < self.config.drop_somatic_score() as f64 {
            Ok(RecordAction::Drop)
        } else if score < self.config.min_somatic_score() as f64 {
            let filter = add_filter_tag(record.filter()?, &self.filter_tag);
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
    use crate::rewriter::RewriteSummary;

    fn input(scores: &[i64]) -> String {
        let mut text = TEST_HEADER.to_string();
        for (i, score) in scores.iter().enumerate() {
            text.push_str(&format!("chr1\t{}\t.\tA\tC\t.\tPASS\t.\tGT:SSC\t0/0:.\t0/1:{score}\n", i + 10));
        }
        text
    }

    #[test]
    fn test_threshold_scenario() {
        let mut filter = SomaticScoreFilter::new(SomaticScoreConfig::default());
        let (summary, output) = rewrite_text(&input(&[10, 25, 30, 45]), &mut filter).unwrap();
        assert_eq!(summary, RewriteSummary { processed: 4, removed: 1, tagged: 2, written: 3 });
        assert!(output.contains("##FILTER=<ID=ssc40,Description=\"Somatic Score < 40\">"));

        let filters: Vec<&str> = data_lines(&output).iter()
            .map(|l| l.split('\t').nth(6).unwrap())
            .collect();
        assert_eq!(filters, vec!["ssc40", "ssc40", "PASS"]);
    }

    #[test]
    fn test_custom_config() {
        let config = SomaticScoreConfigBuilder::default()
            .drop_somatic_score(5)
            .min_somatic_score(20)
            .build().unwrap();
        assert_eq!(config.tumor_sample_name(), "TUMOR");
        let mut filter = SomaticScoreFilter::new(config);
        let (summary, output) = rewrite_text(&input(&[10, 25]), &mut filter).unwrap();
        assert_eq!((summary.removed, summary.tagged, summary.written), (0, 1, 2));
        assert!(output.contains("ID=ssc20"));
    }

    #[test]
    fn test_missing_tumor_sample() {
        let config = SomaticScoreConfigBuilder::default()
            .tumor_sample_name("PRIMARY".to_string())
            .build().unwrap();
        let mut filter = SomaticScoreFilter::new(config);
        let err = rewrite_text(&input(&[10]), &mut filter).unwrap_err();
        assert!(format!("{err:#}").contains("expected samples PRIMARY"));
    }
}
