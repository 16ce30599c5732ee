
use anyhow::ensure;
use clap::Args;
use log::info;
use serde::Serialize;

use crate::cli::core::AFTER_HELP;
use crate::cli::rewrite::{check_rewrite_settings, RewriteSettings};
use crate::transforms::somatic_score::{SomaticScoreConfig, SomaticScoreConfigBuilder};

#[derive(Args, Clone, Default, Serialize)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct SomaticScoreSettings {
    #[command(flatten)]
    pub io: RewriteSettings,

    /// Sample column holding the somatic score
    #[clap(long = "tumor-sample-name")]
    #[clap(value_name = "SAMPLE")]
    #[clap(help_heading = Some("Filter parameters"))]
    #[clap(default_value = "TUMOR")]
    pub tumor_sample_name: String,

    /// Records with a somatic score below this are removed
    #[clap(long = "drop-somatic-score")]
    #[clap(value_name = "SCORE")]
    #[clap(help_heading = Some("Filter parameters"))]
    #[clap(default_value = "25")]
    pub drop_somatic_score: i64,

    /// Records with a somatic score below this are tagged "ssc<SCORE>"
    #[clap(long = "min-somatic-score")]
    #[clap(value_name = "SCORE")]
    #[clap(help_heading = Some("Filter parameters"))]
    #[clap(default_value = "40")]
    pub min_somatic_score: i64,
}

impl SomaticScoreSettings {
    pub fn filter_config(&self) -> anyhow::Result<SomaticScoreConfig> {
        Ok(SomaticScoreConfigBuilder::default()
            .tumor_sample_name(self.tumor_sample_name.clone())
            .drop_somatic_score(self.drop_somatic_score)
            .min_somatic_score(self.min_somatic_score)
            .build()?)
    }
}

pub fn check_somatic_score_settings(mut settings: SomaticScoreSettings) -> anyhow::Result<SomaticScoreSettings> {
    settings.io = check_rewrite_settings(settings.io, "filter-somatic-score")?;

    info!("Filter parameters:");
    ensure!(!settings.tumor_sample_name.is_empty(), "--tumor-sample-name must not be empty");
    info!("\tTumor sample: {:?}", settings.tumor_sample_name);
    ensure!(
        settings.drop_somatic_score <= settings.min_somatic_score,
        "--drop-somatic-score must be <= --min-somatic-score"
    );
    info!("\tDrop somatic score: < {}", settings.drop_somatic_score);
    info!("\tTag somatic score: < {}", settings.min_somatic_score);

    Ok(settings)
}
