
use clap::Args;
use log::info;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::core::{check_distinct_output, check_required_filename, AFTER_HELP, FULL_VERSION};

/// Input/output options shared by every single-VCF rewrite
#[derive(Args, Clone, Default, Serialize)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct RewriteSettings {
    /// Input variant call file (VCF), optionally gzipped
    #[clap(required = true)]
    #[clap(value_name = "INPUT")]
    #[clap(help_heading = Some("Input/Output"))]
    pub input_vcf: PathBuf,

    /// Output file; a ".gz" suffix produces a bgzipped and indexed VCF
    #[clap(required = true)]
    #[clap(value_name = "OUTPUT")]
    #[clap(help_heading = Some("Input/Output"))]
    pub output_vcf: PathBuf,

    /// Optional output summary of the record counts (JSON)
    #[clap(long = "summary-json")]
    #[clap(value_name = "JSON")]
    #[clap(help_heading = Some("Input/Output"))]
    pub summary_json: Option<PathBuf>,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

/// Validates and logs the shared rewrite options
/// # Arguments
/// * `settings` - the parsed options
/// * `command` - sub-command name for the log banner
pub fn check_rewrite_settings(settings: RewriteSettings, command: &str) -> anyhow::Result<RewriteSettings> {
    info!("varfilt version: {:?}", &*FULL_VERSION);
    info!("Sub-command: {command}");
    info!("Inputs:");
    check_required_filename(&settings.input_vcf, "Input VCF")?;
    info!("\tInput VCF: {:?}", &settings.input_vcf);

    info!("Outputs:");
    check_distinct_output(&settings.input_vcf, &settings.output_vcf, "input VCF")?;
    info!("\tOutput: {:?}", &settings.output_vcf);
    if let Some(summary_fn) = settings.summary_json.as_deref() {
        info!("\tSummary JSON: {summary_fn:?}");
    } else {
        info!("\tSummary JSON: None");
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_rewrite_settings() {
        let dir = tempfile::tempdir().unwrap();
        let input_vcf = dir.path().join("input.vcf");
        std::fs::write(&input_vcf, "##fileformat=VCFv4.2\n").unwrap();

        let settings = RewriteSettings {
            input_vcf: input_vcf.clone(),
            output_vcf: dir.path().join("output.vcf.gz"),
            ..Default::default()
        };
        assert!(check_rewrite_settings(settings, "filter-contigs").is_ok());

        let same_path = RewriteSettings {
            input_vcf: input_vcf.clone(),
            output_vcf: input_vcf.clone(),
            ..Default::default()
        };
        assert!(check_rewrite_settings(same_path, "filter-contigs").is_err());

        // input.vcf.gz would be staged as input.vcf, truncating the input
        let staged_over_input = RewriteSettings {
            input_vcf: input_vcf.clone(),
            output_vcf: dir.path().join("input.vcf.gz"),
            ..Default::default()
        };
        assert!(check_rewrite_settings(staged_over_input, "filter-contigs").is_err());
        assert!(input_vcf.exists());

        let missing = RewriteSettings {
            input_vcf: dir.path().join("missing.vcf"),
            output_vcf: dir.path().join("output.vcf"),
            ..Default::default()
        };
        assert!(check_rewrite_settings(missing, "filter-contigs").is_err());
    }
}
