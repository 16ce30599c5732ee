
use anyhow::ensure;
use clap::Args;
use log::info;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::core::{check_distinct_output, check_required_filename, AFTER_HELP, FULL_VERSION};
use crate::cli::rewrite::{check_rewrite_settings, RewriteSettings};

#[derive(Args, Clone, Default, Serialize)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct AddOxogSettings {
    /// Input variant call file (VCF), optionally gzipped
    #[clap(required = true)]
    #[clap(value_name = "INPUT")]
    #[clap(help_heading = Some("Input/Output"))]
    pub input_vcf: PathBuf,

    /// VCF of the sites that failed dToxoG
    #[clap(required = true)]
    #[clap(value_name = "DTOXOG_VCF")]
    #[clap(help_heading = Some("Input/Output"))]
    pub dtoxog_vcf: PathBuf,

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

impl AddOxogSettings {
    /// The rewrite portion of these settings
    pub fn io(&self) -> RewriteSettings {
        RewriteSettings {
            input_vcf: self.input_vcf.clone(),
            output_vcf: self.output_vcf.clone(),
            summary_json: self.summary_json.clone(),
            verbosity: self.verbosity
        }
    }
}

pub fn check_add_oxog_settings(settings: AddOxogSettings) -> anyhow::Result<AddOxogSettings> {
    check_rewrite_settings(settings.io(), "add-oxog-filters")?;
    check_required_filename(&settings.dtoxog_vcf, "dToxoG VCF")?;
    check_distinct_output(&settings.dtoxog_vcf, &settings.output_vcf, "dToxoG VCF")?;
    info!("\tdToxoG VCF: {:?}", &settings.dtoxog_vcf);
    Ok(settings)
}

#[derive(Args, Clone, Default, Serialize)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct CreateMafSettings {
    /// Input SNP-only variant call file (VCF)
    #[clap(required = true)]
    #[clap(value_name = "INPUT")]
    #[clap(help_heading = Some("Input/Output"))]
    pub input_vcf: PathBuf,

    /// Output dToxoG MAF
    #[clap(required = true)]
    #[clap(value_name = "OUTPUT")]
    #[clap(help_heading = Some("Input/Output"))]
    pub output_maf: PathBuf,

    /// Reference FASTA file
    #[clap(required = true)]
    #[clap(short = 'r')]
    #[clap(long = "reference")]
    #[clap(value_name = "FASTA")]
    #[clap(help_heading = Some("Input/Output"))]
    pub reference_fn: PathBuf,

    /// OxoG metrics per site (TSV)
    #[clap(required = true)]
    #[clap(long = "oxog-metrics")]
    #[clap(value_name = "TSV")]
    #[clap(help_heading = Some("Input/Output"))]
    pub oxog_metrics_fn: PathBuf,

    /// Optional output summary of the record counts (JSON)
    #[clap(long = "summary-json")]
    #[clap(value_name = "JSON")]
    #[clap(help_heading = Some("Input/Output"))]
    pub summary_json: Option<PathBuf>,

    /// The oxoQ score of the library
    #[clap(required = true)]
    #[clap(long = "oxoq-score")]
    #[clap(value_name = "FLOAT")]
    #[clap(help_heading = Some("dToxoG parameters"))]
    pub oxoq_score: f64,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

pub fn check_create_maf_settings(settings: CreateMafSettings) -> anyhow::Result<CreateMafSettings> {
    info!("varfilt version: {:?}", &*FULL_VERSION);
    info!("Sub-command: create-dtoxog-maf");
    info!("Inputs:");
    check_required_filename(&settings.input_vcf, "Input VCF")?;
    info!("\tInput VCF: {:?}", &settings.input_vcf);
    check_required_filename(&settings.reference_fn, "Reference FASTA")?;
    info!("\tReference: {:?}", &settings.reference_fn);
    check_required_filename(&settings.oxog_metrics_fn, "OxoG metrics")?;
    info!("\tOxoG metrics: {:?}", &settings.oxog_metrics_fn);

    info!("Outputs:");
    check_distinct_output(&settings.input_vcf, &settings.output_maf, "input VCF")?;
    info!("\tMAF: {:?}", &settings.output_maf);
    info!("\tSummary JSON: {:?}", &settings.summary_json);

    info!("dToxoG parameters:");
    ensure!(settings.oxoq_score.is_finite(), "--oxoq-score must be a finite number");
    info!("\toxoQ score: {}", settings.oxoq_score);

    Ok(settings)
}

#[derive(Args, Clone, Default, Serialize)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct MafToVcfSettings {
    /// dToxoG MAF with the oxoGCut column
    #[clap(required = true)]
    #[clap(value_name = "INPUT_MAF")]
    #[clap(help_heading = Some("Input/Output"))]
    pub input_maf: PathBuf,

    /// Reference FASTA file, used for the contig lines
    #[clap(required = true)]
    #[clap(value_name = "REFERENCE")]
    #[clap(help_heading = Some("Input/Output"))]
    pub reference_fn: PathBuf,

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

pub fn check_maf_to_vcf_settings(settings: MafToVcfSettings) -> anyhow::Result<MafToVcfSettings> {
    info!("varfilt version: {:?}", &*FULL_VERSION);
    info!("Sub-command: dtoxog-maf-to-vcf");
    info!("Inputs:");
    check_required_filename(&settings.input_maf, "Input MAF")?;
    info!("\tInput MAF: {:?}", &settings.input_maf);
    check_required_filename(&settings.reference_fn, "Reference FASTA")?;
    info!("\tReference: {:?}", &settings.reference_fn);

    info!("Outputs:");
    check_distinct_output(&settings.input_maf, &settings.output_vcf, "input MAF")?;
    info!("\tOutput VCF: {:?}", &settings.output_vcf);
    info!("\tSummary JSON: {:?}", &settings.summary_json);

    Ok(settings)
}

#[derive(Args, Clone, Default, Serialize)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct ExtractOxoqSettings {
    /// SQLite database holding the OxoG metrics table
    #[clap(required = true)]
    #[clap(value_name = "DB")]
    #[clap(help_heading = Some("Input/Output"))]
    pub db_fn: PathBuf,

    /// Sequence context to aggregate
    #[clap(long = "context")]
    #[clap(value_name = "CONTEXT")]
    #[clap(help_heading = Some("Query parameters"))]
    #[clap(default_value = "CCG")]
    pub context: String,

    /// Metrics table name
    #[clap(long = "table")]
    #[clap(value_name = "TABLE")]
    #[clap(help_heading = Some("Query parameters"))]
    #[clap(default_value = "picard_CollectOxoGMetrics")]
    pub table: String,

    /// Input state of the metrics rows
    #[clap(long = "input-state")]
    #[clap(value_name = "STATE")]
    #[clap(help_heading = Some("Query parameters"))]
    #[clap(default_value = "markduplicates_readgroups")]
    pub input_state: String,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

pub fn check_extract_oxoq_settings(settings: ExtractOxoqSettings) -> anyhow::Result<ExtractOxoqSettings> {
    info!("varfilt version: {:?}", &*FULL_VERSION);
    info!("Sub-command: extract-oxoq");
    info!("Inputs:");
    check_required_filename(&settings.db_fn, "Metrics database")?;
    info!("\tDatabase: {:?}", &settings.db_fn);

    info!("Query parameters:");
    info!("\tTable: {:?}", settings.table);
    info!("\tContext: {:?}", settings.context);
    info!("\tInput state: {:?}", settings.input_state);

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_oxog_io() {
        let settings = AddOxogSettings {
            input_vcf: PathBuf::from("calls.vcf.gz"),
            dtoxog_vcf: PathBuf::from("dtoxog.vcf"),
            output_vcf: PathBuf::from("tagged.vcf.gz"),
            summary_json: None,
            verbosity: 1
        };
        let io = settings.io();
        assert_eq!(io.input_vcf, PathBuf::from("calls.vcf.gz"));
        assert_eq!(io.output_vcf, PathBuf::from("tagged.vcf.gz"));
        assert_eq!(io.verbosity, 1);
    }

    #[test]
    fn test_missing_dtoxog_vcf() {
        let dir = tempfile::tempdir().unwrap();
        let input_vcf = dir.path().join("calls.vcf");
        std::fs::write(&input_vcf, "##fileformat=VCFv4.2\n").unwrap();
        let settings = AddOxogSettings {
            input_vcf,
            dtoxog_vcf: dir.path().join("missing.vcf"),
            output_vcf: dir.path().join("tagged.vcf"),
            ..Default::default()
        };
        assert!(check_add_oxog_settings(settings).is_err());
    }

    #[test]
    fn test_add_oxog_output_overwrites_dtoxog() {
        let dir = tempfile::tempdir().unwrap();
        let input_vcf = dir.path().join("calls.vcf");
        let dtoxog_vcf = dir.path().join("dtoxog.vcf");
        std::fs::write(&input_vcf, "##fileformat=VCFv4.2\n").unwrap();
        std::fs::write(&dtoxog_vcf, "##fileformat=VCFv4.2\n").unwrap();
        let settings = AddOxogSettings {
            input_vcf: input_vcf.clone(),
            dtoxog_vcf,
            output_vcf: dir.path().join("dtoxog.vcf.gz"),
            ..Default::default()
        };
        assert!(check_add_oxog_settings(settings.clone()).is_err());

        let settings = AddOxogSettings {
            output_vcf: dir.path().join("calls.vcf.gz"),
            ..settings
        };
        assert!(check_add_oxog_settings(settings).is_err());
    }

    #[test]
    fn test_oxoq_score_finite() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["snps.vcf", "ref.fa", "metrics.tsv"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        let mut settings = CreateMafSettings {
            input_vcf: dir.path().join("snps.vcf"),
            output_maf: dir.path().join("out.maf"),
            reference_fn: dir.path().join("ref.fa"),
            oxog_metrics_fn: dir.path().join("metrics.tsv"),
            oxoq_score: 35.5,
            ..Default::default()
        };
        assert!(check_create_maf_settings(settings.clone()).is_ok());
        settings.oxoq_score = f64::NAN;
        assert!(check_create_maf_settings(settings).is_err());
    }
}
