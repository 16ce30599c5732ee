
use anyhow::{bail, ensure};
use clap::{Parser, Subcommand};
use chrono::Datelike;
use lazy_static::lazy_static;
use std::path::Path;

use crate::cli::gdc::GdcSettings;
use crate::cli::oxog::{AddOxogSettings, CreateMafSettings, ExtractOxoqSettings, MafToVcfSettings};
use crate::cli::rewrite::RewriteSettings;
use crate::cli::somatic_score::SomaticScoreSettings;
use crate::data_types::genotype::GenotypeError;
use crate::data_types::header_index::HeaderError;
use crate::data_types::record::RecordError;
use crate::transforms::strelka::StrelkaError;
use crate::writers::vcf_writer::plain_output_path;

lazy_static! {
    /// Stores the full version string we plan to use, which is generated in build.rs
    /// # Examples
    /// * `0.3.0-6bb9635-dirty` - while on a dirty branch
    /// * `0.3.0-6bb9635` - with a fresh commit
    pub static ref FULL_VERSION: String = format!("{}-{}", env!("CARGO_PKG_VERSION"), env!("VERGEN_GIT_DESCRIBE"));

    /// Shared after help string
    pub static ref AFTER_HELP: String = format!("Copyright (C) 2017-{}     The varfilt authors.
This program comes with ABSOLUTELY NO WARRANTY; it is intended for
Research Use Only and not for use in diagnostic procedures.", chrono::Utc::now().year());
}

#[derive(Parser)]
#[clap(author,
    version = &**FULL_VERSION,
    about,
    after_help = &**AFTER_HELP)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands
}

/// varfilt, post-processing filters and formatters for somatic variant calls.
/// Select a subcommand to see more usage information:
#[derive(Subcommand)]
pub enum Commands {
    /// Removes records on contigs missing from the header
    FilterContigs(Box<RewriteSettings>),
    /// Removes records with alleles outside of ACGT
    FilterNonstandardVariants(Box<RewriteSettings>),
    /// Removes DKFZ records too close to the contig start
    PositionFilterDkfz(Box<RewriteSettings>),
    /// Drops or tags records by the tumor somatic score (SSC)
    FilterSomaticScore(Box<SomaticScoreSettings>),
    /// Normalizes Pindel genotypes and INFO fields
    FormatPindelVcf(Box<RewriteSettings>),
    /// Sets Sanger Pindel genotypes for NORMAL and TUMOR
    FormatSangerPindelVcf(Box<RewriteSettings>),
    /// Adds genotypes to Strelka SNV and INDEL records
    FormatStrelkaVcf(Box<RewriteSettings>),
    /// Fixes the SvABA FORMAT header definitions
    FormatSvabaVcf(Box<RewriteSettings>),
    /// Rewrites the header with GDC metadata
    FormatGdcVcf(Box<GdcSettings>),
    /// Tags records that failed dToxoG
    AddOxogFilters(Box<AddOxogSettings>),
    /// Writes the interval list used for OxoG metrics collection
    CreateOxogIntervals(Box<RewriteSettings>),
    /// Builds the dToxoG MAF from a SNP VCF
    CreateDtoxogMaf(Box<CreateMafSettings>),
    /// Converts dToxoG failures into a minimal VCF
    DtoxogMafToVcf(Box<MafToVcfSettings>),
    /// Computes the oxoQ score from the metrics database
    ExtractOxoq(Box<ExtractOxoqSettings>)
}

pub fn get_cli() -> Cli {
    Cli::parse()
}

/// Checks if a file exists and will otherwise exit
/// # Arguments
/// * `filename` - the file path to check for
/// * `label` - the label to use for error messages
pub fn check_required_filename(filename: &Path, label: &str) -> anyhow::Result<()> {
    if !filename.exists() {
        bail!("{} does not exist: \"{}\"", label, filename.display());
    }

    // file exists
    Ok(())
}

/// Ensures an output will not overwrite an input.
/// A `.gz` output is first written to its plain path, so that path is checked too.
pub fn check_distinct_output(input: &Path, output: &Path, label: &str) -> anyhow::Result<()> {
    let same_file = |a: &Path, b: &Path| {
        a == b || matches!((a.canonicalize(), b.canonicalize()), (Ok(x), Ok(y)) if x == y)
    };
    let plain = plain_output_path(output);
    ensure!(
        !same_file(input, output) && !same_file(input, &plain),
        "Output {:?} would overwrite the {label} {:?}", output, input
    );
    Ok(())
}

/// Picks the process exit code for a failed run.
/// Malformed input maps to `DATAERR`, anything else is treated as an I/O failure.
pub fn error_exit_code(error: &anyhow::Error) -> i32 {
    let is_data_error = error.chain().any(|cause| {
        cause.is::<RecordError>() ||
            cause.is::<HeaderError>() ||
            cause.is::<StrelkaError>() ||
            cause.is::<GenotypeError>()
    });
    if is_data_error {
        exitcode::DATAERR
    } else {
        exitcode::IOERR
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_error_exit_code() {
        let data_error: anyhow::Result<()> = Err(RecordError::MissingField { name: "POS".to_string(), found: 1, expected: 8 })
            .context("Error while decoding line 3");
        assert_eq!(error_exit_code(&data_error.unwrap_err()), exitcode::DATAERR);

        let io_error: anyhow::Result<()> = Err(std::io::Error::other("disk full"))
            .context("Error while writing");
        assert_eq!(error_exit_code(&io_error.unwrap_err()), exitcode::IOERR);
    }

    #[test]
    fn test_required_filename() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_required_filename(dir.path(), "Folder").is_ok());
        let err = check_required_filename(&dir.path().join("missing.vcf"), "Input VCF").unwrap_err();
        assert!(err.to_string().starts_with("Input VCF does not exist"));
    }

    #[test]
    fn test_distinct_output() {
        let dir = tempfile::tempdir().unwrap();
        let input_vcf = dir.path().join("calls.vcf");
        std::fs::write(&input_vcf, "##fileformat=VCFv4.2\n").unwrap();

        assert!(check_distinct_output(&input_vcf, &dir.path().join("filtered.vcf.gz"), "input VCF").is_ok());
        assert!(check_distinct_output(&input_vcf, &input_vcf, "input VCF").is_err());
        // calls.vcf.gz is staged as calls.vcf before compression
        assert!(check_distinct_output(&input_vcf, &dir.path().join("calls.vcf.gz"), "input VCF").is_err());
        // same file through a different spelling
        let dotted = dir.path().join(".").join("calls.vcf.gz");
        assert!(check_distinct_output(&input_vcf, &dotted, "input VCF").is_err());
    }
}
