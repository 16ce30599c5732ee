
use log::{LevelFilter, error, info};
use std::path::Path;
use std::time::Instant;

use varfilt::cli::core::{Commands, error_exit_code, get_cli};
use varfilt::cli::gdc::{GdcSettings, check_gdc_settings};
use varfilt::cli::oxog::{
    AddOxogSettings, CreateMafSettings, ExtractOxoqSettings, MafToVcfSettings,
    check_add_oxog_settings, check_create_maf_settings, check_extract_oxoq_settings, check_maf_to_vcf_settings
};
use varfilt::cli::rewrite::{RewriteSettings, check_rewrite_settings};
use varfilt::cli::somatic_score::{SomaticScoreSettings, check_somatic_score_settings};
use varfilt::parsing::metrics::OxogMetricsTable;
use varfilt::parsing::oxoq_db::{SqliteOxoMetrics, extract_oxoq, format_oxoq};
use varfilt::parsing::reference::ReferenceLookup;
use varfilt::rewriter::{RecordTransform, RewriteSummary, VcfRewriter};
use varfilt::transforms::contigs::ContigFilter;
use varfilt::transforms::gdc_header::GdcHeaderFormatter;
use varfilt::transforms::nonstandard::NonstandardVariantFilter;
use varfilt::transforms::oxog::OxogFilterTagger;
use varfilt::transforms::pindel::PindelFormatter;
use varfilt::transforms::position::DkfzPositionFilter;
use varfilt::transforms::sanger_pindel::SangerPindelFormatter;
use varfilt::transforms::somatic_score::SomaticScoreFilter;
use varfilt::transforms::strelka::StrelkaFormatter;
use varfilt::transforms::svaba::SvabaFormatter;
use varfilt::util::json_io::save_json;
use varfilt::writers::maf_writer::{DtoxogMafBuilder, write_dtoxog_maf};
use varfilt::writers::noodles_idx::finalize_output;
use varfilt::writers::oxog_intervals::write_oxog_intervals;
use varfilt::writers::oxog_vcf::dtoxog_maf_to_vcf;
use varfilt::writers::vcf_writer::plain_output_path;

/// Sets up logging before we check the other settings
fn init_logging(verbosity: u8) {
    let filter_level: LevelFilter = match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace
    };
    env_logger::builder()
        .format_timestamp_millis()
        .filter_level(filter_level)
        .init();
}

/// Logs the error and exits with the code matching its cause
fn exit_with_error(message: &str, e: anyhow::Error) -> ! {
    error!("{message}: {e:#}");
    std::process::exit(error_exit_code(&e));
}

fn save_summary(summary: &RewriteSummary, summary_fn: Option<&Path>) {
    if let Some(summary_fn) = summary_fn {
        info!("Saving summary to {summary_fn:?}...");
        if let Err(e) = save_json(summary, summary_fn) {
            error!("Error while saving summary: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    }
}

/// Streams the input through the transform, then compresses and indexes `.gz` targets
fn execute_rewrite<T: RecordTransform>(settings: &RewriteSettings, transform: &mut T) {
    let start_time = Instant::now();

    let mut rewriter = VcfRewriter::new(&settings.input_vcf, &settings.output_vcf)
        .with_progress(true);
    let summary = match rewriter.run(transform) {
        Ok(s) => s,
        Err(e) => exit_with_error(&format!("Error while rewriting {:?}", settings.input_vcf), e)
    };

    if let Err(e) = finalize_output(&rewriter.plain_output(), &settings.output_vcf) {
        error!("Error while finalizing {:?}: {e:#}", settings.output_vcf);
        std::process::exit(exitcode::IOERR);
    }
    save_summary(&summary, settings.summary_json.as_deref());

    info!("Rewrite completed in {} seconds.", start_time.elapsed().as_secs_f64());
}

/// Shared entry point for the tools that only need the input and output paths
fn run_rewrite<T, F>(settings: RewriteSettings, command: &str, build_transform: F)
where
    T: RecordTransform,
    F: FnOnce() -> T
{
    init_logging(settings.verbosity);
    let settings = match check_rewrite_settings(settings, command) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };

    let mut transform = build_transform();
    execute_rewrite(&settings, &mut transform);
}

fn run_filter_somatic_score(settings: SomaticScoreSettings) {
    init_logging(settings.io.verbosity);
    let (settings, config) = match check_somatic_score_settings(settings)
        .and_then(|s| {
            let config = s.filter_config()?;
            Ok((s, config))
        }) {
        Ok(sc) => sc,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };

    let mut transform = SomaticScoreFilter::new(config);
    execute_rewrite(&settings.io, &mut transform);
}

fn run_format_gdc(settings: GdcSettings) {
    init_logging(settings.io.verbosity);
    let settings = match check_gdc_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };

    let mut transform = GdcHeaderFormatter::new(settings.header_fields());
    execute_rewrite(&settings.io, &mut transform);
}

fn run_add_oxog_filters(settings: AddOxogSettings) {
    init_logging(settings.verbosity);
    let settings = match check_add_oxog_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };

    info!("Loading dToxoG sites from {:?}...", settings.dtoxog_vcf);
    let mut transform = match OxogFilterTagger::from_vcf(&settings.dtoxog_vcf) {
        Ok(t) => t,
        Err(e) => exit_with_error("Error while loading dToxoG VCF", e)
    };
    execute_rewrite(&settings.io(), &mut transform);
}

fn run_create_oxog_intervals(settings: RewriteSettings) {
    init_logging(settings.verbosity);
    let settings = match check_rewrite_settings(settings, "create-oxog-intervals") {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };

    let start_time = Instant::now();
    let summary = match write_oxog_intervals(&settings.input_vcf, &settings.output_vcf) {
        Ok(s) => s,
        Err(e) => exit_with_error("Error while writing intervals", e)
    };
    info!("Wrote {} intervals to {:?}", summary.written, settings.output_vcf);
    save_summary(&summary, settings.summary_json.as_deref());

    info!("Intervals completed in {} seconds.", start_time.elapsed().as_secs_f64());
}

fn run_create_dtoxog_maf(settings: CreateMafSettings) {
    init_logging(settings.verbosity);
    let settings = match check_create_maf_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };

    let start_time = Instant::now();
    info!("Loading reference genome from {:?}...", settings.reference_fn);
    let reference = match ReferenceLookup::from_fasta(&settings.reference_fn) {
        Ok(r) => r,
        Err(e) => exit_with_error("Error while loading reference genome", e)
    };

    info!("Loading OxoG metrics from {:?}...", settings.oxog_metrics_fn);
    let metrics = match OxogMetricsTable::from_path(&settings.oxog_metrics_fn) {
        Ok(m) => m,
        Err(e) => exit_with_error("Error while loading OxoG metrics", e)
    };
    info!("Loaded metrics for {} sites", metrics.len());

    let builder = DtoxogMafBuilder::new(&reference, &metrics, settings.oxoq_score);
    let summary = match write_dtoxog_maf(&settings.input_vcf, &settings.output_maf, &builder) {
        Ok(s) => s,
        Err(e) => exit_with_error("Error while writing dToxoG MAF", e)
    };
    info!(
        "[create_dtoxog_maf] Processed {} records, wrote {} MAF rows, and skipped {}",
        summary.processed, summary.written, summary.removed
    );
    save_summary(&summary, settings.summary_json.as_deref());

    info!("MAF creation completed in {} seconds.", start_time.elapsed().as_secs_f64());
}

fn run_dtoxog_maf_to_vcf(settings: MafToVcfSettings) {
    init_logging(settings.verbosity);
    let settings = match check_maf_to_vcf_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };

    let start_time = Instant::now();
    info!("Loading reference genome from {:?}...", settings.reference_fn);
    let reference = match ReferenceLookup::from_fasta(&settings.reference_fn) {
        Ok(r) => r,
        Err(e) => exit_with_error("Error while loading reference genome", e)
    };

    let plain_fn = plain_output_path(&settings.output_vcf);
    let summary = match dtoxog_maf_to_vcf(&settings.input_maf, &reference, &plain_fn) {
        Ok(s) => s,
        Err(e) => exit_with_error("Error while converting dToxoG MAF", e)
    };
    if let Err(e) = finalize_output(&plain_fn, &settings.output_vcf) {
        error!("Error while finalizing {:?}: {e:#}", settings.output_vcf);
        std::process::exit(exitcode::IOERR);
    }
    info!(
        "[dtoxog_maf_to_vcf] Processed {} MAF rows and wrote {} failed sites",
        summary.processed, summary.written
    );
    save_summary(&summary, settings.summary_json.as_deref());

    info!("Conversion completed in {} seconds.", start_time.elapsed().as_secs_f64());
}

fn run_extract_oxoq(settings: ExtractOxoqSettings) {
    init_logging(settings.verbosity);
    let settings = match check_extract_oxoq_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };

    let source = match SqliteOxoMetrics::open(&settings.db_fn, &settings.table) {
        Ok(s) => s,
        Err(e) => exit_with_error("Error while opening metrics database", e)
    };
    let score = match extract_oxoq(&source, &settings.context, &settings.input_state) {
        Ok(s) => s,
        Err(e) => exit_with_error("Error while extracting oxoQ", e)
    };
    let score = format_oxoq(score);
    info!("oxoQ score: {score}");
    println!("{score}");
}

fn main() {
    let cli = get_cli();
    match cli.command {
        Commands::FilterContigs(settings) => {
            run_rewrite(*settings, "filter-contigs", ContigFilter::default);
        },
        Commands::FilterNonstandardVariants(settings) => {
            run_rewrite(*settings, "filter-nonstandard-variants", || NonstandardVariantFilter);
        },
        Commands::PositionFilterDkfz(settings) => {
            run_rewrite(*settings, "position-filter-dkfz", || DkfzPositionFilter);
        },
        Commands::FilterSomaticScore(settings) => {
            run_filter_somatic_score(*settings);
        },
        Commands::FormatPindelVcf(settings) => {
            run_rewrite(*settings, "format-pindel-vcf", || PindelFormatter);
        },
        Commands::FormatSangerPindelVcf(settings) => {
            run_rewrite(*settings, "format-sanger-pindel-vcf", || SangerPindelFormatter);
        },
        Commands::FormatStrelkaVcf(settings) => {
            run_rewrite(*settings, "format-strelka-vcf", || StrelkaFormatter);
        },
        Commands::FormatSvabaVcf(settings) => {
            run_rewrite(*settings, "format-svaba-vcf", || SvabaFormatter);
        },
        Commands::FormatGdcVcf(settings) => {
            run_format_gdc(*settings);
        },
        Commands::AddOxogFilters(settings) => {
            run_add_oxog_filters(*settings);
        },
        Commands::CreateOxogIntervals(settings) => {
            run_create_oxog_intervals(*settings);
        },
        Commands::CreateDtoxogMaf(settings) => {
            run_create_dtoxog_maf(*settings);
        },
        Commands::DtoxogMafToVcf(settings) => {
            run_dtoxog_maf_to_vcf(*settings);
        },
        Commands::ExtractOxoq(settings) => {
            run_extract_oxoq(*settings);
        }
    }

    info!("Process finished successfully.");
}
