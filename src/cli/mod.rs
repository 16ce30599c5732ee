/*!
# CLI module
Command line interface functionality that is specific to varfilt.
*/

/// The main CLI module that contains the top-level CLI parser and help text
pub mod core;
/// The format-gdc-vcf CLI subcommand
pub mod gdc;
/// The OxoG family of CLI subcommands
pub mod oxog;
/// Options shared by the single-VCF rewrite subcommands
pub mod rewrite;
/// The filter-somatic-score CLI subcommand
pub mod somatic_score;
