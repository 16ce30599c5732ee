/*!
# Parsing module
Contains the logic for parsing input files into meaningful structs / data.
*/
/// Reader for the MAF-like TSV produced by dToxoG
pub mod maf;
/// Loader for the OxoG metrics TSV
pub mod metrics;
/// oxoQ score extraction from the metrics database
pub mod oxoq_db;
/// Reference sequence lookups
pub mod reference;
/// Line-oriented VCF reader that indexes the header
pub mod vcf_reader;
