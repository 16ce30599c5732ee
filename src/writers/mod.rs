/*!
# Writers module
Contains the logic for writing the output files: rewritten VCFs, dToxoG MAFs, and interval lists.
*/
/// Generates the dToxoG MAF from a SNP VCF
pub mod maf_writer;
/// Helper functions for compressing and indexing outputs
pub mod noodles_idx;
/// Generates the OxoG interval list
pub mod oxog_intervals;
/// Converts dToxoG failures back into a minimal VCF
pub mod oxog_vcf;
/// Plain-text VCF writer
pub mod vcf_writer;
