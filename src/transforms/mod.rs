/*!
# Transforms module
One [`RecordTransform`](crate::rewriter::RecordTransform) per caller quirk or filter.
*/
/// Drops records on undeclared contigs
pub mod contigs;
/// GDC metadata header rewrite
pub mod gdc_header;
/// Drops records with non-ACGT alleles
pub mod nonstandard;
/// Tags records flagged by dToxoG
pub mod oxog;
/// Pindel genotype and INFO normalization
pub mod pindel;
/// DKFZ position sanity filter
pub mod position;
/// Sanger Pindel genotype fix
pub mod sanger_pindel;
/// Somatic score threshold filter
pub mod somatic_score;
/// Strelka genotype derivation
pub mod strelka;
/// SvABA FORMAT header fix
pub mod svaba;
