/// Genotype parsing and Strelka genotype conversion
pub mod genotype;
/// Ordered, sectioned header model
pub mod header_index;
/// Header line classification into sections
pub mod header_section;
/// INFO field parsing
pub mod info;
/// Data line codec
pub mod record;
/// FORMAT/sample value helpers
pub mod sample;
