
/// Command line interface functionality
pub mod cli;
/// Contains the VCF header and record data types
pub mod data_types;
/// Tooling for parsing input files into meaningful structs / data
pub mod parsing;
/// The streaming VCF rewrite loop shared by every tool
pub mod rewriter;
/// Per-caller record and header transforms
pub mod transforms;
/// Various utility functions that tend to be very generic
pub mod util;
/// All output writers
pub mod writers;
