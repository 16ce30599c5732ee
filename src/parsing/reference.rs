
use anyhow::anyhow;
use indexmap::IndexMap;
use log::debug;
use rust_lib_reference_genome::reference_genome::ReferenceGenome;
use std::path::Path;

/// Random access to reference sequence
pub trait SequenceSource {
    /// Returns the bases from `start` to `end`, 1-based and inclusive, truncated at the contig end.
    /// Returns None if the contig is unknown or the range is empty.
    fn fetch(&self, contig: &str, start: u64, end: u64) -> Option<String>;

    /// Contig names with their lengths, in reference order
    fn contig_lengths(&self) -> Vec<(String, usize)>;
}

/// Reference genome loaded fully into memory
pub struct ReferenceLookup {
    genome: ReferenceGenome,
    /// Contig lengths, also used to guard lookups of unknown contigs
    lengths: IndexMap<String, usize>
}

impl ReferenceLookup {
    /// Loads a FASTA file
    /// # Arguments
    /// * `filename` - path to the (optionally gzipped) FASTA
    pub fn from_fasta(filename: &Path) -> anyhow::Result<Self> {
        debug!("Loading reference genome from {filename:?}...");
        let genome = ReferenceGenome::from_fasta(filename)
            .map_err(|e| anyhow!("Error while loading reference genome {filename:?}: {e:?}"))?;
        Ok(Self::from_genome(genome))
    }

    pub fn from_genome(genome: ReferenceGenome) -> Self {
        let lengths = genome.contig_keys()
            .map(|k| (k.clone(), genome.get_full_chromosome(k).expect("key from contig_keys").len()))
            .collect();
        Self { genome, lengths }
    }
}

impl SequenceSource for ReferenceLookup {
    fn fetch(&self, contig: &str, start: u64, end: u64) -> Option<String> {
        let length = *self.lengths.get(contig)?;
        let start = (start.max(1) - 1) as usize;
        let end = (end as usize).min(length);
        if start >= end {
            return None;
        }
        let sequence = self.genome.get_full_chromosome(contig).ok()?;
        Some(String::from_utf8_lossy(&sequence[start..end]).into_owned())
    }

    fn contig_lengths(&self) -> Vec<(String, usize)> {
        self.lengths.iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple_reference() -> ReferenceLookup {
        let mut genome = ReferenceGenome::empty_reference();
        genome.add_contig("chr1".to_string(), "ACCGTTACCAGGACTTGACAAACCG".into()).unwrap();
        ReferenceLookup::from_genome(genome)
    }

    #[test]
    fn test_fetch() {
        let reference = simple_reference();
        assert_eq!(reference.fetch("chr1", 1, 4).as_deref(), Some("ACCG"));
        assert_eq!(reference.fetch("chr1", 5, 5).as_deref(), Some("T"));
        // truncated at the end of the contig
        assert_eq!(reference.fetch("chr1", 20, 100).as_deref(), Some("AAACCG"));
        assert_eq!(reference.fetch("chr1", 30, 40), None);
        assert_eq!(reference.fetch("chr2", 1, 4), None);
        assert_eq!(reference.contig_lengths(), vec![("chr1".to_string(), 25)]);
    }
}
