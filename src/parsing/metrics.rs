
use anyhow::Context;
use log::debug;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::path::Path;

use crate::parsing::vcf_reader::open_text_file;

/// One row of the per-site OxoG metrics table
#[allow(non_snake_case)]
#[derive(Clone, Debug, Deserialize)]
struct OxogMetricsRow {
    contig: String,
    position: String,
    F1_A: u64, F2_A: u64, R1_A: u64, R2_A: u64,
    F1_C: u64, F2_C: u64, R1_C: u64, R2_C: u64,
    F1_G: u64, F2_G: u64, R1_G: u64, R2_G: u64,
    F1_T: u64, F2_T: u64, R1_T: u64, R2_T: u64
}

/// Orientation-collapsed read counts for a single base
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StrandCounts {
    /// F1 + R2
    pub f1r2: u64,
    /// F2 + R1
    pub f2r1: u64
}

/// Read counts per base at a single site
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SiteCounts {
    a: StrandCounts,
    c: StrandCounts,
    g: StrandCounts,
    t: StrandCounts
}

impl SiteCounts {
    pub fn new(a: StrandCounts, c: StrandCounts, g: StrandCounts, t: StrandCounts) -> Self {
        Self { a, c, g, t }
    }

    /// Counts for a base, case-insensitive.
    /// N has no metrics columns and always counts zero; None for anything but A/C/G/T/N.
    pub fn base(&self, base: &str) -> Option<StrandCounts> {
        match base.to_ascii_uppercase().as_str() {
            "A" => Some(self.a),
            "C" => Some(self.c),
            "G" => Some(self.g),
            "T" => Some(self.t),
            "N" => Some(StrandCounts::default()),
            _ => None
        }
    }
}

impl From<&OxogMetricsRow> for SiteCounts {
    fn from(row: &OxogMetricsRow) -> Self {
        Self {
            a: StrandCounts { f1r2: row.F1_A + row.R2_A, f2r1: row.F2_A + row.R1_A },
            c: StrandCounts { f1r2: row.F1_C + row.R2_C, f2r1: row.F2_C + row.R1_C },
            g: StrandCounts { f1r2: row.F1_G + row.R2_G, f2r1: row.F2_G + row.R1_G },
            t: StrandCounts { f1r2: row.F1_T + row.R2_T, f2r1: row.F2_T + row.R1_T }
        }
    }
}

/// Builds the `contig:position` lookup key
pub fn site_key(contig: &str, position: u64) -> String {
    format!("{contig}:{position}")
}

/// OxoG metrics keyed by `contig:position`
#[derive(Debug, Default)]
pub struct OxogMetricsTable {
    sites: FxHashMap<String, SiteCounts>
}

impl OxogMetricsTable {
    /// Loads a tab-delimited metrics file with a header row
    /// # Arguments
    /// * `filename` - plain or gzip-compressed TSV
    pub fn from_path(filename: &Path) -> anyhow::Result<Self> {
        let reader = open_text_file(filename)?;
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .from_reader(reader);

        let mut sites = FxHashMap::default();
        for result in csv_reader.deserialize() {
            let row: OxogMetricsRow = result
                .with_context(|| format!("Error while parsing {filename:?}:"))?;
            let key = format!("{}:{}", row.contig.trim(), row.position.trim());
            sites.insert(key, SiteCounts::from(&row));
        }
        debug!("Loaded {} OxoG metric sites from {filename:?}", sites.len());
        Ok(Self { sites })
    }

    pub fn insert(&mut self, key: String, counts: SiteCounts) {
        self.sites.insert(key, counts);
    }

    pub fn get(&self, key: &str) -> Option<&SiteCounts> {
        self.sites.get(key)
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.tsv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "contig\tposition\tref\tF1_A\tF2_A\tR1_A\tR2_A\tF1_C\tF2_C\tR1_C\tR2_C\tF1_G\tF2_G\tR1_G\tR2_G\tF1_T\tF2_T\tR1_T\tR2_T").unwrap();
        writeln!(file, "chr1\t100\tC\t0\t0\t0\t0\t5\t6\t7\t8\t0\t0\t0\t0\t1\t2\t3\t4").unwrap();
        drop(file);

        let table = OxogMetricsTable::from_path(&path).unwrap();
        assert_eq!(table.len(), 1);
        let counts = table.get(&site_key("chr1", 100)).unwrap();
        assert_eq!(counts.base("C"), Some(StrandCounts { f1r2: 13, f2r1: 13 }));
        assert_eq!(counts.base("t"), Some(StrandCounts { f1r2: 5, f2r1: 5 }));
        assert_eq!(counts.base("N"), Some(StrandCounts::default()));
        assert_eq!(counts.base("AC"), None);
        assert!(table.get("chr1:101").is_none());
    }
}
