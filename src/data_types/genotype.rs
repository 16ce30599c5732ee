
use itertools::Itertools;
use std::fmt;
use std::str::FromStr;
use strum_macros::EnumString;

use crate::data_types::record::MISSING_VALUE;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum GenotypeError {
    #[error("invalid genotype: {0:?}")]
    Invalid(String),
    #[error("unknown Strelka genotype: {0:?}")]
    UnknownStrelkaGenotype(String)
}

/// A parsed GT value, e.g. `0/1`, `1|0`, or `./.`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Genotype {
    /// Allele indices, None for `.`
    alleles: Vec<Option<usize>>,
    /// True if `|` separates the alleles
    phased: bool
}

impl Genotype {
    pub fn new(alleles: Vec<Option<usize>>, phased: bool) -> Self {
        Self { alleles, phased }
    }

    /// Unphased `0/0`
    pub fn homozygous_reference() -> Self {
        Self::new(vec![Some(0), Some(0)], false)
    }

    /// Unphased `0/1`
    pub fn heterozygous() -> Self {
        Self::new(vec![Some(0), Some(1)], false)
    }

    pub fn alleles(&self) -> &[Option<usize>] {
        &self.alleles
    }

    pub fn is_phased(&self) -> bool {
        self.phased
    }

    /// Returns true if every allele is called and equal to the reference
    pub fn is_homozygous_reference(&self) -> bool {
        !self.alleles.is_empty() && self.alleles.iter().all(|a| *a == Some(0))
    }

    /// First called non-reference allele index
    pub fn first_alt_index(&self) -> Option<usize> {
        self.alleles.iter()
            .flatten()
            .copied()
            .find(|&a| a > 0)
    }
}

impl FromStr for Genotype {
    type Err = GenotypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(GenotypeError::Invalid(s.to_string()));
        }
        let phased = s.contains('|');
        let alleles = s.split(['/', '|'])
            .map(|a| match a {
                MISSING_VALUE => Ok(None),
                index => index.parse::<usize>()
                    .map(Some)
                    .map_err(|_e| GenotypeError::Invalid(s.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { alleles, phased })
    }
}

impl fmt::Display for Genotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = if self.phased { "|" } else { "/" };
        let joined = self.alleles.iter()
            .map(|a| match a {
                Some(index) => index.to_string(),
                None => MISSING_VALUE.to_string()
            })
            .join(separator);
        write!(f, "{joined}")
    }
}

/// Strelka's per-sample genotype categories, as reported in `NT` and `SGT`
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString)]
pub enum StrelkaGenotype {
    #[strum(serialize = "ref")]
    Reference,
    #[strum(serialize = "het")]
    Heterozygous,
    #[strum(serialize = "hom")]
    HomozygousAlternate,
    #[strum(serialize = "conflict")]
    Conflict
}

impl StrelkaGenotype {
    /// Parses a Strelka category, e.g. `het`
    pub fn parse(value: &str) -> Result<Self, GenotypeError> {
        Self::from_str(value)
            .map_err(|_e| GenotypeError::UnknownStrelkaGenotype(value.to_string()))
    }

    /// Equivalent VCF genotype string
    pub fn vcf_genotype(&self) -> &'static str {
        match self {
            StrelkaGenotype::Reference => "0/0",
            StrelkaGenotype::Heterozygous => "0/1",
            StrelkaGenotype::HomozygousAlternate => "1/1",
            StrelkaGenotype::Conflict => "./."
        }
    }
}
