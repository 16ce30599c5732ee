
use log::debug;

use crate::data_types::genotype::Genotype;
use crate::data_types::header_index::{HeaderIndex, HeaderLine};
use crate::data_types::header_section::{CanonicalSection, LineId, SectionName};
use crate::data_types::info::InfoField;
use crate::data_types::record::{Record, INFO};
use crate::data_types::sample::{format_value, with_format_value, GT_KEY, TUMOR_SAMPLE};
use crate::rewriter::{RecordAction, RecordTransform};

/// INFO flag marking a genotype that was forced to heterozygous
pub const FORCED_HET_FLAG: &str = "forcedHet";
const FORCED_HET_DESCRIPTION: &str = "The original homozygous-reference call was converted to heterozygous-alt.";
/// Pindel's structural variant type key and its replacement
const PINDEL_SVTYPE: &str = "SVTYPE";
const RENAMED_SVTYPE: &str = "TYPEOFSV";
/// Attribute removed from the renamed INFO definition
const DROPPED_ATTRIBUTE: &str = "IDX";

/// Normalizes Pindel output: forces homozygous-reference tumor calls to heterozygous and renames SVTYPE
#[derive(Default)]
pub struct PindelFormatter;

/// Renames the SVTYPE definition to TYPEOFSV, dropping IDX. Returns false if there was no SVTYPE line.
fn rename_svtype_definition(header: &mut HeaderIndex) -> bool {
    let info: SectionName = CanonicalSection::Info.into();
    let Some(line) = header.remove_line(&info, &LineId::from(PINDEL_SVTYPE)) else {
        return false;
    };
    match line.structured() {
        Some(mut attributes) => {
            attributes.insert("ID".to_string(), RENAMED_SVTYPE.to_string());
            attributes.shift_remove(DROPPED_ATTRIBUTE);
            header.insert_line(&info, HeaderLine::from_structured(CanonicalSection::Info.key(), &attributes));
        },
        None => {
            // unparseable, keep it as-is
            header.insert_line(&info, line.text().to_string());
        }
    }
    true
}

impl RecordTransform for PindelFormatter {
    fn label(&self) -> &str {
        "format_pindel_vcf"
    }

    fn prepare_header(&mut self, header: &mut HeaderIndex) -> anyhow::Result<()> {
        header.require_samples(&[TUMOR_SAMPLE])?;

        // Pindel writes an empty center line
        header.retain_lines(|line| !(line.key() == Some("center") && line.value() == Some("\"\"")));
        if !rename_svtype_definition(header) {
            debug!("No INFO/{PINDEL_SVTYPE} definition found to rename");
        }
        header.declare_info(FORCED_HET_FLAG, "0", "Flag", FORCED_HET_DESCRIPTION);
        Ok(())
    }

    fn transform(&mut self, record: Record) -> anyhow::Result<RecordAction> {
        let genotype: Genotype = format_value(&record, TUMOR_SAMPLE, GT_KEY)?.parse()?;
        let forced = genotype.is_homozygous_reference();

        let mut info = InfoField::parse(record.info()?);
        info.rename_key(PINDEL_SVTYPE, RENAMED_SVTYPE);

        if forced {
            info.insert_flag_front(FORCED_HET_FLAG);
            let tumor = with_format_value(&record, TUMOR_SAMPLE, GT_KEY, &Genotype::heterozygous().to_string())?;
            Ok(RecordAction::Tag(record.replace([(INFO, info.to_string()), (TUMOR_SAMPLE, tumor)])?))
        } else {
            Ok(RecordAction::Write(record.replace([(INFO, info.to_string())])?))
        }
    }
}
