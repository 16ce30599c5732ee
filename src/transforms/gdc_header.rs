
use log::debug;

use crate::data_types::header_index::HeaderIndex;
use crate::data_types::header_section::{CanonicalSection, META_PREFIX};
use crate::data_types::record::Record;
use crate::data_types::sample::{NORMAL_SAMPLE, TUMOR_SAMPLE};
use crate::rewriter::{RecordAction, RecordTransform};

pub const GDC_CENTER: &str = "NCI Genomic Data Commons (GDC)";
pub const DEFAULT_REFERENCE_NAME: &str = "GRCh38.d1.vd1.fa";
pub const DEFAULT_WORKFLOW_VERSION: &str = "1.0";
/// Header keys that are replaced with GDC values
const REPLACED_KEYS: [&str; 2] = ["fileDate", "reference"];

/// Normalizes a workflow identifier: lower case with underscores for spaces
fn normalize_workflow_token(value: &str) -> String {
    value.to_lowercase().replace(' ', "_")
}

/// One `##gdcWorkflow` entry
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GdcWorkflow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub version: String
}

impl GdcWorkflow {
    pub fn header_line(&self) -> String {
        format!(
            "{META_PREFIX}gdcWorkflow=<ID={},Name={},Description=\"{}\",Version={}>",
            normalize_workflow_token(&self.id),
            normalize_workflow_token(&self.name),
            self.description.as_deref().unwrap_or_default(),
            self.version
        )
    }
}

/// Barcodes and UUIDs for one sample
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GdcSample {
    pub barcode: String,
    pub aliquot_uuid: String,
    pub bam_uuid: String
}

impl GdcSample {
    fn header_line(&self, sample_id: &str) -> String {
        format!(
            "{META_PREFIX}SAMPLE=<ID={sample_id},NAME={},ALIQUOT_ID={},BAM_ID={}>",
            self.barcode, self.aliquot_uuid, self.bam_uuid
        )
    }
}

/// Everything written into a GDC header
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GdcHeaderFields {
    pub reference_name: String,
    pub patient_barcode: String,
    pub case_id: String,
    pub normal: GdcSample,
    pub tumor: GdcSample,
    pub workflows: Vec<GdcWorkflow>
}

/// Rewrites the header with GDC metadata; records pass through untouched
pub struct GdcHeaderFormatter {
    fields: GdcHeaderFields,
    /// YYYYMMDD
    file_date: String
}

impl GdcHeaderFormatter {
    /// Uses today's date as the file date
    pub fn new(fields: GdcHeaderFields) -> Self {
        let file_date = chrono::Local::now().format("%Y%m%d").to_string();
        Self::with_file_date(fields, file_date)
    }

    pub fn with_file_date(fields: GdcHeaderFields, file_date: String) -> Self {
        Self { fields, file_date }
    }
}

impl RecordTransform for GdcHeaderFormatter {
    fn label(&self) -> &str {
        "format_gdc_vcf"
    }

    fn prepare_header(&mut self, header: &mut HeaderIndex) -> anyhow::Result<()> {
        header.retain_lines(|line| !line.key().is_some_and(|k| REPLACED_KEYS.contains(&k)));

        let misc = header.new_misc_section();
        header.insert_section_after(&CanonicalSection::FileFormat.into(), misc.clone());
        header.insert_line(&misc, format!("{META_PREFIX}fileDate={}", self.file_date));
        header.insert_line(&misc, format!("{META_PREFIX}center=\"{GDC_CENTER}\""));
        header.insert_line(&misc, format!("{META_PREFIX}reference={}", self.fields.reference_name));
        for workflow in self.fields.workflows.iter() {
            header.insert_line(&misc, workflow.header_line());
        }
        debug!("Added GDC metadata to section {misc}");

        header.insert_line(
            &CanonicalSection::Individual.into(),
            format!("{META_PREFIX}INDIVIDUAL=<NAME={},ID={}>", self.fields.patient_barcode, self.fields.case_id)
        );
        let sample_section = CanonicalSection::Sample.into();
        header.insert_line(&sample_section, self.fields.normal.header_line(NORMAL_SAMPLE));
        header.insert_line(&sample_section, self.fields.tumor.header_line(TUMOR_SAMPLE));
        Ok(())
    }

    fn transform(&mut self, record: Record) -> anyhow::Result<RecordAction> {
        Ok(RecordAction::Write(record))
    }
}
