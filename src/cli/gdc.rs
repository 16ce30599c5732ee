
use anyhow::ensure;
use clap::Args;
use log::info;
use serde::Serialize;

use crate::cli::core::AFTER_HELP;
use crate::cli::rewrite::{check_rewrite_settings, RewriteSettings};
use crate::transforms::gdc_header::{GdcHeaderFields, GdcSample, GdcWorkflow};

#[derive(Args, Clone, Default, Serialize)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct GdcSettings {
    #[command(flatten)]
    pub io: RewriteSettings,

    /// Reference name written to the header
    #[clap(long = "reference-name")]
    #[clap(value_name = "NAME")]
    #[clap(help_heading = Some("Case metadata"))]
    #[clap(default_value = "GRCh38.d1.vd1.fa")]
    pub reference_name: String,

    /// Patient barcode
    #[clap(required = true)]
    #[clap(long = "patient-barcode")]
    #[clap(value_name = "BARCODE")]
    #[clap(help_heading = Some("Case metadata"))]
    pub patient_barcode: String,

    /// Case ID
    #[clap(required = true)]
    #[clap(long = "case-id")]
    #[clap(value_name = "UUID")]
    #[clap(help_heading = Some("Case metadata"))]
    pub case_id: String,

    /// Tumor barcode
    #[clap(required = true)]
    #[clap(long = "tumor-barcode")]
    #[clap(value_name = "BARCODE")]
    #[clap(help_heading = Some("Sample metadata"))]
    pub tumor_barcode: String,

    /// Tumor aliquot UUID
    #[clap(required = true)]
    #[clap(long = "tumor-aliquot-uuid")]
    #[clap(value_name = "UUID")]
    #[clap(help_heading = Some("Sample metadata"))]
    pub tumor_aliquot_uuid: String,

    /// Tumor BAM UUID
    #[clap(required = true)]
    #[clap(long = "tumor-bam-uuid")]
    #[clap(value_name = "UUID")]
    #[clap(help_heading = Some("Sample metadata"))]
    pub tumor_bam_uuid: String,

    /// Normal barcode
    #[clap(required = true)]
    #[clap(long = "normal-barcode")]
    #[clap(value_name = "BARCODE")]
    #[clap(help_heading = Some("Sample metadata"))]
    pub normal_barcode: String,

    /// Normal aliquot UUID
    #[clap(required = true)]
    #[clap(long = "normal-aliquot-uuid")]
    #[clap(value_name = "UUID")]
    #[clap(help_heading = Some("Sample metadata"))]
    pub normal_aliquot_uuid: String,

    /// Normal BAM UUID
    #[clap(required = true)]
    #[clap(long = "normal-bam-uuid")]
    #[clap(value_name = "UUID")]
    #[clap(help_heading = Some("Sample metadata"))]
    pub normal_bam_uuid: String,

    /// Sets "ID" in the caller gdcWorkflow line
    #[clap(long = "caller-workflow-id")]
    #[clap(value_name = "ID")]
    #[clap(help_heading = Some("Workflow metadata"))]
    pub caller_workflow_id: Option<String>,

    /// Sets "Name" in the caller gdcWorkflow line
    #[clap(long = "caller-workflow-name")]
    #[clap(value_name = "NAME")]
    #[clap(help_heading = Some("Workflow metadata"))]
    pub caller_workflow_name: Option<String>,

    /// Sets "Description" in the caller gdcWorkflow line
    #[clap(long = "caller-workflow-description")]
    #[clap(value_name = "TEXT")]
    #[clap(help_heading = Some("Workflow metadata"))]
    pub caller_workflow_description: Option<String>,

    /// Sets "Version" in the caller gdcWorkflow line
    #[clap(long = "caller-workflow-version")]
    #[clap(value_name = "VERSION")]
    #[clap(help_heading = Some("Workflow metadata"))]
    #[clap(default_value = "1.0")]
    pub caller_workflow_version: String,

    /// Sets "ID" in the annotation gdcWorkflow line
    #[clap(long = "annotation-workflow-id")]
    #[clap(value_name = "ID")]
    #[clap(help_heading = Some("Workflow metadata"))]
    pub annotation_workflow_id: Option<String>,

    /// Sets "Name" in the annotation gdcWorkflow line
    #[clap(long = "annotation-workflow-name")]
    #[clap(value_name = "NAME")]
    #[clap(help_heading = Some("Workflow metadata"))]
    pub annotation_workflow_name: Option<String>,

    /// Sets "Description" in the annotation gdcWorkflow line
    #[clap(long = "annotation-workflow-description")]
    #[clap(value_name = "TEXT")]
    #[clap(help_heading = Some("Workflow metadata"))]
    pub annotation_workflow_description: Option<String>,

    /// Sets "Version" in the annotation gdcWorkflow line
    #[clap(long = "annotation-workflow-version")]
    #[clap(value_name = "VERSION")]
    #[clap(help_heading = Some("Workflow metadata"))]
    #[clap(default_value = "1.0")]
    pub annotation_workflow_version: String,
}

/// A gdcWorkflow line is only written when both its ID and name are provided
fn gdc_workflow(id: Option<&str>, name: Option<&str>, description: Option<&str>, version: &str) -> Option<GdcWorkflow> {
    match (id, name) {
        (Some(id), Some(name)) => Some(GdcWorkflow {
            id: id.to_string(),
            name: name.to_string(),
            description: description.map(String::from),
            version: version.to_string()
        }),
        _ => None
    }
}

impl GdcSettings {
    /// Collects the header values for the GDC formatter
    pub fn header_fields(&self) -> GdcHeaderFields {
        GdcHeaderFields {
            reference_name: self.reference_name.clone(),
            patient_barcode: self.patient_barcode.clone(),
            case_id: self.case_id.clone(),
            normal: GdcSample {
                barcode: self.normal_barcode.clone(),
                aliquot_uuid: self.normal_aliquot_uuid.clone(),
                bam_uuid: self.normal_bam_uuid.clone()
            },
            tumor: GdcSample {
                barcode: self.tumor_barcode.clone(),
                aliquot_uuid: self.tumor_aliquot_uuid.clone(),
                bam_uuid: self.tumor_bam_uuid.clone()
            },
            workflows: [
                gdc_workflow(
                    self.caller_workflow_id.as_deref(), self.caller_workflow_name.as_deref(),
                    self.caller_workflow_description.as_deref(), &self.caller_workflow_version
                ),
                gdc_workflow(
                    self.annotation_workflow_id.as_deref(), self.annotation_workflow_name.as_deref(),
                    self.annotation_workflow_description.as_deref(), &self.annotation_workflow_version
                )
            ].into_iter().flatten().collect()
        }
    }
}

pub fn check_gdc_settings(mut settings: GdcSettings) -> anyhow::Result<GdcSettings> {
    settings.io = check_rewrite_settings(settings.io, "format-gdc-vcf")?;

    info!("Case metadata:");
    ensure!(!settings.reference_name.is_empty(), "--reference-name must not be empty");
    info!("\tReference name: {:?}", settings.reference_name);
    info!("\tPatient barcode: {:?}", settings.patient_barcode);
    info!("\tCase ID: {:?}", settings.case_id);

    info!("Sample metadata:");
    info!("\tNormal: {:?} (aliquot {:?}, BAM {:?})", settings.normal_barcode, settings.normal_aliquot_uuid, settings.normal_bam_uuid);
    info!("\tTumor: {:?} (aliquot {:?}, BAM {:?})", settings.tumor_barcode, settings.tumor_aliquot_uuid, settings.tumor_bam_uuid);

    info!("Workflow metadata:");
    ensure!(
        settings.caller_workflow_id.is_some() == settings.caller_workflow_name.is_some(),
        "--caller-workflow-id and --caller-workflow-name must be given together"
    );
    ensure!(
        settings.annotation_workflow_id.is_some() == settings.annotation_workflow_name.is_some(),
        "--annotation-workflow-id and --annotation-workflow-name must be given together"
    );
    info!("\tCaller: {:?} / {:?} v{}", settings.caller_workflow_id, settings.caller_workflow_name, settings.caller_workflow_version);
    info!("\tAnnotation: {:?} / {:?} v{}", settings.annotation_workflow_id, settings.annotation_workflow_name, settings.annotation_workflow_version);

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_fields() {
        let settings = GdcSettings {
            reference_name: "GRCh38.d1.vd1.fa".to_string(),
            patient_barcode: "TCGA-AA-0001".to_string(),
            tumor_barcode: "TCGA-AA-0001-01A".to_string(),
            normal_barcode: "TCGA-AA-0001-10A".to_string(),
            caller_workflow_id: Some("Somatic Sniper".to_string()),
            caller_workflow_name: Some("SomaticSniper".to_string()),
            caller_workflow_version: "1.0".to_string(),
            annotation_workflow_id: Some("vep".to_string()),
            annotation_workflow_name: Some("VEP".to_string()),
            annotation_workflow_description: Some("annotation".to_string()),
            annotation_workflow_version: "84".to_string(),
            ..Default::default()
        };
        let fields = settings.header_fields();
        assert_eq!(fields.tumor.barcode, "TCGA-AA-0001-01A");
        assert_eq!(fields.normal.barcode, "TCGA-AA-0001-10A");
        assert_eq!(fields.workflows.len(), 2);
        assert_eq!(
            fields.workflows[0].header_line(),
            "##gdcWorkflow=<ID=somatic_sniper,Name=somaticsniper,Description=\"\",Version=1.0>"
        );
        assert_eq!(fields.workflows[1].description.as_deref(), Some("annotation"));
    }

    #[test]
    fn test_header_fields_without_workflows() {
        let settings = GdcSettings {
            reference_name: "GRCh38.d1.vd1.fa".to_string(),
            patient_barcode: "TCGA-AA-0001".to_string(),
            caller_workflow_version: "1.0".to_string(),
            annotation_workflow_id: Some("vep".to_string()),
            annotation_workflow_version: "84".to_string(),
            ..Default::default()
        };
        // annotation has an ID but no name, so neither workflow is written
        assert!(settings.header_fields().workflows.is_empty());

        let settings = GdcSettings {
            caller_workflow_id: Some("mutect2".to_string()),
            caller_workflow_name: Some("MuTect2".to_string()),
            ..settings
        };
        let fields = settings.header_fields();
        assert_eq!(fields.workflows.len(), 1);
        assert_eq!(fields.workflows[0].id, "mutect2");
    }

    #[test]
    fn test_workflow_id_requires_name() {
        let dir = tempfile::tempdir().unwrap();
        let input_vcf = dir.path().join("calls.vcf");
        std::fs::write(&input_vcf, "##fileformat=VCFv4.2\n").unwrap();
        let settings = GdcSettings {
            io: RewriteSettings {
                input_vcf,
                output_vcf: dir.path().join("gdc.vcf"),
                ..Default::default()
            },
            reference_name: "GRCh38.d1.vd1.fa".to_string(),
            ..Default::default()
        };
        assert!(check_gdc_settings(settings.clone()).is_ok());

        let partial = GdcSettings {
            caller_workflow_id: Some("mutect2".to_string()),
            ..settings
        };
        assert!(check_gdc_settings(partial).is_err());
    }
}
