
use rustc_hash::FxHashSet;

use crate::data_types::header_index::HeaderIndex;
use crate::data_types::record::Record;
use crate::rewriter::{RecordAction, RecordTransform};

/// Drops records on contigs that the header does not declare
#[derive(Default)]
pub struct ContigFilter {
    contigs: FxHashSet<String>
}

impl RecordTransform for ContigFilter {
    fn label(&self) -> &str {
        "filter_contigs"
    }

    fn prepare_header(&mut self, header: &mut HeaderIndex) -> anyhow::Result<()> {
        self.contigs = header.contig_names().into_iter().map(String::from).collect();
        Ok(())
    }

    fn transform(&mut self, record: Record) -> anyhow::Result<RecordAction> {
        Ok(if self.contigs.contains(record.chrom()?) {
            RecordAction::Write(record)
        } else {
            RecordAction::Drop
        })
    }
}
