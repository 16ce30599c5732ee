
use crate::data_types::record::Record;
use crate::rewriter::{RecordAction, RecordTransform};

/// Smallest POS that keeps the two-base lookback used by DKFZ non-negative
const MIN_DKFZ_POSITION: u64 = 2;

/// Drops records too close to the contig start for DKFZ (POS - 2 < 0)
#[derive(Default)]
pub struct DkfzPositionFilter;

impl RecordTransform for DkfzPositionFilter {
    fn label(&self) -> &str {
        "position_filter_dkfz"
    }

    fn transform(&mut self, record: Record) -> anyhow::Result<RecordAction> {
        Ok(if record.pos()? < MIN_DKFZ_POSITION {
            RecordAction::Drop
        } else {
            RecordAction::Write(record)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewriter::tests::{rewrite_text, TEST_HEADER};

    #[test]
    fn test_position_filter() {
        let mut text = TEST_HEADER.to_string();
        for pos in [1, 2, 3] {
            text.push_str(&format!("chr1\t{pos}\t.\tA\tC\t.\tPASS\t.\tGT\t0/0\t0/1\n"));
        }
        let (summary, _output) = rewrite_text(&text, &mut DkfzPositionFilter).unwrap();
        assert_eq!((summary.removed, summary.written), (1, 2));
    }
}
