
use crate::data_types::record::{Record, RecordError, MISSING_VALUE};

/// Genotype FORMAT key
pub const GT_KEY: &str = "GT";
/// Conventional sample column names for tumor/normal callers
pub const NORMAL_SAMPLE: &str = "NORMAL";
pub const TUMOR_SAMPLE: &str = "TUMOR";

/// Reads one FORMAT value for a sample, e.g. `SSC` from `TUMOR`.
/// # Errors
/// * if the key is not in FORMAT, or the sample has too few values
pub fn format_value<'a>(record: &'a Record, sample: &str, key: &str) -> Result<&'a str, RecordError> {
    let index = format_key_index(record, sample, key)?;
    record.get(sample)?
        .split(':')
        .nth(index)
        .ok_or_else(|| RecordError::MissingFormatKey { sample: sample.to_string(), key: key.to_string() })
}

/// Builds the sample string with one FORMAT value swapped out.
/// Trailing values that were dropped from the sample are padded with `.` so the key lines up.
pub fn with_format_value(record: &Record, sample: &str, key: &str, value: &str) -> Result<String, RecordError> {
    let index = format_key_index(record, sample, key)?;
    let mut values: Vec<&str> = record.get(sample)?.split(':').collect();
    if values.len() <= index {
        values.resize(index + 1, MISSING_VALUE);
    }
    values[index] = value;
    Ok(values.join(":"))
}

/// Prefixes a `:`-joined FORMAT or sample string with a new leading value
pub fn prepend_value(fields: &str, value: &str) -> String {
    format!("{value}:{fields}")
}

fn format_key_index(record: &Record, sample: &str, key: &str) -> Result<usize, RecordError> {
    record.format()?
        .split(':')
        .position(|k| k == key)
        .ok_or_else(|| RecordError::MissingFormatKey { sample: sample.to_string(), key: key.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn record(line: &str) -> Record {
        let columns: Vec<String> = ["CHROM", "POS", "ID", "REF", "ALT", "QUAL", "FILTER", "INFO", "FORMAT", "NORMAL", "TUMOR"]
            .iter().map(|s| s.to_string()).collect();
        Record::decode(line, &Arc::new(columns))
    }

    #[test]
    fn test_format_value() {
        let r = record("chr1\t10\t.\tA\tT\t.\tPASS\t.\tGT:AD:SSC\t0/0:10,0\t0/1:5,5:33");
        assert_eq!(format_value(&r, TUMOR_SAMPLE, "SSC").unwrap(), "33");
        assert_eq!(format_value(&r, NORMAL_SAMPLE, GT_KEY).unwrap(), "0/0");
        // normal dropped its trailing value
        assert!(matches!(format_value(&r, NORMAL_SAMPLE, "SSC"), Err(RecordError::MissingFormatKey { .. })));
        assert!(matches!(format_value(&r, TUMOR_SAMPLE, "DP"), Err(RecordError::MissingFormatKey { .. })));
    }

    #[test]
    fn test_with_format_value() {
        let r = record("chr1\t10\t.\tA\tT\t.\tPASS\t.\tAD:GT\t10,0\t5,5:0/0");
        assert_eq!(with_format_value(&r, TUMOR_SAMPLE, GT_KEY, "0/1").unwrap(), "5,5:0/1");
        assert_eq!(with_format_value(&r, NORMAL_SAMPLE, GT_KEY, "0/0").unwrap(), "10,0:0/0");
        assert_eq!(prepend_value("DP:AU", "GT"), "GT:DP:AU");
    }
}
