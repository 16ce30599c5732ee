
use anyhow::Context;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::writers::vcf_writer::is_compressed_target;

/// Writes a run summary (or any serializable value) as pretty JSON.
/// A `.gz` suffix gzip-compresses the output.
/// # Errors
/// * if the file cannot be created or written
pub fn save_json<T: Serialize>(data: &T, out_filename: &Path) -> anyhow::Result<()> {
    let file = File::create(out_filename)
        .with_context(|| format!("Error while creating {out_filename:?}:"))?;
    let sink: Box<dyn Write> = if is_compressed_target(out_filename) {
        Box::new(flate2::write::GzEncoder::new(file, flate2::Compression::default()))
    } else {
        Box::new(file)
    };

    let mut writer = BufWriter::new(sink);
    serde_json::to_writer_pretty(&mut writer, data)
        .with_context(|| format!("Error while serializing {out_filename:?}:"))?;
    writeln!(writer)?;
    writer.flush()
        .with_context(|| format!("Error while flushing output to {out_filename:?}:"))?;
    Ok(())
}
