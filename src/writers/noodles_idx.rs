
use anyhow::Context;
use log::debug;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Writes the tabix index (`.tbi`) next to a bgzipped VCF
/// # Arguments
/// * `vcf_fn` - the bgzip-compressed filename to index
pub fn index_vcf(vcf_fn: &Path) -> anyhow::Result<()> {
    let index = noodles::vcf::fs::index(vcf_fn)
        .with_context(|| format!("Error while indexing {vcf_fn:?}:"))?;

    let mut tbi_fn = vcf_fn.to_owned().into_os_string();
    tbi_fn.push(".tbi");
    let tbi_fn = PathBuf::from(tbi_fn);

    noodles::tabix::fs::write(&tbi_fn, &index)
        .with_context(|| format!("Error while writing {tbi_fn:?}:"))?;

    Ok(())
}

/// Compresses a plain file into BGZF
/// # Arguments
/// * `plain_fn` - uncompressed input
/// * `bgzf_fn` - compressed output
pub fn bgzip_file(plain_fn: &Path, bgzf_fn: &Path) -> anyhow::Result<()> {
    let mut reader = File::open(plain_fn)
        .with_context(|| format!("Error while opening {plain_fn:?}:"))?;
    let output = File::create(bgzf_fn)
        .with_context(|| format!("Error while creating {bgzf_fn:?}:"))?;
    let mut writer = noodles::bgzf::io::Writer::new(output);
    std::io::copy(&mut reader, &mut writer)
        .with_context(|| format!("Error while compressing {plain_fn:?}:"))?;
    writer.finish()?;
    Ok(())
}

/// Turns a finished plain-text VCF into the compressed, indexed target and removes the plain copy.
/// Does nothing when the two paths are the same, i.e. the target is not `.gz`.
/// # Arguments
/// * `plain_fn` - the plain-text VCF that was written
/// * `target_fn` - the `.vcf.gz` the user asked for
pub fn finalize_output(plain_fn: &Path, target_fn: &Path) -> anyhow::Result<()> {
    if plain_fn == target_fn {
        return Ok(());
    }
    debug!("Compressing {plain_fn:?} into {target_fn:?}...");
    bgzip_file(plain_fn, target_fn)?;
    debug!("Indexing {target_fn:?}...");
    index_vcf(target_fn)?;
    std::fs::remove_file(plain_fn)
        .with_context(|| format!("Error while removing {plain_fn:?}:"))?;
    Ok(())
}
