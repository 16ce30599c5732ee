
use std::error::Error;
use vergen_gitcl::{Emitter, GitclBuilder};

/// Emits VERGEN_GIT_DESCRIBE and friends for the `--version` string.
/// # Errors
/// * if `git` is not installed
/// * if the build is not from a git checkout, e.g. a release tarball
fn emit_git() -> Result<(), Box<dyn Error>> {
    let gitcl = GitclBuilder::default()
        .all()
        .describe(false, true, Some("NoTagShouldEverMatchThisPattern"))
        .build()?;

    Emitter::default()
        .fail_on_error()
        .add_instructions(&gitcl)?
        .emit()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    if emit_git().is_err() {
        // packagers can set the describe string, otherwise it is "unknown"
        let git_desc = option_env!("VARFILT_GIT_DESCRIBE")
            .unwrap_or("unknown");
        println!("cargo:rustc-env=VERGEN_GIT_DESCRIBE={git_desc}");
    }

    println!("cargo:rerun-if-changed=Cargo.toml");
    println!("cargo:rerun-if-changed=src");
    Ok(())
}
