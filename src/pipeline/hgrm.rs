//! Hgrm stage: build the per-chromosome haplotype genetic relationship
//! matrix.
//!
//! One chromosome per invocation: compress and index the intersected VCF,
//! cut out the requested region restricted to the surviving samples, then
//! stream it through the hgrm binary into `<hgrm_dir>/<chrm>.mat`.
//! Intermediate files live in a scratch directory that is discarded unless
//! `[hgrm] temp_dir` pins one.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::{format, Params};

use super::{config_file, create_dir_with_mode, ensure_complete, required, run_checked, PipelineError};

pub struct HgrmOptions {
    pub config: Option<PathBuf>,
    pub chrm: Option<String>,
    pub vcf: Option<PathBuf>,
}

/// Compute the relationship matrix for one chromosome. Returns the path of
/// the written matrix.
pub fn run(opts: HgrmOptions) -> Result<PathBuf, PipelineError> {
    let config_path = config_file(opts.config.as_deref())?;
    let store = format::load(&config_path)?;
    let mut params = Params::from_store(&store, "hgrm")?;

    params.update([
        ("chrm".to_string(), opts.chrm),
        (
            "vcf".to_string(),
            opts.vcf.map(|path| path.display().to_string()),
        ),
    ]);

    // Without a pinned temp_dir the scratch space is a fresh directory,
    // removed when the guard drops at the end of the run.
    let scratch_guard = if params.get("temp_dir").is_none() {
        let guard = tempfile::tempdir()?;
        params.set("temp_dir", Some(guard.path().display().to_string()));
        Some(guard)
    } else {
        None
    };
    ensure_complete(&params)?;

    let chrm = required(&params, "chrm")?;
    let vcf = PathBuf::from(required(&params, "vcf")?);
    if !vcf.is_file() {
        return Err(PipelineError::MissingInput(vcf));
    }
    let samples_file = PathBuf::from(required(&params, "samples_file")?);
    if !samples_file.is_file() {
        return Err(PipelineError::MissingInput(samples_file));
    }

    let base = store
        .get("common", "path")?
        .ok_or_else(|| PipelineError::IncompleteSection {
            section: "common".to_string(),
        })?;
    let hgrm_dir = Path::new(&base).join(required(&params, "hgrm_dir")?);
    if !hgrm_dir.is_dir() {
        create_dir_with_mode(&hgrm_dir, 0o750)?;
    }
    let matrix_path = hgrm_dir.join(format!("{chrm}.mat"));
    if matrix_path.exists() {
        return Err(PipelineError::AlreadyExists(matrix_path));
    }

    let scratch = PathBuf::from(required(&params, "temp_dir")?);
    if !scratch.is_dir() {
        create_dir_with_mode(&scratch, 0o750)?;
    }

    // An already-compressed VCF is used in place; a plain one is bgzipped
    // into scratch. The index is only built when missing.
    let compressed = if vcf.extension().is_some_and(|ext| ext == "gz") {
        vcf.clone()
    } else {
        let compressed = scratch.join(format!("{chrm}.vcf.gz"));
        run_checked(
            Command::new(required(&params, "bgzip")?)
                .arg("--stdout")
                .arg(&vcf)
                .stdout(Stdio::from(File::create(&compressed)?)),
        )?;
        compressed
    };
    let index = PathBuf::from(format!("{}.tbi", compressed.display()));
    if !index.is_file() {
        run_checked(
            Command::new(required(&params, "tabix")?)
                .arg("--preset")
                .arg("vcf")
                .arg(&compressed),
        )?;
    }

    let region = scratch.join(format!("{chrm}.vcf"));
    run_checked(
        Command::new(required(&params, "bcftools")?)
            .arg("view")
            .arg("--regions")
            .arg(chrm)
            .arg("--samples-file")
            .arg(&samples_file)
            .arg("--output")
            .arg(&region)
            .arg(&compressed),
    )?;

    run_checked(
        Command::new(required(&params, "hgrm")?)
            .arg(&region)
            .stdout(Stdio::from(File::create(&matrix_path)?)),
    )?;
    tracing::info!(path = %matrix_path.display(), "wrote relationship matrix");

    drop(scratch_guard);
    Ok(matrix_path)
}
