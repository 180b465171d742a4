//! Intersect stage: restrict phenotype and covariate tables to the samples
//! present in the genotype VCF.
//!
//! The sample arithmetic itself lives in an R script (configured as
//! `[intersect] script`); this stage extracts the VCF sample list with
//! bcftools and hands everything to Rscript.

use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

use crate::config::{format, Params};

use super::{
    config_file, ensure_complete, required, run_checked, PipelineError, SAMPLE_COLNAME,
};

pub struct IntersectOptions {
    pub config: Option<PathBuf>,
    pub vcf: Option<PathBuf>,
    pub script: Option<PathBuf>,
}

/// Intersect the exported tables with the VCF sample set. The surviving
/// sample identifiers are written to the configured samples file.
pub fn run(opts: IntersectOptions) -> Result<(), PipelineError> {
    let config_path = config_file(opts.config.as_deref())?;
    let mut store = format::load(&config_path)?;
    let mut params = Params::from_store(&store, "intersect")?;

    // Relative CLI paths are pinned to the invocation directory before they
    // are persisted; later stages read them from arbitrary cwds.
    let vcf_override = opts.vcf.map(absolutize).transpose()?;
    let script_override = opts.script.map(absolutize).transpose()?;
    params.update([
        (
            "vcf".to_string(),
            vcf_override.map(|path| path.display().to_string()),
        ),
        (
            "script".to_string(),
            script_override.map(|path| path.display().to_string()),
        ),
    ]);
    ensure_complete(&params)?;

    params.write_back(&mut store)?;
    format::save(&store, &config_path)?;

    let vcf = PathBuf::from(required(&params, "vcf")?);
    if !vcf.is_file() {
        return Err(PipelineError::MissingInput(vcf));
    }
    let covariates_file = PathBuf::from(required(&params, "covariates_file")?);
    if !covariates_file.is_file() {
        return Err(PipelineError::MissingInput(covariates_file));
    }
    let phenotype_file = PathBuf::from(required(&params, "phenotype_file")?);
    if !phenotype_file.is_file() {
        return Err(PipelineError::MissingInput(phenotype_file));
    }

    // The VCF sample list goes through a temp file rather than a pipe so
    // the R script sees a plain one-column input.
    let listing = run_checked(
        Command::new(required(&params, "bcftools")?)
            .arg("query")
            .arg("--list-samples")
            .arg(&vcf),
    )?;
    let mut vcf_samples = tempfile::NamedTempFile::new()?;
    vcf_samples.write_all(&listing.stdout)?;
    vcf_samples.flush()?;

    let output = run_checked(
        Command::new(required(&params, "rscript")?)
            .arg(required(&params, "script")?)
            .arg("--covariate")
            .arg(&covariates_file)
            .arg("--phenotype")
            .arg(&phenotype_file)
            .arg("--vcf")
            .arg(vcf_samples.path())
            .arg("--id")
            .arg(SAMPLE_COLNAME)
            .arg("--sample_filename")
            .arg(required(&params, "samples_file")?),
    )?;
    for line in String::from_utf8_lossy(&output.stdout).lines() {
        tracing::info!(target: "intersect", "{line}");
    }

    Ok(())
}

fn absolutize(path: PathBuf) -> Result<PathBuf, PipelineError> {
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
