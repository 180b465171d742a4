//! Pipeline stages.
//!
//! Every stage follows the same shape: load the config file, build the
//! stage's parameter bag, fold in CLI-derived overrides, gate on
//! completeness, persist the bag back, then drive the external tools via
//! `std::process::Command`. Engine errors propagate unchanged; nothing in a
//! stage retries.

pub mod hgrm;
pub mod init;
pub mod intersect;
pub mod query;

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::{ConfigError, Params};
use crate::template::TemplateError;

/// Name of the per-phenotype configuration file written by `init`.
pub const CONFIG_FILENAME: &str = "config";
pub const LOG_DIR: &str = "logs";

pub const COVARIATE_FILE_SUFFIX: &str = "_covariates.csv";
pub const PHENOTYPE_FILE_SUFFIX: &str = "_phenotype.csv";
pub const SAMPLES_FILENAME: &str = "samples";
/// Column identifying a sample across phenotype, covariate, and VCF data.
pub const SAMPLE_COLNAME: &str = "rfid";

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration file {} not found; run `hwas init` first", .0.display())]
    ConfigMissing(PathBuf),

    #[error("section [{section}] is missing required values (listed above)")]
    IncompleteSection { section: String },

    #[error("{program} exited with {status}: {stderr}")]
    Subprocess {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("{} already exists; delete it or change directories", .0.display())]
    AlreadyExists(PathBuf),

    #[error("required input {} not found", .0.display())]
    MissingInput(PathBuf),
}

/// Resolve the config file path for a stage and check that it exists.
pub fn config_file(override_path: Option<&Path>) -> Result<PathBuf, PipelineError> {
    let path = match override_path {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir()?.join(CONFIG_FILENAME),
    };
    if !path.is_file() {
        return Err(PipelineError::ConfigMissing(path));
    }
    Ok(path)
}

/// Completeness gate shared by every stage. On failure the bag is printed
/// so the operator can see exactly which settings are missing.
pub(crate) fn ensure_complete(params: &Params) -> Result<(), PipelineError> {
    if params.is_complete() {
        return Ok(());
    }
    eprintln!("{params}");
    Err(PipelineError::IncompleteSection {
        section: params.section().to_string(),
    })
}

/// Value of a setting the completeness gate has already vouched for.
pub(crate) fn required<'a>(params: &'a Params, name: &str) -> Result<&'a str, PipelineError> {
    params
        .get(name)
        .ok_or_else(|| PipelineError::IncompleteSection {
            section: params.section().to_string(),
        })
}

/// Run a command, failing with its captured stderr on non-zero exit.
pub(crate) fn run_checked(command: &mut Command) -> Result<std::process::Output, PipelineError> {
    let program = command.get_program().to_string_lossy().into_owned();
    tracing::debug!(program = %program, "running external command");

    let output = command.output()?;
    if !output.status.success() {
        return Err(PipelineError::Subprocess {
            program,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output)
}

#[cfg(unix)]
pub(crate) fn create_dir_with_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    std::fs::DirBuilder::new().mode(mode).create(path)
}

#[cfg(not(unix))]
pub(crate) fn create_dir_with_mode(path: &Path, _mode: u32) -> std::io::Result<()> {
    std::fs::create_dir(path)
}
