//! Query stage: export phenotype and covariate records from the database.
//!
//! The stage itself never talks to the database. It validates the [query]
//! parameter bag (command-line values win over the persisted config),
//! derives the output file paths, persists the final state, and renders an
//! sbatch script that drives the configured export client.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::{format, ConfigStore, Params};
use crate::env::EnvSnapshot;
use crate::template;

use super::{
    config_file, ensure_complete, required, run_checked, PipelineError, COVARIATE_FILE_SUFFIX,
    PHENOTYPE_FILE_SUFFIX, SAMPLE_COLNAME,
};

pub struct QueryOptions {
    pub config: Option<PathBuf>,
    pub dbname: Option<String>,
    pub host: Option<String>,
    pub port: Option<String>,
    pub user: Option<String>,
    pub schema: Option<String>,
    pub phenotype: Option<String>,
    /// Submit the rendered script via `sbatch` instead of only writing it.
    pub submit: bool,
}

/// Default body of the query job. A custom template file can be configured
/// as `[slurm] query_template`.
const QUERY_EXPORT_TEMPLATE: &str = "\
@client \\
    --host @host \\
    --port @port \\
    --user @user \\
    --dbname @dbname \\
    --password-env @password_env_var \\
    --schema @schema \\
    --phenotype @phenotype \\
    --id-column @id_column \\
    --covariates-out @covariates_file \\
    --phenotype-out @phenotype_file
";

/// Validate the query parameters, persist them, and render the export job.
/// Returns the path of the written script.
pub fn run(snapshot: &EnvSnapshot, opts: QueryOptions) -> Result<PathBuf, PipelineError> {
    let config_path = config_file(opts.config.as_deref())?;
    let mut store = format::load(&config_path)?;
    let mut params = Params::from_store(&store, "query")?;

    params.update([
        ("dbname".to_string(), opts.dbname),
        ("host".to_string(), opts.host),
        ("port".to_string(), opts.port),
        ("user".to_string(), opts.user),
        ("schema".to_string(), opts.schema),
        ("phenotype".to_string(), opts.phenotype),
    ]);

    derive_output_files(&mut params);
    ensure_complete(&params)?;

    // The password itself is never written anywhere; the job reads it from
    // the configured variable at run time.
    let password_var = required(&params, "password_env_var")?;
    if snapshot.var(password_var).is_none() {
        tracing::warn!(
            variable = password_var,
            "database password variable is not set; the job will need it at run time"
        );
    }

    params.write_back(&mut store)?;
    format::save(&store, &config_path)?;

    let script = render_script(&store, &params)?;
    let script_path = Path::new(required(&params, "outdir")?).join("query.sbatch");
    fs::write(&script_path, script)?;
    tracing::info!(path = %script_path.display(), "wrote query job script");

    if opts.submit {
        let output = run_checked(Command::new("sbatch").arg(&script_path))?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        tracing::info!(job = %stdout.trim(), "submitted query job");
    }

    Ok(script_path)
}

/// Fill covariates_file / phenotype_file when the config has not pinned
/// them: `<outdir>/<phenotype><suffix>`.
fn derive_output_files(params: &mut Params) {
    fn derive(params: &Params, suffix: &str) -> Option<String> {
        let outdir = params.get("outdir")?;
        let phenotype = params.get("phenotype")?;
        Some(
            Path::new(outdir)
                .join(format!("{phenotype}{suffix}"))
                .display()
                .to_string(),
        )
    }

    if params.get("covariates_file").is_none() {
        if let Some(path) = derive(params, COVARIATE_FILE_SUFFIX) {
            params.set("covariates_file", Some(path));
        }
    }
    if params.get("phenotype_file").is_none() {
        if let Some(path) = derive(params, PHENOTYPE_FILE_SUFFIX) {
            params.set("phenotype_file", Some(path));
        }
    }
}

fn render_script(store: &ConfigStore, params: &Params) -> Result<String, PipelineError> {
    let mut values: HashMap<String, String> = params
        .iter()
        .filter_map(|(name, value)| value.map(|value| (name.to_string(), value.to_string())))
        .collect();
    values.insert("id_column".to_string(), SAMPLE_COLNAME.to_string());

    let mut script = String::from("#!/bin/bash\n");
    script.push_str(&format!(
        "#SBATCH --job-name=hwas-query-{}\n",
        required(params, "phenotype")?
    ));
    if let Ok(Some(logs)) = store.get("common", "logs") {
        script.push_str(&format!("#SBATCH --output={logs}/query_%j.out\n"));
        script.push_str(&format!("#SBATCH --error={logs}/query_%j.err\n"));
    }
    for directive in ["account", "qos"] {
        if store.has_option("slurm", directive) {
            if let Some(value) = store.get("slurm", directive)? {
                script.push_str(&format!("#SBATCH --{directive}={value}\n"));
            }
        }
    }
    script.push('\n');

    let body = if store.has_option("slurm", "query_template") {
        match store.get("slurm", "query_template")? {
            Some(path) => template::render_file(Path::new(&path), &values)?,
            None => template::render(QUERY_EXPORT_TEMPLATE, &values)?,
        }
    } else {
        template::render(QUERY_EXPORT_TEMPLATE, &values)?
    };
    script.push_str(&body);

    Ok(script)
}
