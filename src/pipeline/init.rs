//! Pipeline initialization.
//!
//! Creates the `<schema>/<phenotype>/` working directory and writes the
//! default configuration. The per-stage sections are wired to [common] and
//! to each other through references, so a value corrected in one place is
//! seen everywhere it is consumed.

use std::path::{Path, PathBuf};

use crate::config::{format, overlay, ConfigStore};
use crate::env::EnvSnapshot;

use super::{create_dir_with_mode, PipelineError, CONFIG_FILENAME, LOG_DIR, SAMPLES_FILENAME};

const DEFAULT_DB_HOST: &str = "localhost";
const DEFAULT_DB_PORT: &str = "5432";
const DEFAULT_DB_NAME: &str = "hsrats";
const DEFAULT_PASSWORD_ENV_VAR: &str = "HWAS_DB_PASSWORD";
/// External client the rendered query job invokes to export records.
const DEFAULT_DB_CLIENT: &str = "hwas-db-export";
const DEFAULT_HGRM_DIR: &str = "hgrm";

pub struct InitOptions {
    /// Existing configuration file to use for default values.
    pub config: Option<PathBuf>,
    pub account: Option<String>,
    pub qos: Option<String>,
    pub dbname: Option<String>,
    pub password_env_var: Option<String>,
    pub schema: String,
    pub phenotype: String,
}

/// Initialize `<root>/<schema>/<phenotype>` and write its configuration.
/// Returns the path of the written config file.
pub fn run(
    snapshot: &EnvSnapshot,
    root: &Path,
    opts: InitOptions,
) -> Result<PathBuf, PipelineError> {
    let schema_dir = root.join(&opts.schema);
    if !schema_dir.is_dir() {
        create_dir_with_mode(&schema_dir, 0o770)?;
    }

    let work_dir = schema_dir.join(&opts.phenotype);
    if work_dir.exists() {
        return Err(PipelineError::AlreadyExists(work_dir));
    }
    create_dir_with_mode(&work_dir, 0o750)?;

    let log_dir = work_dir.join(LOG_DIR);
    create_dir_with_mode(&log_dir, 0o750)?;

    let mut store = defaults(snapshot, &work_dir, &log_dir, &opts);

    // A user-supplied config file seeds defaults; values computed by init
    // itself are reapplied afterwards and always win.
    if let Some(ref donor_path) = opts.config {
        if !donor_path.is_file() {
            return Err(PipelineError::MissingInput(donor_path.clone()));
        }
        let donor = format::load(donor_path)?;
        for warning in overlay(&mut store, &donor)? {
            tracing::warn!(%warning, "merge replaced an alias value");
        }
        apply_computed(&mut store, &work_dir, &log_dir, &opts)?;
    }

    let config_path = work_dir.join(CONFIG_FILENAME);
    format::save(&store, &config_path)?;
    tracing::info!(path = %config_path.display(), "initialized pipeline directory");

    Ok(config_path)
}

fn defaults(
    snapshot: &EnvSnapshot,
    work_dir: &Path,
    log_dir: &Path,
    opts: &InitOptions,
) -> ConfigStore {
    let mut store = ConfigStore::new();

    let common = store.add_section("common");
    common.insert("version", Some(env!("CARGO_PKG_VERSION").to_string()));
    common.insert("path", Some(work_dir.display().to_string()));
    common.insert("schema", Some(opts.schema.clone()));
    common.insert("phenotype", Some(opts.phenotype.clone()));
    common.insert("user", snapshot.user().map(str::to_string));
    common.insert("logs", Some(log_dir.display().to_string()));
    if let Some(bin) = snapshot.bin_dir() {
        common.insert("bin", Some(bin.to_string()));
    }

    let slurm = store.add_section("slurm");
    slurm.insert("account", opts.account.clone());
    slurm.insert("qos", opts.qos.clone());

    let query = store.add_section("query");
    query.insert(
        "host",
        Some(snapshot.db_host().unwrap_or(DEFAULT_DB_HOST).to_string()),
    );
    query.insert(
        "port",
        Some(snapshot.db_port().unwrap_or(DEFAULT_DB_PORT).to_string()),
    );
    query.insert(
        "user",
        Some(match snapshot.db_user() {
            Some(user) => user.to_string(),
            None => "${common:user}".to_string(),
        }),
    );
    query.insert(
        "dbname",
        Some(
            opts.dbname
                .clone()
                .or_else(|| snapshot.db_name().map(str::to_string))
                .unwrap_or_else(|| DEFAULT_DB_NAME.to_string()),
        ),
    );
    query.insert(
        "password_env_var",
        Some(
            opts.password_env_var
                .clone()
                .unwrap_or_else(|| DEFAULT_PASSWORD_ENV_VAR.to_string()),
        ),
    );
    query.insert("client", Some(DEFAULT_DB_CLIENT.to_string()));
    query.insert("outdir", Some("${common:path}".to_string()));
    query.insert("schema", Some("${common:schema}".to_string()));
    query.insert("phenotype", Some("${common:phenotype}".to_string()));
    query.insert("covariates_file", None);
    query.insert("phenotype_file", None);

    let intersect = store.add_section("intersect");
    intersect.insert("vcf", None);
    intersect.insert("covariates_file", Some("${query:covariates_file}".to_string()));
    intersect.insert("phenotype_file", Some("${query:phenotype_file}".to_string()));
    intersect.insert(
        "samples_file",
        Some(work_dir.join(SAMPLES_FILENAME).display().to_string()),
    );
    intersect.insert("bcftools", Some(tool(snapshot.bin_dir(), "bcftools")));
    intersect.insert("rscript", Some("Rscript".to_string()));
    intersect.insert("script", None);

    let hgrm = store.add_section("hgrm");
    hgrm.insert("chrm", None);
    hgrm.insert("vcf", Some("${intersect:vcf}".to_string()));
    hgrm.insert("samples_file", Some("${intersect:samples_file}".to_string()));
    hgrm.insert("hgrm_dir", Some(DEFAULT_HGRM_DIR.to_string()));
    hgrm.insert("temp_dir", None);
    hgrm.insert("bcftools", Some("${intersect:bcftools}".to_string()));
    hgrm.insert("bgzip", Some(tool(snapshot.bin_dir(), "bgzip")));
    hgrm.insert("tabix", Some(tool(snapshot.bin_dir(), "tabix")));
    hgrm.insert("hgrm", Some(tool(snapshot.bin_dir(), "hgrm")));

    let output = store.add_section("output");
    output.insert("meta_prefix", Some(format::META_PREFIX.to_string()));

    store
}

/// Reapply the values init computes itself, overriding anything a donor
/// config brought in. Writes are raw: these options must stay literals.
fn apply_computed(
    store: &mut ConfigStore,
    work_dir: &Path,
    log_dir: &Path,
    opts: &InitOptions,
) -> Result<(), PipelineError> {
    store.set_raw(
        "common",
        "version",
        Some(env!("CARGO_PKG_VERSION").to_string()),
    )?;
    store.set_raw("common", "path", Some(work_dir.display().to_string()))?;
    store.set_raw("common", "schema", Some(opts.schema.clone()))?;
    store.set_raw("common", "phenotype", Some(opts.phenotype.clone()))?;
    store.set_raw("common", "logs", Some(log_dir.display().to_string()))?;
    Ok(())
}

fn tool(bin_dir: Option<&str>, name: &str) -> String {
    match bin_dir {
        Some(dir) => Path::new(dir).join(name).display().to_string(),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(schema: &str, phenotype: &str) -> InitOptions {
        InitOptions {
            config: None,
            account: None,
            qos: None,
            dbname: None,
            password_env_var: None,
            schema: schema.to_string(),
            phenotype: phenotype.to_string(),
        }
    }

    #[test]
    fn test_init_writes_wired_defaults() {
        let root = tempfile::tempdir().unwrap();
        let snapshot = EnvSnapshot::from_pairs([("USER", "rvogel")]);

        let config_path = run(&snapshot, root.path(), options("p50", "bodyweight")).unwrap();
        assert!(config_path.is_file());
        assert!(root.path().join("p50/bodyweight/logs").is_dir());

        let store = format::load(&config_path).unwrap();
        assert_eq!(
            store.get("query", "schema").unwrap().as_deref(),
            Some("p50")
        );
        assert_eq!(
            store.get("query", "user").unwrap().as_deref(),
            Some("rvogel")
        );
        assert!(store.is_interpolation("query", "outdir"));
        assert!(store.is_interpolation("hgrm", "vcf"));
        assert_eq!(store.get("hgrm", "chrm").unwrap(), None);
    }

    #[test]
    fn test_init_refuses_existing_phenotype_dir() {
        let root = tempfile::tempdir().unwrap();
        let snapshot = EnvSnapshot::default();

        run(&snapshot, root.path(), options("p50", "bodyweight")).unwrap();
        let err = run(&snapshot, root.path(), options("p50", "bodyweight")).unwrap_err();
        assert!(matches!(err, PipelineError::AlreadyExists(_)));
    }

    #[test]
    fn test_env_snapshot_overrides_db_defaults() {
        let root = tempfile::tempdir().unwrap();
        let snapshot = EnvSnapshot::from_pairs([
            ("HWAS_DB_HOST", "db.internal"),
            ("HWAS_DB_USER", "svc_hwas"),
            ("HWAS_BIN", "/opt/hwas/bin"),
        ]);

        let config_path = run(&snapshot, root.path(), options("p50", "bodyweight")).unwrap();
        let store = format::load(&config_path).unwrap();

        assert_eq!(
            store.get("query", "host").unwrap().as_deref(),
            Some("db.internal")
        );
        // An explicit env user replaces the ${common:user} alias.
        assert!(!store.is_interpolation("query", "user"));
        assert_eq!(
            store.get("query", "user").unwrap().as_deref(),
            Some("svc_hwas")
        );
        assert_eq!(
            store.get("intersect", "bcftools").unwrap().as_deref(),
            Some("/opt/hwas/bin/bcftools")
        );
    }

    #[test]
    fn test_user_config_seeds_defaults_but_init_values_win() {
        let root = tempfile::tempdir().unwrap();
        let donor_path = root.path().join("seed.config");
        std::fs::write(
            &donor_path,
            "[slurm]\naccount = lab-alloc\n\n[common]\nschema = stale\n",
        )
        .unwrap();

        let mut opts = options("p50", "bodyweight");
        opts.config = Some(donor_path);
        let config_path = run(&EnvSnapshot::default(), root.path(), opts).unwrap();

        let store = format::load(&config_path).unwrap();
        assert_eq!(
            store.get("slurm", "account").unwrap().as_deref(),
            Some("lab-alloc")
        );
        // Computed by init, not the donor.
        assert_eq!(store.get("common", "schema").unwrap().as_deref(), Some("p50"));
    }

    #[test]
    fn test_missing_seed_config_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        let mut opts = options("p50", "bodyweight");
        opts.config = Some(root.path().join("nope.config"));

        let err = run(&EnvSnapshot::default(), root.path(), opts).unwrap_err();
        assert!(matches!(err, PipelineError::MissingInput(_)));
    }
}
