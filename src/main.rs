//! hwas CLI
//!
//! Entry point for the `hwas` command-line tool.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use hwas::config::format;
use hwas::pipeline::{self, hgrm, init, intersect, query, PipelineError};
use hwas::EnvSnapshot;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hwas")]
#[command(about = "Haplotype GWAS pipeline automation", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a <schema>/<phenotype> working directory and its config
    Init {
        /// Data release or study cohort name
        schema: String,

        /// Phenotype to analyze
        phenotype: String,

        /// Existing config file to seed defaults from
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// SLURM account for submitted jobs
        #[arg(long)]
        account: Option<String>,

        /// SLURM quality-of-service for submitted jobs
        #[arg(long)]
        qos: Option<String>,

        /// Database name to export from
        #[arg(long)]
        dbname: Option<String>,

        /// Environment variable the export job reads the password from
        #[arg(long)]
        password_env_var: Option<String>,
    },

    /// Render (and optionally submit) the phenotype/covariate export job
    Query {
        /// Path to config file (default: ./config)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        #[arg(long)]
        dbname: Option<String>,

        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<String>,

        #[arg(long)]
        user: Option<String>,

        #[arg(long)]
        schema: Option<String>,

        #[arg(long)]
        phenotype: Option<String>,

        /// Submit the rendered script with sbatch
        #[arg(long)]
        submit: bool,
    },

    /// Intersect exported tables with the genotyped samples
    Intersect {
        /// Path to config file (default: ./config)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Genotype VCF to intersect against
        #[arg(long)]
        vcf: Option<PathBuf>,

        /// R script performing the intersection
        #[arg(long)]
        script: Option<PathBuf>,
    },

    /// Compute the relationship matrix for one chromosome
    Hgrm {
        /// Path to config file (default: ./config)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Chromosome to process (e.g. chr12)
        #[arg(long)]
        chrm: Option<String>,

        /// Intersected VCF (default: the configured [hgrm] vcf)
        #[arg(long)]
        vcf: Option<PathBuf>,
    },

    /// Print the current configuration with references resolved
    Show {
        /// Path to config file (default: ./config)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Only show this section
        section: Option<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Set one configuration value (written through any alias chain)
    Set {
        /// Path to config file (default: ./config)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        section: String,

        option: String,

        /// Omit to clear the value
        value: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(error) = run(Cli::parse()) {
        eprintln!("Error: {error}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), PipelineError> {
    let snapshot = EnvSnapshot::capture();

    match cli.command {
        Commands::Init {
            schema,
            phenotype,
            config,
            account,
            qos,
            dbname,
            password_env_var,
        } => {
            let root = std::env::current_dir()?;
            let config_path = init::run(
                &snapshot,
                &root,
                init::InitOptions {
                    config,
                    account,
                    qos,
                    dbname,
                    password_env_var,
                    schema,
                    phenotype,
                },
            )?;
            println!("{}", config_path.display());
        }

        Commands::Query {
            config,
            dbname,
            host,
            port,
            user,
            schema,
            phenotype,
            submit,
        } => {
            let script_path = query::run(
                &snapshot,
                query::QueryOptions {
                    config,
                    dbname,
                    host,
                    port,
                    user,
                    schema,
                    phenotype,
                    submit,
                },
            )?;
            println!("{}", script_path.display());
        }

        Commands::Intersect {
            config,
            vcf,
            script,
        } => {
            intersect::run(intersect::IntersectOptions {
                config,
                vcf,
                script,
            })?;
        }

        Commands::Hgrm { config, chrm, vcf } => {
            let matrix_path = hgrm::run(hgrm::HgrmOptions { config, chrm, vcf })?;
            println!("{}", matrix_path.display());
        }

        Commands::Show {
            config,
            section,
            json,
        } => show(config, section.as_deref(), json)?,

        Commands::Set {
            config,
            section,
            option,
            value,
        } => {
            let config_path = pipeline::config_file(config.as_deref())?;
            let mut store = format::load(&config_path)?;
            store.set(&section, &option, value)?;
            format::save(&store, &config_path)?;
        }
    }

    Ok(())
}

/// Print options with references resolved, so the operator sees the values
/// the stages will actually use.
fn show(config: Option<PathBuf>, only: Option<&str>, json: bool) -> Result<(), PipelineError> {
    let config_path = pipeline::config_file(config.as_deref())?;
    let store = format::load(&config_path)?;

    if let Some(name) = only {
        // Fails with an unknown-section error when the name is wrong.
        store.section(name)?;
    }
    let selected = store
        .sections()
        .filter(|(name, _)| only.map_or(true, |wanted| *name == wanted));

    if json {
        let mut sections = serde_json::Map::new();
        for (name, section) in selected {
            let mut options = serde_json::Map::new();
            for (option, _) in section.iter() {
                let resolved = store.get(name, option)?;
                options.insert(
                    option.to_string(),
                    resolved.map_or(serde_json::Value::Null, serde_json::Value::String),
                );
            }
            sections.insert(name.to_string(), serde_json::Value::Object(options));
        }
        println!("{}", serde_json::to_string_pretty(&sections).unwrap_or_default());
        return Ok(());
    }

    for (name, section) in selected {
        println!("[{name}]");
        for (option, _) in section.iter() {
            match store.get(name, option)? {
                Some(value) => println!("{option} = {value}"),
                None => println!("{option}"),
            }
        }
        println!();
    }
    Ok(())
}
