//! hwas - haplotype GWAS pipeline automation
//!
//! This crate automates the stages of a haplotype-based GWAS: initializing
//! a per-phenotype working directory, exporting phenotype and covariate
//! records, intersecting them with the genotyped samples, and computing
//! per-chromosome relationship matrices. Stage wiring lives in a single
//! reference-resolving configuration file shared by every stage.

pub mod config;
pub mod env;
pub mod pipeline;
pub mod template;

pub use config::{ConfigError, ConfigStore, Params};
pub use env::EnvSnapshot;
pub use pipeline::PipelineError;
