//! Process environment snapshot.
//!
//! Stage code never reads `std::env` directly. `main` captures the
//! environment once and hands the snapshot down, so every external input a
//! run depends on is visible at one call site. Well-known `HWAS_*` keys get
//! named accessors; anything else (the configured database-password
//! variable in particular) is reachable by name.

use std::collections::HashMap;

pub const ENV_USER: &str = "USER";
pub const ENV_DB_HOST: &str = "HWAS_DB_HOST";
pub const ENV_DB_PORT: &str = "HWAS_DB_PORT";
pub const ENV_DB_NAME: &str = "HWAS_DB_NAME";
pub const ENV_DB_USER: &str = "HWAS_DB_USER";
pub const ENV_BIN: &str = "HWAS_BIN";

/// Read-only copy of the process environment taken at startup.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    pub fn capture() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Build a snapshot from explicit pairs. Used by tests and by callers
    /// that want a fully controlled environment.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn user(&self) -> Option<&str> {
        self.var(ENV_USER)
    }

    pub fn db_host(&self) -> Option<&str> {
        self.var(ENV_DB_HOST)
    }

    pub fn db_port(&self) -> Option<&str> {
        self.var(ENV_DB_PORT)
    }

    pub fn db_name(&self) -> Option<&str> {
        self.var(ENV_DB_NAME)
    }

    pub fn db_user(&self) -> Option<&str> {
        self.var(ENV_DB_USER)
    }

    /// Directory holding locally installed pipeline binaries, if set.
    pub fn bin_dir(&self) -> Option<&str> {
        self.var(ENV_BIN)
    }
}
