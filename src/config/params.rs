//! Per-stage parameter bags.
//!
//! A [`Params`] is a view of one section's options, resolved through the
//! reference engine at construction, with CLI-override precedence and a
//! completeness gate. The tracked name set is fixed when the bag is built:
//! `update` can change values but never grows the set, so command-line
//! flags cannot inject options a stage never declared. Growing the set is
//! an explicit `set`.

use std::fmt;

use indexmap::IndexMap;

use super::error::ConfigError;
use super::store::ConfigStore;

/// Literal that configparser-era files use to spell "no value set".
const LEGACY_NONE: &str = "None";

/// A stage-scoped bag of named settings in first-declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Params {
    section: String,
    values: IndexMap<String, Option<String>>,
}

impl Params {
    /// Build a bag from one section, resolving every option through the
    /// reference engine. A resolved literal `"None"` is treated as absent.
    pub fn from_store(store: &ConfigStore, section: &str) -> Result<Self, ConfigError> {
        let names: Vec<String> = store
            .section(section)?
            .iter()
            .map(|(name, _)| name.to_string())
            .collect();

        let mut values = IndexMap::with_capacity(names.len());
        for name in names {
            let resolved = store
                .get(section, &name)?
                .filter(|value| value != LEGACY_NONE);
            values.insert(name, resolved);
        }

        Ok(Self {
            section: section.to_string(),
            values,
        })
    }

    /// The section this bag was built from.
    pub fn section(&self) -> &str {
        &self.section
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Current value of a tracked option; `None` for absent values and for
    /// names the bag does not track (see [`Params::contains`]).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(|value| value.as_deref())
    }

    /// Set a value directly. A new name is appended to declaration order;
    /// an existing name is replaced in place.
    pub fn set(&mut self, name: impl Into<String>, value: Option<String>) {
        self.values.insert(name.into(), value);
    }

    /// Fold external overrides into the bag.
    ///
    /// Only names already tracked are touched, and only by non-absent
    /// override values; everything else is silently ignored.
    pub fn update<I>(&mut self, overrides: I)
    where
        I: IntoIterator<Item = (String, Option<String>)>,
    {
        for (name, value) in overrides {
            if value.is_none() || !self.values.contains_key(&name) {
                continue;
            }
            self.values.insert(name, value);
        }
    }

    /// True iff every tracked name has a value.
    pub fn is_complete(&self) -> bool {
        self.values.values().all(|value| value.is_some())
    }

    /// Names currently without a value, in declaration order.
    pub fn missing(&self) -> impl Iterator<Item = &str> {
        self.values
            .iter()
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| name.as_str())
    }

    /// Declaration-order iteration over the bag's current state.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.values
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Persist the bag into its originating store through the resolution
    /// engine, so options configured as aliases stay aliases.
    pub fn write_back(&self, store: &mut ConfigStore) -> Result<(), ConfigError> {
        for (name, value) in &self.values {
            store.set(&self.section, name, value.clone())?;
        }
        Ok(())
    }
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[{}]", self.section)?;
        for (name, value) in self.iter() {
            writeln!(f, "{} = {}", name, value.unwrap_or(""))?;
        }
        Ok(())
    }
}
