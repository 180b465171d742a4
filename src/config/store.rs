//! In-memory configuration store.
//!
//! Sections of string-or-absent options, kept in insertion order for
//! display. This layer owns the raw data and knows nothing about
//! indirection; reference following lives in `resolve.rs`.

use indexmap::IndexMap;

use super::error::ConfigError;

/// Default bound on reference hops followed per lookup.
pub const DEFAULT_MAX_RESOLVE_DEPTH: usize = 10;

/// A named group of options.
///
/// Option names are case-sensitive and unique within the section. A value
/// of `None` means the option is declared but has no value set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    options: IndexMap<String, Option<String>>,
}

impl Section {
    pub fn has_option(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }

    /// Raw value of an option. Outer `None` means the option was never
    /// declared; `Some(None)` means declared with no value.
    pub fn get(&self, name: &str) -> Option<Option<&str>> {
        self.options.get(name).map(|value| value.as_deref())
    }

    /// Insert or overwrite an option. Existing options keep their position
    /// in declaration order.
    pub fn insert(&mut self, name: impl Into<String>, value: Option<String>) {
        self.options.insert(name.into(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.options
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

/// The full configuration: an ordered collection of sections plus the
/// resolution depth bound used by the engine in `resolve.rs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigStore {
    sections: IndexMap<String, Section>,
    max_resolve_depth: usize,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore {
    pub fn new() -> Self {
        Self {
            sections: IndexMap::new(),
            max_resolve_depth: DEFAULT_MAX_RESOLVE_DEPTH,
        }
    }

    pub fn with_max_resolve_depth(mut self, depth: usize) -> Self {
        self.max_resolve_depth = depth;
        self
    }

    pub fn max_resolve_depth(&self) -> usize {
        self.max_resolve_depth
    }

    /// Create a section if it does not exist and return it.
    pub fn add_section(&mut self, name: impl Into<String>) -> &mut Section {
        self.sections.entry(name.into()).or_default()
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    pub fn has_option(&self, section: &str, option: &str) -> bool {
        self.sections
            .get(section)
            .is_some_and(|s| s.has_option(option))
    }

    pub fn section(&self, name: &str) -> Result<&Section, ConfigError> {
        self.sections
            .get(name)
            .ok_or_else(|| ConfigError::UnknownSection(name.to_string()))
    }

    pub fn sections(&self) -> impl Iterator<Item = (&str, &Section)> {
        self.sections
            .iter()
            .map(|(name, section)| (name.as_str(), section))
    }

    /// Raw (unresolved) value. Undeclared section or option is an error,
    /// distinct from a declared option with no value.
    pub fn raw(&self, section: &str, option: &str) -> Result<Option<&str>, ConfigError> {
        self.section(section)?
            .get(option)
            .ok_or_else(|| ConfigError::UnknownOption {
                section: section.to_string(),
                option: option.to_string(),
            })
    }

    /// Raw (unresolved) write. The section must already exist; the option
    /// is created if new.
    pub fn set_raw(
        &mut self,
        section: &str,
        option: &str,
        value: Option<String>,
    ) -> Result<(), ConfigError> {
        let section = self
            .sections
            .get_mut(section)
            .ok_or_else(|| ConfigError::UnknownSection(section.to_string()))?;
        section.insert(option, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_value_is_not_a_lookup_error() {
        let mut store = ConfigStore::new();
        store.add_section("common");
        store.set_raw("common", "option_a", None).unwrap();

        assert_eq!(store.raw("common", "option_a").unwrap(), None);
    }

    #[test]
    fn test_undeclared_option_is_a_lookup_error() {
        let mut store = ConfigStore::new();
        store.add_section("common");

        let err = store.raw("common", "nope").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownOption { .. }));

        let err = store.raw("missing", "nope").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownSection(_)));
    }

    #[test]
    fn test_set_raw_requires_section() {
        let mut store = ConfigStore::new();
        let err = store.set_raw("missing", "x", Some("1".into())).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownSection(_)));
    }

    #[test]
    fn test_overwrite_keeps_declaration_order() {
        let mut store = ConfigStore::new();
        let section = store.add_section("s");
        section.insert("a", Some("1".into()));
        section.insert("b", Some("2".into()));
        section.insert("a", Some("3".into()));

        let names: Vec<&str> = store.section("s").unwrap().iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(store.raw("s", "a").unwrap(), Some("3"));
    }
}
