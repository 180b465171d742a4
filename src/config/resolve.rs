//! Reference resolution over a `ConfigStore`.
//!
//! A raw value whose entire text matches `${option}` or `${section:option}`
//! is a reference to another location in the store. Reads follow the chain
//! to its terminal location under a hard hop bound; writes land at the
//! terminal location too, so an alias keeps pointing at what it points at
//! instead of being shadowed.
//!
//! The hop bound is a plain counter, not a visited-set: an acyclic chain
//! longer than the bound fails the same way a cycle does.

use std::sync::OnceLock;

use regex_lite::Regex;

use super::error::ConfigError;
use super::store::ConfigStore;

/// A parsed reference value.
///
/// `section == None` means the reference names an option in the section it
/// appears in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub section: Option<String>,
    pub option: String,
}

/// Full-string reference grammar: `${segment}` or `${segment:segment}`,
/// segments being letters, digits, underscore, or hyphen.
fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\$\{([A-Za-z0-9_-]+)(?::([A-Za-z0-9_-]+))?\}$")
            .expect("reference pattern is valid")
    })
}

/// Parse a raw value as a reference.
///
/// Full-string matches only: a reference embedded in other text (or a
/// malformed one) is an ordinary literal and parses as `None`.
pub fn parse_reference(value: &str) -> Option<Reference> {
    let caps = reference_pattern().captures(value)?;

    // The grammar decomposes into exactly two segments. Anything else is a
    // defect in the pattern itself, not a user error.
    assert_eq!(
        caps.len(),
        3,
        "reference grammar must decompose into exactly two segments"
    );

    let first = caps
        .get(1)
        .expect("group 1 participates in every match")
        .as_str();

    match caps.get(2) {
        Some(second) => Some(Reference {
            section: Some(first.to_string()),
            option: second.as_str().to_string(),
        }),
        None => Some(Reference {
            section: None,
            option: first.to_string(),
        }),
    }
}

impl ConfigStore {
    /// True iff the stored raw value exists and is, in full, a reference.
    pub fn is_interpolation(&self, section: &str, option: &str) -> bool {
        match self.raw(section, option) {
            Ok(Some(value)) => parse_reference(value).is_some(),
            _ => false,
        }
    }

    /// The (section, option) a stored reference points at, with an omitted
    /// section segment defaulting to the referencing section. `None` when
    /// the value is absent, undeclared, or not a reference.
    pub fn reference_target(&self, section: &str, option: &str) -> Option<(String, String)> {
        let value = self.raw(section, option).ok()??;
        let reference = parse_reference(value)?;
        let target_section = reference.section.unwrap_or_else(|| section.to_string());
        Some((target_section, reference.option))
    }

    /// Follow the alias chain from (section, option) to its terminal
    /// location.
    ///
    /// Each indirection followed counts one hop; exceeding the store's
    /// depth bound fails with [`ConfigError::RecursionLimit`]. A reference
    /// to a location not yet declared in the store stops the chain and
    /// returns that unresolved location, so forward references can exist
    /// transiently.
    pub fn resolve(&self, section: &str, option: &str) -> Result<(String, String), ConfigError> {
        let mut current = (section.to_string(), option.to_string());
        let mut hops = 0usize;

        while let Some(target) = self.reference_target(&current.0, &current.1) {
            hops += 1;
            if hops > self.max_resolve_depth() {
                return Err(ConfigError::RecursionLimit {
                    section: section.to_string(),
                    option: option.to_string(),
                    max_depth: self.max_resolve_depth(),
                });
            }
            current = target;
        }

        Ok(current)
    }

    /// Resolved read.
    ///
    /// An absent option, or a chain that bottoms out on one, reads as
    /// `Ok(None)`. A terminal location that was never declared is a lookup
    /// error.
    pub fn get(&self, section: &str, option: &str) -> Result<Option<String>, ConfigError> {
        let (terminal_section, terminal_option) = self.resolve(section, option)?;
        self.raw(&terminal_section, &terminal_option)
            .map(|value| value.map(str::to_string))
    }

    /// Resolved write: the value lands at the terminal location of the
    /// alias chain. The terminal section must exist; the terminal option is
    /// created if new.
    pub fn set(
        &mut self,
        section: &str,
        option: &str,
        value: Option<String>,
    ) -> Result<(), ConfigError> {
        let (terminal_section, terminal_option) = self.resolve(section, option)?;
        self.set_raw(&terminal_section, &terminal_option, value)
    }
}
