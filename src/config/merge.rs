//! Overlay merge of one store onto another.
//!
//! Donor values are written through the resolution engine, so a donor value
//! landing on a receiver alias mutates what the alias points at. When that
//! happens the merge reports it: the donor had no way of knowing the
//! receiver relied on indirection there. The report is a warning, never an
//! abort.

use std::fmt;

use super::error::ConfigError;
use super::store::ConfigStore;

/// Non-fatal report that an overlay wrote through an existing alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeWarning {
    pub section: String,
    pub option: String,
    /// Where the receiver's alias pointed when the donor value arrived.
    pub old_target: (String, String),
    /// The donor value written through the alias.
    pub incoming: Option<String>,
}

impl fmt::Display for MergeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} is an alias for [{}] {}; overlay wrote '{}' through it",
            self.section,
            self.option,
            self.old_target.0,
            self.old_target.1,
            self.incoming.as_deref().unwrap_or("")
        )
    }
}

/// Overlay every donor option onto the receiver, section by section, in the
/// donor's own order. Last write wins; missing receiver sections are
/// created. Returns the alias-clobber warnings collected along the way.
pub fn overlay(
    receiver: &mut ConfigStore,
    donor: &ConfigStore,
) -> Result<Vec<MergeWarning>, ConfigError> {
    let mut warnings = Vec::new();

    for (section, options) in donor.sections() {
        if !receiver.has_section(section) {
            receiver.add_section(section);
        }

        for (option, value) in options.iter() {
            if receiver.has_option(section, option) && receiver.is_interpolation(section, option) {
                if let Some(old_target) = receiver.reference_target(section, option) {
                    warnings.push(MergeWarning {
                        section: section.to_string(),
                        option: option.to_string(),
                        old_target,
                        incoming: value.map(str::to_string),
                    });
                }
            }
            receiver.set(section, option, value.map(str::to_string))?;
        }
    }

    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn donor_with(section: &str, option: &str, value: &str) -> ConfigStore {
        let mut donor = ConfigStore::new();
        donor.add_section(section).insert(option, Some(value.into()));
        donor
    }

    #[test]
    fn test_overlay_literal_no_warning() {
        let mut receiver = ConfigStore::new();
        receiver.add_section("common").insert("option_b", Some("old".into()));

        let donor = donor_with("common", "option_b", "new");
        let warnings = overlay(&mut receiver, &donor).unwrap();

        assert!(warnings.is_empty());
        assert_eq!(
            receiver.get("common", "option_b").unwrap().as_deref(),
            Some("new")
        );
    }

    #[test]
    fn test_overlay_alias_warns_and_writes_through() {
        let mut receiver = ConfigStore::new();
        let section = receiver.add_section("common");
        section.insert("option_a", None);
        section.insert("option_b", Some("${option_a}".into()));

        let donor = donor_with("common", "option_b", "new");
        let warnings = overlay(&mut receiver, &donor).unwrap();

        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].old_target, ("common".into(), "option_a".into()));
        assert_eq!(warnings[0].incoming.as_deref(), Some("new"));

        // Reading the option still yields the donor value, and the alias
        // itself survived the merge.
        assert_eq!(
            receiver.get("common", "option_b").unwrap().as_deref(),
            Some("new")
        );
        assert!(receiver.is_interpolation("common", "option_b"));
        assert_eq!(
            receiver.get("common", "option_a").unwrap().as_deref(),
            Some("new")
        );
    }

    #[test]
    fn test_overlay_creates_missing_sections() {
        let mut receiver = ConfigStore::new();
        let donor = donor_with("slurm", "account", "lab");

        let warnings = overlay(&mut receiver, &donor).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(
            receiver.get("slurm", "account").unwrap().as_deref(),
            Some("lab")
        );
    }

    #[test]
    fn test_overlay_is_idempotent() {
        let mut receiver = ConfigStore::new();
        let section = receiver.add_section("common");
        section.insert("option_a", None);
        section.insert("option_b", Some("${option_a}".into()));

        let mut donor = ConfigStore::new();
        let donor_section = donor.add_section("common");
        donor_section.insert("option_b", Some("new".into()));
        donor_section.insert("option_c", Some("c".into()));

        overlay(&mut receiver, &donor).unwrap();
        let once = receiver.clone();
        overlay(&mut receiver, &donor).unwrap();

        assert_eq!(receiver, once);
    }

    #[test]
    fn test_overlay_carries_absent_values() {
        let mut receiver = ConfigStore::new();
        receiver.add_section("hgrm").insert("chrm", Some("chr1".into()));

        let mut donor = ConfigStore::new();
        donor.add_section("hgrm").insert("chrm", None);

        overlay(&mut receiver, &donor).unwrap();
        assert_eq!(receiver.get("hgrm", "chrm").unwrap(), None);
    }
}
