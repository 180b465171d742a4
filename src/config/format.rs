//! Text round-tripping for configuration stores.
//!
//! INI-like format: `[section]` headers, `key = value` lines, a bare `key`
//! when no value is set, `#`/`;` comment lines. Reference tokens are not
//! interpreted here; they ride along as ordinary values. Saving archives
//! any existing file to a numbered hidden name first, so earlier pipeline
//! state stays recoverable.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use super::error::ConfigError;
use super::store::ConfigStore;

/// Prefix for generated metadata comment lines.
pub const META_PREFIX: &str = "##";

/// Parse configuration text into a store.
pub fn parse_str(text: &str) -> Result<ConfigStore, ConfigError> {
    let mut store = ConfigStore::new();
    let mut current: Option<String> = None;

    for (index, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(inner) = line.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
            let name = inner.trim();
            if name.is_empty() {
                return Err(ConfigError::Parse {
                    line: index + 1,
                    message: "empty section name".to_string(),
                });
            }
            store.add_section(name);
            current = Some(name.to_string());
            continue;
        }

        let Some(section) = current.as_deref() else {
            return Err(ConfigError::Parse {
                line: index + 1,
                message: format!("option '{line}' appears before any [section] header"),
            });
        };

        match line.split_once('=') {
            Some((key, value)) => {
                let key = key.trim();
                if key.is_empty() {
                    return Err(ConfigError::Parse {
                        line: index + 1,
                        message: "option with empty name".to_string(),
                    });
                }
                let value = value.trim();
                let value = (!value.is_empty()).then(|| value.to_string());
                store.set_raw(section, key, value)?;
            }
            // A bare key declares the option with no value.
            None => store.set_raw(section, line, None)?,
        }
    }

    Ok(store)
}

/// Render a store as configuration text, sections and options in store
/// order, with a generated-at header.
pub fn to_text(store: &ConfigStore) -> String {
    let mut out = format!(
        "{META_PREFIX} written by hwas {} at {}\n\n",
        env!("CARGO_PKG_VERSION"),
        Utc::now().to_rfc3339()
    );

    for (name, section) in store.sections() {
        out.push_str(&format!("[{name}]\n"));
        for (option, value) in section.iter() {
            match value {
                Some(value) => out.push_str(&format!("{option} = {value}\n")),
                None => {
                    out.push_str(option);
                    out.push('\n');
                }
            }
        }
        out.push('\n');
    }

    out
}

pub fn load(path: &Path) -> Result<ConfigStore, ConfigError> {
    let text = fs::read_to_string(path)?;
    parse_str(&text)
}

/// Write the store to `path`, archiving any existing file first.
pub fn save(store: &ConfigStore, path: &Path) -> Result<(), ConfigError> {
    if path.exists() {
        archive(path)?;
    }
    fs::write(path, to_text(store))?;
    Ok(())
}

/// Rename `path` to `.<name>_<n>` alongside it, using the first free n.
fn archive(path: &Path) -> Result<PathBuf, ConfigError> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("config");
    let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

    let mut index = 1usize;
    loop {
        let candidate = dir.join(format!(".{name}_{index}"));
        if !candidate.exists() {
            fs::rename(path, &candidate)?;
            return Ok(candidate);
        }
        index += 1;
    }
}
