//! Job script templates.
//!
//! Minimal `@identifier` substitution for SLURM submission scripts: `@@`
//! escapes a literal `@`, and every placeholder appearing in the template
//! must be supplied. A missing placeholder is an error naming the
//! identifier, so a half-rendered script never reaches `sbatch`.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex_lite::Regex;

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("template placeholder '@{identifier}' has no value")]
    MissingValue { identifier: String },

    #[error("template I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"@(@|[A-Za-z_][A-Za-z0-9_]*)").expect("placeholder pattern is valid")
    })
}

/// Substitute every `@identifier` in `template` from `values`.
pub fn render(template: &str, values: &HashMap<String, String>) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for caps in placeholder_pattern().captures_iter(template) {
        let whole = caps.get(0).expect("group 0 participates in every match");
        let token = caps
            .get(1)
            .expect("group 1 participates in every match")
            .as_str();

        out.push_str(&template[last..whole.start()]);
        if token == "@" {
            out.push('@');
        } else {
            match values.get(token) {
                Some(value) => out.push_str(value),
                None => {
                    return Err(TemplateError::MissingValue {
                        identifier: token.to_string(),
                    })
                }
            }
        }
        last = whole.end();
    }

    out.push_str(&template[last..]);
    Ok(out)
}

pub fn render_file(
    path: &Path,
    values: &HashMap<String, String>,
) -> Result<String, TemplateError> {
    let text = fs::read_to_string(path)?;
    render(&text, values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn test_render_substitutes_identifiers() {
        let rendered = render(
            "query --schema @schema --phenotype @phenotype",
            &values(&[("schema", "p50"), ("phenotype", "bodyweight")]),
        )
        .unwrap();
        assert_eq!(rendered, "query --schema p50 --phenotype bodyweight");
    }

    #[test]
    fn test_missing_identifier_is_named() {
        let err = render("run @tool", &values(&[])).unwrap_err();
        match err {
            TemplateError::MissingValue { identifier } => assert_eq!(identifier, "tool"),
            other => panic!("expected MissingValue, got {other:?}"),
        }
    }

    #[test]
    fn test_double_at_escapes() {
        let rendered = render("user@@host: @dir", &values(&[("dir", "/work")])).unwrap();
        assert_eq!(rendered, "user@host: /work");
    }

    #[test]
    fn test_lone_at_passes_through() {
        // "@ " does not form an identifier and is left alone.
        let rendered = render("a @ b", &values(&[])).unwrap();
        assert_eq!(rendered, "a @ b");
    }
}
