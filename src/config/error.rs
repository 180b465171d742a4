//! Error types for the configuration engine.

use std::io;

/// Errors raised by the configuration store and resolution engine.
///
/// A declared option with no value is not an error anywhere in this module;
/// it reads as `Ok(None)`. Only access to names that were never declared,
/// unterminated reference chains, and text-format defects are errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The alias chain starting at (section, option) did not terminate
    /// within the hop bound. Almost always a reference cycle.
    #[error(
        "resolving [{section}] {option} exceeded {max_depth} reference hops; \
         the alias chain is probably cyclic"
    )]
    RecursionLimit {
        section: String,
        option: String,
        max_depth: usize,
    },

    #[error("no section named [{0}] in the configuration")]
    UnknownSection(String),

    #[error("no option named '{option}' in section [{section}]")]
    UnknownOption { section: String, option: String },

    #[error("config line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("config I/O error: {0}")]
    Io(#[from] io::Error),
}
