//! Configuration engine.
//!
//! A [`ConfigStore`] holds named sections of string-or-absent options. A
//! value written as `${option}` or `${section:option}` is a reference to
//! another location in the store, followed at read time under a hop bound
//! and preserved on write (writes land at the end of the chain). Each
//! pipeline stage consumes one section through a [`Params`] bag, which adds
//! override precedence and the completeness gate; [`overlay`] folds a
//! user-supplied store onto a default one.

mod error;
pub mod format;
mod merge;
mod params;
mod resolve;
mod store;

pub use error::ConfigError;
pub use merge::{overlay, MergeWarning};
pub use params::Params;
pub use resolve::{parse_reference, Reference};
pub use store::{ConfigStore, Section, DEFAULT_MAX_RESOLVE_DEPTH};
