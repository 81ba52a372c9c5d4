//! modrewrite-rules: Configuration-driven rewriting of module descriptors
//!
//! Rules come from `module-rewrite.conf` files found in a project directory
//! and every ancestor of it. Each `module:<name>[:<slot>]` section collects
//! rule entries for one module; the `ALL:ALL` section applies to every
//! module, after the module's own entries.
//!
//! Directives:
//! - include: Add a dependency
//! - export: Add an exported dependency
//! - optional: Mark a dependency optional
//! - replace: Swap one dependency for another
//! - remove-artifact: Drop resources matching a pattern
//! - force-artifact-version: Override an artifact's version

mod engine;
mod error;
pub mod loader;
pub mod parser;
mod rule;
mod store;

pub use engine::Rewriter;
pub use error::{LoadError, ParseWarning, WarningKind};
pub use loader::{discover, load_files, load_project, ConfigLoader, LoadedConfig, CONF_FILE_NAME};
pub use rule::{Change, RewriteRule, RuleSet};
pub use store::RuleStore;
