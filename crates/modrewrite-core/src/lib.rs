//! modrewrite-core: Value types shared by the module rewrite engine
//!
//! This crate provides:
//! - `ModuleId`: A module identity (name + slot) used as the rule lookup key
//! - `ArtifactCoordinate` / `ArtifactSelector`: Artifact references and the
//!   selectors that force their versions
//! - `ArtifactPattern`: Match pattern for removing resources
//! - `ModuleDescriptor`: An in-memory module descriptor
//! - `RewriteTarget`: Trait for descriptors that rewrite rules can mutate
//! - `PropertySource`: Trait for build property lookup

mod artifact;
pub mod descriptor;
mod identity;
pub mod property;

pub use artifact::{ArtifactCoordinate, ArtifactPattern, ArtifactSelector, CoordinateError};
pub use descriptor::{ModuleDependency, ModuleDescriptor, Resource, RewriteTarget};
pub use identity::{split_name_slot, IdentityError, ModuleId, MAIN_SLOT, WILDCARD};
pub use property::{placeholder_name, NoProperties, PropertySource};
