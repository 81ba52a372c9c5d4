//! Module identities

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Slot used whenever a name is given without one
pub const MAIN_SLOT: &str = "main";

/// Name and slot of the identity whose rules apply to every module
pub const WILDCARD: &str = "ALL";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Module name must not be empty in '{0}'")]
    EmptyName(String),
}

/// A module name qualified by its slot
///
/// Two identities are equal when both fields match exactly (case-sensitive).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleId {
    name: String,
    slot: String,
}

impl ModuleId {
    pub fn new(name: impl Into<String>, slot: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slot: slot.into(),
        }
    }

    /// Create an identity, falling back to the `main` slot when none is given
    pub fn with_default_slot(name: impl Into<String>, slot: Option<&str>) -> Self {
        let slot = match slot {
            Some(s) if !s.is_empty() => s,
            _ => MAIN_SLOT,
        };
        Self::new(name, slot)
    }

    /// The `ALL:ALL` identity
    pub fn wildcard() -> Self {
        Self::new(WILDCARD, WILDCARD)
    }

    pub fn is_wildcard(&self) -> bool {
        self.name == WILDCARD && self.slot == WILDCARD
    }

    /// Parse `name[:slot]`, defaulting the slot to `main`
    pub fn parse(text: &str) -> Result<Self, IdentityError> {
        let (name, slot) = split_name_slot(text);
        if name.is_empty() {
            return Err(IdentityError::EmptyName(text.trim().to_string()));
        }
        Ok(Self::with_default_slot(name, slot))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.slot)
    }
}

/// Split `name[:slot]` into its parts
///
/// Segments after the second `:` are ignored. An empty slot segment is
/// reported as no slot at all.
pub fn split_name_slot(text: &str) -> (&str, Option<&str>) {
    let mut parts = text.trim().split(':');
    let name = parts.next().unwrap_or_default().trim();
    let slot = parts.next().map(str::trim).filter(|s| !s.is_empty());
    (name, slot)
}
