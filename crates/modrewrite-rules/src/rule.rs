//! Rewrite rule entries and ordered rule sets

use modrewrite_core::{ArtifactPattern, ArtifactSelector, ModuleId, RewriteTarget};
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// A single rewrite applied to a descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteRule {
    /// Swap a dependency for another module
    Replace { from: ModuleId, to: ModuleId },
    /// Mark an existing dependency optional
    MakeOptional(ModuleId),
    /// Add a dependency; `slot: None` leaves the slot unset
    Include { name: String, slot: Option<String> },
    /// Add an exported dependency; `slot: None` leaves the slot unset
    Export { name: String, slot: Option<String> },
    /// Drop resources matching a pattern
    RemoveArtifact(ArtifactPattern),
    /// Override the version of matching artifacts
    ForceArtifactVersion {
        selector: ArtifactSelector,
        version: String,
    },
}

/// Record of a rule entry that changed a descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    pub rule: &'static str,
    pub message: String,
}

impl Change {
    fn new(rule: &'static str, message: impl Into<String>) -> Self {
        Self {
            rule,
            message: message.into(),
        }
    }
}

impl RewriteRule {
    /// Directive keyword this rule was declared with
    pub fn kind(&self) -> &'static str {
        match self {
            RewriteRule::Replace { .. } => "replace",
            RewriteRule::MakeOptional(_) => "optional",
            RewriteRule::Include { .. } => "include",
            RewriteRule::Export { .. } => "export",
            RewriteRule::RemoveArtifact(_) => "remove-artifact",
            RewriteRule::ForceArtifactVersion { .. } => "force-artifact-version",
        }
    }

    /// Apply this rule, returning `None` when the descriptor had nothing to change
    pub fn apply<D: RewriteTarget + ?Sized>(&self, target: &mut D) -> Option<Change> {
        let kind = self.kind();
        let change = match self {
            RewriteRule::Replace { from, to } => {
                let count = target.replace_dependency(from, to);
                (count > 0).then(|| Change::new(kind, format!("Replace dependency {} with {}", from, to)))
            }
            RewriteRule::MakeOptional(id) => {
                let count = target.mark_optional(id);
                (count > 0).then(|| Change::new(kind, format!("Mark dependency {} optional", id)))
            }
            RewriteRule::Include { name, slot } => {
                target.add_dependency(name, slot.as_deref(), false);
                Some(Change::new(kind, format!("Add dependency {}", display_name_slot(name, slot))))
            }
            RewriteRule::Export { name, slot } => {
                target.add_dependency(name, slot.as_deref(), true);
                Some(Change::new(
                    kind,
                    format!("Add exported dependency {}", display_name_slot(name, slot)),
                ))
            }
            RewriteRule::RemoveArtifact(pattern) => {
                let count = target.remove_resources(pattern);
                (count > 0).then(|| {
                    Change::new(kind, format!("Remove {} resource(s) matching {}", count, pattern))
                })
            }
            RewriteRule::ForceArtifactVersion { selector, version } => {
                let count = target.set_artifact_version(selector, version);
                (count > 0).then(|| Change::new(kind, format!("Set version of {} to {}", selector, version)))
            }
        };

        match &change {
            Some(c) => debug!(module = target.name(), rule = kind, "{}", c.message),
            None => debug!(module = target.name(), rule = %self, "rule had no target"),
        }
        change
    }
}

impl fmt::Display for RewriteRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RewriteRule::Replace { from, to } => write!(f, "replace:{}>{}", from, to),
            RewriteRule::MakeOptional(id) => write!(f, "optional:{}", id),
            RewriteRule::Include { name, slot } => write!(f, "include:{}", display_name_slot(name, slot)),
            RewriteRule::Export { name, slot } => write!(f, "export:{}", display_name_slot(name, slot)),
            RewriteRule::RemoveArtifact(pattern) => write!(f, "remove-artifact:{}", pattern),
            RewriteRule::ForceArtifactVersion { selector, version } => {
                write!(f, "force-artifact-version:{}={}", selector, version)
            }
        }
    }
}

fn display_name_slot(name: &str, slot: &Option<String>) -> String {
    match slot {
        Some(slot) => format!("{}:{}", name, slot),
        None => name.to_string(),
    }
}

/// Rule entries for one module, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<RewriteRule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, rule: RewriteRule) {
        self.rules.push(rule);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RewriteRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply every entry in order
    pub fn apply<D: RewriteTarget + ?Sized>(&self, target: &mut D) -> Vec<Change> {
        self.rules.iter().filter_map(|rule| rule.apply(target)).collect()
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a RewriteRule;
    type IntoIter = std::slice::Iter<'a, RewriteRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
