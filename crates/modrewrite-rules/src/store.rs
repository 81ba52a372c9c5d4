//! Rule sets keyed by module identity

use modrewrite_core::ModuleId;
use std::collections::HashMap;

use crate::rule::RuleSet;

/// All rule sets of a build, keyed by module identity
#[derive(Debug, Clone, Default)]
pub struct RuleStore {
    sets: HashMap<ModuleId, RuleSet>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the rule set for `id`, creating an empty one on first reference
    pub fn get_or_create(&mut self, id: &ModuleId) -> &mut RuleSet {
        self.sets.entry(id.clone()).or_default()
    }

    pub fn get(&self, id: &ModuleId) -> Option<&RuleSet> {
        self.sets.get(id)
    }

    /// Like [`get`](Self::get), also returning the stored key
    pub fn get_key_value(&self, id: &ModuleId) -> Option<(&ModuleId, &RuleSet)> {
        self.sets.get_key_value(id)
    }

    /// All identities with a rule set, sorted
    pub fn identities(&self) -> Vec<&ModuleId> {
        let mut ids: Vec<&ModuleId> = self.sets.keys().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Total number of rule entries across all sets
    pub fn rule_count(&self) -> usize {
        self.sets.values().map(RuleSet::len).sum()
    }
}
