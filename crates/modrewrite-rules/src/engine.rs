//! Applying loaded rules to descriptors

use modrewrite_core::{ModuleId, RewriteTarget};
use tracing::debug;

use crate::rule::{Change, RuleSet};
use crate::store::RuleStore;

/// Read-only view of a loaded [`RuleStore`] that rewrites descriptors
///
/// The store cannot change once wrapped, so one `Rewriter` may be shared
/// across threads rewriting independent descriptors.
#[derive(Debug, Clone, Default)]
pub struct Rewriter {
    store: RuleStore,
}

impl Rewriter {
    pub fn new(store: RuleStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &RuleStore {
        &self.store
    }

    /// Rule sets that apply to `id`, in application order
    ///
    /// The module's own set comes first, then the `ALL:ALL` set. A descriptor
    /// that is itself `ALL:ALL` gets the wildcard set from both lookups.
    pub fn rule_sets_for(&self, id: &ModuleId) -> Vec<(&ModuleId, &RuleSet)> {
        let wildcard = ModuleId::wildcard();
        let mut sets = Vec::with_capacity(2);

        if let Some((key, set)) = self.store.get_key_value(id) {
            sets.push((key, set));
        }
        if let Some((key, set)) = self.store.get_key_value(&wildcard) {
            sets.push((key, set));
        }
        sets
    }

    /// Rewrite a descriptor in place, returning what changed
    pub fn rewrite_in_place<D: RewriteTarget + ?Sized>(&self, descriptor: &mut D) -> Vec<Change> {
        let id = descriptor.identity();
        let mut changes = Vec::new();

        for (key, set) in self.rule_sets_for(&id) {
            debug!(module = %id, rules = %key, entries = set.len(), "applying rewrite rules");
            changes.extend(set.apply(descriptor));
        }
        changes
    }

    /// Rewrite a descriptor, returning the transformed value
    pub fn rewrite<D: RewriteTarget>(&self, mut descriptor: D) -> D {
        self.rewrite_in_place(&mut descriptor);
        descriptor
    }
}
