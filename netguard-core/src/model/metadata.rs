//! Per-resource bookkeeping metadata carried alongside every resource's
//! spec fields: identity, optimistic-concurrency counters, and conditions.

use serde::{Deserialize, Serialize};

use super::condition::ConditionSet;
use super::identifier::Identifier;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    pub identifier: Identifier,
    /// Bumped on every commit that touches this resource, the way a
    /// Kubernetes object's `resourceVersion` works.
    pub resource_version: u64,
    /// Bumped only on spec-affecting writes (not on condition-only passes).
    pub generation: u64,
    pub conditions: ConditionSet,
}

impl Metadata {
    pub fn new(identifier: Identifier) -> Self {
        Self {
            identifier,
            resource_version: 0,
            generation: 1,
            conditions: ConditionSet::default(),
        }
    }

    pub fn bump_resource_version(&mut self) {
        self.resource_version += 1;
    }
}
