//! Kubernetes-style condition vocabulary: `{type, status, reason, message,
//! last_transition_time}`, stamped by the [`crate::condition`] manager and
//! never by client intent.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionType {
    Ready,
    Synced,
    Validated,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionReason {
    Ready,
    NotReady,
    Pending,
    Synced,
    SyncFailed,
    Validated,
    Validating,
    ValidationFailed,
    DependencyError,
    BackendError,
}

impl ConditionReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ConditionReason::Ready => "Ready",
            ConditionReason::NotReady => "NotReady",
            ConditionReason::Pending => "Pending",
            ConditionReason::Synced => "Synced",
            ConditionReason::SyncFailed => "SyncFailed",
            ConditionReason::Validated => "Validated",
            ConditionReason::Validating => "Validating",
            ConditionReason::ValidationFailed => "ValidationFailed",
            ConditionReason::DependencyError => "DependencyError",
            ConditionReason::BackendError => "BackendError",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    pub condition_type: ConditionType,
    pub status: ConditionStatus,
    pub reason: ConditionReason,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub last_transition_time: OffsetDateTime,
}

impl Condition {
    pub fn new(
        condition_type: ConditionType,
        status: ConditionStatus,
        reason: ConditionReason,
        message: impl Into<String>,
    ) -> Self {
        Self {
            condition_type,
            status,
            reason,
            message: message.into(),
            last_transition_time: OffsetDateTime::now_utc(),
        }
    }
}

/// The set of conditions attached to a resource: at most one per
/// [`ConditionType`], replaced wholesale on each transition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConditionSet {
    conditions: Vec<Condition>,
}

impl ConditionSet {
    pub fn get(&self, condition_type: ConditionType) -> Option<&Condition> {
        self.conditions
            .iter()
            .find(|c| c.condition_type == condition_type)
    }

    pub fn is_true(&self, condition_type: ConditionType) -> bool {
        matches!(
            self.get(condition_type).map(|c| c.status),
            Some(ConditionStatus::True)
        )
    }

    /// Set (insert or replace) the condition of this type.
    pub fn set(&mut self, condition: Condition) {
        if let Some(existing) = self
            .conditions
            .iter_mut()
            .find(|c| c.condition_type == condition.condition_type)
        {
            *existing = condition;
        } else {
            self.conditions.push(condition);
        }
    }

    /// Drop the `Error` condition, if any. Called at the start of every
    /// condition-manager pass so a resolved error doesn't linger.
    pub fn clear_error(&mut self) {
        self.conditions
            .retain(|c| c.condition_type != ConditionType::Error);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Condition> {
        self.conditions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_same_type() {
        let mut set = ConditionSet::default();
        set.set(Condition::new(
            ConditionType::Ready,
            ConditionStatus::False,
            ConditionReason::NotReady,
            "not ready",
        ));
        set.set(Condition::new(
            ConditionType::Ready,
            ConditionStatus::True,
            ConditionReason::Ready,
            "ready",
        ));
        assert!(set.is_true(ConditionType::Ready));
        assert_eq!(set.iter().count(), 1);
    }

    #[test]
    fn clear_error_only_touches_error_type() {
        let mut set = ConditionSet::default();
        set.set(Condition::new(
            ConditionType::Ready,
            ConditionStatus::True,
            ConditionReason::Ready,
            "ready",
        ));
        set.set(Condition::new(
            ConditionType::Error,
            ConditionStatus::True,
            ConditionReason::DependencyError,
            "boom",
        ));
        set.clear_error();
        assert!(set.get(ConditionType::Error).is_none());
        assert!(set.is_true(ConditionType::Ready));
    }
}
