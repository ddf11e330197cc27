use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The only condition type the controller sets.
pub const READY_CONDITION: &str = "Ready";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionReason {
    Available,
    Creating,
    Deleting,
}

impl fmt::Display for ConditionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConditionReason::Available => "Available",
            ConditionReason::Creating => "Creating",
            ConditionReason::Deleting => "Deleting",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub kind: String,
    pub status: ConditionStatus,
    pub reason: ConditionReason,
    pub last_transition_time: DateTime<Utc>,
}

impl Condition {
    /// The external resource exists and is usable.
    pub fn available(now: DateTime<Utc>) -> Self {
        Self::ready(ConditionStatus::True, ConditionReason::Available, now)
    }

    /// The external resource is being created.
    pub fn creating(now: DateTime<Utc>) -> Self {
        Self::ready(ConditionStatus::False, ConditionReason::Creating, now)
    }

    /// The external resource is being deleted.
    pub fn deleting(now: DateTime<Utc>) -> Self {
        Self::ready(ConditionStatus::False, ConditionReason::Deleting, now)
    }

    fn ready(status: ConditionStatus, reason: ConditionReason, now: DateTime<Utc>) -> Self {
        Self {
            kind: READY_CONDITION.to_string(),
            status,
            reason,
            last_transition_time: now,
        }
    }

    /// Same type, status and reason; transition time is ignored.
    pub fn equivalent(&self, other: &Condition) -> bool {
        self.kind == other.kind && self.status == other.status && self.reason == other.reason
    }
}
