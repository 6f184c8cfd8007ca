use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of one attempt. `Invalid` and `Submitted` are terminal; only an
/// explicit reset leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptStatus {
    Loading,
    Invalid,
    Verification,
    Instructions,
    InProgress,
    Submitting,
    Submitted,
}

impl AttemptStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, AttemptStatus::Invalid | AttemptStatus::Submitted)
    }

    /// Whether `next` is reachable from `self` without a reset. Any state may
    /// fall to `Invalid` on an unrecoverable error.
    pub fn may_transition(self, next: AttemptStatus) -> bool {
        if next == AttemptStatus::Invalid {
            return self != AttemptStatus::Invalid;
        }
        matches!(
            (self, next),
            (AttemptStatus::Loading, AttemptStatus::Verification)
                | (AttemptStatus::Verification, AttemptStatus::Instructions)
                | (AttemptStatus::Instructions, AttemptStatus::InProgress)
                | (AttemptStatus::InProgress, AttemptStatus::Submitting)
                | (AttemptStatus::Submitting, AttemptStatus::Submitted)
                | (AttemptStatus::Submitting, AttemptStatus::InProgress)
        )
    }
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttemptStatus::Loading => "LOADING",
            AttemptStatus::Invalid => "INVALID",
            AttemptStatus::Verification => "VERIFICATION",
            AttemptStatus::Instructions => "INSTRUCTIONS",
            AttemptStatus::InProgress => "IN_PROGRESS",
            AttemptStatus::Submitting => "SUBMITTING",
            AttemptStatus::Submitted => "SUBMITTED",
        };
        f.write_str(name)
    }
}
