//! Node outcomes and the per-node state machine.
//!
//! ```text
//! Pending ──► Regenerating ──► Succeeded | Failed | Cancelled
//!    │
//!    ├──► SkippedParentFailed   (parent resolved unfavorably)
//!    ├──► Cancelled             (never started)
//!    └──► Failed                (discovery failed before regeneration)
//! ```
//!
//! Every outcome is terminal: once a node reaches one it is never revisited.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a node failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureReason {
    /// The credential does not exist.
    NotFound,
    /// The caller may not read or regenerate the credential.
    PermissionDenied,
    /// Transport failure or an unusable server response.
    NetworkError,
    /// The call did not complete within the request timeout.
    Timeout,
    /// The credential type does not support regeneration.
    ValidationError,
    /// The certificate was already on the current root-to-node path.
    CycleDetected,
    /// The certificate sits below the configured maximum depth.
    DepthExceeded,
}

impl FailureReason {
    /// Structural reasons come from discovery and never from a store call.
    pub fn is_structural(self) -> bool {
        matches!(self, FailureReason::CycleDetected | FailureReason::DepthExceeded)
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureReason::NotFound => "NotFound",
            FailureReason::PermissionDenied => "PermissionDenied",
            FailureReason::NetworkError => "NetworkError",
            FailureReason::Timeout => "Timeout",
            FailureReason::ValidationError => "ValidationError",
            FailureReason::CycleDetected => "CycleDetected",
            FailureReason::DepthExceeded => "DepthExceeded",
        };
        f.write_str(name)
    }
}

/// The terminal result recorded for one certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Succeeded,
    Failed(FailureReason),
    SkippedParentFailed,
    Cancelled,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Succeeded)
    }

    /// Get the failure reason, if this is a failure.
    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self {
            Outcome::Failed(reason) => Some(*reason),
            _ => None,
        }
    }

    /// Outcome inherited by a child whose parent ended with `self`.
    ///
    /// Returns `None` when the parent succeeded and the child must be
    /// processed on its own merits.
    pub fn inherited_by_child(&self) -> Option<Outcome> {
        match self {
            Outcome::Succeeded => None,
            Outcome::Cancelled => Some(Outcome::Cancelled),
            Outcome::Failed(_) | Outcome::SkippedParentFailed => {
                Some(Outcome::SkippedParentFailed)
            }
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Succeeded => f.write_str("Succeeded"),
            Outcome::Failed(reason) => write!(f, "Failed({})", reason),
            Outcome::SkippedParentFailed => f.write_str("SkippedParentFailed"),
            Outcome::Cancelled => f.write_str("Cancelled"),
        }
    }
}

/// Lifecycle state of a node while the cascade runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NodeState {
    #[default]
    Pending,
    Regenerating,
    Done(Outcome),
}

impl NodeState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, NodeState::Done(_))
    }

    /// Get the terminal outcome, if reached.
    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            NodeState::Done(outcome) => Some(*outcome),
            _ => None,
        }
    }

    /// Check whether `self -> next` is a legal transition.
    pub fn can_transition_to(&self, next: &NodeState) -> bool {
        match (self, next) {
            (NodeState::Pending, NodeState::Regenerating) => true,
            (NodeState::Pending, NodeState::Done(outcome)) => matches!(
                outcome,
                Outcome::SkippedParentFailed | Outcome::Cancelled | Outcome::Failed(_)
            ),
            (NodeState::Regenerating, NodeState::Done(outcome)) => matches!(
                outcome,
                Outcome::Succeeded | Outcome::Failed(_) | Outcome::Cancelled
            ),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_display() {
        assert_eq!(Outcome::Succeeded.to_string(), "Succeeded");
        assert_eq!(
            Outcome::Failed(FailureReason::NotFound).to_string(),
            "Failed(NotFound)"
        );
        assert_eq!(
            Outcome::SkippedParentFailed.to_string(),
            "SkippedParentFailed"
        );
        assert_eq!(Outcome::Cancelled.to_string(), "Cancelled");
    }

    #[test]
    fn test_inherited_by_child() {
        assert_eq!(Outcome::Succeeded.inherited_by_child(), None);
        assert_eq!(
            Outcome::Failed(FailureReason::Timeout).inherited_by_child(),
            Some(Outcome::SkippedParentFailed)
        );
        assert_eq!(
            Outcome::SkippedParentFailed.inherited_by_child(),
            Some(Outcome::SkippedParentFailed)
        );
        assert_eq!(
            Outcome::Cancelled.inherited_by_child(),
            Some(Outcome::Cancelled)
        );
    }

    #[test]
    fn test_transitions_from_pending() {
        let pending = NodeState::Pending;
        assert!(pending.can_transition_to(&NodeState::Regenerating));
        assert!(pending.can_transition_to(&NodeState::Done(Outcome::SkippedParentFailed)));
        assert!(pending.can_transition_to(&NodeState::Done(Outcome::Cancelled)));
        assert!(pending.can_transition_to(&NodeState::Done(Outcome::Failed(
            FailureReason::NotFound
        ))));
        // Success requires an actual regeneration.
        assert!(!pending.can_transition_to(&NodeState::Done(Outcome::Succeeded)));
    }

    #[test]
    fn test_transitions_from_regenerating() {
        let running = NodeState::Regenerating;
        assert!(running.can_transition_to(&NodeState::Done(Outcome::Succeeded)));
        assert!(running.can_transition_to(&NodeState::Done(Outcome::Cancelled)));
        assert!(!running.can_transition_to(&NodeState::Done(Outcome::SkippedParentFailed)));
        assert!(!running.can_transition_to(&NodeState::Pending));
    }

    #[test]
    fn test_terminal_states_are_final() {
        let done = NodeState::Done(Outcome::Succeeded);
        assert!(done.is_terminal());
        assert!(!done.can_transition_to(&NodeState::Regenerating));
        assert!(!done.can_transition_to(&NodeState::Done(Outcome::Cancelled)));
    }

    #[test]
    fn test_structural_reasons() {
        assert!(FailureReason::CycleDetected.is_structural());
        assert!(FailureReason::DepthExceeded.is_structural());
        assert!(!FailureReason::NetworkError.is_structural());
    }
}
