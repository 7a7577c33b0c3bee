//! Result aggregation: per-node state tracking and the final report.

use certcascade_core::{
    CoreError, DiscoveryEntry, FailureReason, NodeIndex, NodeState, Outcome, Report, ReportEntry,
    SignerGraph,
};

use crate::error::Result;

/// Collects node outcomes as the scheduler emits them.
///
/// Enforces the node state machine: a terminal outcome is recorded once
/// and never overwritten.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    states: Vec<NodeState>,
    details: Vec<Option<String>>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking any nodes added to `graph` since the last call.
    pub fn track(&mut self, graph: &SignerGraph) {
        self.states.resize(graph.len(), NodeState::Pending);
        self.details.resize(graph.len(), None);
    }

    /// Current state of a node.
    pub fn state(&self, index: NodeIndex) -> Result<NodeState> {
        self.states
            .get(index.get())
            .copied()
            .ok_or_else(|| CoreError::UnknownNode(index).into())
    }

    /// Terminal outcome of a node, if it has one.
    pub fn outcome(&self, index: NodeIndex) -> Option<Outcome> {
        self.states.get(index.get()).and_then(NodeState::outcome)
    }

    pub fn is_pending(&self, index: NodeIndex) -> bool {
        matches!(self.states.get(index.get()), Some(NodeState::Pending))
    }

    /// Mark a node as having a regeneration in flight.
    pub fn begin(&mut self, index: NodeIndex) -> Result<()> {
        self.transition(index, NodeState::Regenerating)
    }

    /// Record a terminal outcome.
    pub fn record(&mut self, index: NodeIndex, outcome: Outcome) -> Result<()> {
        self.transition(index, NodeState::Done(outcome))
    }

    /// Record a terminal outcome with a human-readable explanation.
    pub fn record_with_detail(
        &mut self,
        index: NodeIndex,
        outcome: Outcome,
        detail: impl Into<String>,
    ) -> Result<()> {
        self.transition(index, NodeState::Done(outcome))?;
        self.details[index.get()] = Some(detail.into());
        Ok(())
    }

    fn transition(&mut self, index: NodeIndex, next: NodeState) -> Result<()> {
        let current = self.state(index)?;
        if !current.can_transition_to(&next) {
            return Err(CoreError::InvalidTransition {
                node: index,
                from: current,
                to: next,
            }
            .into());
        }
        self.states[index.get()] = next;
        Ok(())
    }

    /// Build the report in discovery order.
    ///
    /// Nodes that never reached a terminal state were abandoned and are
    /// reported as cancelled. Rejected edges take their outcome from their
    /// signer: they only count as failures when the signer itself succeeded.
    pub fn report(&self, graph: &SignerGraph) -> Report {
        let entries = graph
            .entries()
            .iter()
            .map(|entry| match entry {
                DiscoveryEntry::Node(index) => {
                    let outcome = self.outcome(*index).unwrap_or(Outcome::Cancelled);
                    let entry = ReportEntry::new(graph.name(*index), outcome);
                    match self.details.get(index.get()).cloned().flatten() {
                        Some(detail) => entry.with_detail(detail),
                        None => entry,
                    }
                }
                DiscoveryEntry::Rejected {
                    name,
                    parent,
                    reason,
                } => {
                    let signer = graph.name(*parent);
                    let outcome = match self.outcome(*parent) {
                        Some(Outcome::Succeeded) => Outcome::Failed(*reason),
                        Some(other) => other
                            .inherited_by_child()
                            .unwrap_or(Outcome::SkippedParentFailed),
                        None => Outcome::Cancelled,
                    };
                    ReportEntry::new(name.clone(), outcome)
                        .with_detail(rejection_detail(*reason, signer))
                }
            })
            .collect();

        Report::from_entries(graph.root().name.clone(), entries)
    }
}

fn rejection_detail(reason: FailureReason, signer: &str) -> String {
    match reason {
        FailureReason::CycleDetected => {
            format!("listed as signed by {} but already on its signing path", signer)
        }
        FailureReason::DepthExceeded => {
            format!("signed by {} beyond the maximum discovery depth", signer)
        }
        other => format!("signed by {}: {}", signer, other),
    }
}
