//! Report and plan rendering for stdout.

use certcascade_core::{DiscoveryEntry, FailureReason, NodeIndex, Report};
use certcascade_engine::Discovery;
use serde_json::json;

use crate::config::OutputFormat;

/// Render a finished run.
///
/// Text is one `<name>: <outcome>` line per certificate followed by the
/// summary line.
pub fn render_report(report: &Report, format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Text => Ok(format!("{}\n", report)),
        OutputFormat::Json => Ok(format!("{}\n", serde_json::to_string_pretty(report)?)),
    }
}

/// Render a dry-run discovery.
pub fn render_plan(discovery: &Discovery, format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Text => Ok(plan_text(discovery)),
        OutputFormat::Json => Ok(format!(
            "{}\n",
            serde_json::to_string_pretty(&plan_json(discovery))?
        )),
    }
}

fn plan_text(discovery: &Discovery) -> String {
    let graph = &discovery.graph;

    let mut rejected: Vec<Vec<(&str, FailureReason)>> = vec![Vec::new(); graph.len()];
    for entry in graph.entries() {
        if let DiscoveryEntry::Rejected {
            name,
            parent,
            reason,
        } = entry
        {
            rejected[parent.get()].push((name.as_str(), *reason));
        }
    }

    let mut out = String::new();
    let mut stack = vec![NodeIndex::ROOT];
    while let Some(index) = stack.pop() {
        let Ok(node) = graph.node(index) else {
            continue;
        };
        let indent = "  ".repeat(node.depth);

        out.push_str(&indent);
        out.push_str(&node.name);
        if let Some((_, error)) = discovery.failures.iter().find(|(i, _)| *i == index) {
            out.push_str(&format!(" (not listed: {})", error));
        } else if discovery.cancelled.contains(&index) {
            out.push_str(" (not listed: cancelled)");
        }
        out.push('\n');

        for (name, reason) in &rejected[index.get()] {
            out.push_str(&format!("{}  {} ({})\n", indent, name, reason));
        }

        stack.extend(node.children.iter().rev().copied());
    }

    out.push_str(&format!(
        "discovered: {}, rejected: {}, unlisted: {}\n",
        graph.len(),
        graph.rejected_count(),
        discovery.failures.len() + discovery.cancelled.len()
    ));
    out
}

fn plan_json(discovery: &Discovery) -> serde_json::Value {
    let graph = &discovery.graph;
    let signer = |parent: Option<NodeIndex>| parent.map(|p| graph.name(p).to_string());

    let certificates: Vec<_> = graph
        .nodes()
        .map(|(_, node)| {
            json!({
                "name": node.name,
                "signed_by": signer(node.parent),
                "depth": node.depth,
            })
        })
        .collect();

    let rejected: Vec<_> = graph
        .entries()
        .iter()
        .filter_map(|entry| match entry {
            DiscoveryEntry::Rejected {
                name,
                parent,
                reason,
            } => Some(json!({
                "name": name,
                "signed_by": graph.name(*parent),
                "reason": reason,
            })),
            DiscoveryEntry::Node(_) => None,
        })
        .collect();

    let unlisted: Vec<_> = discovery
        .failures
        .iter()
        .map(|(index, error)| {
            json!({
                "name": graph.name(*index),
                "reason": error.reason(),
                "error": error.to_string(),
            })
        })
        .chain(discovery.cancelled.iter().map(|index| {
            json!({
                "name": graph.name(*index),
                "reason": "Cancelled",
            })
        }))
        .collect();

    json!({
        "root": graph.root().name,
        "certificates": certificates,
        "rejected": rejected,
        "unlisted": unlisted,
    })
}
