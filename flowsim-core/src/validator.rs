//! Structural checks over a built [`Network`]. Every applicable rule runs —
//! the validator does not stop at the first failure, so a caller sees every
//! violation in one pass instead of fixing a diagram one error at a time.

use crate::entity::NodeId;
use crate::error::{ValidationError, ValidationIssue};
use crate::graph::{Network, Vertex, VertexKind};

pub fn validate_network(network: &Network) -> Result<(), ValidationError> {
    let mut issues = Vec::new();
    let vertices: Vec<&Vertex> = network.vertices().collect();

    if vertices.is_empty() {
        issues.push(issue("V-EMPTY-VERTICES", None, "network has no vertices"));
    }
    if network.edge_count() == 0 {
        issues.push(issue("V-EMPTY-EDGES", None, "network has no edges"));
    }

    let sources: Vec<&Vertex> = vertices
        .iter()
        .copied()
        .filter(|v| matches!(v.kind, VertexKind::Source { .. }))
        .collect();
    let exits: Vec<&Vertex> = vertices
        .iter()
        .copied()
        .filter(|v| matches!(v.kind, VertexKind::Exit))
        .collect();

    if sources.is_empty() {
        issues.push(issue("V-NO-SOURCE", None, "network has no Source vertex"));
    }
    if exits.is_empty() {
        issues.push(issue("V-NO-EXIT", None, "network has no Exit vertex"));
    }

    for v in &vertices {
        match &v.kind {
            VertexKind::Source { .. } if v.outbound_edges.len() != 1 => {
                issues.push(issue(
                    "V-SRC-OUT",
                    Some(&v.id),
                    &format!("Source must have exactly one outbound edge, has {}", v.outbound_edges.len()),
                ));
            }
            VertexKind::Process { .. } if v.outbound_edges.len() != 1 => {
                issues.push(issue(
                    "V-PROC-OUT",
                    Some(&v.id),
                    &format!("Process must have exactly one outbound edge, has {}", v.outbound_edges.len()),
                ));
            }
            VertexKind::Exit if !v.outbound_edges.is_empty() => {
                issues.push(issue(
                    "V-EXIT-OUT",
                    Some(&v.id),
                    &format!("Exit must have no outbound edges, has {}", v.outbound_edges.len()),
                ));
            }
            VertexKind::Decision { .. } if v.outbound_edges.is_empty() => {
                issues.push(issue("V-DEC-OUT", Some(&v.id), "Decision must have at least one outbound edge"));
            }
            _ => {}
        }
    }

    for s in &sources {
        if !search_for_exit(&s.id, Vec::new(), network) {
            issues.push(issue(
                "V-REACH",
                Some(&s.id),
                "no path from this Source reaches an Exit",
            ));
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(ValidationError(issues))
    }
}

fn issue(rule: &'static str, node_id: Option<&str>, message: &str) -> ValidationIssue {
    ValidationIssue {
        rule,
        node_id: node_id.map(|s| s.to_string()),
        message: message.to_string(),
    }
}

/// Depth-first reachability search for an Exit, reproducing a specific
/// asymmetry from the original implementation exactly: at a branching vertex
/// (Decision) each outbound path gets its own clone of the visited set, so
/// sibling subtrees can't block each other; along a single-successor chain
/// the same visited set is threaded through (mutated in place, not cloned).
/// Revisiting a vertex already on the current path is a cycle and fails that
/// path only — a successful run just needs one path to reach an Exit.
fn search_for_exit(cur_id: &str, mut visited: Vec<NodeId>, network: &Network) -> bool {
    let vertex = match network.vertex(cur_id) {
        Some(v) => v,
        None => return false,
    };
    if matches!(vertex.kind, VertexKind::Exit) {
        return true;
    }
    if visited.iter().any(|v| v == cur_id) {
        return false;
    }
    visited.push(cur_id.to_string());

    if matches!(vertex.kind, VertexKind::Decision { .. }) {
        for edge_id in &vertex.outbound_edges {
            if let Some(edge) = network.edge(edge_id) {
                if search_for_exit(&edge.to, visited.clone(), network) {
                    return true;
                }
            }
        }
        false
    } else {
        match vertex.outbound_edges.first() {
            Some(edge_id) => match network.edge(edge_id) {
                Some(edge) => search_for_exit(&edge.to, visited, network),
                None => false,
            },
            None => false,
        }
    }
}
