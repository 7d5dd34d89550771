use std::collections::HashMap;

use petgraph::graph::{Graph, NodeIndex};

use crate::delay::DelaySpec;
use crate::entity::{NodeId, ResourceId};

pub type EdgeId = String;

/// Static, per-node behavior configuration. Built once by the network
/// builder and never mutated after — any per-run counters (Source's created
/// count, a Resource's in-use count) live in the scheduler's own state, not
/// here, so the same `Network` can back multiple independent runs.
#[derive(Debug, Clone)]
pub enum VertexKind {
    Source {
        label_prefix: String,
        delay: DelaySpec,
    },
    Process {
        will_seize: bool,
        will_delay: bool,
        will_release: bool,
        resource: Option<ResourceId>,
        delay: DelaySpec,
    },
    Decision {
        /// Probability routed to the `up` outbound edge; `u > probability`
        /// routes to `down` (see `Decision::run` in `scheduler.rs`).
        probability: f64,
    },
    Exit,
}

#[derive(Debug, Clone)]
pub struct Vertex {
    pub id: NodeId,
    /// Outbound edges in document encounter order. For a Decision, index 0
    /// is `up` and index 1 is `down`; for Source/Process there is at most
    /// one; Exit has none.
    pub outbound_edges: Vec<EdgeId>,
    pub kind: VertexKind,
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
}

#[derive(Debug, Clone)]
pub struct ResourceDef {
    pub name: String,
    pub capacity: usize,
}

/// The built, immutable graph: vertices, edges and declared resources,
/// indexed for O(1) lookup by their diagram-stable string ids.
#[derive(Debug, Clone)]
pub struct Network {
    graph: Graph<Vertex, EdgeId>,
    index_of: HashMap<NodeId, NodeIndex>,
    edges: HashMap<EdgeId, Edge>,
    pub resources: HashMap<ResourceId, ResourceDef>,
}

impl Network {
    pub(crate) fn new(
        vertices: Vec<Vertex>,
        edges: Vec<Edge>,
        resources: HashMap<ResourceId, ResourceDef>,
    ) -> Self {
        let mut graph = Graph::new();
        let mut index_of = HashMap::new();
        for v in vertices {
            let id = v.id.clone();
            let idx = graph.add_node(v);
            index_of.insert(id, idx);
        }
        let mut edge_map = HashMap::new();
        for e in edges {
            if let (Some(&from_idx), Some(&to_idx)) =
                (index_of.get(&e.from), index_of.get(&e.to))
            {
                graph.add_edge(from_idx, to_idx, e.id.clone());
            }
            edge_map.insert(e.id.clone(), e);
        }
        Network {
            graph,
            index_of,
            edges: edge_map,
            resources,
        }
    }

    pub fn vertex(&self, id: &str) -> Option<&Vertex> {
        self.index_of.get(id).map(|&idx| &self.graph[idx])
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.get(id)
    }

    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.graph.node_weights()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.index_of.keys()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_of.contains_key(id)
    }

    pub fn vertex_count(&self) -> usize {
        self.index_of.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn sources(&self) -> impl Iterator<Item = &Vertex> {
        self.graph
            .node_weights()
            .filter(|v| matches!(v.kind, VertexKind::Source { .. }))
    }

    /// Target vertex of an outbound edge, if the edge and its target exist.
    pub fn edge_target(&self, edge_id: &str) -> Option<&Vertex> {
        let edge = self.edges.get(edge_id)?;
        self.vertex(&edge.to)
    }
}
