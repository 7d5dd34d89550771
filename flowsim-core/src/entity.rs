use std::collections::HashMap;

pub type EntityId = u64;
pub type NodeId = String;
pub type ResourceId = String;

/// A held unit of a Resource's capacity. Carries no data of its own — its
/// presence in `Entity::holdings` is what it means to hold one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket;

/// One pass of an entity through a Process, bracketing service time only:
/// from the moment the entity actually starts being served (after any
/// Resource seize has been granted) to the moment it hands off. Time spent
/// queued for a Resource is not part of this span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessVisit {
    pub node_id: NodeId,
    pub service_started_at: u64,
    pub departed_at: u64,
}

impl ProcessVisit {
    pub fn duration(&self) -> u64 {
        self.departed_at.saturating_sub(self.service_started_at)
    }
}

/// The statistics an entity accumulates as it moves through the network.
#[derive(Debug, Clone, Default)]
pub struct EntityStats {
    pub visited: Vec<NodeId>,
    pub process_visits: Vec<ProcessVisit>,
}

/// A token flowing through the network. Entities are moved, not shared: at
/// any instant an entity is owned by exactly one place (a scheduled event, or
/// a Resource's wait queue), matching the single-task-runs-at-a-time model.
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub label: String,
    pub created_at: u64,
    pub created_by: NodeId,
    pub departed_at: Option<u64>,
    pub departed_through: Option<NodeId>,
    pub stats: EntityStats,
    pub holdings: HashMap<ResourceId, Ticket>,
}

impl Entity {
    pub fn new(id: EntityId, label_prefix: &str, created_by: NodeId, now: u64) -> Self {
        Entity {
            id,
            label: format!("{label_prefix} {id}"),
            created_at: now,
            created_by,
            departed_at: None,
            departed_through: None,
            stats: EntityStats::default(),
            holdings: HashMap::new(),
        }
    }

    pub fn lifespan(&self) -> Option<u64> {
        self.departed_at.map(|d| d.saturating_sub(self.created_at))
    }

    pub fn record_visit(&mut self, node_id: &NodeId) {
        self.stats.visited.push(node_id.clone());
    }
}
