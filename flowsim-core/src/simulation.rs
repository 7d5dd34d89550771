//! Top-level facade: build a diagram into a validated [`Network`], then run
//! it under the scheduler any number of times and reduce each run's result.
//!
//! Mirrors the `build_sim(xml) -> Simulation(nodes, edges, resources) ->
//! sim.run()` pipeline in `examples/original_source/sim_worker.py`, minus the
//! job-queue/HTTP plumbing around it — that lives behind the
//! `SimulationSubmit`/`SimulationDeliver` seam in `crate::interfaces`.

use crate::aggregator::{aggregate, SimulationStatistics};
use crate::builder::build_network;
use crate::config::RunConfig;
use crate::error::SimError;
use crate::graph::Network;
use crate::scheduler::Scheduler;
use crate::validator::validate_network;

/// A diagram that has been parsed and structurally validated. Immutable once
/// built, so the same `Simulation` can back any number of independent runs
/// with different seeds or horizons.
pub struct Simulation {
    network: Network,
}

impl Simulation {
    /// Parses `xml` into a network and validates it. Build and validation
    /// failures are fatal here and never produce a partial statistics
    /// document (spec.md §7) — `Simulation::run` is only reachable once this
    /// succeeds.
    pub fn build(xml: &str) -> Result<Self, SimError> {
        let network = build_network(xml)?;
        validate_network(&network)?;
        Ok(Simulation { network })
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Executes one run to completion (or horizon) and reduces the departed
    /// entities into the response document shape (spec.md §6). Runtime
    /// anomalies (release without seize, unknown delay types) degrade to a
    /// logged no-op rather than aborting the run — see `crate::scheduler`.
    pub fn run(&self, config: &RunConfig) -> SimulationStatistics {
        tracing::debug!(
            vertices = self.network.vertex_count(),
            edges = self.network.edge_count(),
            horizon = config.horizon(),
            seed = config.resolved_seed(),
            "starting simulation run"
        );
        let departed = Scheduler::new(&self.network, config).run();
        let stats = aggregate(departed);
        tracing::debug!(exited = stats.entities.lifespans.len(), "simulation run complete");
        stats
    }
}
