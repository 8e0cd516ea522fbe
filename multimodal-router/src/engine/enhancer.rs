//! Bounded fixed-point enhancement through the intermediate-route gateway.
//!
//! Each pass sends the node signature of every complete route to the
//! gateway, which may answer with an enlarged graph. A returned graph
//! replaces the working graph only if it has strictly more complete routes.
//! Passes stop at the first one without growth or at the configured cap.

use std::collections::HashSet;

use chrono::NaiveDate;
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::domain::NodeId;
use crate::gateway::{TransportGateway, with_timeout};
use crate::graph::Graph;

use super::config::GraphConfig;
use super::paths::enumerate_paths;

/// Counts from one enhancement run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnhanceReport {
    /// Passes run, including the final one without growth.
    pub passes: usize,
    /// Signatures sent to the gateway.
    pub submitted: usize,
    /// Times the working graph was replaced.
    pub replacements: usize,
    /// Complete routes in the final graph.
    pub complete_routes: usize,
}

/// Enhances the graph of one search.
///
/// The set of processed hubs outlives individual passes, so a hub expanded
/// once is not expanded again within the same search.
pub struct RouteEnhancer<'a, G: ?Sized> {
    gateway: &'a G,
    config: &'a GraphConfig,
    origin: &'a NodeId,
    destination: &'a NodeId,
    date: NaiveDate,
    processed: HashSet<NodeId>,
}

impl<'a, G: TransportGateway + ?Sized> RouteEnhancer<'a, G> {
    pub fn new(
        gateway: &'a G,
        config: &'a GraphConfig,
        origin: &'a NodeId,
        destination: &'a NodeId,
        date: NaiveDate,
    ) -> Self {
        Self {
            gateway,
            config,
            origin,
            destination,
            date,
            processed: HashSet::new(),
        }
    }

    /// Number of complete routes from origin to destination in `graph`.
    pub fn complete_routes(&self, graph: &Graph) -> usize {
        enumerate_paths(graph, self.origin, self.destination, self.config.max_transfers).len()
    }

    /// Run passes until one produces no growth or the pass cap is reached.
    pub async fn enhance(&mut self, graph: &mut Graph) -> EnhanceReport {
        let mut report = EnhanceReport {
            complete_routes: self.complete_routes(graph),
            ..EnhanceReport::default()
        };

        while report.passes < self.config.max_enhancement_passes {
            report.passes += 1;
            let before = report.complete_routes;

            self.pass(graph, &mut report).await;

            if report.complete_routes <= before {
                debug!(pass = report.passes, routes = before, "No growth, stopping");
                break;
            }
        }

        info!(
            passes = report.passes,
            submitted = report.submitted,
            replacements = report.replacements,
            complete_routes = report.complete_routes,
            "Route enhancement complete"
        );
        report
    }

    async fn pass(&mut self, graph: &mut Graph, report: &mut EnhanceReport) {
        let signatures = self.fresh_signatures(graph);
        debug!(pass = report.passes, signatures = signatures.len(), "Enhancement pass");

        for batch in signatures.chunks(self.config.batch()) {
            report.submitted += batch.len();

            let snapshot: &Graph = graph;
            let answers = join_all(batch.iter().map(|signature| self.expand(signature, snapshot))).await;

            let best = answers
                .into_iter()
                .flatten()
                .map(|candidate| (self.complete_routes(&candidate), candidate))
                .max_by_key(|(routes, _)| *routes);

            if let Some((routes, candidate)) = best
                && routes > report.complete_routes
            {
                debug!(from = report.complete_routes, to = routes, "Replacing working graph");
                *graph = candidate;
                report.complete_routes = routes;
                report.replacements += 1;
            }
        }
    }

    /// Distinct signatures of length three or more with at least one hub
    /// not yet processed. Their hubs are marked processed.
    fn fresh_signatures(&mut self, graph: &Graph) -> Vec<Vec<NodeId>> {
        let mut seen = HashSet::new();
        let mut fresh = Vec::new();

        for path in enumerate_paths(graph, self.origin, self.destination, self.config.max_transfers) {
            let signature = path.node_seq();
            if signature.len() < 3 || !seen.insert(signature.to_vec()) {
                continue;
            }

            let hubs = &signature[1..signature.len() - 1];
            if hubs.iter().all(|hub| self.processed.contains(hub)) {
                continue;
            }
            self.processed.extend(hubs.iter().cloned());
            fresh.push(signature.to_vec());
        }

        fresh
    }

    /// One gateway call. Failures and unusable answers come back as `None`.
    async fn expand(&self, signature: &[NodeId], graph: &Graph) -> Option<Graph> {
        let call = self.gateway.intermediate_routes(signature, self.date, graph);

        let candidate = match with_timeout("intermediate_routes", self.config.gateway_timeout(), call).await {
            Ok(Some(candidate)) => candidate,
            Ok(None) => {
                debug!(stops = signature.len(), "No intermediate routes");
                return None;
            }
            Err(e) => {
                warn!(stops = signature.len(), error = %e, "Intermediate-route lookup failed");
                return None;
            }
        };

        if let Err(e) = candidate.validate() {
            warn!(error = %e, "Discarding inconsistent graph from intermediate-route lookup");
            return None;
        }
        if !candidate.contains_node(self.origin) || !candidate.contains_node(self.destination) {
            warn!("Discarding graph without journey endpoints from intermediate-route lookup");
            return None;
        }

        Some(candidate)
    }
}
