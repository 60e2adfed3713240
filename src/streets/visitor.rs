//! Routing visitors
//!
//! A visitor sees every state popped from the queue and may stop the search
//! early; this is also the engine's cooperative cancellation point. Two
//! built-in visitors harvest reached transit stops and reached flagged
//! vertices (bike share, park-and-ride) during access/egress searches.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::state::{RoutingVariable, State};
use super::vertex_store::{VertexFlag, VertexStore};
use crate::transit::TransitLayer;

pub trait RoutingVisitor {
    /// Called for every state popped from the priority queue.
    fn visit_vertex(&mut self, state: &Arc<State>);

    /// Checked after each visit; `true` ends the search.
    fn should_break_search(&self) -> bool {
        false
    }
}

/// Collects up to `max_stops` transit stops at least `min_travel_time_seconds`
/// from the start of the search. When a stop is reached multiple times the
/// best cost under the dominance variable wins.
pub struct StopVisitor<'a> {
    transit: &'a TransitLayer,
    dominance_variable: RoutingVariable,
    max_stops: usize,
    min_travel_time_seconds: i32,
    stops: HashMap<i32, i32>,
}

impl<'a> StopVisitor<'a> {
    pub fn new(
        transit: &'a TransitLayer,
        dominance_variable: RoutingVariable,
        max_stops: usize,
        min_travel_time_seconds: i32,
    ) -> Self {
        Self {
            transit,
            dominance_variable,
            max_stops,
            min_travel_time_seconds,
            stops: HashMap::new(),
        }
    }

    /// Stop index → cost under the dominance variable.
    pub fn stops(&self) -> &HashMap<i32, i32> {
        &self.stops
    }

    pub fn into_stops(self) -> HashMap<i32, i32> {
        self.stops
    }
}

impl RoutingVisitor for StopVisitor<'_> {
    fn visit_vertex(&mut self, state: &Arc<State>) {
        let Some(stop) = self.transit.stop_at_street_vertex(state.vertex) else {
            return;
        };
        if state.duration_seconds < self.min_travel_time_seconds {
            return;
        }
        let value = state.routing_variable(self.dominance_variable);
        self.stops
            .entry(stop)
            .and_modify(|best| {
                if *best > value {
                    *best = value;
                }
            })
            .or_insert(value);
    }

    fn should_break_search(&self) -> bool {
        self.stops.len() >= self.max_stops
    }
}

/// Collects up to `max_vertices` vertices carrying `wanted_flag`, each at
/// least `min_travel_time_seconds` into the current leg. Vertices first seen
/// too early are blacklisted so a later, longer path to the same vertex cannot
/// sneak past the floor.
pub struct VertexFlagVisitor<'a> {
    vertex_store: &'a VertexStore,
    dominance_variable: RoutingVariable,
    wanted_flag: VertexFlag,
    max_vertices: usize,
    min_travel_time_seconds: i32,
    vertices: HashMap<i32, Arc<State>>,
    skipped_vertices: HashSet<i32>,
}

impl<'a> VertexFlagVisitor<'a> {
    pub fn new(
        vertex_store: &'a VertexStore,
        dominance_variable: RoutingVariable,
        wanted_flag: VertexFlag,
        max_vertices: usize,
        min_travel_time_seconds: i32,
    ) -> Self {
        Self {
            vertex_store,
            dominance_variable,
            wanted_flag,
            max_vertices,
            min_travel_time_seconds,
            vertices: HashMap::new(),
            skipped_vertices: HashSet::new(),
        }
    }

    /// Vertex index → best state reaching it.
    pub fn vertices(&self) -> &HashMap<i32, Arc<State>> {
        &self.vertices
    }

    pub fn into_vertices(self) -> HashMap<i32, Arc<State>> {
        self.vertices
    }
}

impl RoutingVisitor for VertexFlagVisitor<'_> {
    fn visit_vertex(&mut self, state: &Arc<State>) {
        // Origin seeds are skipped: after a mode switch they carry travel time
        // from a different mode and must not count as reached here.
        if state.vertex < 0
            || state.back_state.is_none()
            || state.duration_from_origin_seconds < self.min_travel_time_seconds
            || self.skipped_vertices.contains(&state.vertex)
        {
            if state.vertex >= 0
                && state.duration_from_origin_seconds < self.min_travel_time_seconds
            {
                self.skipped_vertices.insert(state.vertex);
            }
            return;
        }
        if !self.vertex_store.has_flag(state.vertex, self.wanted_flag) {
            return;
        }
        let value = state.routing_variable(self.dominance_variable);
        match self.vertices.get(&state.vertex) {
            Some(existing)
                if existing.routing_variable(self.dominance_variable) <= value => {}
            _ => {
                self.vertices.insert(state.vertex, Arc::clone(state));
            }
        }
    }

    fn should_break_search(&self) -> bool {
        self.vertices.len() >= self.max_vertices
    }
}
