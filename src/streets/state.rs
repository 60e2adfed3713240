//! Search states
//!
//! One state per (edge, distinct turn-restriction progress) actually explored.
//! A state sits at the *end* of the edge it was reached by, so edge-to-edge
//! turn costs can be applied when leaving it. Predecessor chains form a DAG
//! rooted at the origins; predecessors are shared by all successors, which is
//! why `back_state` is an `Arc`.

use std::sync::Arc;

use log::warn;

use super::edge_store::EdgeStore;
use super::turn_restrictions::RestrictionProgress;
use crate::request::StreetMode;

/// Which cumulative variable drives both queue ordering and domination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingVariable {
    /// Time, in seconds
    DurationSeconds,
    /// Weight / generalized cost
    Weight,
    /// Distance, in millimeters
    DistanceMillimeters,
}

#[derive(Debug, Clone)]
pub struct State {
    /// Vertex this state sits at: the to-vertex of `back_edge` (from-vertex on
    /// reverse searches), or the seed vertex for origin states.
    pub vertex: i32,
    /// Edge this state was reached by; -1 for a state seeded directly at a
    /// vertex.
    pub back_edge: i32,
    /// Predecessor in the search tree.
    pub back_state: Option<Arc<State>>,
    /// Generalized cost since the first origin.
    pub weight: i32,
    /// Travel time since the first origin, seconds.
    pub duration_seconds: i32,
    /// Travel time within the current leg only, seconds. Differs from
    /// `duration_seconds` after a mode switch (park-and-ride, bike share).
    pub duration_from_origin_seconds: i32,
    /// Distance since the first origin, millimeters.
    pub distance_mm: i32,
    /// Predecessor count.
    pub idx: u32,
    /// Mode in effect on this leg.
    pub street_mode: StreetMode,
    /// A mode switch happened at this vertex (bike pickup/dropoff).
    pub is_bike_share: bool,
    /// Cached admissible underestimate of the remaining cost to the
    /// destination, in units of the active routing variable.
    pub heuristic: i32,
    /// Progress through turn restrictions currently being traversed; `None`
    /// when not mid-restriction.
    pub turn_restrictions: Option<RestrictionProgress>,
}

impl State {
    /// Fresh origin state with all cumulative variables at zero.
    pub fn new(vertex: i32, back_edge: i32, street_mode: StreetMode) -> Self {
        Self {
            vertex,
            back_edge,
            back_state: None,
            weight: 0,
            duration_seconds: 0,
            duration_from_origin_seconds: 0,
            distance_mm: 0,
            idx: 0,
            street_mode,
            is_bike_share: false,
            heuristic: 0,
            turn_restrictions: None,
        }
    }

    /// Successor of `back` reached over `via_edge`, inheriting all cumulative
    /// variables. The caller adds the traversal costs afterwards.
    pub fn step(back: &Arc<State>, vertex: i32, via_edge: i32) -> Self {
        Self {
            vertex,
            back_edge: via_edge,
            back_state: Some(Arc::clone(back)),
            weight: back.weight,
            duration_seconds: back.duration_seconds,
            duration_from_origin_seconds: back.duration_from_origin_seconds,
            distance_mm: back.distance_mm,
            idx: back.idx + 1,
            street_mode: back.street_mode,
            is_bike_share: back.is_bike_share,
            heuristic: 0,
            turn_restrictions: None,
        }
    }

    #[inline]
    pub fn routing_variable(&self, variable: RoutingVariable) -> i32 {
        match variable {
            RoutingVariable::DurationSeconds => self.duration_seconds,
            RoutingVariable::Weight => self.weight,
            RoutingVariable::DistanceMillimeters => self.distance_mm,
        }
    }

    /// Add travel time. Increments are strictly additive; a negative amount
    /// indicates a graph defect and leaves the state unadvanced.
    pub fn increment_time_seconds(&mut self, seconds: i32) {
        if seconds < 0 {
            warn!(
                "A state's time is being incremented by a negative amount ({seconds}s) \
                 while traversing edge {}",
                self.back_edge
            );
            return;
        }
        self.duration_seconds += seconds;
        self.duration_from_origin_seconds += seconds;
    }

    pub fn increment_weight(&mut self, weight: i32) {
        self.weight += weight;
    }

    /// Reverse a terminal state chain for rendering arrive-by results: the new
    /// chain runs tail-to-head, each node adopting its predecessor's edge and
    /// re-deriving its vertex from that edge's endpoints (both endpoints are
    /// examined so degenerate self-loop edges stay correct). Cumulative values
    /// are re-accumulated from the original chain's segment deltas.
    pub fn reverse(&self, edge_store: &EdgeStore) -> Arc<State> {
        let mut orig = self;
        let mut reversed = {
            let mut head = State::new(self.vertex, -1, self.street_mode);
            head.idx = self.idx;
            Arc::new(head)
        };
        while let Some(back) = orig.back_state.as_deref() {
            let edge = orig.back_edge;
            let mut child = (*reversed).clone();
            child.back_state = Some(Arc::clone(&reversed));
            child.back_edge = edge;

            let cursor = edge_store.cursor(edge);
            let (from_vertex, to_vertex) = (cursor.from_vertex(), cursor.to_vertex());
            if reversed.vertex == from_vertex {
                // Also covers the self-loop case where both endpoints match.
                child.vertex = to_vertex;
            } else if reversed.vertex == to_vertex {
                child.vertex = from_vertex;
            }

            child.weight += orig.weight - back.weight;
            let time_delta = orig.duration_seconds - back.duration_seconds;
            child.duration_seconds += time_delta;
            child.duration_from_origin_seconds += time_delta;
            child.distance_mm += (orig.distance_mm - back.distance_mm).abs();
            child.street_mode = orig.street_mode;

            reversed = Arc::new(child);
            orig = back;
        }
        reversed
    }
}
