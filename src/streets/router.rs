//! The street router
//!
//! A throw-away A* calculator over a street layer: configure it, seed one or
//! more origins, optionally set a destination, call `route()`, then read the
//! resulting state cloud through the extraction methods. States are stored per
//! *edge* rather than per vertex so edge-to-edge turn costs and restrictions
//! stay correct; each edge keeps a small non-dominated set of states because
//! states mid-turn-restriction are incomparable.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;

use log::{debug, warn};

use crate::geo::{fixed_to_floating, MM_PER_FIXED_DEGREE_LAT};
use crate::request::{LegMode, ProfileRequest, StreetMode};

use super::edge_store::WALK_RELUCTANCE_FACTOR;
use super::split::Split;
use super::state::{RoutingVariable, State};
use super::turn_costs::TurnCostCalculator;
use super::turn_restrictions::RestrictionProgress;
use super::vertex_store::VertexFlag;
use super::visitor::{RoutingVisitor, StopVisitor, VertexFlagVisitor};
use super::{StreetLayer, LINK_RADIUS_METERS};

/// `to_vertex` value meaning "no single-target termination".
pub const ALL_VERTICES: i32 = -1;

/// Default cap for transit-stop searches.
pub const DEFAULT_MAX_TRANSIT_STOPS: usize = 40;

/// Default cap for vertex-flag searches.
pub const DEFAULT_MAX_VERTICES: usize = 20;

/// Heuristic speed ceiling when the request leaves the car speed unset
/// (130 km/h).
const UNSET_CAR_SPEED_M_S: f64 = 36.11;

pub struct StreetRouter<'a> {
    pub layer: &'a StreetLayer,

    /// Set individual properties here, or an entirely new request. Configure
    /// before seeding origins; the queue ordering snapshots the dominance
    /// variable at insertion.
    pub profile_request: ProfileRequest,

    /// Mode of transport used in this search. A router routes a single mode;
    /// multimodal trips chain routers.
    pub street_mode: StreetMode,

    /// Which routing variable drives both queue ordering and domination.
    pub dominance_variable: RoutingVariable,

    /// Prune states beyond this cumulative distance (0 = no limit).
    pub distance_limit_meters: i32,

    /// Prune states beyond this cumulative duration (0 = no limit).
    pub time_limit_seconds: i32,

    /// Harvest reached transit stops and stop once `max_transit_stops` are
    /// found (or the queue drains / a limit trips first).
    pub transit_stop_search: bool,
    pub max_transit_stops: usize,

    /// Harvest vertices carrying this flag (bike share, park-and-ride) and
    /// stop once `max_vertices` are found.
    pub flag_search: Option<VertexFlag>,
    pub max_vertices: usize,

    /// Direct the search toward this vertex and stop when it is settled.
    pub to_vertex: i32,

    /// The preceding router in a multi-leg search (drive to car parks, then
    /// walk to stops). A hint for path reconstruction in higher layers; the
    /// search itself never reads it.
    pub previous_router: Option<Box<StreetRouter<'a>>>,

    turn_cost_calculator: TurnCostCalculator,
    best_states_at_edge: HashMap<i32, Vec<Arc<State>>>,
    /// Seeds placed directly at vertices; they sit on no edge, so the
    /// per-edge index never sees them.
    vertex_origin_states: Vec<Arc<State>>,
    queue: BinaryHeap<QueueEntry>,
    queue_sequence: u64,
    visitor: VisitorSlot<'a>,
    origin_split: Option<Split>,
    destination_split: Option<Split>,
    /// Best known value of the dominance variable at the destination, for
    /// target pruning.
    best_value_at_destination: i32,
    /// Largest absolute origin latitude, for heuristic calibration.
    max_abs_origin_lat: i32,
    millimeters_per_fixed_degree_lon: f64,
    max_speed_seconds_per_mm: f64,
}

impl<'a> StreetRouter<'a> {
    pub fn new(layer: &'a StreetLayer) -> Self {
        Self {
            layer,
            profile_request: ProfileRequest::default(),
            street_mode: StreetMode::Walk,
            dominance_variable: RoutingVariable::Weight,
            distance_limit_meters: 0,
            time_limit_seconds: 0,
            transit_stop_search: false,
            max_transit_stops: DEFAULT_MAX_TRANSIT_STOPS,
            flag_search: None,
            max_vertices: DEFAULT_MAX_VERTICES,
            to_vertex: ALL_VERTICES,
            previous_router: None,
            turn_cost_calculator: TurnCostCalculator::new(true),
            best_states_at_edge: HashMap::new(),
            vertex_origin_states: Vec::new(),
            queue: BinaryHeap::new(),
            queue_sequence: 0,
            visitor: VisitorSlot::None,
            origin_split: None,
            destination_split: None,
            best_value_at_destination: i32::MAX,
            max_abs_origin_lat: i32::MIN,
            millimeters_per_fixed_degree_lon: 0.0,
            max_speed_seconds_per_mm: 0.0,
        }
    }

    /// Supply a visitor to track search progress or implement wall-clock
    /// cancellation. Replaced by the built-in visitor when a stop or flag
    /// search is configured.
    pub fn set_routing_visitor(&mut self, visitor: Box<dyn RoutingVisitor + 'a>) {
        self.visitor = VisitorSlot::Custom(visitor);
    }

    pub fn origin_split(&self) -> Option<Split> {
        self.origin_split
    }

    pub fn destination_split(&self) -> Option<Split> {
        self.destination_split
    }

    /// Seed the search from a geographic point by snapping it to the nearest
    /// edge that permits the configured mode. Two states are seeded, one per
    /// direction of the split edge, carrying the partial traversal from the
    /// snapped point to the respective end vertex. Returns `false` (and seeds
    /// nothing) when no street is within the link radius.
    pub fn set_origin(&mut self, lat: f64, lon: f64) -> bool {
        let Some(split) = self
            .layer
            .find_split(lat, lon, LINK_RADIUS_METERS, self.street_mode)
        else {
            warn!("No street was found near the specified origin point of {lat}, {lon}.");
            return false;
        };
        self.origin_split = Some(split);
        self.best_states_at_edge.clear();
        self.vertex_origin_states.clear();
        self.queue.clear();

        // The seeds sit at the ends of the two split-edge directions so that
        // turn restrictions and turn costs apply correctly at the origin.
        let mut start0 = State::new(split.vertex0, split.edge + 1, self.street_mode);
        let mut start1 = State::new(split.vertex1, split.edge, self.street_mode);

        let mut edge = self.layer.edge_store.cursor(split.edge);
        let forward_speed = edge.calculate_speed(&self.profile_request, self.street_mode);
        seed_partial_traversal(&mut start1, split.distance1_mm, forward_speed);
        edge.advance();
        // Speed can differ between the two directions.
        let backward_speed = edge.calculate_speed(&self.profile_request, self.street_mode);
        seed_partial_traversal(&mut start0, split.distance0_mm, backward_speed);

        if self.profile_request.reverse_search {
            start0.vertex = split.vertex1;
            start1.vertex = split.vertex0;
        }

        self.activate_seed_restrictions(&mut start0);
        self.activate_seed_restrictions(&mut start1);

        for seed in [start0, start1] {
            let seed = Arc::new(seed);
            self.best_states_at_edge
                .entry(seed.back_edge)
                .or_default()
                .push(Arc::clone(&seed));
            self.push_queue(seed);
        }
        self.max_abs_origin_lat = split.fixed_lat.abs();
        true
    }

    /// Seed the search from a single vertex.
    pub fn set_origin_vertex(&mut self, from_vertex: i32) {
        self.best_states_at_edge.clear();
        self.vertex_origin_states.clear();
        self.queue.clear();
        self.max_abs_origin_lat = self.layer.vertex_store.fixed_lat(from_vertex).abs();
        // A back edge of -1 marks an origin seeded at a vertex rather than via
        // an edge; it is kept out of the per-edge state index.
        let start = Arc::new(State::new(from_vertex, -1, self.street_mode));
        self.vertex_origin_states.push(Arc::clone(&start));
        self.push_queue(start);
    }

    /// Seed the search from the result cloud of a previous router, applying
    /// mode-switch penalties. Each entry is one origin; cumulative variables
    /// are inherited and `switch_cost` / `switch_time` added. `BicycleRent`
    /// marks the seeds as bike-share switches.
    pub fn set_origin_states(
        &mut self,
        previous_states: &HashMap<i32, Arc<State>>,
        switch_time_seconds: i32,
        switch_cost: i32,
        leg_mode: LegMode,
    ) {
        self.best_states_at_edge.clear();
        self.vertex_origin_states.clear();
        self.queue.clear();

        let mut max_lat = i32::MIN;
        // Sorted so repeated searches seed in a reproducible order.
        let mut entries: Vec<_> = previous_states.iter().collect();
        entries.sort_by_key(|(vertex, _)| **vertex);

        for (&vertex, previous) in entries {
            // The inherited back edge keeps seeds on distinct edges from
            // dominating each other only when they genuinely share an edge.
            let mut state = State::new(vertex, previous.back_edge, self.street_mode);
            state.weight = previous.weight + switch_cost;
            state.duration_seconds = previous.duration_seconds;
            state.increment_time_seconds(switch_time_seconds);
            state.distance_mm = previous.distance_mm;
            if leg_mode == LegMode::BicycleRent {
                state.is_bike_share = true;
            }
            if !self.is_dominated(&state) {
                let state = Arc::new(state);
                self.best_states_at_edge
                    .entry(state.back_edge)
                    .or_default()
                    .push(Arc::clone(&state));
                self.push_queue(state);
                max_lat = max_lat.max(self.layer.vertex_store.fixed_lat(vertex).abs());
            }
        }
        self.max_abs_origin_lat = max_lat;
    }

    /// Enable goal direction toward a geographic point. Returns `false` when
    /// the point cannot be snapped to the street network.
    pub fn set_destination(&mut self, lat: f64, lon: f64) -> bool {
        match self
            .layer
            .find_split(lat, lon, LINK_RADIUS_METERS, self.street_mode)
        {
            Some(split) => {
                self.destination_split = Some(split);
                true
            }
            None => {
                warn!("No street was found near the specified destination point of {lat}, {lon}.");
                false
            }
        }
    }

    /// Enable goal direction toward a pre-computed split.
    pub fn set_destination_split(&mut self, split: Split) {
        self.destination_split = Some(split);
    }

    /// Run the search. Call one of the origin setters first. The search ends
    /// when the queue drains, the target vertex is settled, no queued state
    /// can beat the best destination value, or the visitor breaks.
    pub fn route(&mut self) {
        let layer = self.layer;
        let variable = self.dominance_variable;
        let reverse = self.profile_request.reverse_search;

        // Precalculate the heuristic scale factors. The longitude scale uses
        // the cosine at the larger absolute latitude of origin and
        // destination; picking the higher latitude shrinks the x scale and
        // keeps the estimate an underestimate.
        if let Some(destination) = self.destination_split {
            let max_abs_lat_fixed = destination.fixed_lat.abs().max(self.max_abs_origin_lat);
            let max_abs_lat_radians = fixed_to_floating(max_abs_lat_fixed).to_radians();
            self.millimeters_per_fixed_degree_lon =
                MM_PER_FIXED_DEGREE_LAT * max_abs_lat_radians.cos();
            let mut max_speed_m_s = self.profile_request.speed(self.street_mode) as f64;
            if max_speed_m_s <= 0.0 {
                // Car speed is often left unset in the request.
                max_speed_m_s = UNSET_CAR_SPEED_M_S;
            }
            self.max_speed_seconds_per_mm = 1.0 / (max_speed_m_s * 1000.0);
        }

        let distance_limit_mm = if self.distance_limit_meters > 0 {
            if variable != RoutingVariable::DistanceMillimeters {
                warn!(
                    "Setting a distance limit when distance is not the dominance function, \
                     this is a resource limiting issue and paths may be incorrect."
                );
            }
            self.distance_limit_meters.saturating_mul(1000)
        } else {
            i32::MAX
        };
        let time_limit_seconds = if self.time_limit_seconds > 0 {
            if variable != RoutingVariable::DurationSeconds {
                warn!(
                    "Setting a time limit when time is not the dominance function, \
                     this is a resource limiting issue and paths may be incorrect."
                );
            }
            self.time_limit_seconds
        } else {
            i32::MAX
        };
        if self.time_limit_seconds > 0 && self.distance_limit_meters > 0 {
            warn!(
                "Both distance limit of {}m and time limit of {}s are set",
                self.distance_limit_meters, self.time_limit_seconds
            );
        } else if self.time_limit_seconds == 0 && self.distance_limit_meters == 0 {
            debug!(
                "Distance and time limit are both set to 0: the entire street graph \
                 reachable by the mode will be explored. This can be slow."
            );
        }

        if self.queue.is_empty() {
            warn!("Routing without first setting an origin, no search will happen.");
        }

        if self.transit_stop_search {
            self.visitor = VisitorSlot::Stop(StopVisitor::new(
                &layer.transit,
                variable,
                self.max_transit_stops,
                self.profile_request.min_time_limit(self.street_mode),
            ));
        } else if let Some(flag) = self.flag_search {
            self.visitor = VisitorSlot::Flag(VertexFlagVisitor::new(
                &layer.vertex_store,
                variable,
                flag,
                self.max_vertices,
                self.profile_request.min_time_limit(self.street_mode),
            ));
        }

        #[cfg(feature = "debug-dump")]
        let mut debug_dump = DebugDump::create();

        while let Some(entry) = self.queue.pop() {
            let s0 = entry.state;

            #[cfg(feature = "debug-dump")]
            if let Some(dump) = debug_dump.as_mut() {
                let (lat, lon) = layer.vertex_coordinates(s0.vertex);
                dump.record(lat, lon, s0.weight);
            }

            // A popped state may have been dominated by a later insertion on
            // the same edge; such zombies are detected by membership in the
            // per-edge non-dominated set. Origin states with no back edge are
            // never indexed there and skip the check.
            if s0.back_edge >= 0 && !self.contains_state(&s0) {
                continue;
            }

            // First settle of the target vertex is optimal.
            if self.to_vertex >= 0 && self.to_vertex == s0.vertex {
                break;
            }

            // Target pruning: nothing left in the queue can beat the best
            // known cost at the destination.
            if s0.routing_variable(variable) > self.best_value_at_destination {
                break;
            }

            self.visitor.visit_vertex(&s0);
            if self.visitor.should_break_search() {
                debug!("Routing visitor stopped the search");
                self.queue.clear();
                break;
            }

            // When the settled vertex is an endpoint of the destination split,
            // reconstruct the best state on the split edge itself (applying
            // the final turn cost and partial traversal) and tighten the
            // pruning bound.
            if let Some(destination) = self.destination_split {
                if s0.vertex == destination.vertex0 || s0.vertex == destination.vertex1 {
                    if let Some(at_destination) = self.get_state(&destination) {
                        let value = at_destination.routing_variable(variable);
                        if value < self.best_value_at_destination {
                            self.best_value_at_destination = value;
                        }
                    }
                }
            }

            let edge_list = if reverse {
                &layer.incoming_edges[s0.vertex as usize]
            } else {
                &layer.outgoing_edges[s0.vertex as usize]
            };
            for &edge_index in edge_list {
                let edge = layer.edge_store.cursor(edge_index);
                let Some(mut s1) = edge.traverse(
                    &s0,
                    self.street_mode,
                    &self.profile_request,
                    &self.turn_cost_calculator,
                    &layer.turn_restrictions,
                ) else {
                    continue;
                };
                if s1.distance_mm > distance_limit_mm || s1.duration_seconds >= time_limit_seconds
                {
                    continue;
                }
                if self.is_dominated(&s1) {
                    continue;
                }
                // The heuristic (a square root) is only computed for states
                // that are actually retained.
                s1.heuristic = self.calc_heuristic(&s1);
                let s1 = Arc::new(s1);
                self.best_states_at_edge
                    .entry(s1.back_edge)
                    .or_default()
                    .push(Arc::clone(&s1));
                self.push_queue(s1);
            }
        }
    }

    /// The best state at the end of an edge, even if it is mid-restriction.
    /// `None` when the edge was not reached.
    pub fn get_state_at_edge(&self, edge_index: i32) -> Option<Arc<State>> {
        let variable = self.dominance_variable;
        self.best_states_at_edge.get(&edge_index).and_then(|states| {
            states
                .iter()
                .min_by_key(|state| state.routing_variable(variable))
                .cloned()
        })
    }

    /// The best state at a vertex, minimized over its arriving edges. Not
    /// suitable for destination snapping: it ignores the turn cost onto the
    /// destination split edge; use `get_state` for that.
    pub fn get_state_at_vertex(&self, vertex: i32) -> Option<Arc<State>> {
        let variable = self.dominance_variable;
        let edge_list = if self.profile_request.reverse_search {
            &self.layer.outgoing_edges[vertex as usize]
        } else {
            &self.layer.incoming_edges[vertex as usize]
        };
        edge_list
            .iter()
            .filter_map(|&edge| self.get_state_at_edge(edge))
            .min_by_key(|state| state.routing_variable(variable))
    }

    pub fn travel_time_to_vertex(&self, vertex: i32) -> Option<i32> {
        self.get_state_at_vertex(vertex)
            .map(|state| state.duration_seconds)
    }

    /// The best state on a split edge, evaluating both directions: every
    /// admissible predecessor state on the adjacent edges is extended by the
    /// legality check, the turn cost onto the split edge and the partial
    /// traversal to the split point. `None` when neither direction is
    /// reachable (e.g. the split edge closes a turn restriction).
    pub fn get_state(&self, split: &Split) -> Option<Arc<State>> {
        let layer = self.layer;
        let variable = self.dominance_variable;
        let reverse = self.profile_request.reverse_search;
        let mut relevant_states: Vec<State> = Vec::new();

        let mut edge = layer.edge_store.cursor(split.edge);
        for side in 0..2 {
            let (end_vertex, partial_mm) = if side == 0 {
                (split.vertex0, split.distance0_mm)
            } else {
                edge.advance();
                (split.vertex1, split.distance1_mm)
            };
            let edge_list = if reverse {
                let other = if side == 0 { split.vertex1 } else { split.vertex0 };
                &layer.outgoing_edges[other as usize]
            } else {
                &layer.incoming_edges[end_vertex as usize]
            };
            for &edge_index in edge_list {
                let Some(states) = self.best_states_at_edge.get(&edge_index) else {
                    continue;
                };
                for state in states {
                    if !edge.can_turn_from(state, reverse, &layer.turn_restrictions) {
                        continue;
                    }
                    let speed = edge.calculate_speed(&self.profile_request, state.street_mode);
                    if speed <= 0.0 {
                        continue;
                    }
                    let turn_cost = if state.back_edge >= 0 {
                        self.turn_cost_calculator.compute_turn_cost(
                            &layer.edge_store,
                            state.back_edge,
                            edge.index(),
                            state.street_mode,
                        )
                    } else {
                        0
                    };
                    let traversal_cost =
                        ((partial_mm as f64 / 1000.0) / speed as f64).round() as i32;
                    let mut at_split = State::step(state, -1, edge.index());
                    at_split.distance_mm += partial_mm;
                    at_split.increment_weight(turn_cost + traversal_cost);
                    at_split.increment_time_seconds(turn_cost + traversal_cost);
                    relevant_states.push(at_split);
                }
            }
        }

        relevant_states
            .into_iter()
            .min_by_key(|state| state.routing_variable(variable))
            .map(Arc::new)
    }

    /// Snap a point and return the best state on the resulting split.
    pub fn get_state_at_point(&self, lat: f64, lon: f64) -> Option<Arc<State>> {
        let split = self
            .layer
            .find_split(lat, lon, LINK_RADIUS_METERS, self.street_mode)?;
        self.get_state(&split)
    }

    /// Transit stops reached by the search, as stop index → cost under the
    /// active dominance variable. Uses the live stop visitor when one ran,
    /// otherwise sweeps the state cloud.
    pub fn get_reached_stops(&self) -> HashMap<i32, i32> {
        if self.transit_stop_search {
            if let VisitorSlot::Stop(visitor) = &self.visitor {
                return visitor.stops().clone();
            }
        }
        let variable = self.dominance_variable;
        let mut result = HashMap::new();
        for (street_vertex, stop) in self.layer.transit.linked_stops() {
            if let Some(state) = self.get_state_at_vertex(street_vertex) {
                result.insert(stop, state.routing_variable(variable));
            }
        }
        result
    }

    /// All reached vertices with their cost under the dominance variable.
    pub fn get_reached_vertices(&self) -> HashMap<i32, i32> {
        let variable = self.dominance_variable;
        let mut result: HashMap<i32, i32> = HashMap::new();
        for seed in &self.vertex_origin_states {
            result.insert(seed.vertex, seed.routing_variable(variable));
        }
        for (&edge_index, states) in &self.best_states_at_edge {
            if edge_index < 0 {
                continue;
            }
            let Some(best) = states
                .iter()
                .min_by_key(|state| state.routing_variable(variable))
            else {
                continue;
            };
            let value = best.routing_variable(variable);
            result
                .entry(best.vertex)
                .and_modify(|existing| {
                    if *existing > value {
                        *existing = value;
                    }
                })
                .or_insert(value);
        }
        result
    }

    /// Reached vertices carrying `flag`, with the best state reaching each.
    /// Uses the live flag visitor when one ran for the same flag.
    pub fn get_reached_vertices_with_flag(&self, flag: VertexFlag) -> HashMap<i32, Arc<State>> {
        if self.flag_search == Some(flag) {
            if let VisitorSlot::Flag(visitor) = &self.visitor {
                return visitor.vertices().clone();
            }
        }
        let variable = self.dominance_variable;
        let mut result: HashMap<i32, Arc<State>> = HashMap::new();
        for (&edge_index, states) in &self.best_states_at_edge {
            if edge_index < 0 {
                continue;
            }
            let Some(best) = states
                .iter()
                .min_by_key(|state| state.routing_variable(variable))
            else {
                continue;
            };
            if best.vertex < 0 || !self.layer.vertex_store.has_flag(best.vertex, flag) {
                continue;
            }
            match result.get(&best.vertex) {
                Some(existing)
                    if existing.routing_variable(variable)
                        <= best.routing_variable(variable) => {}
                _ => {
                    result.insert(best.vertex, Arc::clone(best));
                }
            }
        }
        result
    }

    fn push_queue(&mut self, state: Arc<State>) {
        let priority = state.routing_variable(self.dominance_variable) + state.heuristic;
        self.queue_sequence += 1;
        self.queue.push(QueueEntry {
            priority,
            sequence: self.queue_sequence,
            state,
        });
    }

    fn contains_state(&self, state: &Arc<State>) -> bool {
        self.best_states_at_edge
            .get(&state.back_edge)
            .is_some_and(|states| states.iter().any(|other| Arc::ptr_eq(other, state)))
    }

    /// Whether any retained state on the same edge dominates `new_state`.
    /// Side effect: evicts retained states the newcomer dominates.
    fn is_dominated(&mut self, new_state: &State) -> bool {
        let variable = self.dominance_variable;
        let Some(states) = self.best_states_at_edge.get_mut(&new_state.back_edge) else {
            return false;
        };
        // Existing states win ties, so they are checked first.
        if states
            .iter()
            .any(|existing| dominates(existing, new_state, variable))
        {
            return true;
        }
        states.retain(|existing| !dominates(new_state, existing, variable));
        false
    }

    /// Underestimate of the remaining cost to the destination in units of the
    /// dominance variable. Zero without a destination (plain Dijkstra).
    fn calc_heuristic(&self, state: &State) -> i32 {
        let Some(destination) = self.destination_split else {
            return 0;
        };
        let delta_lat_fixed =
            (destination.fixed_lat - self.layer.vertex_store.fixed_lat(state.vertex)) as f64;
        let delta_lon_fixed =
            (destination.fixed_lon - self.layer.vertex_store.fixed_lon(state.vertex)) as f64;
        let millimeters_x = self.millimeters_per_fixed_degree_lon * delta_lon_fixed;
        let millimeters_y = MM_PER_FIXED_DEGREE_LAT * delta_lat_fixed;
        let distance_millimeters =
            (millimeters_x * millimeters_x + millimeters_y * millimeters_y).sqrt();
        let mut estimate = distance_millimeters;
        if self.dominance_variable != RoutingVariable::DistanceMillimeters {
            // Straight-line time at the fastest possible speed; weight is
            // always at least time.
            estimate *= self.max_speed_seconds_per_mm;
        }
        if self.dominance_variable == RoutingVariable::Weight
            && self.street_mode == StreetMode::Walk
        {
            estimate *= WALK_RELUCTANCE_FACTOR;
        }
        estimate as i32
    }

    fn activate_seed_restrictions(&self, seed: &mut State) {
        let mut progress = RestrictionProgress::new();
        self.layer.turn_restrictions.begin_restrictions(
            &mut progress,
            seed.back_edge,
            self.profile_request.reverse_search,
        );
        if !progress.is_empty() {
            seed.turn_restrictions = Some(progress);
        }
    }
}

/// `true` if `s1` is better than *or equal to* `s2` on the dominance variable.
/// States mid-turn-restriction are incomparable, except that states with
/// exactly the same restriction progress dominate one another; without that
/// exception adjacent restrictions can keep spawning states forever.
fn dominates(s1: &State, s2: &State, variable: RoutingVariable) -> bool {
    match (&s1.turn_restrictions, &s2.turn_restrictions) {
        (None, None) => s1.routing_variable(variable) <= s2.routing_variable(variable),
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn seed_partial_traversal(state: &mut State, partial_mm: i32, speed_m_s: f32) {
    state.distance_mm = partial_mm;
    if speed_m_s > 0.0 {
        let seconds = ((partial_mm as f64 / 1000.0) / speed_m_s as f64).round() as i32;
        state.weight = seconds;
        state.increment_time_seconds(seconds);
    }
}

struct QueueEntry {
    priority: i32,
    sequence: u64,
    state: Arc<State>,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.sequence == other.sequence
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Inverted so the std max-heap pops the smallest priority; ties go to
        // the earliest insertion.
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

enum VisitorSlot<'a> {
    None,
    Stop(StopVisitor<'a>),
    Flag(VertexFlagVisitor<'a>),
    Custom(Box<dyn RoutingVisitor + 'a>),
}

impl VisitorSlot<'_> {
    fn visit_vertex(&mut self, state: &Arc<State>) {
        match self {
            VisitorSlot::None => {}
            VisitorSlot::Stop(visitor) => visitor.visit_vertex(state),
            VisitorSlot::Flag(visitor) => visitor.visit_vertex(state),
            VisitorSlot::Custom(visitor) => visitor.visit_vertex(state),
        }
    }

    fn should_break_search(&self) -> bool {
        match self {
            VisitorSlot::None => false,
            VisitorSlot::Stop(visitor) => visitor.should_break_search(),
            VisitorSlot::Flag(visitor) => visitor.should_break_search(),
            VisitorSlot::Custom(visitor) => visitor.should_break_search(),
        }
    }
}

#[cfg(feature = "debug-dump")]
struct DebugDump {
    writer: std::io::BufWriter<std::fs::File>,
}

#[cfg(feature = "debug-dump")]
impl DebugDump {
    fn create() -> Option<Self> {
        use std::io::Write;
        match std::fs::File::create("street-router-debug.csv") {
            Ok(file) => {
                let mut writer = std::io::BufWriter::new(file);
                let _ = writeln!(writer, "lat,lon,weight");
                Some(Self { writer })
            }
            Err(err) => {
                warn!("Could not open street-router-debug.csv: {err}");
                None
            }
        }
    }

    fn record(&mut self, lat: f64, lon: f64, weight: i32) {
        use std::io::Write;
        let _ = writeln!(self.writer, "{lat:.6},{lon:.6},{weight}");
    }
}
