//! Columnar directed-edge table
//!
//! Edges come in pairs: index `2k` is the forward direction of an underlying
//! street segment, `2k + 1` the back direction; flipping is `index ^ 1`.
//! Geometry and length are shared per pair, flags and car speed are stored per
//! direction. Reads go through a seekable cursor.

use std::sync::Arc;

use crate::geo::bearing_degrees;
use crate::request::{ProfileRequest, StreetMode};

use super::state::State;
use super::turn_costs::TurnCostCalculator;
use super::turn_restrictions::TurnRestrictionTable;

/// Weight multiplier applied to walking time when the generalized cost is the
/// dominance variable. Walking a minute is worth two minutes of riding.
pub const WALK_RELUCTANCE_FACTOR: f64 = 2.0;

/// Per-direction edge flags: traversal permissions plus way-type labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EdgeFlag {
    AllowsPedestrian = 0,
    AllowsBike = 1,
    AllowsCar = 2,
    Stairs = 3,
    /// Eligible as a snapping target for origins, destinations and
    /// park-and-ride linking.
    Linkable = 4,
    BikePath = 5,
    Sidewalk = 6,
    Crossing = 7,
    Roundabout = 8,
    Platform = 9,
}

impl EdgeFlag {
    #[inline]
    pub fn mask(self) -> u32 {
        1 << (self as u32)
    }
}

/// The permission flag a mode needs to traverse an edge.
#[inline]
pub fn permission_flag(mode: StreetMode) -> EdgeFlag {
    match mode {
        StreetMode::Walk => EdgeFlag::AllowsPedestrian,
        StreetMode::Bicycle => EdgeFlag::AllowsBike,
        StreetMode::Car => EdgeFlag::AllowsCar,
    }
}

/// Combine flags into a bitset.
pub fn flag_set(flags: &[EdgeFlag]) -> u32 {
    flags.iter().fold(0, |bits, flag| bits | flag.mask())
}

#[derive(Debug, Default)]
pub struct EdgeStore {
    // Per pair:
    from_vertices: Vec<i32>,
    to_vertices: Vec<i32>,
    lengths_mm: Vec<i32>,
    /// Fixed-point (lat, lon) polyline, endpoints included, oriented forward.
    geometries: Vec<Vec<(i32, i32)>>,
    // Per directed edge:
    flags: Vec<u32>,
    car_speeds_mm_s: Vec<u32>,
}

impl EdgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of directed edges (always even).
    pub fn edge_count(&self) -> usize {
        self.flags.len()
    }

    /// Append a pair of directed edges, returning the forward index.
    #[allow(clippy::too_many_arguments)]
    pub fn add_edge_pair(
        &mut self,
        from_vertex: i32,
        to_vertex: i32,
        length_mm: i32,
        forward_flags: u32,
        backward_flags: u32,
        forward_speed_mm_s: u32,
        backward_speed_mm_s: u32,
        geometry: Vec<(i32, i32)>,
    ) -> i32 {
        let forward_index = self.flags.len() as i32;
        self.from_vertices.push(from_vertex);
        self.to_vertices.push(to_vertex);
        self.lengths_mm.push(length_mm);
        self.geometries.push(geometry);
        self.flags.push(forward_flags);
        self.flags.push(backward_flags);
        self.car_speeds_mm_s.push(forward_speed_mm_s);
        self.car_speeds_mm_s.push(backward_speed_mm_s);
        forward_index
    }

    /// Cursor positioned at `index`.
    pub fn cursor(&self, index: i32) -> Edge<'_> {
        Edge { store: self, index }
    }
}

/// Seekable cursor over the edge columns. All accessors are direction-aware:
/// positioned on a back edge, `from_vertex`/`to_vertex`/bearings read the
/// geometry against its stored orientation.
pub struct Edge<'a> {
    store: &'a EdgeStore,
    index: i32,
}

impl<'a> Edge<'a> {
    pub fn seek(&mut self, index: i32) {
        self.index = index;
    }

    /// Move from a forward edge to its back edge. Only defined when positioned
    /// on the even index of a pair.
    pub fn advance(&mut self) {
        debug_assert!(self.index % 2 == 0, "advance() from a back edge");
        self.index += 1;
    }

    #[inline]
    pub fn index(&self) -> i32 {
        self.index
    }

    #[inline]
    fn pair_index(&self) -> usize {
        (self.index / 2) as usize
    }

    #[inline]
    pub fn is_backward(&self) -> bool {
        self.index & 1 == 1
    }

    #[inline]
    pub fn from_vertex(&self) -> i32 {
        if self.is_backward() {
            self.store.to_vertices[self.pair_index()]
        } else {
            self.store.from_vertices[self.pair_index()]
        }
    }

    #[inline]
    pub fn to_vertex(&self) -> i32 {
        if self.is_backward() {
            self.store.from_vertices[self.pair_index()]
        } else {
            self.store.to_vertices[self.pair_index()]
        }
    }

    #[inline]
    pub fn length_mm(&self) -> i32 {
        self.store.lengths_mm[self.pair_index()]
    }

    /// Fixed-point polyline of the pair, oriented forward.
    #[inline]
    pub fn geometry(&self) -> &'a [(i32, i32)] {
        &self.store.geometries[self.pair_index()]
    }

    #[inline]
    pub fn flag(&self, flag: EdgeFlag) -> bool {
        self.store.flags[self.index as usize] & flag.mask() != 0
    }

    #[inline]
    pub fn allows_street_mode(&self, mode: StreetMode) -> bool {
        self.flag(permission_flag(mode))
    }

    #[inline]
    pub fn car_speed_mm_s(&self) -> u32 {
        self.store.car_speeds_mm_s[self.index as usize]
    }

    /// Travel speed in meters per second for a mode. Walking and cycling come
    /// from the request; driving uses the per-direction stored speed with the
    /// request speed as fallback.
    pub fn calculate_speed(&self, request: &ProfileRequest, mode: StreetMode) -> f32 {
        match mode {
            StreetMode::Walk => request.walk_speed_m_s,
            StreetMode::Bicycle => request.bike_speed_m_s,
            StreetMode::Car => {
                let stored = self.car_speed_mm_s();
                if stored > 0 {
                    stored as f32 / 1000.0
                } else {
                    request.car_speed_m_s
                }
            }
        }
    }

    /// Bearing of the final geometry segment in traversal direction, degrees
    /// clockwise from north.
    pub fn in_angle_degrees(&self) -> f64 {
        let geometry = self.geometry();
        let n = geometry.len();
        if self.is_backward() {
            bearing_degrees(geometry[1], geometry[0])
        } else {
            bearing_degrees(geometry[n - 2], geometry[n - 1])
        }
    }

    /// Bearing of the first geometry segment in traversal direction.
    pub fn out_angle_degrees(&self) -> f64 {
        let geometry = self.geometry();
        let n = geometry.len();
        if self.is_backward() {
            bearing_degrees(geometry[n - 1], geometry[n - 2])
        } else {
            bearing_degrees(geometry[0], geometry[1])
        }
    }

    /// Whether a state may continue from its current restriction progress onto
    /// this edge. Used when reconstructing destination-side states on a split
    /// edge without enqueuing them.
    pub fn can_turn_from(
        &self,
        previous: &State,
        reverse: bool,
        restrictions: &TurnRestrictionTable,
    ) -> bool {
        restrictions.permits_turn(previous.turn_restrictions.as_ref(), self.index, reverse)
    }

    /// The per-edge search step: permission check, travel time from length and
    /// mode speed, walk reluctance on the weight, turn cost from the
    /// predecessor's back edge, and turn-restriction bookkeeping. Returns
    /// `None` when the edge cannot be traversed from this state.
    pub fn traverse(
        &self,
        s0: &Arc<State>,
        mode: StreetMode,
        request: &ProfileRequest,
        turn_costs: &TurnCostCalculator,
        restrictions: &TurnRestrictionTable,
    ) -> Option<State> {
        let reverse = request.reverse_search;
        if !self.allows_street_mode(mode) {
            return None;
        }
        if !self.can_turn_from(s0, reverse, restrictions) {
            return None;
        }
        let speed_m_s = self.calculate_speed(request, mode);
        if speed_m_s <= 0.0 {
            return None;
        }

        let time_seconds = (self.length_mm() as f64 / 1000.0) / speed_m_s as f64;
        let mut weight = time_seconds;
        if mode == StreetMode::Walk {
            weight *= WALK_RELUCTANCE_FACTOR;
        }
        let turn_cost = if s0.back_edge >= 0 {
            turn_costs.compute_turn_cost(self.store, s0.back_edge, self.index, mode)
        } else {
            0
        };

        let vertex = if reverse {
            self.from_vertex()
        } else {
            self.to_vertex()
        };
        let mut s1 = State::step(s0, vertex, self.index);
        s1.street_mode = mode;
        s1.distance_mm += self.length_mm();
        s1.increment_time_seconds(time_seconds.round() as i32 + turn_cost);
        s1.increment_weight(weight.round() as i32 + turn_cost);
        s1.turn_restrictions =
            restrictions.advance_progress(s0.turn_restrictions.as_ref(), self.index, reverse);
        Some(s1)
    }
}
