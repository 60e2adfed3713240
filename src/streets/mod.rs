//! The street layer: everything the router reads
//!
//! Columnar vertex and edge stores, per-vertex adjacency in both directions,
//! the turn-restriction table, the transit stop mapping and a spatial index
//! for snapping. Built once upstream, read-only and shareable across threads
//! during routing.

pub mod edge_store;
pub mod router;
pub mod split;
pub mod state;
pub mod turn_costs;
pub mod turn_restrictions;
pub mod vertex_store;
pub mod visitor;

use kingfisher_common::{Error, Result};
use log::warn;

use crate::geo::{fixed_to_floating, floating_to_fixed, haversine_distance};
use crate::request::StreetMode;
use crate::transit::TransitLayer;

use edge_store::EdgeStore;
use split::{build_segment_index, SegmentIndex, Split};
use turn_restrictions::{TurnRestriction, TurnRestrictionTable};
use vertex_store::{VertexFlag, VertexStore};

/// How far away from a point we are willing to snap to an edge, meters.
pub const LINK_RADIUS_METERS: f64 = 300.0;

/// Description of one street segment to add as an edge pair.
#[derive(Debug, Clone)]
pub struct EdgeSpec {
    pub from_vertex: i32,
    pub to_vertex: i32,
    /// Length in millimeters; derived from the geometry when absent.
    pub length_mm: Option<i32>,
    pub forward_flags: u32,
    pub backward_flags: u32,
    /// Stored car speeds per direction, mm/s (0 = fall back to the request).
    pub forward_car_speed_mm_s: u32,
    pub backward_car_speed_mm_s: u32,
    /// Optional interior geometry points in floating degrees (lat, lon); the
    /// endpoint vertices are prepended/appended automatically.
    pub intermediate_points: Vec<(f64, f64)>,
}

impl EdgeSpec {
    pub fn new(from_vertex: i32, to_vertex: i32) -> Self {
        Self {
            from_vertex,
            to_vertex,
            length_mm: None,
            forward_flags: 0,
            backward_flags: 0,
            forward_car_speed_mm_s: 0,
            backward_car_speed_mm_s: 0,
            intermediate_points: Vec::new(),
        }
    }
}

#[derive(Default)]
pub struct StreetLayer {
    pub vertex_store: VertexStore,
    pub edge_store: EdgeStore,
    /// Directed edges leaving each vertex.
    pub outgoing_edges: Vec<Vec<i32>>,
    /// Directed edges arriving at each vertex.
    pub incoming_edges: Vec<Vec<i32>>,
    pub turn_restrictions: TurnRestrictionTable,
    pub transit: TransitLayer,
    spatial_index: Option<SegmentIndex>,
}

impl std::fmt::Debug for StreetLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "StreetLayer with {} vertices, {} directed edges, {} turn restrictions",
            self.vertex_count(),
            self.edge_count(),
            self.turn_restrictions.len()
        )
    }
}

impl StreetLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_store.vertex_count()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_store.edge_count()
    }

    pub fn add_vertex(&mut self, lat: f64, lon: f64) -> i32 {
        let vertex = self.vertex_store.add_vertex(lat, lon);
        self.outgoing_edges.push(Vec::new());
        self.incoming_edges.push(Vec::new());
        vertex
    }

    pub fn set_vertex_flag(&mut self, vertex: i32, flag: VertexFlag) -> Result<()> {
        self.check_vertex(vertex)?;
        self.vertex_store.set_flag(vertex, flag);
        Ok(())
    }

    /// Add a pair of directed edges, returning the forward index. The back
    /// index is the forward index + 1.
    pub fn add_edge_pair(&mut self, spec: EdgeSpec) -> Result<i32> {
        self.check_vertex(spec.from_vertex)?;
        self.check_vertex(spec.to_vertex)?;

        let mut geometry = Vec::with_capacity(spec.intermediate_points.len() + 2);
        geometry.push((
            self.vertex_store.fixed_lat(spec.from_vertex),
            self.vertex_store.fixed_lon(spec.from_vertex),
        ));
        geometry.extend(
            spec.intermediate_points
                .iter()
                .map(|&(lat, lon)| (floating_to_fixed(lat), floating_to_fixed(lon))),
        );
        geometry.push((
            self.vertex_store.fixed_lat(spec.to_vertex),
            self.vertex_store.fixed_lon(spec.to_vertex),
        ));

        let length_mm = match spec.length_mm {
            Some(length) if length >= 0 => length,
            Some(length) => {
                return Err(Error::InvalidInput(format!(
                    "negative edge length {length} mm"
                )))
            }
            None => geometry_length_mm(&geometry),
        };

        let forward = self.edge_store.add_edge_pair(
            spec.from_vertex,
            spec.to_vertex,
            length_mm,
            spec.forward_flags,
            spec.backward_flags,
            spec.forward_car_speed_mm_s,
            spec.backward_car_speed_mm_s,
            geometry,
        );
        let backward = forward + 1;
        self.outgoing_edges[spec.from_vertex as usize].push(forward);
        self.incoming_edges[spec.to_vertex as usize].push(forward);
        self.outgoing_edges[spec.to_vertex as usize].push(backward);
        self.incoming_edges[spec.from_vertex as usize].push(backward);

        // New geometry invalidates the snapping index.
        self.spatial_index = None;
        Ok(forward)
    }

    pub fn add_turn_restriction(&mut self, restriction: TurnRestriction) -> Result<i32> {
        self.check_edge(restriction.from_edge)?;
        self.check_edge(restriction.to_edge)?;
        for &via in &restriction.via_edges {
            self.check_edge(via)?;
        }
        // The sequence must be traversable: each edge ends where the next
        // begins.
        let mut sequence = Vec::with_capacity(restriction.via_edges.len() + 2);
        sequence.push(restriction.from_edge);
        sequence.extend_from_slice(&restriction.via_edges);
        sequence.push(restriction.to_edge);
        for window in sequence.windows(2) {
            let head = self.edge_store.cursor(window[0]).to_vertex();
            let tail = self.edge_store.cursor(window[1]).from_vertex();
            if head != tail {
                return Err(Error::GraphDefect(format!(
                    "turn restriction sequence breaks between edges {} and {}: \
                     {} != {}",
                    window[0], window[1], head, tail
                )));
            }
        }
        Ok(self.turn_restrictions.add(restriction))
    }

    /// Register a transit stop at a street vertex.
    pub fn link_transit_stop(&mut self, vertex: i32) -> Result<i32> {
        self.check_vertex(vertex)?;
        Ok(self.transit.add_stop(vertex))
    }

    /// (Re)build the segment R-tree used by `find_split`. Call after the last
    /// mutation; routing itself never needs it for vertex origins.
    pub fn build_spatial_index(&mut self) {
        self.spatial_index = Some(build_segment_index(&self.edge_store));
    }

    /// Snap a point to the closest linkable edge permitting `mode` within
    /// `radius_meters`. `None` if nothing is near enough.
    pub fn find_split(
        &self,
        lat: f64,
        lon: f64,
        radius_meters: f64,
        mode: StreetMode,
    ) -> Option<Split> {
        let Some(index) = self.spatial_index.as_ref() else {
            warn!("find_split called before build_spatial_index; no snapping possible");
            return None;
        };
        Split::find(lat, lon, radius_meters, mode, &self.edge_store, index)
    }

    /// Floating-degree coordinates of a vertex.
    pub fn vertex_coordinates(&self, vertex: i32) -> (f64, f64) {
        (
            fixed_to_floating(self.vertex_store.fixed_lat(vertex)),
            fixed_to_floating(self.vertex_store.fixed_lon(vertex)),
        )
    }

    fn check_vertex(&self, vertex: i32) -> Result<()> {
        if vertex < 0 || vertex as usize >= self.vertex_count() {
            return Err(Error::InvalidInput(format!(
                "vertex {vertex} out of range (0..{})",
                self.vertex_count()
            )));
        }
        Ok(())
    }

    fn check_edge(&self, edge: i32) -> Result<()> {
        if edge < 0 || edge as usize >= self.edge_count() {
            return Err(Error::InvalidInput(format!(
                "edge {edge} out of range (0..{})",
                self.edge_count()
            )));
        }
        Ok(())
    }
}

fn geometry_length_mm(geometry: &[(i32, i32)]) -> i32 {
    let mut meters = 0.0;
    for window in geometry.windows(2) {
        let (lat0, lon0) = window[0];
        let (lat1, lon1) = window[1];
        meters += haversine_distance(
            fixed_to_floating(lat0),
            fixed_to_floating(lon0),
            fixed_to_floating(lat1),
            fixed_to_floating(lon1),
        );
    }
    (meters * 1000.0).round() as i32
}
