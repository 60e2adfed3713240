//! Snapping geographic points onto edges
//!
//! A split is the perpendicular projection of a point onto the nearest
//! linkable edge that permits the requested mode, yielding the two candidate
//! endpoint vertices and the partial distances to each. Candidate edges come
//! from an R-tree over edge segments in floating [lon, lat] space; the exact
//! projection runs in fixed-degree space with longitude scaled by the cosine
//! of the latitude, the same plane the A* heuristic uses.

use rstar::primitives::{GeomWithData, Line};
use rstar::RTree;

use crate::geo::{FIXED_FACTOR, MM_PER_FIXED_DEGREE_LAT};
use crate::request::StreetMode;

use super::edge_store::{EdgeFlag, EdgeStore};

/// Meters spanned by one degree of latitude.
const METERS_PER_DEGREE_LAT: f64 = MM_PER_FIXED_DEGREE_LAT * FIXED_FACTOR / 1000.0;

/// Segment R-tree: line in [lon, lat] degrees, data = (forward edge index,
/// segment index within the geometry).
pub(crate) type SegmentIndex = RTree<GeomWithData<Line<[f64; 2]>, (i32, usize)>>;

pub(crate) fn build_segment_index(edge_store: &EdgeStore) -> SegmentIndex {
    let mut segments = Vec::new();
    let mut edge = edge_store.cursor(0);
    for pair in 0..edge_store.edge_count() as i32 / 2 {
        edge.seek(pair * 2);
        let geometry = edge.geometry();
        for (segment, window) in geometry.windows(2).enumerate() {
            let [(lat0, lon0), (lat1, lon1)] = [window[0], window[1]];
            segments.push(GeomWithData::new(
                Line::new(
                    [lon0 as f64 / FIXED_FACTOR, lat0 as f64 / FIXED_FACTOR],
                    [lon1 as f64 / FIXED_FACTOR, lat1 as f64 / FIXED_FACTOR],
                ),
                (pair * 2, segment),
            ));
        }
    }
    RTree::bulk_load(segments)
}

/// Projection of a point onto an edge pair. `edge` is always the forward
/// member of the pair; the back edge is `edge + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split {
    pub edge: i32,
    /// From-vertex of the forward edge.
    pub vertex0: i32,
    /// To-vertex of the forward edge.
    pub vertex1: i32,
    /// Millimeters from `vertex0` to the split point along the geometry.
    pub distance0_mm: i32,
    /// Millimeters from the split point to `vertex1` along the geometry.
    pub distance1_mm: i32,
    /// Fixed-point coordinates of the snapped point.
    pub fixed_lat: i32,
    pub fixed_lon: i32,
}

impl Split {
    /// Snap a point to the closest linkable, mode-permitting edge within
    /// `radius_meters`. `None` when no such edge is near enough.
    pub fn find(
        lat: f64,
        lon: f64,
        radius_meters: f64,
        mode: StreetMode,
        edge_store: &EdgeStore,
        index: &SegmentIndex,
    ) -> Option<Split> {
        let cos_lat = lat.to_radians().cos().max(0.01);
        // Conservative degree radius: one lon degree is the shortest, so this
        // bound is a superset of the metric circle.
        let radius_degrees = radius_meters / (METERS_PER_DEGREE_LAT * cos_lat);
        let radius_mm = radius_meters * 1000.0;

        // Query point in scaled fixed space: x = fixed lon × cos(lat), y = fixed lat.
        let px = lon * FIXED_FACTOR * cos_lat;
        let py = lat * FIXED_FACTOR;

        let mut best: Option<Candidate> = None;
        for segment in index.locate_within_distance([lon, lat], radius_degrees * radius_degrees) {
            let (edge_index, segment_index) = segment.data;
            let edge = edge_store.cursor(edge_index);
            if !edge.flag(EdgeFlag::Linkable) || !edge.allows_street_mode(mode) {
                continue;
            }

            let line = segment.geom();
            let (ax, ay) = (line.from[0] * FIXED_FACTOR * cos_lat, line.from[1] * FIXED_FACTOR);
            let (bx, by) = (line.to[0] * FIXED_FACTOR * cos_lat, line.to[1] * FIXED_FACTOR);
            let (dx, dy) = (bx - ax, by - ay);
            let length_squared = dx * dx + dy * dy;
            let t = if length_squared > 0.0 {
                (((px - ax) * dx + (py - ay) * dy) / length_squared).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let (cx, cy) = (ax + t * dx, ay + t * dy);
            let perpendicular_mm = ((px - cx).hypot(py - cy)) * MM_PER_FIXED_DEGREE_LAT;

            let replace = match &best {
                None => perpendicular_mm <= radius_mm,
                Some(current) => {
                    perpendicular_mm < current.perpendicular_mm
                        || (perpendicular_mm == current.perpendicular_mm
                            && (edge_index, segment_index)
                                < (current.edge_index, current.segment_index))
                }
            };
            if replace {
                best = Some(Candidate {
                    edge_index,
                    segment_index,
                    t,
                    perpendicular_mm,
                    fixed_lat: cy.round() as i32,
                    fixed_lon: (cx / cos_lat).round() as i32,
                });
            }
        }

        let candidate = best?;
        let edge = edge_store.cursor(candidate.edge_index);
        let geometry = edge.geometry();

        // Distance along the geometry to the split point, then rescaled so the
        // two partial distances always sum to the stored edge length.
        let mut along = 0.0;
        let mut total = 0.0;
        for (segment, window) in geometry.windows(2).enumerate() {
            let length = scaled_length_mm(window[0], window[1], cos_lat);
            if segment < candidate.segment_index {
                along += length;
            } else if segment == candidate.segment_index {
                along += length * candidate.t;
            }
            total += length;
        }
        let fraction = if total > 0.0 { along / total } else { 0.0 };
        let distance0_mm = (fraction * edge.length_mm() as f64).round() as i32;

        Some(Split {
            edge: candidate.edge_index,
            vertex0: edge.from_vertex(),
            vertex1: edge.to_vertex(),
            distance0_mm,
            distance1_mm: edge.length_mm() - distance0_mm,
            fixed_lat: candidate.fixed_lat,
            fixed_lon: candidate.fixed_lon,
        })
    }
}

struct Candidate {
    edge_index: i32,
    segment_index: usize,
    t: f64,
    perpendicular_mm: f64,
    fixed_lat: i32,
    fixed_lon: i32,
}

fn scaled_length_mm(a: (i32, i32), b: (i32, i32), cos_lat: f64) -> f64 {
    let dy = (b.0 - a.0) as f64;
    let dx = (b.1 - a.1) as f64 * cos_lat;
    dx.hypot(dy) * MM_PER_FIXED_DEGREE_LAT
}
