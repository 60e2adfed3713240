//! Transit stop ↔ street vertex mapping
//!
//! The street router only needs to know which street vertices carry a transit
//! stop; timetable routing lives elsewhere.

use std::collections::HashMap;

/// Sentinel for "no stop at this vertex" / "stop not linked to the street".
pub const NO_STOP: i32 = -1;

#[derive(Debug, Default)]
pub struct TransitLayer {
    /// Street vertex index → stop index.
    stop_for_street_vertex: HashMap<i32, i32>,
    /// Stop index → street vertex index (or `NO_STOP` when unlinked).
    street_vertex_for_stop: Vec<i32>,
}

impl TransitLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stop at a street vertex, returning the new stop index.
    pub fn add_stop(&mut self, street_vertex: i32) -> i32 {
        let stop = self.street_vertex_for_stop.len() as i32;
        self.street_vertex_for_stop.push(street_vertex);
        if street_vertex >= 0 {
            self.stop_for_street_vertex.insert(street_vertex, stop);
        }
        stop
    }

    #[inline]
    pub fn stop_at_street_vertex(&self, street_vertex: i32) -> Option<i32> {
        self.stop_for_street_vertex.get(&street_vertex).copied()
    }

    #[inline]
    pub fn street_vertex_for_stop(&self, stop: i32) -> i32 {
        self.street_vertex_for_stop
            .get(stop as usize)
            .copied()
            .unwrap_or(NO_STOP)
    }

    pub fn stop_count(&self) -> usize {
        self.street_vertex_for_stop.len()
    }

    /// Iterate (street vertex, stop) pairs for all linked stops.
    pub fn linked_stops(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.stop_for_street_vertex.iter().map(|(&v, &s)| (v, s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stops_map_both_ways() {
        let mut transit = TransitLayer::new();
        let s0 = transit.add_stop(4);
        let s1 = transit.add_stop(9);
        assert_eq!(s0, 0);
        assert_eq!(s1, 1);
        assert_eq!(transit.stop_at_street_vertex(4), Some(0));
        assert_eq!(transit.stop_at_street_vertex(5), None);
        assert_eq!(transit.street_vertex_for_stop(1), 9);
        assert_eq!(transit.stop_count(), 2);
    }

    #[test]
    fn unlinked_stop_has_no_vertex() {
        let mut transit = TransitLayer::new();
        let stop = transit.add_stop(NO_STOP);
        assert_eq!(transit.street_vertex_for_stop(stop), NO_STOP);
        assert_eq!(transit.linked_stops().count(), 0);
    }
}
