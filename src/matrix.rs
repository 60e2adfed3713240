//! Batched one-to-many searches
//!
//! Routers are cheap, single-threaded and share a read-only street layer, so
//! many-origin workloads (access legs for every percentile origin, stop
//! matrices) parallelize by running one router per origin.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::request::{ProfileRequest, StreetMode};
use crate::streets::router::StreetRouter;
use crate::streets::state::RoutingVariable;
use crate::streets::StreetLayer;

/// Per-origin search settings for a batched stop search.
#[derive(Debug, Clone)]
pub struct StopSearchOptions {
    pub request: ProfileRequest,
    pub street_mode: StreetMode,
    pub dominance_variable: RoutingVariable,
    /// Prune beyond this cumulative duration, seconds (0 = no limit).
    pub time_limit_seconds: i32,
    pub max_transit_stops: usize,
}

/// Run an independent stop search per origin in parallel, returning for each
/// origin a map stop index → cost under the dominance variable. Unsnappable
/// origins yield an empty map.
pub fn reached_stops_for_origins(
    layer: &StreetLayer,
    origins: &[(f64, f64)],
    options: &StopSearchOptions,
) -> Vec<HashMap<i32, i32>> {
    origins
        .par_iter()
        .map(|&(lat, lon)| {
            let mut router = StreetRouter::new(layer);
            router.profile_request = options.request.clone();
            router.street_mode = options.street_mode;
            router.dominance_variable = options.dominance_variable;
            router.time_limit_seconds = options.time_limit_seconds;
            router.transit_stop_search = true;
            router.max_transit_stops = options.max_transit_stops;
            if !router.set_origin(lat, lon) {
                return HashMap::new();
            }
            router.route();
            router.get_reached_stops()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streets::edge_store::{flag_set, EdgeFlag};
    use crate::streets::EdgeSpec;

    /// A short chain of walkable edges with stops at both ends.
    fn chain_layer() -> StreetLayer {
        let mut layer = StreetLayer::new();
        let flags = flag_set(&[EdgeFlag::AllowsPedestrian, EdgeFlag::Linkable]);
        let mut previous = layer.add_vertex(45.0, 13.0);
        for i in 1..4 {
            let vertex = layer.add_vertex(45.0 + 0.0001 * i as f64, 13.0);
            layer
                .add_edge_pair(EdgeSpec {
                    forward_flags: flags,
                    backward_flags: flags,
                    ..EdgeSpec::new(previous, vertex)
                })
                .unwrap();
            previous = vertex;
        }
        layer.link_transit_stop(0).unwrap();
        layer.link_transit_stop(previous).unwrap();
        layer.build_spatial_index();
        layer
    }

    #[test]
    fn each_origin_gets_its_own_stop_map() {
        let layer = chain_layer();
        let options = StopSearchOptions {
            request: ProfileRequest::default(),
            street_mode: StreetMode::Walk,
            dominance_variable: RoutingVariable::DurationSeconds,
            time_limit_seconds: 0,
            max_transit_stops: 10,
        };
        let origins = [(45.0, 13.0), (45.0003, 13.0), (89.0, 0.0)];
        let results = reached_stops_for_origins(&layer, &origins, &options);
        assert_eq!(results.len(), 3);
        // Both ends of the chain are visible from on-network origins.
        assert_eq!(results[0].len(), 2);
        assert_eq!(results[1].len(), 2);
        // The far-off origin cannot snap.
        assert!(results[2].is_empty());

        // The origin next to stop 0 reaches it more cheaply than the distant one.
        assert!(results[0][&0] <= results[1][&0]);
    }
}
