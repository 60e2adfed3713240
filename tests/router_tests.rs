//! End-to-end routing scenarios on small synthetic street networks
//!
//! Each network is built through the layer builder with explicit lengths so
//! expected durations are exact; walking at 1 m/s makes a 1000 mm edge cost
//! one second.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use kingfisher_streets::streets::edge_store::{flag_set, EdgeFlag};
use kingfisher_streets::streets::router::StreetRouter;
use kingfisher_streets::{
    EdgeSpec, LegMode, RoutingVariable, RoutingVisitor, State, StreetLayer, StreetMode,
    TurnRestriction, VertexFlag,
};

/// Meters spanned by one degree of latitude, for laying out test coordinates.
const METERS_PER_DEGREE: f64 = 111_195.0;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn all_modes() -> u32 {
    flag_set(&[
        EdgeFlag::AllowsPedestrian,
        EdgeFlag::AllowsBike,
        EdgeFlag::AllowsCar,
        EdgeFlag::Linkable,
    ])
}

fn walkable() -> u32 {
    flag_set(&[EdgeFlag::AllowsPedestrian, EdgeFlag::Linkable])
}

fn edge(from: i32, to: i32, length_mm: i32, flags: u32) -> EdgeSpec {
    EdgeSpec {
        length_mm: Some(length_mm),
        forward_flags: flags,
        backward_flags: flags,
        ..EdgeSpec::new(from, to)
    }
}

/// A north-running chain of `count` vertices with 1000 mm edges in between.
fn chain_layer(count: usize) -> StreetLayer {
    let mut layer = StreetLayer::new();
    for i in 0..count {
        layer.add_vertex(45.0 + (i as f64) / METERS_PER_DEGREE, 13.0);
    }
    for i in 1..count {
        layer
            .add_edge_pair(edge(i as i32 - 1, i as i32, 1000, walkable()))
            .unwrap();
    }
    layer
}

fn walking_router(layer: &StreetLayer) -> StreetRouter<'_> {
    let mut router = StreetRouter::new(layer);
    router.profile_request.walk_speed_m_s = 1.0;
    router.dominance_variable = RoutingVariable::DurationSeconds;
    router
}

#[test]
fn empty_graph_search_reaches_only_the_origin() {
    init_logging();
    let mut layer = StreetLayer::new();
    layer.add_vertex(45.0, 13.0);

    let mut router = walking_router(&layer);
    router.set_origin_vertex(0);
    router.route();

    let reached = router.get_reached_vertices();
    assert_eq!(reached, HashMap::from([(0, 0)]));
}

#[test]
fn single_edge_walk_takes_one_second() {
    init_logging();
    let layer = chain_layer(2);
    let mut router = walking_router(&layer);
    router.set_origin_vertex(0);
    router.to_vertex = 1;
    router.route();

    let state = router.get_state_at_vertex(1).expect("target reached");
    assert_eq!(state.duration_seconds, 1);
    assert_eq!(state.distance_mm, 1000);
}

#[test]
fn forbidden_turn_forces_the_detour() {
    init_logging();
    // O --eA--> J --eC--> T with a side loop J --> D --> T. The direct turn
    // eA -> eC is forbidden.
    let build = |restricted: bool| {
        let mut layer = StreetLayer::new();
        let o = layer.add_vertex(45.0, 13.0);
        let j = layer.add_vertex(45.0 + 100.0 / METERS_PER_DEGREE, 13.0);
        let t = layer.add_vertex(45.0 + 200.0 / METERS_PER_DEGREE, 13.0);
        let d = layer.add_vertex(45.0 + 100.0 / METERS_PER_DEGREE, 13.001);
        let e_a = layer.add_edge_pair(edge(o, j, 1000, walkable())).unwrap();
        let e_c = layer.add_edge_pair(edge(j, t, 1000, walkable())).unwrap();
        layer.add_edge_pair(edge(j, d, 1000, walkable())).unwrap();
        layer.add_edge_pair(edge(d, t, 1000, walkable())).unwrap();
        if restricted {
            layer
                .add_turn_restriction(TurnRestriction::no_turn(e_a, vec![], e_c))
                .unwrap();
        }
        layer
    };

    let free = build(false);
    let mut router = walking_router(&free);
    router.set_origin_vertex(0);
    router.to_vertex = 2;
    router.route();
    let unrestricted = router.get_state_at_vertex(2).unwrap().duration_seconds;
    assert_eq!(unrestricted, 2);

    let restricted = build(true);
    let mut router = walking_router(&restricted);
    router.set_origin_vertex(0);
    router.to_vertex = 2;
    router.route();
    let state = router.get_state_at_vertex(2).expect("detour exists");
    assert_eq!(state.duration_seconds, 3);
    // The optimum exceeds the forbidden path by exactly the detour delta.
    assert_eq!(state.duration_seconds - unrestricted, 1);
    // The path actually runs via D (vertex 3).
    assert_eq!(state.back_state.as_ref().unwrap().vertex, 3);
}

#[test]
fn split_edge_origin_seeds_both_directions() {
    init_logging();
    let mut layer = chain_layer(2);
    layer.build_spatial_index();

    let mut router = walking_router(&layer);
    let mid_lat = 45.0 + 0.5 / METERS_PER_DEGREE;
    assert!(router.set_origin(mid_lat, 13.0));

    let split = router.origin_split().expect("origin snapped");
    assert_eq!(split.distance0_mm + split.distance1_mm, 1000);
    assert!((split.distance0_mm - 500).abs() <= 15, "snapped off-center");

    router.route();

    // Both endpoints carry roughly half the edge: duration 0.5 s rounded,
    // never underestimated.
    for vertex in [0, 1] {
        let state = router.get_state_at_vertex(vertex).expect("endpoint reached");
        assert!(state.duration_seconds >= 1);
        assert!((state.distance_mm - 500).abs() <= 15);
    }
}

#[test]
fn stop_visitor_caps_at_the_nearest_stops() {
    init_logging();
    let mut layer = chain_layer(6);
    // Stops at vertices 1..=5; stop index i maps to vertex i + 1.
    for vertex in 1..6 {
        layer.link_transit_stop(vertex).unwrap();
    }

    let mut router = walking_router(&layer);
    router.transit_stop_search = true;
    router.max_transit_stops = 3;
    router.set_origin_vertex(0);
    router.route();

    let stops = router.get_reached_stops();
    assert_eq!(stops.len(), 3);
    // The three nearest stops by duration, with their costs.
    assert_eq!(stops, HashMap::from([(0, 1), (1, 2), (2, 3)]));
}

#[test]
fn bike_share_chaining_applies_switch_penalties() {
    init_logging();
    let mut layer = StreetLayer::new();
    for i in 0..3 {
        layer.add_vertex(45.0 + (i as f64) / METERS_PER_DEGREE, 13.0);
    }
    layer.add_edge_pair(edge(0, 1, 1000, all_modes())).unwrap();
    layer.add_edge_pair(edge(1, 2, 1000, all_modes())).unwrap();
    layer.set_vertex_flag(1, VertexFlag::BikeSharing).unwrap();
    layer.set_vertex_flag(2, VertexFlag::BikeSharing).unwrap();

    let mut walk_router = StreetRouter::new(&layer);
    walk_router.profile_request.walk_speed_m_s = 1.0;
    walk_router.dominance_variable = RoutingVariable::Weight;
    walk_router.flag_search = Some(VertexFlag::BikeSharing);
    walk_router.set_origin_vertex(0);
    walk_router.route();

    let bike_share_vertices = walk_router.get_reached_vertices_with_flag(VertexFlag::BikeSharing);
    assert_eq!(bike_share_vertices.len(), 2);

    let mut bike_router = StreetRouter::new(&layer);
    bike_router.street_mode = StreetMode::Bicycle;
    bike_router.dominance_variable = RoutingVariable::Weight;
    bike_router.set_origin_states(&bike_share_vertices, 60, 120, LegMode::BicycleRent);

    for (_, previous) in &bike_share_vertices {
        let seed = bike_router
            .get_state_at_edge(previous.back_edge)
            .expect("seed indexed on the inherited edge");
        assert_eq!(seed.weight, previous.weight + 120);
        assert_eq!(seed.duration_seconds, previous.duration_seconds + 60);
        assert_eq!(seed.duration_from_origin_seconds, 60);
        assert!(seed.is_bike_share);
        assert!(seed.back_state.is_none());
    }

    bike_router.route();
    assert!(!bike_router.get_reached_vertices().is_empty());
}

#[test]
fn repeated_routing_is_deterministic() {
    init_logging();
    // A seeded random grid with shuffled edge lengths.
    let n = 6usize;
    let mut rng = StdRng::seed_from_u64(42);
    let mut layer = StreetLayer::new();
    for row in 0..n {
        for col in 0..n {
            layer.add_vertex(
                45.0 + (row as f64) * 100.0 / METERS_PER_DEGREE,
                13.0 + (col as f64) * 100.0 / METERS_PER_DEGREE,
            );
        }
    }
    let at = |row: usize, col: usize| (row * n + col) as i32;
    for row in 0..n {
        for col in 0..n {
            let length = rng.gen_range(500..5000);
            if col + 1 < n {
                layer
                    .add_edge_pair(edge(at(row, col), at(row, col + 1), length, walkable()))
                    .unwrap();
            }
            if row + 1 < n {
                layer
                    .add_edge_pair(edge(at(row, col), at(row + 1, col), length, walkable()))
                    .unwrap();
            }
        }
    }

    let run = || {
        let mut router = walking_router(&layer);
        router.set_origin_vertex(0);
        router.route();
        router.get_reached_vertices()
    };
    let first = run();
    let second = run();
    assert_eq!(first, second);
    assert_eq!(first.len(), n * n);

    // Routing again on an unmutated router changes nothing either.
    let mut router = walking_router(&layer);
    router.set_origin_vertex(0);
    router.route();
    let before = router.get_reached_vertices();
    router.route();
    assert_eq!(before, router.get_reached_vertices());
}

#[test]
fn forward_and_reverse_searches_agree() {
    init_logging();
    let mut layer = StreetLayer::new();
    for i in 0..3 {
        layer.add_vertex(45.0 + (i as f64) * 2.0 / METERS_PER_DEGREE, 13.0);
    }
    layer.add_edge_pair(edge(0, 1, 1500, walkable())).unwrap();
    layer.add_edge_pair(edge(1, 2, 2500, walkable())).unwrap();

    let mut forward = walking_router(&layer);
    forward.set_origin_vertex(0);
    forward.to_vertex = 2;
    forward.route();
    let forward_duration = forward.get_state_at_vertex(2).unwrap().duration_seconds;

    let mut reverse = walking_router(&layer);
    reverse.profile_request.reverse_search = true;
    reverse.set_origin_vertex(2);
    reverse.to_vertex = 0;
    reverse.route();
    let reverse_duration = reverse.get_state_at_vertex(0).unwrap().duration_seconds;

    assert_eq!(forward_duration, reverse_duration);
}

#[test]
fn time_limit_bounds_retained_states() {
    init_logging();
    let layer = chain_layer(10);
    let mut router = walking_router(&layer);
    router.time_limit_seconds = 3;
    router.set_origin_vertex(0);
    router.route();

    let reached = router.get_reached_vertices();
    for (&vertex, &duration) in &reached {
        assert!(
            duration <= 3,
            "vertex {vertex} retained beyond the limit at {duration}s"
        );
    }
    assert!(reached.contains_key(&2));
    assert!(!reached.contains_key(&5));
}

#[test]
fn unlimited_search_covers_the_whole_component() {
    init_logging();
    let layer = chain_layer(8);
    let mut router = walking_router(&layer);
    router.set_origin_vertex(3);
    router.route();
    assert_eq!(router.get_reached_vertices().len(), 8);
}

/// Records `variable + heuristic` of every visited state.
struct PopRecorder {
    log: Rc<RefCell<Vec<i32>>>,
}

impl RoutingVisitor for PopRecorder {
    fn visit_vertex(&mut self, state: &Arc<State>) {
        self.log
            .borrow_mut()
            .push(state.duration_seconds + state.heuristic);
    }
}

#[test]
fn astar_pop_order_is_monotone() {
    init_logging();
    let mut layer = chain_layer(12);
    layer.build_spatial_index();

    let mut router = walking_router(&layer);
    let log = Rc::new(RefCell::new(Vec::new()));
    router.set_routing_visitor(Box::new(PopRecorder { log: Rc::clone(&log) }));
    router.set_origin_vertex(0);
    let goal = 45.0 + 11.0 / METERS_PER_DEGREE;
    assert!(router.set_destination(goal, 13.0));
    router.route();

    let log = log.borrow();
    assert!(!log.is_empty());
    for pair in log.windows(2) {
        assert!(pair[0] <= pair[1], "pop order regressed: {pair:?}");
    }
}

/// Breaks the search after the first visited state.
struct ImmediateBreak {
    visited: usize,
}

impl RoutingVisitor for ImmediateBreak {
    fn visit_vertex(&mut self, _state: &Arc<State>) {
        self.visited += 1;
    }

    fn should_break_search(&self) -> bool {
        self.visited > 0
    }
}

#[test]
fn custom_visitor_cancels_the_search() {
    init_logging();
    let layer = chain_layer(20);
    let mut router = walking_router(&layer);
    router.set_routing_visitor(Box::new(ImmediateBreak { visited: 0 }));
    router.set_origin_vertex(0);
    router.route();
    // Only the origin was settled; at most its immediate expansion exists.
    assert!(router.get_reached_vertices().len() <= 2);
}

#[test]
fn car_turn_costs_show_up_in_durations() {
    init_logging();
    let mut layer = StreetLayer::new();
    let car = flag_set(&[EdgeFlag::AllowsCar, EdgeFlag::Linkable]);
    let a = layer.add_vertex(45.0, 13.0);
    let b = layer.add_vertex(45.0 + 10.0 / METERS_PER_DEGREE, 13.0);
    let c = layer.add_vertex(
        45.0 + 10.0 / METERS_PER_DEGREE,
        13.0 + 10.0 / (METERS_PER_DEGREE * 45f64.to_radians().cos()),
    );
    for (from, to) in [(a, b), (b, c)] {
        layer
            .add_edge_pair(EdgeSpec {
                length_mm: Some(10_000),
                forward_flags: car,
                backward_flags: car,
                forward_car_speed_mm_s: 10_000,
                backward_car_speed_mm_s: 10_000,
                ..EdgeSpec::new(from, to)
            })
            .unwrap();
    }

    let mut router = StreetRouter::new(&layer);
    router.street_mode = StreetMode::Car;
    router.dominance_variable = RoutingVariable::DurationSeconds;
    router.set_origin_vertex(a);
    router.to_vertex = c;
    router.route();

    // 1 s per edge plus 4 s for the right turn at B.
    let state = router.get_state_at_vertex(c).unwrap();
    assert_eq!(state.duration_seconds, 6);
}

#[test]
fn destination_split_honors_partial_traversal() {
    init_logging();
    let mut layer = chain_layer(3);
    layer.build_spatial_index();

    let mut router = walking_router(&layer);
    router.set_origin_vertex(0);
    let mid_of_second_edge = 45.0 + 1.5 / METERS_PER_DEGREE;
    assert!(router.set_destination(mid_of_second_edge, 13.0));
    router.route();

    let destination = router.destination_split().unwrap();
    let state = router.get_state(&destination).expect("destination reached");
    // One full edge plus half of the second one.
    assert_eq!(state.duration_seconds, 2);
    assert_eq!(state.distance_mm, 1500);
    assert_eq!(state.back_edge, destination.edge);
}

#[test]
fn target_pruning_stops_the_sweep_past_the_destination() {
    init_logging();
    let mut layer = chain_layer(8);
    layer.build_spatial_index();

    let mut router = walking_router(&layer);
    router.set_origin_vertex(0);
    assert!(router.set_destination(45.0 + 1.5 / METERS_PER_DEGREE, 13.0));
    router.route();

    // Vertices far beyond the destination were never expanded.
    assert!(router.get_state_at_vertex(6).is_none());
    assert!(router.get_state_at_vertex(7).is_none());
}

#[test]
fn unsnappable_origin_reports_failure_and_routes_nothing() {
    init_logging();
    let mut layer = chain_layer(2);
    layer.build_spatial_index();

    let mut router = walking_router(&layer);
    assert!(!router.set_origin(52.0, 0.0));
    router.route();
    assert!(router.get_reached_vertices().is_empty());
    assert!(router.get_state_at_vertex(1).is_none());
}

#[test]
fn terminal_chains_reverse_cleanly() {
    init_logging();
    let layer = chain_layer(3);
    let mut router = walking_router(&layer);
    router.set_origin_vertex(0);
    router.to_vertex = 2;
    router.route();

    let terminal = router.get_state_at_vertex(2).unwrap();
    assert_eq!(terminal.vertex, 2);
    let reversed = terminal.reverse(&layer.edge_store);

    // The reversed chain runs tail-to-head with the same totals.
    assert_eq!(reversed.vertex, 0);
    assert_eq!(reversed.duration_seconds, terminal.duration_seconds);
    assert_eq!(reversed.distance_mm, terminal.distance_mm);
    let middle = reversed.back_state.as_ref().unwrap();
    assert_eq!(middle.vertex, 1);
    assert_eq!(middle.back_state.as_ref().unwrap().vertex, 2);
}
