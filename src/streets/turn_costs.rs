//! Turn costs
//!
//! Scalar cost in seconds for moving from one edge onto another, classified by
//! the bearing change at the junction. Handedness is a construction parameter:
//! with right-hand traffic a right turn crosses no opposing lane and is cheap,
//! a left turn is expensive; mirrored for left-hand traffic. Pedestrians turn
//! for free.

use crate::request::StreetMode;

use super::edge_store::EdgeStore;

/// Bearing changes up to this magnitude count as going straight.
const STRAIGHT_TOLERANCE_DEGREES: f64 = 30.0;
/// Bearing changes beyond this magnitude count as U-turns.
const U_TURN_THRESHOLD_DEGREES: f64 = 160.0;

const CAR_NEAR_TURN_SECONDS: i32 = 4;
const CAR_FAR_TURN_SECONDS: i32 = 8;
const CAR_U_TURN_SECONDS: i32 = 20;

const BICYCLE_NEAR_TURN_SECONDS: i32 = 2;
const BICYCLE_FAR_TURN_SECONDS: i32 = 4;
const BICYCLE_U_TURN_SECONDS: i32 = 10;

#[derive(Debug, Clone)]
pub struct TurnCostCalculator {
    drive_on_right: bool,
}

impl TurnCostCalculator {
    pub fn new(drive_on_right: bool) -> Self {
        Self { drive_on_right }
    }

    /// Cost in seconds of the movement `from_edge → to_edge` for a mode.
    /// Zero when either edge is missing (origin states have no back edge).
    pub fn compute_turn_cost(
        &self,
        edges: &EdgeStore,
        from_edge: i32,
        to_edge: i32,
        mode: StreetMode,
    ) -> i32 {
        if mode == StreetMode::Walk || from_edge < 0 || to_edge < 0 {
            return 0;
        }
        let (near, far, u_turn) = match mode {
            StreetMode::Walk => unreachable!(),
            StreetMode::Bicycle => (
                BICYCLE_NEAR_TURN_SECONDS,
                BICYCLE_FAR_TURN_SECONDS,
                BICYCLE_U_TURN_SECONDS,
            ),
            StreetMode::Car => (CAR_NEAR_TURN_SECONDS, CAR_FAR_TURN_SECONDS, CAR_U_TURN_SECONDS),
        };

        // Reversing onto the other half of the same pair is a U-turn no matter
        // what the geometry says.
        if from_edge ^ 1 == to_edge {
            return u_turn;
        }

        let in_angle = edges.cursor(from_edge).in_angle_degrees();
        let out_angle = edges.cursor(to_edge).out_angle_degrees();
        let mut delta = out_angle - in_angle;
        if delta > 180.0 {
            delta -= 360.0;
        } else if delta <= -180.0 {
            delta += 360.0;
        }

        if delta.abs() <= STRAIGHT_TOLERANCE_DEGREES {
            0
        } else if delta.abs() >= U_TURN_THRESHOLD_DEGREES {
            u_turn
        } else {
            // Positive delta is clockwise, a right turn.
            let turns_with_traffic = (delta > 0.0) == self.drive_on_right;
            if turns_with_traffic {
                near
            } else {
                far
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::floating_to_fixed;
    use crate::streets::edge_store::{flag_set, EdgeFlag};

    fn fixed(lat: f64, lon: f64) -> (i32, i32) {
        (floating_to_fixed(lat), floating_to_fixed(lon))
    }

    /// Cross junction at vertex 4: edges run into it from the south and leave
    /// north (straight), east (right) and west (left).
    fn cross_junction() -> EdgeStore {
        let mut store = EdgeStore::new();
        let all = flag_set(&[EdgeFlag::AllowsCar, EdgeFlag::AllowsBike]);
        let center = (45.0, 13.0);
        let south = (44.999, 13.0);
        let north = (45.001, 13.0);
        let east = (45.0, 13.001);
        let west = (45.0, 12.999);
        for (a, b) in [(south, center), (center, north), (center, east), (center, west)] {
            store.add_edge_pair(
                0,
                0,
                100_000,
                all,
                all,
                0,
                0,
                vec![fixed(a.0, a.1), fixed(b.0, b.1)],
            );
        }
        store
    }

    #[test]
    fn straight_through_is_free() {
        let store = cross_junction();
        let calc = TurnCostCalculator::new(true);
        assert_eq!(calc.compute_turn_cost(&store, 0, 2, StreetMode::Car), 0);
    }

    #[test]
    fn right_turns_are_cheaper_than_left_with_right_hand_traffic() {
        let store = cross_junction();
        let calc = TurnCostCalculator::new(true);
        let right = calc.compute_turn_cost(&store, 0, 4, StreetMode::Car);
        let left = calc.compute_turn_cost(&store, 0, 6, StreetMode::Car);
        assert!(right < left);
        assert_eq!(right, CAR_NEAR_TURN_SECONDS);
        assert_eq!(left, CAR_FAR_TURN_SECONDS);
    }

    #[test]
    fn handedness_mirrors_the_costs() {
        let store = cross_junction();
        let left_hand = TurnCostCalculator::new(false);
        let right = left_hand.compute_turn_cost(&store, 0, 4, StreetMode::Car);
        let left = left_hand.compute_turn_cost(&store, 0, 6, StreetMode::Car);
        assert!(left < right);
    }

    #[test]
    fn pair_reversal_is_a_u_turn() {
        let store = cross_junction();
        let calc = TurnCostCalculator::new(true);
        assert_eq!(
            calc.compute_turn_cost(&store, 0, 1, StreetMode::Car),
            CAR_U_TURN_SECONDS
        );
        assert_eq!(
            calc.compute_turn_cost(&store, 0, 1, StreetMode::Bicycle),
            BICYCLE_U_TURN_SECONDS
        );
    }

    #[test]
    fn walking_turns_are_free() {
        let store = cross_junction();
        let calc = TurnCostCalculator::new(true);
        assert_eq!(calc.compute_turn_cost(&store, 0, 6, StreetMode::Walk), 0);
        assert_eq!(calc.compute_turn_cost(&store, -1, 6, StreetMode::Car), 0);
    }
}
