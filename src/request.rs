//! Request-level routing parameters
//!
//! A profile request carries the per-mode travel speeds and search polarity the
//! engine needs; everything else in the upstream request object (dates,
//! transit preferences, fares) never reaches the street layer.

use serde::{Deserialize, Serialize};

/// Single mode of travel on the street network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreetMode {
    Walk,
    Bicycle,
    Car,
}

/// Leg qualifier used when chaining street searches (mode switches happen at
/// park-and-ride lots and bike-share stations, not mid-edge).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegMode {
    Walk,
    Bicycle,
    BicycleRent,
    Car,
    CarPark,
}

/// Default walking speed, meters per second (5 km/h).
pub const DEFAULT_WALK_SPEED_M_S: f32 = 1.38;
/// Default cycling speed, meters per second (15 km/h).
pub const DEFAULT_BIKE_SPEED_M_S: f32 = 4.16;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRequest {
    /// Walking speed in meters per second.
    pub walk_speed_m_s: f32,
    /// Cycling speed in meters per second.
    pub bike_speed_m_s: f32,
    /// Driving speed in meters per second. Zero means "use per-edge speeds";
    /// the heuristic then calibrates against a motorway ceiling instead.
    pub car_speed_m_s: f32,
    /// Search from the destination towards the origins (swaps adjacency
    /// polarity and turn-restriction orientation).
    pub reverse_search: bool,
    /// Floor in seconds below which reached bike-share vertices are ignored.
    pub min_bike_time_seconds: i32,
    /// Floor in seconds below which reached park-and-ride vertices are ignored.
    pub min_car_time_seconds: i32,
}

impl Default for ProfileRequest {
    fn default() -> Self {
        Self {
            walk_speed_m_s: DEFAULT_WALK_SPEED_M_S,
            bike_speed_m_s: DEFAULT_BIKE_SPEED_M_S,
            car_speed_m_s: 0.0,
            reverse_search: false,
            min_bike_time_seconds: 0,
            min_car_time_seconds: 0,
        }
    }
}

impl ProfileRequest {
    /// Requested speed for a mode, meters per second. May be zero for Car.
    pub fn speed(&self, mode: StreetMode) -> f32 {
        match mode {
            StreetMode::Walk => self.walk_speed_m_s,
            StreetMode::Bicycle => self.bike_speed_m_s,
            StreetMode::Car => self.car_speed_m_s,
        }
    }

    /// Minimum travel time before a reached vertex or stop counts for a mode.
    /// Keeps mode switches from winning over trivially short first legs.
    pub fn min_time_limit(&self, mode: StreetMode) -> i32 {
        match mode {
            StreetMode::Walk => 0,
            StreetMode::Bicycle => self.min_bike_time_seconds,
            StreetMode::Car => self.min_car_time_seconds,
        }
    }
}
