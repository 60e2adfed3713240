//! Traversal permissions, United States profile
//!
//! A base table keyed on the `highway` class gives default per-mode access;
//! the US profile layers the handful of deviations from that default on top
//! (cyclists on pedestrian ways, pedestrians and cyclists on cycleways and
//! bridleways). Explicit access tags and oneway handling then adjust the
//! per-direction result.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::streets::edge_store::EdgeFlag;

use super::tags::{is_affirmative, WayTags};

#[derive(Debug, Clone, Copy, Default)]
struct ModeAccess {
    pedestrian: bool,
    bike: bool,
    car: bool,
}

impl ModeAccess {
    const fn new(pedestrian: bool, bike: bool, car: bool) -> Self {
        Self {
            pedestrian,
            bike,
            car,
        }
    }
}

/// Default access per highway class.
static BASE_TABLE: Lazy<HashMap<&'static str, ModeAccess>> = Lazy::new(|| {
    HashMap::from([
        ("motorway", ModeAccess::new(false, false, true)),
        ("motorway_link", ModeAccess::new(false, false, true)),
        ("trunk", ModeAccess::new(true, true, true)),
        ("trunk_link", ModeAccess::new(true, true, true)),
        ("primary", ModeAccess::new(true, true, true)),
        ("primary_link", ModeAccess::new(true, true, true)),
        ("secondary", ModeAccess::new(true, true, true)),
        ("secondary_link", ModeAccess::new(true, true, true)),
        ("tertiary", ModeAccess::new(true, true, true)),
        ("tertiary_link", ModeAccess::new(true, true, true)),
        ("unclassified", ModeAccess::new(true, true, true)),
        ("residential", ModeAccess::new(true, true, true)),
        ("living_street", ModeAccess::new(true, true, true)),
        ("service", ModeAccess::new(true, true, true)),
        ("road", ModeAccess::new(true, true, true)),
        ("track", ModeAccess::new(true, true, true)),
        ("footway", ModeAccess::new(true, false, false)),
        ("pedestrian", ModeAccess::new(true, false, false)),
        ("steps", ModeAccess::new(true, false, false)),
        ("path", ModeAccess::new(true, true, false)),
        ("cycleway", ModeAccess::new(false, true, false)),
        ("bridleway", ModeAccess::new(false, false, false)),
        ("platform", ModeAccess::new(true, false, false)),
        ("corridor", ModeAccess::new(true, false, false)),
    ])
});

/// United States deviations, merged over the base table: only grants that
/// differ from the default are listed.
static US_OVERRIDES: Lazy<HashMap<&'static str, ModeAccess>> = Lazy::new(|| {
    HashMap::from([
        ("pedestrian", ModeAccess::new(true, true, false)),
        ("bridleway", ModeAccess::new(true, true, false)),
        ("cycleway", ModeAccess::new(true, true, false)),
    ])
});

/// Per-direction permission flags for a way under the US profile. Ways with
/// no recognized `highway` class get no permissions at all.
pub fn traversal_permissions(tags: &WayTags) -> (u32, u32) {
    let Some(highway) = tags.get("highway") else {
        return (0, 0);
    };
    let mut access = match US_OVERRIDES.get(highway).or_else(|| BASE_TABLE.get(highway)) {
        Some(access) => *access,
        None => return (0, 0),
    };

    // Blanket access tags first, then mode-specific ones.
    if matches!(tags.get("access"), Some("no") | Some("private")) {
        access = ModeAccess::default();
    }
    match tags.get("foot") {
        Some("no") | Some("private") => access.pedestrian = false,
        Some(value) if is_affirmative(value) || value == "designated" => {
            access.pedestrian = true;
        }
        _ => {}
    }
    match tags.get("bicycle") {
        Some("no") | Some("private") => access.bike = false,
        Some(value) if is_affirmative(value) || value == "designated" => access.bike = true,
        _ => {}
    }
    match tags.get("motor_vehicle").or_else(|| tags.get("motorcar")) {
        Some("no") | Some("private") => access.car = false,
        Some(value) if is_affirmative(value) => access.car = true,
        _ => {}
    }

    let mut forward = mode_flags(access);
    let mut backward = mode_flags(access);

    // Oneway applies to vehicles; pedestrians ignore it, cyclists only when
    // not exempted.
    let bicycle_exempt = tags
        .get("oneway:bicycle")
        .map(|v| v == "no")
        .unwrap_or(false)
        || tags.has_tag("cycleway", "opposite_lane")
        || tags.has_tag("cycleway", "opposite_track");
    match tags.get("oneway") {
        Some(value) if is_affirmative(value) => {
            backward &= !EdgeFlag::AllowsCar.mask();
            if !bicycle_exempt {
                backward &= !EdgeFlag::AllowsBike.mask();
            }
        }
        Some("-1") | Some("reverse") => {
            forward &= !EdgeFlag::AllowsCar.mask();
            if !bicycle_exempt {
                forward &= !EdgeFlag::AllowsBike.mask();
            }
        }
        _ => {}
    }

    (forward, backward)
}

fn mode_flags(access: ModeAccess) -> u32 {
    let mut flags = 0;
    if access.pedestrian {
        flags |= EdgeFlag::AllowsPedestrian.mask();
    }
    if access.bike {
        flags |= EdgeFlag::AllowsBike.mask();
    }
    if access.car {
        flags |= EdgeFlag::AllowsCar.mask();
    }
    flags
}
