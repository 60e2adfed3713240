//! Way-tag labeling
//!
//! Pure functions from OSM-style way tags to per-direction edge flags:
//! traversal permissions per mode (United States profile) and way-type labels
//! (stairs, sidewalks, cycleways, …). Graph construction calls these once per
//! way; the router only ever sees the resulting flag bitsets.

pub mod edge_types;
pub mod permissions;
pub mod tags;

pub use edge_types::label_edge_types;
pub use permissions::traversal_permissions;
pub use tags::WayTags;

/// Full labeling pass for one way: permissions, then type flags (some type
/// flags depend on the granted permissions). Returns (forward, backward) flag
/// bitsets ready for an edge pair.
pub fn label_way(tags: &WayTags) -> (u32, u32) {
    let (mut forward, mut backward) = traversal_permissions(tags);
    label_edge_types(tags, &mut forward, &mut backward);
    (forward, backward)
}
