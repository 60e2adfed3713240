//! Way-type labeling
//!
//! Adds stairs, linkability, bike-path, sidewalk, crossing, roundabout and
//! platform flags to the per-direction bitsets. Cycleway and sidewalk
//! detection are direction-sensitive: a `cycleway:right` lane only labels the
//! forward edge, `cycleway:left` only the back edge.

use crate::streets::edge_store::EdgeFlag;

use super::tags::{is_affirmative, WayTags};

fn is_cycleway(tags: &WayTags, back: bool) -> bool {
    let bidirectional_cycleway = tags.has_tag("highway", "cycleway")
        || (tags.has_tag("highway", "path")
            && tags.has_tag("bicycle", "designated")
            && tags.has_tag("foot", "designated"))
        || tags.has_tag("cycleway", "lane")
        || tags.has_tag("cycleway", "track");
    if bidirectional_cycleway {
        match tags.get("oneway") {
            Some(value) if is_affirmative(value) => return !back,
            Some(_) => {}
            None => return true,
        }
    }

    let has_cycleway_opposite =
        tags.has_tag("cycleway", "opposite_lane") || tags.has_tag("cycleway", "opposite_track");

    if back {
        if tags.get("cycleway:left").map(is_affirmative) == Some(true) {
            return true;
        }
        // A oneway street with an opposite lane has its contraflow cycleway on
        // the back edge.
        if has_cycleway_opposite
            && tags.get("oneway").map(is_affirmative) == Some(true)
        {
            return true;
        }
    } else {
        if tags.get("cycleway:right").map(is_affirmative) == Some(true) {
            return true;
        }
        if has_cycleway_opposite
            && matches!(tags.get("oneway"), Some("-1") | Some("reverse"))
        {
            return true;
        }
    }
    false
}

fn is_sidewalk(tags: &WayTags, back: bool) -> bool {
    if let Some(sidewalk) = tags.get("sidewalk") {
        let sidewalk = sidewalk.to_lowercase();
        if sidewalk == "both" {
            return true;
        }
        if matches!(sidewalk.as_str(), "none" | "no" | "false") {
            return false;
        }
        if !back && sidewalk == "right" {
            return true;
        }
        if back && sidewalk == "left" {
            return true;
        }
    } else if tags.has_tag("highway", "footway") && tags.has_tag("footway", "sidewalk") {
        return true;
    } else if (tags.has_tag("highway", "cycleway") && tags.has_tag("foot", "designated"))
        || (tags.has_tag("highway", "path")
            && tags.has_tag("bicycle", "designated")
            && tags.has_tag("foot", "designated"))
    {
        return true;
    } else if tags.has_tag("cycleway", "track") && tags.has_tag("segregated", "yes") {
        return true;
    }
    false
}

/// Add the way-type flags to already-permission-labeled bitsets.
pub fn label_edge_types(tags: &WayTags, forward_flags: &mut u32, backward_flags: &mut u32) {
    if tags.has_tag("highway", "steps") {
        *forward_flags |= EdgeFlag::Stairs.mask();
        *backward_flags |= EdgeFlag::Stairs.mask();
    }

    // Anything not underground, covered or a motorway can be linked to
    // park-and-ride lots and snapped origins.
    if !(tags.has_tag("tunnel", "yes")
        || tags.has_tag("covered", "yes")
        || tags.has_tag("highway", "motorway"))
    {
        *forward_flags |= EdgeFlag::Linkable.mask();
        *backward_flags |= EdgeFlag::Linkable.mask();
    }

    if *forward_flags & EdgeFlag::AllowsBike.mask() != 0 && is_cycleway(tags, false) {
        *forward_flags |= EdgeFlag::BikePath.mask();
    }
    if *backward_flags & EdgeFlag::AllowsBike.mask() != 0 && is_cycleway(tags, true) {
        *backward_flags |= EdgeFlag::BikePath.mask();
    }

    if is_sidewalk(tags, false) {
        *forward_flags |= EdgeFlag::Sidewalk.mask();
    }
    if is_sidewalk(tags, true) {
        *backward_flags |= EdgeFlag::Sidewalk.mask();
    }

    if tags.has_tag("footway", "crossing") || tags.has_tag("cycleway", "crossing") {
        *forward_flags |= EdgeFlag::Crossing.mask();
        *backward_flags |= EdgeFlag::Crossing.mask();
    }

    if tags.has_tag("junction", "roundabout") {
        *forward_flags |= EdgeFlag::Roundabout.mask();
        *backward_flags |= EdgeFlag::Roundabout.mask();
    }

    if tags.has_tag("highway", "platform")
        || tags.has_tag("public_transport", "platform")
        || tags.has_tag("railway", "platform")
    {
        *forward_flags |= EdgeFlag::Platform.mask();
        *backward_flags |= EdgeFlag::Platform.mask();
    }
}
