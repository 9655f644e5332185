//! Tag interpretation helpers.
//!
//! Kept independent of any parser so both the PBF loader and hand-built
//! fixtures agree on what a tag set means.

use tg_core::{access, NodeType, RoadClass};

use crate::SignalDirection;

/// Road class for a `highway=*` value, or `None` if the way is not drivable.
pub fn road_class(highway: &str) -> Option<RoadClass> {
    match highway {
        "motorway"  | "motorway_link"         => Some(RoadClass::Motorway),
        "trunk"     | "trunk_link"            => Some(RoadClass::Trunk),
        "primary"   | "primary_link"          => Some(RoadClass::Primary),
        "secondary" | "secondary_link"        => Some(RoadClass::Secondary),
        "tertiary"  | "tertiary_link"
        | "unclassified"                      => Some(RoadClass::Tertiary),
        "residential" | "living_street"       => Some(RoadClass::Residential),
        "service"                             => Some(RoadClass::Service),
        "road" | "track" | "busway"           => Some(RoadClass::Other),
        // Explicitly non-drivable:
        "footway" | "path" | "cycleway"
        | "pedestrian" | "steps" | "bridleway"
        | "construction" | "proposed"         => None,
        // Unknown value — keep it drivable at the lowest class.
        _                                     => Some(RoadClass::Other),
    }
}

/// `true` for ramp / connector highway values.
#[inline]
pub fn is_link(highway: &str) -> bool {
    highway.ends_with("_link")
}

/// Drivable directions `(forward, backward)` for a way.
///
/// Motorways, motorway links and roundabouts are implicitly one-way.
/// `oneway=-1` flips the way; `oneway=no` overrides the implicit rule.
pub fn directions(highway: &str, tags: &[(&str, &str)]) -> (bool, bool) {
    let oneway = tag(tags, "oneway");
    let implicit = matches!(highway, "motorway" | "motorway_link")
        || tag(tags, "junction") == Some("roundabout");
    match oneway {
        Some("yes" | "1" | "true") => (true, false),
        Some("-1" | "reverse")     => (false, true),
        Some("no" | "0" | "false") => (true, true),
        _ if implicit              => (true, false),
        _                          => (true, true),
    }
}

/// Node type from `highway` / `barrier` tags.
pub fn node_type(tags: &[(&str, &str)]) -> NodeType {
    match (tag(tags, "highway"), tag(tags, "barrier")) {
        (Some("motorway_junction"), _)   => NodeType::MotorwayJunction,
        (_, Some("toll_booth"))          => NodeType::TollBooth,
        (_, Some("gate" | "lift_gate"))  => NodeType::Gate,
        (_, Some("bollard"))             => NodeType::Bollard,
        (_, Some("border_control"))      => NodeType::BorderControl,
        _                                => NodeType::StreetIntersection,
    }
}

/// Access mask from `access` and per-mode tags.  Untagged nodes allow all
/// modes; bollards block motor vehicles unless a mode tag says otherwise.
pub fn access_mask(tags: &[(&str, &str)]) -> u16 {
    let mut mask = match tag(tags, "access") {
        Some("no" | "private") => 0,
        _                      => access::ALL,
    };
    if tag(tags, "barrier") == Some("bollard") {
        mask &= access::PEDESTRIAN | access::BICYCLE | access::EMERGENCY;
    }
    let modes: [(&str, u16); 6] = [
        ("motor_vehicle", access::AUTO | access::TRUCK | access::TAXI | access::BUS | access::HOV),
        ("motorcar",      access::AUTO),
        ("foot",          access::PEDESTRIAN),
        ("bicycle",       access::BICYCLE),
        ("hgv",           access::TRUCK),
        ("bus",           access::BUS),
    ];
    for (key, bits) in modes {
        match tag(tags, key) {
            Some("yes" | "designated" | "permissive") => mask |= bits,
            Some("no" | "private")                    => mask &= !bits,
            _ => {}
        }
    }
    mask
}

/// Traffic-signal direction (`traffic_signals:direction`).
pub fn signal_direction(tags: &[(&str, &str)]) -> SignalDirection {
    match tag(tags, "traffic_signals:direction").or_else(|| tag(tags, "direction")) {
        Some("forward")  => SignalDirection::Forward,
        Some("backward") => SignalDirection::Backward,
        _                => SignalDirection::Both,
    }
}

/// `true` if the node carries a traffic signal.
#[inline]
pub fn is_traffic_signal(tags: &[(&str, &str)]) -> bool {
    tag(tags, "highway") == Some("traffic_signals")
}

#[inline]
fn tag<'a>(tags: &[(&str, &'a str)], key: &str) -> Option<&'a str> {
    tags.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}
