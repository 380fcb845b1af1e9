//! Linear mapping between latitude/longitude and positions inside the map
//! container. Longitude spans the full width (-180..180), latitude the full
//! height (90..-90). Nothing is clamped.

use crate::core::geo::{LatLng, Point};

/// Position of `lat_lng` as percentages of the container's width and height.
pub fn lat_lng_to_percent(lat_lng: &LatLng) -> Point {
    Point::new(
        (lat_lng.lng / 360.0 + 0.5) * 100.0,
        (0.5 - lat_lng.lat / 180.0) * 100.0,
    )
}

/// Inverse of [`lat_lng_to_percent`] for a pixel offset inside a container of
/// `size`. Returns `None` when the container has no area.
pub fn container_point_to_lat_lng(offset: &Point, size: &Point) -> Option<LatLng> {
    if size.x <= 0.0 || size.y <= 0.0 {
        return None;
    }

    let lat = (size.y / 2.0 - offset.y) / size.y * 180.0;
    let lng = (offset.x - size.x / 2.0) / size.x * 360.0;
    Some(LatLng::new(lat, lng))
}

/// Formats a percentage for an inline style, e.g. `62.5%` or `50%`.
pub fn percent_css(value: f64) -> String {
    format!("{}%", value)
}
