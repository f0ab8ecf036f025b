//! Geographic utility functions.
//!
//! Distance, center, and unit-conversion helpers shared across the
//! clustering pipeline and the projector.

use crate::{GeoPoint, SurfacePoint};

/// Earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Calculate the haversine (great-circle) distance between two points
/// in meters.
pub fn haversine_distance(p1: &GeoPoint, p2: &GeoPoint) -> f64 {
    let lat1 = p1.lat.to_radians();
    let lat2 = p2.lat.to_radians();
    let d_lat = (p2.lat - p1.lat).to_radians();
    let d_lng = (p2.lng - p1.lng).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Convert a distance in meters to degrees of longitude at a given latitude.
pub fn meters_to_degrees(meters: f64, latitude: f64) -> f64 {
    let lat_rad = latitude.to_radians();
    meters / (111_320.0 * lat_rad.cos().max(0.01))
}

/// Compute the centroid of geographic points. Returns (0, 0) for empty input.
pub fn compute_center(points: &[GeoPoint]) -> GeoPoint {
    if points.is_empty() {
        return GeoPoint::new(0.0, 0.0);
    }
    let sum_lat: f64 = points.iter().map(|p| p.lat).sum();
    let sum_lng: f64 = points.iter().map(|p| p.lng).sum();
    GeoPoint::new(sum_lat / points.len() as f64, sum_lng / points.len() as f64)
}

/// Compute the centroid of surface points. Returns (0, 0) for empty input.
pub fn surface_centroid(points: &[SurfacePoint]) -> SurfacePoint {
    if points.is_empty() {
        return SurfacePoint::default();
    }
    let sum_x: f64 = points.iter().map(|p| p.x).sum();
    let sum_y: f64 = points.iter().map(|p| p.y).sum();
    SurfacePoint::new(sum_x / points.len() as f64, sum_y / points.len() as f64)
}

/// Distance from point `p` to the segment `a`-`b` on the surface,
/// together with the closest point on the segment.
pub fn point_to_segment(
    p: &SurfacePoint,
    a: &SurfacePoint,
    b: &SurfacePoint,
) -> (f64, SurfacePoint) {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;

    if len_sq == 0.0 {
        return (p.distance_to(a), *a);
    }

    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    let closest = SurfacePoint::new(a.x + t * dx, a.y + t * dy);
    (p.distance_to(&closest), closest)
}

/// Signed cross product of the segment `a`-`b` with point `p`.
///
/// Positive and negative signs distinguish the two sides of the line
/// through `a` and `b`.
pub fn side_of_segment(p: &SurfacePoint, a: &SurfacePoint, b: &SurfacePoint) -> f64 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}
