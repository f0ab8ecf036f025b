//! Geographic-to-surface projection.
//!
//! Maps a geographic bounding rectangle onto a fixed pixel surface with a
//! linear equirectangular transform. North maps to the top of the surface,
//! west to the left.

use crate::{Bounds, GeoPoint, SurfacePoint};

/// Linear projector from a geographic rectangle to pixel coordinates.
///
/// Degenerate bounds (a single point, or all points on one meridian or
/// parallel) are padded so projection stays finite.
#[derive(Debug, Clone)]
pub struct SurfaceProjector {
    bounds: Bounds,
    width: f64,
    height: f64,
}

impl SurfaceProjector {
    /// Build a projector for the given geographic bounds and surface size.
    pub fn new(bounds: Bounds, width: f64, height: f64) -> Self {
        let mut bounds = bounds;
        if bounds.max_lat - bounds.min_lat < 1e-9 {
            bounds.min_lat -= 0.0005;
            bounds.max_lat += 0.0005;
        }
        if bounds.max_lng - bounds.min_lng < 1e-9 {
            bounds.min_lng -= 0.0005;
            bounds.max_lng += 0.0005;
        }
        Self {
            bounds,
            width,
            height,
        }
    }

    /// Build a projector fitting all given points with a margin, in degrees,
    /// on every side. Returns `None` for empty input.
    pub fn fit(points: &[GeoPoint], margin: f64, width: f64, height: f64) -> Option<Self> {
        let bounds = Bounds::from_points(points)?.expanded(margin);
        Some(Self::new(bounds, width, height))
    }

    /// The geographic bounds this projector covers.
    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Surface dimensions in px.
    pub fn surface_size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// Project a geographic point onto the surface.
    pub fn project(&self, p: &GeoPoint) -> SurfacePoint {
        let x = (p.lng - self.bounds.min_lng) / (self.bounds.max_lng - self.bounds.min_lng)
            * self.width;
        let y = (self.bounds.max_lat - p.lat) / (self.bounds.max_lat - self.bounds.min_lat)
            * self.height;
        SurfacePoint::new(x, y)
    }

    /// Inverse of [`project`](Self::project).
    pub fn unproject(&self, p: &SurfacePoint) -> GeoPoint {
        let lng =
            self.bounds.min_lng + p.x / self.width * (self.bounds.max_lng - self.bounds.min_lng);
        let lat =
            self.bounds.max_lat - p.y / self.height * (self.bounds.max_lat - self.bounds.min_lat);
        GeoPoint::new(lat, lng)
    }

    /// Clamp a surface point into the surface rectangle.
    pub fn clamp(&self, p: &SurfacePoint) -> SurfacePoint {
        SurfacePoint::new(p.x.clamp(0.0, self.width), p.y.clamp(0.0, self.height))
    }
}
