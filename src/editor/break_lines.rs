//! Break-line path editing.
//!
//! A connector line joins an entity's computed anchor to its dragged
//! position. This editor lets the user route that line around other
//! elements by inserting, dragging, and removing bend points. Only
//! entities with an active position override have a connector, so the
//! editor can only ever select those.

use std::time::Instant;

use crate::geo_utils::point_to_segment;
use crate::overlay::OverlayStore;
use crate::persist::{OverlayKind, PersistQueue};
use crate::render::RenderScene;
use crate::SurfacePoint;

/// Max distance from a connector segment for selection and insertion, px.
pub const LINE_TOLERANCE: f64 = 10.0;
/// Rendered radius of a bend point, px.
pub const POINT_RADIUS: f64 = 8.0;
/// Extra slack around a bend point when picking it up, px.
pub const POINT_GRAB_SLACK: f64 = 5.0;
/// Bend points stay at least this far inside the surface edges, px.
pub const EDGE_MARGIN: f64 = 20.0;

/// Per-mode state for break-line editing.
#[derive(Debug, Default)]
pub struct BreakLineEditor {
    selected: Option<String>,
    grabbed: Option<usize>,
}

impl BreakLineEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// The storage key of the selected connector, if any.
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Index of the bend point currently being dragged.
    pub fn grabbed(&self) -> Option<usize> {
        self.grabbed
    }

    /// Primary click. Selects a line, picks up a bend point, or inserts
    /// a new one. Returns `false` when the click hit nothing actionable.
    pub fn primary_click(
        &mut self,
        scene: &RenderScene,
        overlays: &mut OverlayStore,
        queue: &mut PersistQueue,
        now: Instant,
        p: &SurfacePoint,
    ) -> bool {
        let Some(key) = self.selected.clone() else {
            if let Some(key) = nearest_line(scene, p) {
                self.selected = Some(key);
                return true;
            }
            return false;
        };

        // Existing bend points take precedence over insertion
        if let Some(path) = overlays.break_path(&key) {
            let grab_radius = POINT_RADIUS + POINT_GRAB_SLACK;
            if let Some(idx) = path
                .points
                .iter()
                .position(|point| p.distance_to(point) <= grab_radius)
            {
                self.grabbed = Some(idx);
                return true;
            }
        }

        let Some(connector) = scene.connectors.iter().find(|c| c.key == key) else {
            return false;
        };

        if let Some(segment) = nearest_segment(&connector.points, p) {
            overlays.break_path_mut(&key).points.insert(segment, *p);
            queue.schedule(OverlayKind::BreakPoints, now);
            return true;
        }

        false
    }

    /// Pointer move. Drags the grabbed bend point, clamped inside the
    /// surface.
    pub fn pointer_move(
        &mut self,
        overlays: &mut OverlayStore,
        surface_width: f64,
        surface_height: f64,
        p: &SurfacePoint,
    ) {
        let (Some(key), Some(idx)) = (self.selected.as_ref(), self.grabbed) else {
            return;
        };

        let clamped = SurfacePoint::new(
            p.x.clamp(EDGE_MARGIN, surface_width - EDGE_MARGIN),
            p.y.clamp(EDGE_MARGIN, surface_height - EDGE_MARGIN),
        );

        let path = overlays.break_path_mut(key);
        if let Some(point) = path.points.get_mut(idx) {
            *point = clamped;
        }
    }

    /// Secondary click. Releases the grabbed bend point, or deselects the
    /// line without discarding its points.
    pub fn secondary_click(&mut self, queue: &mut PersistQueue, now: Instant) {
        if self.grabbed.take().is_some() {
            queue.schedule(OverlayKind::BreakPoints, now);
        } else {
            self.selected = None;
        }
    }

    /// Remove all bend points of the selected line and deselect it.
    pub fn reset(&mut self, overlays: &mut OverlayStore, queue: &mut PersistQueue, now: Instant) {
        if let Some(key) = self.selected.take() {
            overlays.clear_break_path(&key);
            queue.schedule(OverlayKind::BreakPoints, now);
        }
        self.grabbed = None;
    }

    /// Whether the editor has anything selected.
    pub fn has_selection(&self) -> bool {
        self.selected.is_some()
    }
}

/// The connector line nearest the pointer, within tolerance.
fn nearest_line(scene: &RenderScene, p: &SurfacePoint) -> Option<String> {
    let mut best: Option<(f64, &str)> = None;

    for connector in &scene.connectors {
        for window in connector.points.windows(2) {
            let (dist, _) = point_to_segment(p, &window[0], &window[1]);
            if dist <= LINE_TOLERANCE && best.map_or(true, |(d, _)| dist < d) {
                best = Some((dist, &connector.key));
            }
        }
    }

    best.map(|(_, key)| key.to_string())
}

/// Index of the bend-point slot a click on the polyline maps to.
///
/// Segment `i` runs from polyline point `i` to `i + 1`; a bend inserted
/// there lands at index `i` of the break path (the polyline's first point
/// is the connector origin, not a bend).
fn nearest_segment(points: &[SurfacePoint], p: &SurfacePoint) -> Option<usize> {
    let mut best: Option<(f64, usize)> = None;

    for (i, window) in points.windows(2).enumerate() {
        let (dist, _) = point_to_segment(p, &window[0], &window[1]);
        if dist <= LINE_TOLERANCE && best.map_or(true, |(d, _)| dist < d) {
            best = Some((dist, i));
        }
    }

    best.map(|(_, i)| i)
}
