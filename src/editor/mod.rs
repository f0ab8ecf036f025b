//! Edit mode state machine and input routing.
//!
//! All pointer and key events flow through [`EditorController`], which
//! dispatches them to the active mode. Modes are mutually exclusive:
//! entering one while another is active is refused with
//! [`PoiMapError::ModeBusy`], and exiting always lands back in
//! [`EditMode::Idle`] with the mode's selection state cleared.
//!
//! Escape is the universal reset key: with a selection it clears that
//! element's overlay of the mode's kind and deselects; with nothing
//! selected it exits the mode.

pub mod break_lines;
pub mod hit;

pub use break_lines::BreakLineEditor;
pub use hit::{entity_position, hit_test};

use std::time::Instant;

use crate::overlay::OverlayStore;
use crate::persist::{OverlayKind, PersistQueue};
use crate::render::{RenderScene, DEFAULT_POI_SIZE};
use crate::{EntityKey, PoiMapError, Result, SurfacePoint};

/// Size adjustment per resize notch, in px.
pub const SIZE_STEP: f64 = 5.0;
/// Smallest allowed entity size, in px.
pub const SIZE_MIN: f64 = 20.0;
/// Largest allowed entity size, in px.
pub const SIZE_MAX: f64 = 200.0;
/// Rotation per notch, in degrees.
pub const ROTATE_STEP: f64 = 5.0;
/// Reshape adjustment per arrow key, in px.
pub const RESHAPE_STEP: f64 = 10.0;

/// The mutually exclusive edit modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    Idle,
    Drag,
    Resize,
    Rotate,
    Reshape,
    BreakLines,
}

impl EditMode {
    fn name(&self) -> &'static str {
        match self {
            EditMode::Idle => "idle",
            EditMode::Drag => "drag",
            EditMode::Resize => "resize",
            EditMode::Rotate => "rotate",
            EditMode::Reshape => "reshape",
            EditMode::BreakLines => "break-lines",
        }
    }
}

/// Pointer buttons the router distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

/// A pointer event delivered by the host.
#[derive(Debug, Clone, Copy)]
pub enum PointerEvent {
    Down {
        position: SurfacePoint,
        button: PointerButton,
    },
    Move {
        position: SurfacePoint,
    },
    Up {
        position: SurfacePoint,
    },
}

/// Keys the editor reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Plus,
    Minus,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
}

/// Everything an event handler needs from the session.
pub struct EditContext<'a> {
    pub scene: &'a RenderScene,
    pub overlays: &'a mut OverlayStore,
    pub queue: &'a mut PersistQueue,
    pub now: Instant,
    pub surface_width: f64,
    pub surface_height: f64,
    /// Base size a cluster falls back to when it has no size override
    pub default_cluster_size: f64,
}

#[derive(Debug)]
struct DragState {
    key: EntityKey,
    original: SurfacePoint,
    grab_dx: f64,
    grab_dy: f64,
}

#[derive(Debug)]
enum ModeState {
    Idle,
    Drag { active: Option<DragState> },
    Resize { selected: Option<EntityKey> },
    Rotate { selected: Option<usize> },
    Reshape { selected: Option<String> },
    BreakLines(BreakLineEditor),
}

impl ModeState {
    fn mode(&self) -> EditMode {
        match self {
            ModeState::Idle => EditMode::Idle,
            ModeState::Drag { .. } => EditMode::Drag,
            ModeState::Resize { .. } => EditMode::Resize,
            ModeState::Rotate { .. } => EditMode::Rotate,
            ModeState::Reshape { .. } => EditMode::Reshape,
            ModeState::BreakLines(_) => EditMode::BreakLines,
        }
    }
}

/// Owns the active mode and routes input events to it.
#[derive(Debug)]
pub struct EditorController {
    state: ModeState,
    notices: Vec<String>,
}

impl Default for EditorController {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorController {
    pub fn new() -> Self {
        Self {
            state: ModeState::Idle,
            notices: Vec::new(),
        }
    }

    /// The active mode.
    pub fn mode(&self) -> EditMode {
        self.state.mode()
    }

    /// Enter an edit mode. Only allowed from idle; entering
    /// [`EditMode::Idle`] is equivalent to [`exit`](Self::exit).
    pub fn enter(&mut self, mode: EditMode) -> Result<()> {
        if mode == EditMode::Idle {
            self.exit();
            return Ok(());
        }

        if self.state.mode() != EditMode::Idle {
            return Err(PoiMapError::ModeBusy {
                requested: mode.name().to_string(),
                active: self.state.mode().name().to_string(),
            });
        }

        self.state = match mode {
            EditMode::Drag => ModeState::Drag { active: None },
            EditMode::Resize => ModeState::Resize { selected: None },
            EditMode::Rotate => ModeState::Rotate { selected: None },
            EditMode::Reshape => ModeState::Reshape { selected: None },
            EditMode::BreakLines => ModeState::BreakLines(BreakLineEditor::new()),
            EditMode::Idle => unreachable!(),
        };
        Ok(())
    }

    /// Leave the active mode and drop its selection state.
    pub fn exit(&mut self) {
        self.state = ModeState::Idle;
    }

    /// User-facing notices accumulated since the last call.
    pub fn take_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }

    /// Route a pointer event to the active mode.
    pub fn on_pointer(&mut self, event: PointerEvent, ctx: &mut EditContext) {
        match &mut self.state {
            ModeState::Idle => {}
            ModeState::Drag { active } => {
                Self::drag_pointer(active, event, ctx);
            }
            ModeState::Resize { selected } => {
                if let PointerEvent::Down {
                    position,
                    button: PointerButton::Primary,
                } = event
                {
                    match hit_test(ctx.scene, &position) {
                        Some(key @ (EntityKey::Cluster(_) | EntityKey::Poi(_))) => {
                            *selected = Some(key);
                        }
                        Some(_) => self
                            .notices
                            .push("Resize applies to POIs and clusters".to_string()),
                        None => {}
                    }
                }
            }
            ModeState::Rotate { selected } => {
                if let PointerEvent::Down {
                    position,
                    button: PointerButton::Primary,
                } = event
                {
                    match hit_test(ctx.scene, &position) {
                        Some(EntityKey::Road(index)) => *selected = Some(index),
                        Some(_) => self
                            .notices
                            .push("Rotation applies to road labels only".to_string()),
                        None => {}
                    }
                }
            }
            ModeState::Reshape { selected } => {
                if let PointerEvent::Down {
                    position,
                    button: PointerButton::Primary,
                } = event
                {
                    match hit_test(ctx.scene, &position) {
                        Some(EntityKey::Cluster(id)) => *selected = Some(id),
                        Some(_) => self
                            .notices
                            .push("Reshape applies to clusters only".to_string()),
                        None => {}
                    }
                }
            }
            ModeState::BreakLines(editor) => match event {
                PointerEvent::Down {
                    position,
                    button: PointerButton::Primary,
                } => {
                    if !editor.primary_click(ctx.scene, ctx.overlays, ctx.queue, ctx.now, &position)
                    {
                        self.notices
                            .push("No connector line near the click".to_string());
                    }
                }
                PointerEvent::Down {
                    button: PointerButton::Secondary,
                    ..
                } => editor.secondary_click(ctx.queue, ctx.now),
                PointerEvent::Move { position } => {
                    editor.pointer_move(
                        ctx.overlays,
                        ctx.surface_width,
                        ctx.surface_height,
                        &position,
                    );
                }
                PointerEvent::Up { .. } => {}
            },
        }
    }

    /// Route a key press to the active mode.
    pub fn on_key(&mut self, key: Key, ctx: &mut EditContext) {
        if key == Key::Escape {
            self.escape(ctx);
            return;
        }

        match &mut self.state {
            ModeState::Resize {
                selected: Some(entity),
            } => {
                let step = match key {
                    Key::Plus => SIZE_STEP,
                    Key::Minus => -SIZE_STEP,
                    _ => return,
                };
                let storage = entity.storage_key();
                let default = match entity {
                    EntityKey::Cluster(_) => ctx.default_cluster_size,
                    _ => DEFAULT_POI_SIZE,
                };
                let current = ctx.overlays.size(&storage).unwrap_or(default);
                ctx.overlays
                    .set_size(&storage, (current + step).clamp(SIZE_MIN, SIZE_MAX));
                ctx.queue.schedule(OverlayKind::Sizes, ctx.now);
            }
            ModeState::Rotate {
                selected: Some(index),
            } => {
                let step = match key {
                    Key::Plus => ROTATE_STEP,
                    Key::Minus => -ROTATE_STEP,
                    _ => return,
                };
                let storage = EntityKey::Road(*index).storage_key();
                let current = ctx.overlays.rotation(&storage);
                ctx.overlays.set_rotation(&storage, current + step);
                ctx.queue.schedule(OverlayKind::Rotations, ctx.now);
            }
            ModeState::Reshape {
                selected: Some(cluster_id),
            } => {
                let (dw, dh) = match key {
                    Key::ArrowRight => (RESHAPE_STEP, 0.0),
                    Key::ArrowLeft => (-RESHAPE_STEP, 0.0),
                    Key::ArrowDown => (0.0, RESHAPE_STEP),
                    Key::ArrowUp => (0.0, -RESHAPE_STEP),
                    _ => return,
                };
                let storage = EntityKey::Cluster(cluster_id.clone()).storage_key();
                ctx.overlays.adjust_reshape(&storage, dw, dh);
                ctx.queue.schedule(OverlayKind::Reshapes, ctx.now);
            }
            _ => {}
        }
    }

    fn escape(&mut self, ctx: &mut EditContext) {
        match &mut self.state {
            ModeState::Idle => {}
            ModeState::Drag { active } => {
                if let Some(drag) = active.take() {
                    ctx.overlays.clear_position(&drag.key.storage_key());
                    ctx.queue.schedule(OverlayKind::DraggedPositions, ctx.now);
                } else {
                    self.exit();
                }
            }
            ModeState::Resize { selected } => {
                if let Some(entity) = selected.take() {
                    ctx.overlays.clear_size(&entity.storage_key());
                    ctx.queue.schedule(OverlayKind::Sizes, ctx.now);
                } else {
                    self.exit();
                }
            }
            ModeState::Rotate { selected } => {
                if let Some(index) = selected.take() {
                    ctx.overlays
                        .clear_rotation(&EntityKey::Road(index).storage_key());
                    ctx.queue.schedule(OverlayKind::Rotations, ctx.now);
                } else {
                    self.exit();
                }
            }
            ModeState::Reshape { selected } => {
                if let Some(id) = selected.take() {
                    ctx.overlays
                        .clear_reshape(&EntityKey::Cluster(id).storage_key());
                    ctx.queue.schedule(OverlayKind::Reshapes, ctx.now);
                } else {
                    self.exit();
                }
            }
            ModeState::BreakLines(editor) => {
                if editor.has_selection() {
                    editor.reset(ctx.overlays, ctx.queue, ctx.now);
                } else {
                    self.exit();
                }
            }
        }
    }

    fn drag_pointer(active: &mut Option<DragState>, event: PointerEvent, ctx: &mut EditContext) {
        match event {
            PointerEvent::Down {
                position,
                button: PointerButton::Primary,
            } => {
                let Some(key) = hit_test(ctx.scene, &position) else {
                    return;
                };
                let Some(current) = entity_position(ctx.scene, &key) else {
                    return;
                };

                // Keep the first drag's anchor across repeated drags
                let storage = key.storage_key();
                let original = ctx
                    .overlays
                    .position(&storage)
                    .map(|o| o.original)
                    .unwrap_or(current);

                *active = Some(DragState {
                    key,
                    original,
                    grab_dx: position.x - current.x,
                    grab_dy: position.y - current.y,
                });
            }
            PointerEvent::Move { position } => {
                if let Some(drag) = active {
                    let current =
                        SurfacePoint::new(position.x - drag.grab_dx, position.y - drag.grab_dy);
                    ctx.overlays
                        .set_position(&drag.key.storage_key(), drag.original, current);
                }
            }
            PointerEvent::Up { .. } => {
                if active.take().is_some() {
                    ctx.queue.schedule(OverlayKind::DraggedPositions, ctx.now);
                }
            }
            PointerEvent::Down {
                button: PointerButton::Secondary,
                ..
            } => {}
        }
    }
}
