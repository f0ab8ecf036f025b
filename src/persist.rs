//! Write-behind persistence queue.
//!
//! Overlay edits arrive in bursts (a drag emits dozens of moves), so every
//! overlay kind gets a coalescing debounce window: scheduling while a
//! window is open extends it, and only one write goes out when it closes.
//! The caller drives time explicitly through `flush_due`, which keeps
//! tests deterministic and leaves the event loop integration to the host.
//!
//! Failed writes are logged and dropped. Local state stays authoritative,
//! the next edit schedules a fresh write anyway.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use log::warn;

use crate::Result;

/// The overlay kinds that persist independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayKind {
    DraggedPositions,
    Sizes,
    Rotations,
    Reshapes,
    BreakPoints,
    Selection,
    ClusterAssignments,
}

impl OverlayKind {
    /// Debounce window before a scheduled write goes out. Selection
    /// changes arrive in rapid toggles, so they wait longer.
    pub fn debounce(&self) -> Duration {
        match self {
            OverlayKind::Selection => Duration::from_millis(2000),
            _ => Duration::from_millis(1000),
        }
    }

    /// Storage key for the persisted payload.
    pub fn storage_name(&self) -> &'static str {
        match self {
            OverlayKind::DraggedPositions => "draggedPositions",
            OverlayKind::Sizes => "sizes",
            OverlayKind::Rotations => "rotations",
            OverlayKind::Reshapes => "reshapes",
            OverlayKind::BreakPoints => "breakPoints",
            OverlayKind::Selection => "selection",
            OverlayKind::ClusterAssignments => "clusterAssignments",
        }
    }
}

/// Destination for persisted overlay payloads.
pub trait PersistStore {
    /// Write a JSON payload under the kind's storage name.
    fn write(&mut self, kind: OverlayKind, payload: &str) -> Result<()>;
}

/// In-memory store for tests and hosts without real storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<&'static str, String>,
    pub write_count: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: OverlayKind) -> Option<&String> {
        self.entries.get(kind.storage_name())
    }
}

impl PersistStore for MemoryStore {
    fn write(&mut self, kind: OverlayKind, payload: &str) -> Result<()> {
        self.entries.insert(kind.storage_name(), payload.to_string());
        self.write_count += 1;
        Ok(())
    }
}

/// Coalescing write-behind queue over the overlay kinds.
#[derive(Debug, Default)]
pub struct PersistQueue {
    deadlines: HashMap<OverlayKind, Instant>,
}

impl PersistQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the kind's debounce window, or push an open window out again.
    pub fn schedule(&mut self, kind: OverlayKind, now: Instant) {
        self.deadlines.insert(kind, now + kind.debounce());
    }

    /// Kinds with an open window, due or not.
    pub fn pending(&self) -> Vec<OverlayKind> {
        self.deadlines.keys().copied().collect()
    }

    pub fn is_pending(&self, kind: OverlayKind) -> bool {
        self.deadlines.contains_key(&kind)
    }

    /// Write out every kind whose window has closed.
    ///
    /// `payload` renders the current state of a kind to JSON. A payload or
    /// write failure drops that write; the kind leaves the queue either
    /// way. Returns the number of successful writes.
    pub fn flush_due<F>(&mut self, now: Instant, store: &mut dyn PersistStore, payload: F) -> usize
    where
        F: Fn(OverlayKind) -> Result<String>,
    {
        let due: Vec<OverlayKind> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(kind, _)| *kind)
            .collect();

        let mut written = 0;
        for kind in due {
            self.deadlines.remove(&kind);
            written += write_one(store, kind, &payload);
        }
        written
    }

    /// Write out everything pending regardless of deadlines.
    pub fn flush_all<F>(&mut self, store: &mut dyn PersistStore, payload: F) -> usize
    where
        F: Fn(OverlayKind) -> Result<String>,
    {
        let pending: Vec<OverlayKind> = self.deadlines.drain().map(|(kind, _)| kind).collect();

        let mut written = 0;
        for kind in pending {
            written += write_one(store, kind, &payload);
        }
        written
    }

    /// Drop a pending write without emitting it.
    pub fn cancel(&mut self, kind: OverlayKind) {
        self.deadlines.remove(&kind);
    }

    /// Drop all pending writes.
    pub fn cancel_all(&mut self) {
        self.deadlines.clear();
    }
}

fn write_one<F>(store: &mut dyn PersistStore, kind: OverlayKind, payload: &F) -> usize
where
    F: Fn(OverlayKind) -> Result<String>,
{
    let json = match payload(kind) {
        Ok(json) => json,
        Err(e) => {
            warn!("Failed to serialize {} payload: {e}", kind.storage_name());
            return 0;
        }
    };

    match store.write(kind, &json) {
        Ok(()) => 1,
        Err(e) => {
            warn!("Persist write for {} failed: {e}", kind.storage_name());
            0
        }
    }
}
