//! Runtime mode selection shared between the render loop and the control
//! surface.
//!
//! The active mode lives in a single `AtomicU8`. A writer replaces the whole
//! value in one store and the render loop loads it once per frame, so a frame
//! sees either the old or the new mode and never anything in between.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use crate::strategy::VisualizationMode;

/// Lock-free single-slot cell holding the active mode
#[derive(Debug)]
pub struct ModeCell {
    value: AtomicU8,
}

impl ModeCell {
    pub fn new(initial: VisualizationMode) -> Self {
        Self {
            value: AtomicU8::new(initial as u8),
        }
    }

    pub fn get(&self) -> VisualizationMode {
        let raw = self.value.load(Ordering::Acquire);
        // only `set` writes, and it writes valid discriminants
        VisualizationMode::from_repr(raw).unwrap_or_default()
    }

    /// Store a new mode, returning the previous one.
    pub fn set(&self, mode: VisualizationMode) -> VisualizationMode {
        let previous = self.value.swap(mode as u8, Ordering::AcqRel);
        VisualizationMode::from_repr(previous).unwrap_or_default()
    }
}

impl Default for ModeCell {
    fn default() -> Self {
        Self::new(VisualizationMode::default())
    }
}

/// Mode descriptor exposed to operators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeInfo {
    pub id: String,
    pub name: String,
}

impl From<VisualizationMode> for ModeInfo {
    fn from(mode: VisualizationMode) -> Self {
        Self {
            id: mode.id().to_string(),
            name: mode.display_name().to_string(),
        }
    }
}

/// Handle given to control transports (HTTP, CLI, ...).
///
/// Cloning is cheap; all clones write the same cell the engine reads.
#[derive(Debug, Clone)]
pub struct ModeControl {
    cell: Arc<ModeCell>,
}

impl ModeControl {
    pub fn new(cell: Arc<ModeCell>) -> Self {
        Self { cell }
    }

    /// Available modes in presentation order
    pub fn list_modes(&self) -> Vec<ModeInfo> {
        VisualizationMode::ALL.into_iter().map(ModeInfo::from).collect()
    }

    /// Activate the mode with the given id.
    ///
    /// Returns `false` and leaves the active mode untouched if the id is not
    /// recognized.
    pub fn set_mode(&self, id: &str) -> bool {
        match VisualizationMode::from_id(id) {
            Some(mode) => {
                let previous = self.cell.set(mode);
                if previous != mode {
                    info!("Visualization mode changed: {} -> {}", previous.id(), mode.id());
                }
                true
            }
            None => {
                warn!("Rejected unknown visualization mode '{}'", id);
                false
            }
        }
    }

    pub fn current(&self) -> VisualizationMode {
        self.cell.get()
    }
}
