// THEORY:
// The `interaction` module is the decision layer of the engine: it owns the
// only persistent interaction state (which cells are selected) and derives
// the transient state (which cells are active under the cursor) on every
// cursor update. Its output is a delta stream of per-cell messages, never a
// full snapshot, so a presentation layer can animate transitions directly.
//
// Key architectural principles:
// 1.  **Derived Activity, Persistent Selection**: The active set is
//     recomputed from the cursor and the current mode on every update; only
//     its previous value is remembered, for diffing. The selection set is
//     the durable state and changes only on click-style commands.
// 2.  **Policy as Mode**: Three interaction policies share one machine.
//     Standard takes every cell containing the cursor, Proximity always
//     elects the single nearest cell, and Focus keeps the last active set
//     alive when the cursor leaves all cells ("sticky focus").
// 3.  **Delta Emission**: Each cursor update emits rollout messages for
//     cells leaving the active set and rollover messages for cells entering
//     it. A cell present in both the old and new set is not re-announced.
// 4.  **No Stale Identity**: Installing a new cell layout drops every
//     remembered id that no longer exists, so active and selected ids always
//     reference current geometry.

use crate::core_modules::cursor::CursorPoint;
use crate::core_modules::grid::CellGeometry;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which cells count as "active" under the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionMode {
    /// Every cell whose rectangle contains the cursor (inclusive bounds).
    Standard,
    /// Exactly the cell whose center is nearest the cursor.
    Proximity,
    /// Standard hits, but the last active set persists when there are none.
    Focus,
}

/// Transition kinds announced per cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellMessageKind {
    Rollover,
    Rollout,
    Select,
    Unselect,
}

/// One per-cell message for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct CellMessage {
    pub cell_id: String,
    pub kind: CellMessageKind,
}

impl CellMessage {
    fn new(cell_id: &str, kind: CellMessageKind) -> Self {
        Self {
            cell_id: cell_id.to_string(),
            kind,
        }
    }
}

/// Discrete commands driving the machine alongside cursor movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionCommand {
    /// Toggle selection of every currently active cell.
    Click,
    /// Clear the entire selection set.
    UnselectAll,
}

/// The interaction state machine over one grid of cells.
pub struct InteractionEngine {
    cells: Vec<CellGeometry>,
    mode: InteractionMode,
    /// Last computed active set, kept in computation order for diffing.
    active: Vec<String>,
    /// Selected cell ids in selection order.
    selected: Vec<String>,
}

impl InteractionEngine {
    pub fn new(cells: Vec<CellGeometry>, mode: InteractionMode) -> Self {
        Self {
            cells,
            mode,
            active: Vec::new(),
            selected: Vec::new(),
        }
    }

    /// Recomputes the active set for a cursor position and emits the delta:
    /// rollouts for cells leaving, then rollovers for cells entering.
    pub fn cursor_moved(&mut self, cursor: &CursorPoint) -> Vec<CellMessage> {
        let new_active = self.active_cells_for(cursor);

        let mut messages = Vec::new();
        for id in &self.active {
            if !new_active.contains(id) {
                messages.push(CellMessage::new(id, CellMessageKind::Rollout));
            }
        }
        for id in &new_active {
            if !self.active.contains(id) {
                messages.push(CellMessage::new(id, CellMessageKind::Rollover));
            }
        }
        self.active = new_active;
        messages
    }

    /// Applies a discrete command against the current active/selection sets.
    pub fn command(&mut self, command: InteractionCommand) -> Vec<CellMessage> {
        match command {
            InteractionCommand::Click => {
                let mut messages = Vec::new();
                for id in self.active.clone() {
                    if let Some(pos) = self.selected.iter().position(|s| *s == id) {
                        self.selected.remove(pos);
                        messages.push(CellMessage::new(&id, CellMessageKind::Unselect));
                    } else {
                        self.selected.push(id.clone());
                        messages.push(CellMessage::new(&id, CellMessageKind::Select));
                    }
                }
                messages
            }
            InteractionCommand::UnselectAll => {
                debug!(count = self.selected.len(), "clearing selection");
                self.selected
                    .drain(..)
                    .map(|id| CellMessage::new(&id, CellMessageKind::Unselect))
                    .collect()
            }
        }
    }

    /// Switches the interaction policy. No corrective messages are emitted;
    /// the next cursor update reconciles under the new rule.
    pub fn set_mode(&mut self, mode: InteractionMode) {
        self.mode = mode;
    }

    /// Installs a new layout, dropping remembered ids that no longer exist.
    pub fn set_cells(&mut self, cells: Vec<CellGeometry>) {
        self.cells = cells;
        let cells = &self.cells;
        self.active.retain(|id| cells.iter().any(|c| c.id == *id));
        self.selected.retain(|id| cells.iter().any(|c| c.id == *id));
    }

    pub fn active(&self) -> &[String] {
        &self.active
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    fn active_cells_for(&self, cursor: &CursorPoint) -> Vec<String> {
        match self.mode {
            InteractionMode::Standard => self.contained_cells(cursor),
            InteractionMode::Proximity => self.nearest_cell(cursor).into_iter().collect(),
            InteractionMode::Focus => {
                let hits = self.contained_cells(cursor);
                if !hits.is_empty() {
                    hits
                } else if !self.active.is_empty() {
                    // Sticky focus: keep the last active set alive.
                    self.active.clone()
                } else {
                    // First frame with no hits: fall back to the first cell.
                    self.cells.first().map(|c| c.id.clone()).into_iter().collect()
                }
            }
        }
    }

    /// All cells whose rectangle contains the cursor, inclusive on every
    /// edge, in layout order.
    fn contained_cells(&self, cursor: &CursorPoint) -> Vec<String> {
        self.cells
            .iter()
            .filter(|cell| {
                cursor.x >= cell.x
                    && cursor.x <= cell.x + cell.width
                    && cursor.y >= cell.y
                    && cursor.y <= cell.y + cell.height
            })
            .map(|cell| cell.id.clone())
            .collect()
    }

    /// The single cell whose center is nearest the cursor by squared
    /// distance. Strict comparison keeps the first minimum on ties.
    fn nearest_cell(&self, cursor: &CursorPoint) -> Option<String> {
        let mut best: Option<&CellGeometry> = None;
        let mut best_distance = f64::INFINITY;
        for cell in &self.cells {
            let cx = cell.x + cell.width / 2.0;
            let cy = cell.y + cell.height / 2.0;
            let distance = (cursor.x - cx).powi(2) + (cursor.y - cy).powi(2);
            if distance < best_distance {
                best_distance = distance;
                best = Some(cell);
            }
        }
        best.map(|cell| cell.id.clone())
    }
}
