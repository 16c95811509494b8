// THEORY:
// The `pipeline` module is the final, top-level API for the interaction
// engine. It encapsulates the full stack — smoothing, classification, layout
// and the interaction state machine — into a single interface: landmark
// frames in, cursor points and per-cell messages out.
//
// Key architectural principles:
// 1.  **Synchronous Core, Async Shell**: `InteractionPipeline` is a plain
//     stateful transformer, driven one frame at a time and trivially
//     testable. `spawn_pipeline` wraps it in a single cooperative task that
//     pumps the ingestion hub's broadcast streams, preserving per-source
//     ordering while the two sources interleave freely.
// 2.  **Explicit Configuration**: Every tunable lives in `PipelineConfig`,
//     validated up front and applied atomically by `update_config`. There is
//     no ambient global state; changing handedness or grid shape is a
//     defined operation with defined recomputation.
// 3.  **Exactly One Output Channel**: Failure conditions (missing landmarks,
//     low confidence, no gesture match) travel through the data path as
//     sentinels. The pipeline never throws past construction and
//     reconfiguration, which fail fast on invalid settings.

use crate::core_modules::cursor::{CursorPoint, CursorTracker, Handedness};
use crate::core_modules::gesture::{GestureClassifier, GestureEstimator, HandAction};
use crate::core_modules::grid::{compute_layout, CellGeometry};
use crate::core_modules::ingestion::IngestionHub;
use crate::core_modules::interaction::{
    CellMessage, InteractionCommand, InteractionEngine, InteractionMode,
};
use crate::core_modules::landmark::{BodyFrame, HandFrame, TimedEvent};
use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};

/// Configuration for the interaction pipeline, allowing for tunable behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub columns: u32,
    pub rows: u32,
    /// Gap size as a fraction of the cell unit size.
    pub border_ratio: f64,
    pub interaction_mode: InteractionMode,
    pub handedness: Handedness,
    /// Minimum wrist visibility before falling back to the other hand.
    pub visibility_threshold: f64,
    /// Sliding-window length for cursor smoothing.
    pub smoothing_window: usize,
    /// Normalized-to-pixel magnification of wrist movement.
    pub cursor_scale: f64,
    pub screen_width: f64,
    pub screen_height: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            columns: 5,
            rows: 2,
            border_ratio: 0.25,
            interaction_mode: InteractionMode::Standard,
            handedness: Handedness::Right,
            visibility_threshold: 0.5,
            smoothing_window: 6,
            cursor_scale: 2250.0,
            screen_width: 1920.0,
            screen_height: 1080.0,
        }
    }
}

impl PipelineConfig {
    /// Rejects configurations that are programmer errors rather than
    /// runtime conditions.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.columns >= 1, "columns must be at least 1");
        ensure!(self.rows >= 1, "rows must be at least 1");
        ensure!(
            self.screen_width > 0.0 && self.screen_height > 0.0,
            "screen dimensions must be positive"
        );
        ensure!(self.smoothing_window >= 1, "smoothing window must be at least 1");
        Ok(())
    }

    fn build_tracker(&self) -> CursorTracker {
        CursorTracker::new(
            self.handedness,
            self.visibility_threshold,
            self.smoothing_window,
            self.cursor_scale,
            self.screen_width,
            self.screen_height,
        )
    }

    fn build_layout(&self) -> Vec<CellGeometry> {
        compute_layout(
            self.columns,
            self.rows,
            self.screen_width,
            self.screen_height,
            self.border_ratio,
        )
    }
}

/// Everything one input frame produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameOutput {
    /// Present once the smoothing window has filled (body frames only).
    pub cursor: Option<CursorPoint>,
    /// A new hand action edge, if this frame produced one (hand frames only).
    pub action: Option<HandAction>,
    /// Per-cell transition and selection messages.
    pub messages: Vec<CellMessage>,
}

/// The main, top-level struct for the interaction engine.
pub struct InteractionPipeline {
    config: PipelineConfig,
    cells: Vec<CellGeometry>,
    tracker: CursorTracker,
    classifier: GestureClassifier,
    engine: InteractionEngine,
}

impl InteractionPipeline {
    /// Builds the full stack from a validated configuration and an external
    /// gesture estimator.
    pub fn new(config: PipelineConfig, estimator: GestureEstimator) -> Result<Self> {
        config.validate()?;
        let cells = config.build_layout();
        let engine = InteractionEngine::new(cells.clone(), config.interaction_mode);
        Ok(Self {
            tracker: config.build_tracker(),
            classifier: GestureClassifier::new(estimator),
            engine,
            cells,
            config,
        })
    }

    /// Runs one body frame through wrist selection, smoothing and hit
    /// testing. Emits a cursor point (once the window is full) plus the
    /// rollover/rollout delta it caused.
    pub fn process_body_frame(&mut self, event: &TimedEvent<BodyFrame>) -> FrameOutput {
        let cursor = self.tracker.process(&event.data);
        let messages = match &cursor {
            Some(point) => self.engine.cursor_moved(point),
            None => Vec::new(),
        };
        FrameOutput {
            cursor,
            action: None,
            messages,
        }
    }

    /// Runs one hand frame through the gesture stage chain. A closed-hand
    /// edge doubles as a click on the currently active cells.
    pub fn process_hand_frame(&mut self, event: &TimedEvent<HandFrame>) -> FrameOutput {
        let action = self.classifier.process(&event.data);
        let messages = match action {
            Some(HandAction::HandClosed) => self.engine.command(InteractionCommand::Click),
            _ => Vec::new(),
        };
        FrameOutput {
            cursor: None,
            action,
            messages,
        }
    }

    /// Injects a discrete command from outside the landmark streams, e.g. a
    /// global clear-all.
    pub fn command(&mut self, command: InteractionCommand) -> Vec<CellMessage> {
        self.engine.command(command)
    }

    /// Applies a new configuration atomically: the layout is recomputed,
    /// stale cell ids are dropped, the smoothing window restarts and the
    /// interaction policy switches. The next cursor update reconciles.
    pub fn update_config(&mut self, config: PipelineConfig) -> Result<()> {
        config.validate()?;
        info!(
            columns = config.columns,
            rows = config.rows,
            mode = ?config.interaction_mode,
            "applying pipeline configuration"
        );
        self.cells = config.build_layout();
        self.engine.set_cells(self.cells.clone());
        self.engine.set_mode(config.interaction_mode);
        self.tracker = config.build_tracker();
        self.config = config;
        Ok(())
    }

    /// Current cell geometry, for the presentation layer.
    pub fn cells(&self) -> &[CellGeometry] {
        &self.cells
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

/// Receiving ends of a spawned pipeline's output streams.
pub struct PipelineOutputs {
    pub cursors: mpsc::UnboundedReceiver<CursorPoint>,
    pub actions: mpsc::UnboundedReceiver<HandAction>,
    pub messages: mpsc::UnboundedReceiver<CellMessage>,
}

/// Drives a pipeline from an ingestion hub inside a single cooperative task.
///
/// Per-source ordering is preserved end-to-end; the body and hand streams
/// interleave with no cross-source guarantee. The task ends once both
/// producers have closed their streams.
pub fn spawn_pipeline(mut pipeline: InteractionPipeline, hub: &IngestionHub) -> PipelineOutputs {
    let mut body_rx = hub.subscribe_body();
    let mut hand_rx = hub.subscribe_hand();
    let (cursor_tx, cursors) = mpsc::unbounded_channel();
    let (action_tx, actions) = mpsc::unbounded_channel();
    let (message_tx, messages) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let mut body_open = true;
        let mut hand_open = true;
        while body_open || hand_open {
            tokio::select! {
                received = body_rx.recv(), if body_open => match received {
                    Ok(event) => {
                        let output = pipeline.process_body_frame(&event);
                        if let Some(point) = output.cursor {
                            let _ = cursor_tx.send(point);
                        }
                        for message in output.messages {
                            let _ = message_tx.send(message);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(missed, "body subscriber lagged, skipping to newest frame");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        body_open = false;
                    }
                },
                received = hand_rx.recv(), if hand_open => match received {
                    Ok(event) => {
                        let output = pipeline.process_hand_frame(&event);
                        if let Some(action) = output.action {
                            let _ = action_tx.send(action);
                        }
                        for message in output.messages {
                            let _ = message_tx.send(message);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(missed, "hand subscriber lagged, skipping to newest frame");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        hand_open = false;
                    }
                },
            }
        }
        info!("landmark producers closed, pipeline task finished");
    });

    PipelineOutputs {
        cursors,
        actions,
        messages,
    }
}
