// THEORY:
// This file is the main entry point for the `gesture_grid` library crate.
// It follows the standard Rust convention of using `lib.rs` to define the
// public API that will be exposed to external consumers (a presentation
// layer rendering cells and a cursor, and the capture layer feeding frames).
//
// The primary goal is to export the `InteractionPipeline` and its associated
// data structures (`PipelineConfig`, `FrameOutput`, the cursor and cell
// message types) as the clean, high-level interface for the entire engine.
// The internal stages (`core_modules`) remain addressable for consumers that
// want to compose them differently.

pub mod core_modules;
pub mod pipeline;

pub use crate::core_modules::cursor::{CursorPoint, Handedness};
pub use crate::core_modules::gesture::{GestureEstimator, HandAction, HandGesture};
pub use crate::core_modules::grid::{compute_layout, CellGeometry};
pub use crate::core_modules::ingestion::IngestionHub;
pub use crate::core_modules::interaction::{
    CellMessage, CellMessageKind, InteractionCommand, InteractionMode,
};
pub use crate::core_modules::landmark::{BodyFrame, HandFrame, Landmark, TimedEvent};
pub use crate::pipeline::{
    spawn_pipeline, FrameOutput, InteractionPipeline, PipelineConfig, PipelineOutputs,
};
