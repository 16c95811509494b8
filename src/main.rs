// Demo runner for the `gesture_grid` library: pushes a synthetic wave of
// body and hand frames through the full pipeline and prints what a
// presentation layer would receive. In a real application the two publish
// calls would be wired to a pose estimator and a hand landmark model.

use anyhow::{Context, Result};
use futures::StreamExt;
use gesture_grid::{
    BodyFrame, GestureEstimator, HandFrame, HandGesture, IngestionHub, InteractionPipeline,
    Landmark, PipelineConfig,
};
use gesture_grid::core_modules::cursor::{LEFT_WRIST_INDEX, RIGHT_WRIST_INDEX};
use gesture_grid::core_modules::gesture::{CLOSED_HAND, OPEN_HAND};
use std::time::Duration;
use tracing::info;

const POSE_LANDMARK_COUNT: usize = 33;
const HAND_LANDMARK_COUNT: usize = 21;

/// Stand-in for a real curl-based classifier: judges the hand open or closed
/// by the average joint spread around the wrist.
fn spread_estimator() -> GestureEstimator {
    Box::new(|landmarks: &[Landmark]| {
        let Some(wrist) = landmarks.first() else {
            return Vec::new();
        };
        let spread = landmarks
            .iter()
            .map(|lm| ((lm.x - wrist.x).powi(2) + (lm.y - wrist.y).powi(2)).sqrt())
            .sum::<f64>()
            / landmarks.len() as f64;
        let (name, confidence) = if spread > 0.12 {
            (OPEN_HAND, 10.0)
        } else {
            (CLOSED_HAND, 10.0)
        };
        vec![HandGesture {
            name: name.to_string(),
            confidence,
        }]
    })
}

/// A body frame whose wrists sweep horizontally across the frame.
fn synthetic_body_frame(step: usize) -> BodyFrame {
    let mut pose_landmarks = vec![Landmark::ZERO; POSE_LANDMARK_COUNT];
    let wrist = Landmark {
        x: 0.2 + 0.01 * step as f64,
        y: 0.5,
        z: 0.0,
        visibility: Some(0.95),
    };
    pose_landmarks[RIGHT_WRIST_INDEX] = wrist;
    pose_landmarks[LEFT_WRIST_INDEX] = wrist;
    BodyFrame { pose_landmarks }
}

/// A hand frame that is open for the first half of the sweep, closed after.
fn synthetic_hand_frame(step: usize, total: usize) -> HandFrame {
    let spread = if step < total / 2 { 0.2 } else { 0.02 };
    let joints = (0..HAND_LANDMARK_COUNT)
        .map(|i| Landmark {
            x: 0.5 + spread * (i % 5) as f64 / 4.0,
            y: 0.5 + spread * (i / 5) as f64 / 4.0,
            z: 0.0,
            visibility: Some(1.0),
        })
        .collect();
    HandFrame { hands: vec![joints] }
}

fn load_config() -> Result<PipelineConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading settings file {path}"))?;
            serde_json::from_str(&raw).with_context(|| format!("parsing settings file {path}"))
        }
        None => Ok(PipelineConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gesture_grid=info".into()),
        )
        .init();

    let config = load_config()?;
    let hub = IngestionHub::new();
    let pipeline = InteractionPipeline::new(config, spread_estimator())?;
    info!(cells = pipeline.cells().len(), "pipeline ready");
    let mut outputs = gesture_grid::spawn_pipeline(pipeline, &hub);

    let total_frames = 60usize;
    let producer = tokio::spawn(async move {
        let mut steps = futures::stream::iter(0..total_frames);
        while let Some(step) = steps.next().await {
            hub.publish_body(synthetic_body_frame(step));
            hub.publish_hand(synthetic_hand_frame(step, total_frames));
            tokio::time::sleep(Duration::from_millis(15)).await;
        }
        // Dropping the hub closes both streams and ends the pipeline task.
    });

    // All three output channels close together once the pipeline task ends,
    // so any None is the shutdown signal.
    loop {
        tokio::select! {
            cursor = outputs.cursors.recv() => match cursor {
                Some(point) => info!(x = point.x, y = point.y, visible = point.visible, "cursor"),
                None => break,
            },
            action = outputs.actions.recv() => match action {
                Some(action) => info!(?action, "hand action edge"),
                None => break,
            },
            message = outputs.messages.recv() => match message {
                Some(message) => info!(cell = %message.cell_id, kind = ?message.kind, "cell message"),
                None => break,
            },
        }
    }

    producer.await.context("frame producer task")?;
    Ok(())
}
