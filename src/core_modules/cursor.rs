// THEORY:
// The `cursor` module turns a stream of noisy body-pose frames into a
// stabilized on-screen cursor. It is the temporal smoothing layer of the
// engine: per-frame wrist observations are unreliable (occlusion, low
// confidence, dropped landmarks), so a raw feed would make the cursor jitter
// and teleport.
//
// Key architectural principles:
// 1.  **Preference with Fallback**: The tracker follows one preferred wrist
//     but falls back to the other when the preferred one is not visible
//     enough, and as a last resort reports the preferred wrist regardless.
//     A frame always selects *something*; reliability is judged later.
// 2.  **Sliding-Window Averaging**: The last N selected landmarks are kept in
//     a window advancing by one per frame. Only entries above the visibility
//     gate participate in the average, so a few bad frames inside the window
//     do not drag the cursor toward garbage positions.
// 3.  **Mirrored Wrist Indices**: The pose estimator labels left and right
//     relative to the subject, while the upstream video feed is horizontally
//     flipped. The index constants below compensate for this deliberately;
//     "fixing" them would swap the user's hands on screen.
// 4.  **Invisible, Not Absent**: When the whole window is untrustworthy the
//     tracker still emits a point, flagged `visible: false`. Downstream
//     consumers receive exactly one cursor event per smoothed frame.

use crate::core_modules::landmark::{average_landmarks, BodyFrame, Landmark};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::trace;

// Wrist indices flipped because the upstream video feed is flipped.
pub const RIGHT_WRIST_INDEX: usize = 16;
pub const LEFT_WRIST_INDEX: usize = 15;

/// A smoothed visibility above this marks the cursor visible.
const CURSOR_VISIBILITY_THRESHOLD: f64 = 0.5;

/// Which wrist the tracker prefers to follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handedness {
    Left,
    Right,
}

/// The tracker's output in screen-pixel space. `visible: false` means no
/// sufficiently confident landmark backed this point; it must not be treated
/// as a real pointer location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorPoint {
    pub x: f64,
    pub y: f64,
    pub visible: bool,
}

/// Selects, smooths and screen-maps a wrist landmark per body frame.
pub struct CursorTracker {
    preference: Handedness,
    visibility_threshold: f64,
    window_size: usize,
    window: VecDeque<Landmark>,
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl CursorTracker {
    /// Window size must be at least 1; the pipeline validates this before
    /// construction.
    pub fn new(
        preference: Handedness,
        visibility_threshold: f64,
        window_size: usize,
        scale: f64,
        screen_width: f64,
        screen_height: f64,
    ) -> Self {
        Self {
            preference,
            visibility_threshold,
            window_size,
            window: VecDeque::with_capacity(window_size + 1),
            scale,
            offset_x: screen_width / 2.0,
            offset_y: screen_height / 2.0,
        }
    }

    /// Changes the followed wrist. The smoothing window is cleared so samples
    /// from the previous subscription cannot leak into the new one.
    pub fn set_preference(&mut self, preference: Handedness) {
        self.preference = preference;
        self.window.clear();
    }

    /// Feeds one body frame through selection and smoothing. Returns `None`
    /// until the window has filled (the first N-1 frames), then exactly one
    /// point per frame.
    pub fn process(&mut self, frame: &BodyFrame) -> Option<CursorPoint> {
        let selected = self.select_wrist(frame);
        self.window.push_back(selected);
        if self.window.len() > self.window_size {
            self.window.pop_front();
        }
        if self.window.len() < self.window_size {
            return None;
        }

        let samples: Vec<Landmark> = self.window.iter().copied().collect();
        let smoothed = average_landmarks(&samples);
        let point = self.to_screen(&smoothed);
        trace!(x = point.x, y = point.y, visible = point.visible, "cursor");
        Some(point)
    }

    /// Preferred wrist if visible enough, else the other wrist if visible
    /// enough, else the preferred wrist regardless.
    fn select_wrist(&self, frame: &BodyFrame) -> Landmark {
        let right = frame.landmark(RIGHT_WRIST_INDEX);
        let left = frame.landmark(LEFT_WRIST_INDEX);
        let (preferred, other) = match self.preference {
            Handedness::Right => (right, left),
            Handedness::Left => (left, right),
        };

        let visibility = |lm: &Landmark| lm.visibility.unwrap_or(0.0);
        if visibility(&preferred) >= self.visibility_threshold {
            preferred
        } else if visibility(&other) >= self.visibility_threshold {
            other
        } else {
            preferred
        }
    }

    /// Maps a normalized landmark into screen pixels. The x axis is negated
    /// to undo the horizontal flip of the video feed.
    fn to_screen(&self, landmark: &Landmark) -> CursorPoint {
        CursorPoint {
            x: (landmark.x - 0.5) * -self.scale + self.offset_x,
            y: (landmark.y - 0.5) * self.scale + self.offset_y,
            visible: landmark
                .visibility
                .is_some_and(|v| v > CURSOR_VISIBILITY_THRESHOLD),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCALE: f64 = 2250.0;

    fn tracker(preference: Handedness, window_size: usize) -> CursorTracker {
        CursorTracker::new(preference, 0.5, window_size, SCALE, 1920.0, 1080.0)
    }

    fn frame_with_wrists(left: Landmark, right: Landmark) -> BodyFrame {
        let mut pose_landmarks = vec![Landmark::ZERO; 33];
        pose_landmarks[LEFT_WRIST_INDEX] = left;
        pose_landmarks[RIGHT_WRIST_INDEX] = right;
        BodyFrame { pose_landmarks }
    }

    fn wrist(x: f64, visibility: f64) -> Landmark {
        Landmark {
            x,
            y: 0.5,
            z: 0.0,
            visibility: Some(visibility),
        }
    }

    #[test]
    fn prefers_the_configured_wrist() {
        let mut t = tracker(Handedness::Right, 1);
        let point = t
            .process(&frame_with_wrists(wrist(0.25, 0.9), wrist(0.75, 0.9)))
            .expect("window of one emits immediately");
        // Right wrist at x=0.75, mapped with the mirroring negation.
        assert_eq!(point.x, (0.75 - 0.5) * -SCALE + 960.0);
        assert!(point.visible);
    }

    #[test]
    fn falls_back_to_the_other_wrist_when_preferred_is_unsure() {
        let mut t = tracker(Handedness::Right, 1);
        let point = t
            .process(&frame_with_wrists(wrist(0.25, 0.9), wrist(0.75, 0.2)))
            .expect("point");
        // The preferred right wrist is unsure, so the left one is mapped.
        assert_eq!(point.x, (0.25 - 0.5) * -SCALE + 960.0);
    }

    #[test]
    fn last_resort_returns_preferred_wrist_invisible() {
        let mut t = tracker(Handedness::Left, 1);
        let point = t
            .process(&frame_with_wrists(wrist(0.2, 0.1), wrist(0.7, 0.1)))
            .expect("point");
        // Both below threshold: preferred (left) wrist is kept, but the
        // window average then excludes it, so the zero sentinel is mapped.
        assert_eq!(point.x, (0.0 - 0.5) * -SCALE + 960.0);
        assert!(!point.visible);
    }

    #[test]
    fn emits_nothing_until_the_window_fills() {
        let mut t = tracker(Handedness::Right, 6);
        let frame = frame_with_wrists(wrist(0.375, 0.9), wrist(0.625, 0.9));
        for _ in 0..5 {
            assert_eq!(t.process(&frame), None);
        }
        assert!(t.process(&frame).is_some());
        // Window now slides by one: every further frame emits.
        assert!(t.process(&frame).is_some());
    }

    #[test]
    fn uniform_window_maps_the_input_exactly() {
        let mut t = tracker(Handedness::Right, 5);
        let frame = frame_with_wrists(wrist(0.1, 0.9), wrist(0.25, 0.8));
        let point = (0..5).filter_map(|_| t.process(&frame)).last().expect("point");
        assert_eq!(point.x, (0.25 - 0.5) * -SCALE + 960.0);
        assert_eq!(point.y, (0.5 - 0.5) * SCALE + 540.0);
        assert!(point.visible);
    }

    #[test]
    fn bad_frames_inside_the_window_are_excluded() {
        let mut t = tracker(Handedness::Right, 3);
        let good = frame_with_wrists(wrist(0.0, 0.0), wrist(0.3, 0.9));
        let bad = frame_with_wrists(wrist(0.0, 0.0), wrist(0.9, 0.1));
        t.process(&good);
        t.process(&good);
        let point = t.process(&bad).expect("window full");
        // The bad frame selects the right wrist as last resort but its low
        // visibility keeps it out of the average.
        assert_eq!(point.x, (0.3 - 0.5) * -SCALE + 960.0);
    }

    #[test]
    fn preference_change_tears_down_the_window() {
        let mut t = tracker(Handedness::Right, 3);
        let frame = frame_with_wrists(wrist(0.25, 0.9), wrist(0.75, 0.9));
        t.process(&frame);
        t.process(&frame);
        t.set_preference(Handedness::Left);
        // The old subscription's samples are gone; the window refills.
        assert_eq!(t.process(&frame), None);
        assert_eq!(t.process(&frame), None);
        let point = t.process(&frame).expect("refilled");
        assert_eq!(point.x, (0.25 - 0.5) * -SCALE + 960.0);
    }

    #[test]
    fn empty_pose_frame_counts_as_an_invisible_sample() {
        let mut t = tracker(Handedness::Right, 2);
        t.process(&BodyFrame::default());
        let point = t
            .process(&BodyFrame::default())
            .expect("one point per frame once full");
        assert!(!point.visible);
    }
}
