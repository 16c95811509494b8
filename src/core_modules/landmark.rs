// THEORY:
// The `landmark` module defines the foundational data vocabulary for the entire
// interaction engine. Everything downstream — gesture classification, cursor
// smoothing, hit testing — is a transformation over the types defined here.
//
// Key architectural principles:
// 1.  **Immutable Observations**: A `Landmark` is a single tracked anatomical
//     point captured in one frame. It is a plain value type; once produced by
//     an estimator it is never mutated, only combined into new values.
// 2.  **Visibility as Reliability**: The optional `visibility` field is the
//     estimator's per-landmark confidence. It is a reliability gate, not a
//     depth or opacity value. Averaging and wrist selection both use it to
//     decide whether an observation can be trusted at all.
// 3.  **Ingestion-Time Stamping**: `TimedEvent` wraps every observation with a
//     monotonic timestamp assigned when the frame enters the engine, not by
//     the external producer. Model cadence is irregular; our clock is not.
// 4.  **Sentinels over Errors**: A frame that yields no trustworthy landmark
//     produces the all-zero landmark rather than an error. Failure flows
//     through the normal data channel so every input frame has an output.

use std::time::Instant;

/// Landmarks below this visibility are excluded from window averaging.
pub const VISIBILITY_GATE: f64 = 0.5;

/// A single tracked anatomical point with position and detection confidence,
/// in the producing estimator's frame-local coordinate system.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// The estimator's confidence in [0, 1], when it reports one.
    pub visibility: Option<f64>,
}

impl Landmark {
    /// The sentinel emitted when no trustworthy observation exists.
    pub const ZERO: Landmark = Landmark {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        visibility: Some(0.0),
    };
}

/// An observation stamped with the monotonic time it entered the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedEvent<T> {
    pub t: Instant,
    pub data: T,
}

impl<T> TimedEvent<T> {
    pub fn now(data: T) -> Self {
        Self {
            t: Instant::now(),
            data,
        }
    }
}

/// One frame from the body-pose estimator: a fixed-size indexed array of
/// landmarks using the estimator's own numbering convention.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BodyFrame {
    pub pose_landmarks: Vec<Landmark>,
}

impl BodyFrame {
    /// Looks up a landmark by the estimator's fixed index, returning the zero
    /// sentinel when the frame has no landmark at that position.
    pub fn landmark(&self, index: usize) -> Landmark {
        self.pose_landmarks
            .get(index)
            .copied()
            .unwrap_or(Landmark::ZERO)
    }
}

/// One frame from the hand-landmark detector: a list of detected hands, each
/// a 21-point joint list. Only `hands[0]` is consumed downstream.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HandFrame {
    pub hands: Vec<Vec<Landmark>>,
}

/// Averages x, y, z and visibility independently over exactly the landmarks
/// whose visibility meets [`VISIBILITY_GATE`]. When no entry qualifies the
/// result is the all-zero landmark, never an error.
pub fn average_landmarks(landmarks: &[Landmark]) -> Landmark {
    let mut acc = Landmark::ZERO;
    let mut counter = 0u32;

    for lm in landmarks {
        if let Some(vis) = lm.visibility {
            if vis >= VISIBILITY_GATE {
                acc.x += lm.x;
                acc.y += lm.y;
                acc.z += lm.z;
                acc.visibility = Some(acc.visibility.unwrap_or(0.0) + vis);
                counter += 1;
            }
        }
    }

    if counter > 0 {
        let n = counter as f64;
        acc.x /= n;
        acc.y /= n;
        acc.z /= n;
        acc.visibility = acc.visibility.map(|v| v / n);
        acc
    } else {
        Landmark::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lm(x: f64, y: f64, z: f64, visibility: f64) -> Landmark {
        Landmark {
            x,
            y,
            z,
            visibility: Some(visibility),
        }
    }

    #[test]
    fn averages_landmarks_gated_by_visibility() {
        // Three entries at visibility 0.5 qualify, the 0.3 entry does not.
        let window = [
            lm(1.0, 2.0, 7.0, 0.5),
            lm(1.0, 2.0, 5.0, 0.5),
            lm(1.0, 2.0, 6.0, 0.5),
            lm(1.0, 2.0, 3.0, 0.3),
        ];
        let result = average_landmarks(&window);
        assert_eq!(result, lm(1.0, 2.0, 6.0, 0.5));
    }

    #[test]
    fn uniform_window_averages_to_itself() {
        // Dyadic values keep the sum-then-divide exact.
        let sample = lm(0.25, 0.75, -0.125, 0.5);
        let window = [sample; 6];
        assert_eq!(average_landmarks(&window), sample);
    }

    #[test]
    fn all_invisible_window_yields_zero_sentinel() {
        let window = [
            lm(0.4, 0.4, 0.4, 0.49),
            lm(0.6, 0.6, 0.6, 0.1),
            Landmark {
                x: 0.9,
                y: 0.9,
                z: 0.9,
                visibility: None,
            },
        ];
        assert_eq!(average_landmarks(&window), Landmark::ZERO);
    }

    #[test]
    fn empty_window_yields_zero_sentinel() {
        assert_eq!(average_landmarks(&[]), Landmark::ZERO);
    }

    #[test]
    fn body_frame_lookup_falls_back_to_sentinel() {
        let frame = BodyFrame::default();
        assert_eq!(frame.landmark(16), Landmark::ZERO);

        let frame = BodyFrame {
            pose_landmarks: vec![lm(0.1, 0.2, 0.3, 1.0)],
        };
        assert_eq!(frame.landmark(0), lm(0.1, 0.2, 0.3, 1.0));
        assert_eq!(frame.landmark(15), Landmark::ZERO);
    }
}
