// THEORY:
// The `gesture` module turns the raw per-frame output of an external hand
// gesture estimator into a debounced stream of discrete action edges. The
// estimator itself (curl geometry, matching math) is a black box supplied as
// a function; this module owns everything after it.
//
// Key architectural principles:
// 1.  **Single-Hand Contract**: Only the first detected hand is classified.
//     This is a deliberate structural simplification that downstream
//     consumers depend on; it is preserved, not generalized.
// 2.  **Cascaded Deduplication**: The stage chain — gesture lists, then
//     winners, then actions — deduplicates consecutive identical values at
//     every step, so downstream only ever observes *changes*. A frame that
//     changes nothing produces nothing.
// 3.  **Winner-Take-All**: Among a frame's candidate gestures the single
//     winner is found with a running best seeded at a fixed confidence
//     threshold and updated only on strict improvement, scanning in input
//     order. No candidate above the threshold means no winner.
// 4.  **Edges, Never Levels**: The output is `HandOpened` / `HandClosed`
//     transitions. Unrecognized winners are filtered out rather than
//     surfaced, so consumers never see a "none" action.

use crate::core_modules::landmark::{HandFrame, Landmark};
use tracing::debug;

/// Gesture names the external estimator is expected to produce.
pub const OPEN_HAND: &str = "open hand";
pub const CLOSED_HAND: &str = "closed hand";

/// A candidate's confidence must strictly exceed this (in the estimator's
/// own confidence units, roughly 0-10) to become the winner.
const WINNER_SCORE_THRESHOLD: f64 = 8.0;

/// One named gesture candidate from the external estimator.
#[derive(Debug, Clone, PartialEq)]
pub struct HandGesture {
    pub name: String,
    pub confidence: f64,
}

/// A discrete hand action edge. There is deliberately no `None` variant;
/// frames without a recognized transition simply emit nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandAction {
    HandOpened,
    HandClosed,
}

/// The supplied external classifier: joint landmarks in, zero or more named
/// gestures out. Its internal matching threshold is its own concern.
pub type GestureEstimator = Box<dyn Fn(&[Landmark]) -> Vec<HandGesture> + Send>;

/// Debounces estimator output into a stream of hand action edges.
pub struct GestureClassifier {
    estimator: GestureEstimator,
    last_gestures: Option<Vec<HandGesture>>,
    last_winner: Option<String>,
    last_action: Option<HandAction>,
}

impl GestureClassifier {
    pub fn new(estimator: GestureEstimator) -> Self {
        Self {
            estimator,
            last_gestures: None,
            last_winner: None,
            last_action: None,
        }
    }

    /// Runs one hand frame through the stage chain. Returns an action only
    /// when this frame produces a new edge.
    pub fn process(&mut self, frame: &HandFrame) -> Option<HandAction> {
        let gestures = match frame.hands.first() {
            Some(hand) => (self.estimator)(hand),
            None => Vec::new(),
        };

        // Stage 1: drop frames whose gesture list is structurally unchanged.
        if self.last_gestures.as_deref() == Some(gestures.as_slice()) {
            return None;
        }
        self.last_gestures = Some(gestures.clone());

        let winner = Self::select_winner(&gestures);

        // Stage 2: drop consecutive identical winners.
        if self.last_winner.as_deref() == Some(winner.as_str()) {
            return None;
        }
        debug!(winner = %winner, "gesture winner changed");
        self.last_winner = Some(winner.clone());

        // Stage 3: map to an action, filter unrecognized winners, dedupe.
        let action = match winner.as_str() {
            OPEN_HAND => HandAction::HandOpened,
            CLOSED_HAND => HandAction::HandClosed,
            _ => return None,
        };
        if self.last_action == Some(action) {
            return None;
        }
        self.last_action = Some(action);
        Some(action)
    }

    /// Single-pass winner selection. The running best is seeded at the score
    /// threshold and only a strictly greater confidence takes the lead, so
    /// input order is the tie-break.
    fn select_winner(gestures: &[HandGesture]) -> String {
        let mut winner = "";
        let mut running_best = WINNER_SCORE_THRESHOLD;
        for gesture in gestures {
            if gesture.confidence > running_best {
                winner = &gesture.name;
                running_best = gesture.confidence;
            }
        }
        if winner.is_empty() {
            "none".to_string()
        } else {
            winner.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gesture(name: &str, confidence: f64) -> HandGesture {
        HandGesture {
            name: name.to_string(),
            confidence,
        }
    }

    fn frame_for(gestures: Vec<HandGesture>) -> (GestureClassifier, HandFrame) {
        // Each call builds a classifier whose estimator replays a fixed list.
        let classifier = GestureClassifier::new(Box::new(move |_| gestures.clone()));
        let frame = HandFrame {
            hands: vec![vec![Landmark::ZERO; 21]],
        };
        (classifier, frame)
    }

    fn scripted_classifier(script: Vec<Vec<HandGesture>>) -> GestureClassifier {
        // Replays a fixed per-frame script, then returns empty lists.
        let cursor = std::cell::Cell::new(0usize);
        GestureClassifier::new(Box::new(move |_| {
            let i = cursor.get();
            cursor.set(i + 1);
            script.get(i).cloned().unwrap_or_default()
        }))
    }

    fn hand_frame() -> HandFrame {
        HandFrame {
            hands: vec![vec![Landmark::ZERO; 21]],
        }
    }

    #[test]
    fn later_strictly_greater_confidence_wins() {
        let (mut classifier, frame) = frame_for(vec![
            gesture(OPEN_HAND, 9.0),
            gesture(CLOSED_HAND, 9.5),
        ]);
        assert_eq!(classifier.process(&frame), Some(HandAction::HandClosed));
    }

    #[test]
    fn equal_confidence_keeps_the_first_winner() {
        let (mut classifier, frame) = frame_for(vec![
            gesture(CLOSED_HAND, 9.0),
            gesture(OPEN_HAND, 9.0),
        ]);
        assert_eq!(classifier.process(&frame), Some(HandAction::HandClosed));
    }

    #[test]
    fn nothing_above_threshold_means_no_action() {
        let (mut classifier, frame) = frame_for(vec![
            gesture(OPEN_HAND, 7.9),
            gesture(CLOSED_HAND, 8.0),
        ]);
        // 8.0 does not strictly exceed the seed of 8.0.
        assert_eq!(classifier.process(&frame), None);
    }

    #[test]
    fn empty_hand_set_produces_no_action() {
        let mut classifier = scripted_classifier(vec![]);
        assert_eq!(classifier.process(&HandFrame::default()), None);
    }

    #[test]
    fn unrecognized_winner_is_filtered() {
        let (mut classifier, frame) = frame_for(vec![gesture("thumbs up", 9.9)]);
        assert_eq!(classifier.process(&frame), None);
    }

    #[test]
    fn consecutive_identical_frames_emit_once() {
        let mut classifier = scripted_classifier(vec![
            vec![gesture(OPEN_HAND, 9.0)],
            vec![gesture(OPEN_HAND, 9.0)],
            vec![gesture(OPEN_HAND, 9.0)],
        ]);
        let frame = hand_frame();
        assert_eq!(classifier.process(&frame), Some(HandAction::HandOpened));
        assert_eq!(classifier.process(&frame), None);
        assert_eq!(classifier.process(&frame), None);
    }

    #[test]
    fn action_edges_alternate_through_noise() {
        let mut classifier = scripted_classifier(vec![
            vec![gesture(OPEN_HAND, 9.0)],
            // Confidence wobble changes the gesture list but not the winner.
            vec![gesture(OPEN_HAND, 9.4)],
            // Unrecognized interloper must not break the open->closed edge.
            vec![gesture("thumbs up", 9.9)],
            vec![gesture(CLOSED_HAND, 9.0)],
            vec![gesture(OPEN_HAND, 8.5)],
        ]);
        let frame = hand_frame();
        let edges: Vec<_> = (0..5).filter_map(|_| classifier.process(&frame)).collect();
        assert_eq!(
            edges,
            vec![
                HandAction::HandOpened,
                HandAction::HandClosed,
                HandAction::HandOpened,
            ]
        );
    }

    #[test]
    fn hand_reappearing_with_same_gesture_does_not_reemit() {
        let mut classifier = scripted_classifier(vec![
            vec![gesture(OPEN_HAND, 9.0)],
            vec![gesture(OPEN_HAND, 9.0)],
        ]);
        let frame = hand_frame();
        assert_eq!(classifier.process(&frame), Some(HandAction::HandOpened));
        // Hand disappears: gesture list changes to empty, winner becomes
        // "none", but no action edge is produced.
        assert_eq!(classifier.process(&HandFrame::default()), None);
        // Hand returns still open: winner changes back to "open hand" but the
        // action stream already ended on HandOpened, so nothing is emitted.
        assert_eq!(classifier.process(&frame), None);
    }
}
