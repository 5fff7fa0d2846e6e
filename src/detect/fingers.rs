//! Extended-finger counting over a 21-point hand landmark set.

use crate::detect::types::{Landmark, PoseSymbol};

/// Landmarks per detected hand.
pub const HAND_LANDMARK_COUNT: usize = 21;

/// Fingertip landmark indices (thumb through pinky).
pub const FINGER_TIPS: [usize; 5] = [4, 8, 12, 16, 20];

/// Proximal-joint landmark indices paired with `FINGER_TIPS`.
pub const FINGER_PIPS: [usize; 5] = [3, 6, 10, 14, 18];

/// Count fingers whose tip sits above its proximal joint.
///
/// A finger counts as extended iff `tip.y < pip.y` — y grows downward in
/// image coordinates. A landmark set shorter than 21 points counts as
/// zero extended fingers.
pub fn count_extended(landmarks: &[Landmark]) -> usize {
    if landmarks.len() < HAND_LANDMARK_COUNT {
        return 0;
    }
    FINGER_TIPS
        .iter()
        .zip(FINGER_PIPS.iter())
        .filter(|(tip, pip)| landmarks[**tip].y < landmarks[**pip].y)
        .count()
}

/// Map an extended-finger count to a pose symbol.
///
/// 1 → One, 2 → Two, anything else (0, 3, 4, 5) → None.
pub fn classify(extended: usize) -> PoseSymbol {
    match extended {
        1 => PoseSymbol::One,
        2 => PoseSymbol::Two,
        _ => PoseSymbol::None,
    }
}

/// Build a 21-landmark hand with the given fingers (0-4) extended.
///
/// Extended fingers get a tip above (numerically below) the proximal
/// joint; curled fingers the opposite. Test scaffolding shared across
/// detection tests.
#[cfg(test)]
pub(crate) fn make_hand_landmarks(extended: &[usize]) -> Vec<Landmark> {
    let mut landmarks = vec![Landmark::new(0.5, 0.5); HAND_LANDMARK_COUNT];
    for (finger, (&tip, &pip)) in FINGER_TIPS.iter().zip(FINGER_PIPS.iter()).enumerate() {
        if extended.contains(&finger) {
            landmarks[tip] = Landmark::new(0.5, 0.2);
            landmarks[pip] = Landmark::new(0.5, 0.4);
        } else {
            landmarks[tip] = Landmark::new(0.5, 0.6);
            landmarks[pip] = Landmark::new(0.5, 0.4);
        }
    }
    landmarks
}
