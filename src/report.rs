//! Console lines printed for each processed image.

use crate::hand::HandRecord;

/// `Handedness: [Right (0.97), Left (0.88)]`, or `Handedness: None` when no hand was found.
pub fn handedness_line(hands: &[HandRecord]) -> String {
    if hands.is_empty() {
        return "Handedness: None".to_string();
    }

    let labels = hands
        .iter()
        .map(|hand| hand.handedness().to_string())
        .collect::<Vec<_>>();
    format!("Handedness: [{}]", labels.join(", "))
}

/// `Index finger tip coordinates: (123.45, 67.89)`, in pixels.
pub fn fingertip_line(x: f32, y: f32) -> String {
    format!("Index finger tip coordinates: ({:.2}, {:.2})", x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::{Handedness, NormalizedLandmark, NUM_LANDMARKS};

    #[test]
    fn test_handedness_line() {
        assert_eq!(handedness_line(&[]), "Handedness: None");

        let landmarks = [NormalizedLandmark::default(); NUM_LANDMARKS];
        let hands = [
            HandRecord::new(Handedness::from_raw_score(0.97), landmarks),
            HandRecord::new(Handedness::from_raw_score(0.25), landmarks),
        ];
        assert_eq!(
            handedness_line(&hands),
            "Handedness: [Left (0.97), Right (0.75)]"
        );
    }

    #[test]
    fn test_fingertip_line() {
        assert_eq!(
            fingertip_line(123.456, 7.0),
            "Index finger tip coordinates: (123.46, 7.00)"
        );
    }
}
