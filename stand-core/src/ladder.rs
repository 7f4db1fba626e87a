//! Resistor-ladder decoding: one analog pin, several discrete positions.

/// Level reported when the sample sits below every threshold.
pub const LEVEL_NONE: u8 = 0;

/// Decodes a raw analog sample against ascending `thresholds`.
///
/// A sample below the first threshold is level 0. Otherwise the level is one
/// more than the number of thresholds at or below the sample, so a sample
/// equal to a threshold belongs to the band above it and a sample past the
/// last threshold reads as `thresholds.len() + 1`. Level 1 is never produced.
pub fn decode(thresholds: &[u16], sample: u16) -> u8 {
    let crossed = thresholds.iter().take_while(|&&t| sample >= t).count();

    if crossed == 0 {
        LEVEL_NONE
    } else {
        (crossed + 1) as u8
    }
}

/// Checks that `thresholds` is usable as a ladder.
pub fn is_valid(thresholds: &[u16]) -> bool {
    !thresholds.is_empty()
        && thresholds.len() < u8::MAX as usize
        && thresholds.windows(2).all(|pair| pair[0] < pair[1])
}
