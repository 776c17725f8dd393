use alloc::vec::Vec;
use hush_core::{Pattern, CALIBRATION_GAP, TERMINATOR_GAP};

/// Appends the calibration gap. A frame of N magnitudes becomes N + 1 pulses.
pub fn frame(gaps: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(gaps.len() + 1);
    out.extend_from_slice(gaps);
    out.push(CALIBRATION_GAP);
    out
}

/// `[0] + starter + [10]`. The leading zero fires the anchor pulse
/// the receiver uses to seed its first arrival.
pub fn starter_frame(starter: &Pattern) -> Vec<f64> {
    let mut gaps = Vec::with_capacity(starter.len() + 1);
    gaps.push(0.0);
    gaps.extend_from_slice(starter);
    frame(&gaps)
}

pub fn symbol_frame(pattern: &Pattern) -> Vec<f64> {
    frame(pattern)
}

/// A single oversized idle gap, then the calibration pulse.
pub fn terminator_frame() -> Vec<f64> {
    frame(&[TERMINATOR_GAP])
}
