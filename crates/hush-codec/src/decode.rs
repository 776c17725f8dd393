use hush_core::{Alphabet, Symbol, TimingWindow, CALIBRATION_GAP, PATTERN_LEN};

/// Best alphabet match for one window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedSymbol {
    pub symbol: Symbol,
    /// Estimated channel delay: observed calibration gap minus `CALIBRATION_GAP`.
    pub delay: f64,
    /// Summed absolute deviation of the winning entry.
    pub score: f64,
}

/// Nearest-neighbour match of a window against the alphabet.
///
/// The calibration gap gives a uniform delay estimate which is removed from
/// every content gap before scoring:
/// `score(e) = sum |e[i] - content[i] + delay|`.
/// Entries are scored in alphabet order and only a strictly lower score
/// replaces the current best, so ties go to the earlier entry.
pub fn decode(window: &TimingWindow, alphabet: &Alphabet) -> DecodedSymbol {
    let delay = window.calibration() - CALIBRATION_GAP;
    let content = window.content();

    let mut best = DecodedSymbol {
        symbol: Symbol::Starter,
        delay,
        score: f64::INFINITY,
    };

    for (symbol, pattern) in alphabet.iter() {
        let mut score = 0.0;
        for i in 0..PATTERN_LEN {
            score += abs(pattern[i] - content[i] + delay);
        }
        if score < best.score {
            best.score = score;
            best.symbol = *symbol;
        }
    }

    best
}

fn abs(x: f64) -> f64 {
    if x < 0.0 { -x } else { x }
}
