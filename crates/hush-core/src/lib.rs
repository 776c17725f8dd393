#![no_std]
#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

mod alphabet;
pub use alphabet::{Alphabet, Pattern};

/// Content gaps per symbol pattern.
pub const PATTERN_LEN: usize = 5;
/// Gaps per received window: the pattern plus one calibration gap.
pub const WINDOW_LEN: usize = PATTERN_LEN + 1;

/// Trailing magnitude appended to every transmitted sequence.
pub const CALIBRATION_GAP: f64 = 10.0;
/// Idle gap the sender emits to close a bridge (4 s).
pub const TERMINATOR_GAP: f64 = 400.0;
/// Whole seconds of silence the receiver treats as end-of-transmission.
pub const FINISH_THRESHOLD_SECS: u64 = 3;

/// One magnitude unit is a hundredth of a second.
pub const UNIT_US: u64 = 10_000;

/// Reserved alphabet name for the start marker.
pub const STARTER_NAME: &str = "starter";

/// An alphabet entry: either the start marker or a message character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
    Starter,
    Char(char),
}

impl Symbol {
    /// Parses an alphabet row name. Characters are upper-cased.
    pub fn from_name(name: &str) -> HushResult<Self> {
        if name == STARTER_NAME {
            return Ok(Symbol::Starter);
        }
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => alphabet::normalize(Symbol::Char(c)),
            _ => Err(HushError::InvalidSymbol),
        }
    }

    pub fn as_char(&self) -> Option<char> {
        match self {
            Symbol::Char(c) => Some(*c),
            Symbol::Starter => None,
        }
    }
}

impl core::fmt::Display for Symbol {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Symbol::Starter => f.write_str(STARTER_NAME),
            Symbol::Char(c) => write!(f, "{}", c),
        }
    }
}

/// Six observed inter-arrival gaps, in magnitude units.
/// Index `WINDOW_LEN - 1` is the calibration gap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingWindow(pub [f64; WINDOW_LEN]);

impl TimingWindow {
    pub fn new(gaps: [f64; WINDOW_LEN]) -> Self {
        Self(gaps)
    }

    pub fn content(&self) -> &[f64] {
        &self.0[..PATTERN_LEN]
    }

    pub fn calibration(&self) -> f64 {
        self.0[PATTERN_LEN]
    }
}

impl TryFrom<&[f64]> for TimingWindow {
    type Error = HushError;

    fn try_from(gaps: &[f64]) -> HushResult<Self> {
        let arr: [f64; WINDOW_LEN] = gaps
            .try_into()
            .map_err(|_| HushError::WindowLength(gaps.len()))?;
        Ok(Self(arr))
    }
}

pub type HushResult<T> = Result<T, HushError>;

#[derive(Debug, Clone, PartialEq)]
pub enum HushError {
    /// Alphabet has no `starter` row.
    MissingStarter,
    DuplicateSymbol(Symbol),
    /// A row does not carry exactly `PATTERN_LEN` gaps.
    PatternLength { symbol: Symbol, len: usize },
    InvalidMagnitude { symbol: Symbol, value: f64 },
    /// Row name is neither `starter` nor a single character.
    InvalidSymbol,
    WindowLength(usize),
    /// Character has no pattern in the alphabet.
    UnknownSymbol(char),
    /// Peer unreachable.
    LinkDown,
    HalError,
    InvalidState,
}

impl core::fmt::Display for HushError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HushError {}
