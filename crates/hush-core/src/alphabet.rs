use alloc::vec::Vec;

use crate::{HushError, HushResult, Symbol, PATTERN_LEN};

/// Reference gap magnitudes for one symbol.
pub type Pattern = [f64; PATTERN_LEN];

const STANDARD_SYMBOLS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789 .,?!-";
const STANDARD_LEVELS: [f64; 3] = [5.0, 15.0, 25.0];
const STANDARD_STARTER: Pattern = [35.0; PATTERN_LEN];

/// Immutable symbol table shared by every bridge.
///
/// Iteration order is insertion order. Decoding walks the table in this
/// order, so the earlier of two equally scored entries always wins.
#[derive(Debug, Clone, PartialEq)]
pub struct Alphabet {
    entries: Vec<(Symbol, Pattern)>,
}

impl Alphabet {
    /// Builds an alphabet from fixed-length rows.
    /// Characters are upper-cased, matching what transmitters send.
    pub fn from_entries(entries: Vec<(Symbol, Pattern)>) -> HushResult<Self> {
        let entries = entries
            .into_iter()
            .map(|(symbol, pattern)| normalize(symbol).map(|s| (s, pattern)))
            .collect::<HushResult<Vec<_>>>()?;

        for (i, (symbol, pattern)) in entries.iter().enumerate() {
            if entries[..i].iter().any(|(s, _)| s == symbol) {
                return Err(HushError::DuplicateSymbol(*symbol));
            }
            for &value in pattern {
                if !value.is_finite() || value < 0.0 {
                    return Err(HushError::InvalidMagnitude { symbol: *symbol, value });
                }
            }
        }

        if !entries.iter().any(|(s, _)| *s == Symbol::Starter) {
            return Err(HushError::MissingStarter);
        }

        Ok(Self { entries })
    }

    /// Builds an alphabet from loosely typed rows (config files).
    /// Every row must carry exactly `PATTERN_LEN` magnitudes.
    pub fn from_rows<I>(rows: I) -> HushResult<Self>
    where
        I: IntoIterator<Item = (Symbol, Vec<f64>)>,
    {
        let mut entries = Vec::new();
        for (symbol, gaps) in rows {
            let pattern: Pattern = gaps
                .as_slice()
                .try_into()
                .map_err(|_| HushError::PatternLength { symbol, len: gaps.len() })?;
            entries.push((symbol, pattern));
        }
        Self::from_entries(entries)
    }

    /// The built-in table: `A-Z`, `0-9`, space and `. , ? ! -`.
    /// Each symbol is a distinct base-3 code over three gap levels,
    /// so any two characters differ by at least one full level step.
    pub fn standard() -> Self {
        let mut entries = Vec::with_capacity(STANDARD_SYMBOLS.len() + 1);
        entries.push((Symbol::Starter, STANDARD_STARTER));

        for (k, c) in STANDARD_SYMBOLS.chars().enumerate() {
            let mut pattern = [0.0; PATTERN_LEN];
            let mut code = k;
            for slot in pattern.iter_mut().rev() {
                *slot = STANDARD_LEVELS[code % STANDARD_LEVELS.len()];
                code /= STANDARD_LEVELS.len();
            }
            entries.push((Symbol::Char(c), pattern));
        }

        Self { entries }
    }

    pub fn starter(&self) -> &Pattern {
        // `from_entries` rejects tables without a starter.
        self.get(Symbol::Starter).unwrap_or(&STANDARD_STARTER)
    }

    pub fn get(&self, symbol: Symbol) -> Option<&Pattern> {
        self.entries.iter().find(|(s, _)| *s == symbol).map(|(_, p)| p)
    }

    pub fn pattern(&self, c: char) -> Option<&Pattern> {
        self.get(Symbol::Char(c))
    }

    pub fn contains(&self, c: char) -> bool {
        self.pattern(c).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Symbol, Pattern)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub(crate) fn normalize(symbol: Symbol) -> HushResult<Symbol> {
    match symbol {
        Symbol::Starter => Ok(Symbol::Starter),
        Symbol::Char(c) => {
            let mut upper = c.to_uppercase();
            match (upper.next(), upper.next()) {
                (Some(u), None) => Ok(Symbol::Char(u)),
                _ => Err(HushError::InvalidSymbol),
            }
        }
    }
}
