use std::sync::Arc;

use hush_codec::decode;
use hush_core::{Alphabet, Symbol, TimingWindow, FINISH_THRESHOLD_SECS, UNIT_US, WINDOW_LEN};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    WaitingStart,
    Active,
    /// Terminal.
    Finished,
}

/// What a single arrival did to the machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Arrival {
    /// First pulse on the bridge. Only seeds the arrival clock.
    Seeded,
    /// Gap stored, window not complete yet.
    Buffered,
    /// Window completed before the starter matched. Dropped.
    Discarded,
    Started,
    /// A content window is ready for decoding.
    Window(TimingWindow),
    /// End-of-transmission gap consumed.
    Finished,
    /// Pulse after finish.
    Ignored,
}

/// Per-bridge reception state.
/// Owns the "last arrival" timestamp; nothing outside the bridge touches it.
pub struct BridgeMachine {
    alphabet: Arc<Alphabet>,
    state: BridgeState,
    window: [f64; WINDOW_LEN],
    filled: usize,
    last_arrival_us: Option<u64>,
}

impl BridgeMachine {
    pub fn new(alphabet: Arc<Alphabet>) -> Self {
        Self {
            alphabet,
            state: BridgeState::WaitingStart,
            window: [0.0; WINDOW_LEN],
            filled: 0,
            last_arrival_us: None,
        }
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    /// Feed one connection event observed at `now_us`.
    pub fn on_arrival(&mut self, now_us: u64) -> Arrival {
        if self.state == BridgeState::Finished {
            return Arrival::Ignored;
        }

        let last = match self.last_arrival_us.replace(now_us) {
            Some(t) => t,
            None => return Arrival::Seeded,
        };
        let elapsed_us = now_us.saturating_sub(last);

        // Long silence only means "finished" once the starter was seen.
        if self.state == BridgeState::Active && elapsed_us / 1_000_000 >= FINISH_THRESHOLD_SECS {
            self.halt();
            return Arrival::Finished;
        }

        self.window[self.filled] = elapsed_us as f64 / UNIT_US as f64;
        self.filled += 1;
        if self.filled < WINDOW_LEN {
            return Arrival::Buffered;
        }

        self.filled = 0;
        let window = TimingWindow::new(self.window);

        match self.state {
            BridgeState::WaitingStart => {
                if decode(&window, &self.alphabet).symbol == Symbol::Starter {
                    self.state = BridgeState::Active;
                    Arrival::Started
                } else {
                    Arrival::Discarded
                }
            }
            BridgeState::Active => Arrival::Window(window),
            BridgeState::Finished => Arrival::Ignored,
        }
    }

    /// Moves to `Finished` and drops any partial window. Idempotent.
    pub fn halt(&mut self) {
        self.state = BridgeState::Finished;
        self.filled = 0;
    }
}
