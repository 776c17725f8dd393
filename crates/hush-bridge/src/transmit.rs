use std::sync::Arc;

use log::info;

use hush_codec::{frame, starter_frame, symbol_frame, terminator_frame};
use hush_core::{Alphabet, HushError, HushResult, Pattern, UNIT_US};
use hush_hal::{PlatformClock, PulseEmitter};

/// Sender side of one bridge.
pub struct TransmitBridge {
    emitter: Box<dyn PulseEmitter>,
    clock: Arc<dyn PlatformClock>,
    alphabet: Arc<Alphabet>,
    message: String,
}

impl TransmitBridge {
    pub fn new(
        emitter: Box<dyn PulseEmitter>,
        alphabet: Arc<Alphabet>,
        clock: Arc<dyn PlatformClock>,
    ) -> Self {
        Self { emitter, clock, alphabet, message: String::new() }
    }

    pub fn label(&self) -> &str {
        self.emitter.peer()
    }

    /// Appends to this bridge's share, upper-cased to the alphabet's domain.
    pub fn assign(&mut self, text: &str) {
        self.message.extend(text.chars().flat_map(char::to_uppercase));
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Waits each magnitude (hundredths of a second) then pulses.
    /// The calibration gap is always appended.
    pub fn send_sequence(&mut self, magnitudes: &[f64]) -> HushResult<()> {
        self.send_frame(&frame(magnitudes))
    }

    fn send_frame(&mut self, gaps: &[f64]) -> HushResult<()> {
        for &gap in gaps {
            self.clock.sleep_us(to_us(gap));
            self.emitter.pulse()?;
        }
        Ok(())
    }

    pub fn start(&mut self) -> HushResult<()> {
        let gaps = starter_frame(self.alphabet.starter());
        self.send_frame(&gaps)
    }

    pub fn send_symbol(&mut self, c: char) -> HushResult<()> {
        let pattern = *self.alphabet.pattern(c).ok_or(HushError::UnknownSymbol(c))?;
        self.send_frame(&symbol_frame(&pattern))
    }

    pub fn finish(&mut self) -> HushResult<()> {
        self.send_frame(&terminator_frame())
    }

    /// Starter, every assigned character, terminator.
    /// Characters are checked against the alphabet before the first pulse.
    pub fn send_message(&mut self) -> HushResult<()> {
        let patterns = self
            .message
            .chars()
            .map(|c| self.alphabet.pattern(c).copied().ok_or(HushError::UnknownSymbol(c)))
            .collect::<HushResult<Vec<Pattern>>>()?;

        let began = self.clock.now_us();
        info!("Starting to send {} symbols to {}", patterns.len(), self.label());

        self.start()?;
        for pattern in &patterns {
            self.send_frame(&symbol_frame(pattern))?;
        }
        self.finish()?;

        let elapsed_ms = self.clock.now_us().saturating_sub(began) / 1_000;
        info!("The message ENDED through {} ({} ms)", self.label(), elapsed_ms);
        Ok(())
    }
}

fn to_us(gap: f64) -> u64 {
    (gap.max(0.0) * UNIT_US as f64).round() as u64
}
