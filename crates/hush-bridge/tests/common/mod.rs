#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use hush_core::{Alphabet, HushError, HushResult, Symbol, UNIT_US};
use hush_hal::{PlatformClock, PulseAcceptor, PulseEmitter};

// Thread-safe virtual clock: sleeping advances time instantly.
pub struct VirtualClock {
    t: AtomicU64,
}

impl VirtualClock {
    pub fn new(start: u64) -> Arc<Self> {
        Arc::new(Self { t: AtomicU64::new(start) })
    }
    pub fn set(&self, t: u64) {
        self.t.store(t, Ordering::SeqCst);
    }
}

impl PlatformClock for VirtualClock {
    fn now_us(&self) -> u64 { self.t.load(Ordering::SeqCst) }
    fn sleep_us(&self, us: u64) {
        self.t.fetch_add(us, Ordering::SeqCst);
        std::thread::yield_now();
    }
}

/// Records the virtual time of every pulse. `cost_us` models connect latency.
pub struct RecordingEmitter {
    pub label: String,
    pub clock: Arc<VirtualClock>,
    pub log: Arc<Mutex<Vec<u64>>>,
    pub cost_us: u64,
}

impl RecordingEmitter {
    pub fn new(label: &str, clock: Arc<VirtualClock>) -> (Self, Arc<Mutex<Vec<u64>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let em = Self { label: label.to_string(), clock, log: log.clone(), cost_us: 0 };
        (em, log)
    }
}

impl PulseEmitter for RecordingEmitter {
    fn pulse(&mut self) -> HushResult<()> {
        self.log.lock().unwrap().push(self.clock.now_us());
        self.clock.sleep_us(self.cost_us);
        Ok(())
    }
    fn peer(&self) -> &str { &self.label }
}

pub struct DownEmitter;

impl PulseEmitter for DownEmitter {
    fn pulse(&mut self) -> HushResult<()> { Err(HushError::LinkDown) }
    fn peer(&self) -> &str { "10.0.0.1:50003" }
}

/// Replays recorded arrival times into the receiver's clock.
pub struct ScriptedAcceptor {
    label: String,
    arrivals: VecDeque<u64>,
    clock: Arc<VirtualClock>,
    fail_when_empty: bool,
}

impl ScriptedAcceptor {
    pub fn new(label: &str, arrivals: Vec<u64>, clock: Arc<VirtualClock>) -> Self {
        Self { label: label.to_string(), arrivals: arrivals.into(), clock, fail_when_empty: false }
    }
    pub fn failing(label: &str, arrivals: Vec<u64>, clock: Arc<VirtualClock>) -> Self {
        Self { fail_when_empty: true, ..Self::new(label, arrivals, clock) }
    }
}

impl PulseAcceptor for ScriptedAcceptor {
    fn accept(&mut self) -> nb::Result<(), HushError> {
        match self.arrivals.pop_front() {
            Some(t) => {
                self.clock.set(t);
                Ok(())
            }
            None if self.fail_when_empty => Err(nb::Error::Other(HushError::HalError)),
            None => Err(nb::Error::WouldBlock),
        }
    }
    fn local(&self) -> &str { &self.label }
}

pub fn scenario_alphabet() -> Arc<Alphabet> {
    Arc::new(
        Alphabet::from_entries(vec![
            (Symbol::Starter, [0.0; 5]),
            (Symbol::Char('A'), [1.0, 2.0, 3.0, 4.0, 5.0]),
            (Symbol::Char('B'), [5.0, 4.0, 3.0, 2.0, 1.0]),
        ])
        .unwrap(),
    )
}

/// Arrival times for a run of gaps (in magnitude units) starting at `t`.
pub fn arrivals(t: &mut u64, gaps: &[f64]) -> Vec<u64> {
    gaps.iter()
        .map(|g| {
            *t += (g * UNIT_US as f64).round() as u64;
            *t
        })
        .collect()
}
