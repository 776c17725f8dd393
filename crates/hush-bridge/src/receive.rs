use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use spin::Mutex;

use hush_core::{Alphabet, HushResult};
use hush_hal::{PlatformClock, PulseAcceptor};

use crate::lane::DecodeLane;
use crate::machine::{Arrival, BridgeMachine};

/// Idle sleep between non-blocking accept attempts.
pub const ACCEPT_POLL_US: u64 = 1_000;

/// How long the listener stays open after the end-of-transmission gap.
/// The sender closes every frame with a calibration pulse, the terminator included.
pub const FINISH_LINGER_US: u64 = 1_000_000;

/// The part of a receiving bridge other threads may look at.
pub struct BridgeStatus {
    label: String,
    text: Arc<Mutex<String>>,
    finished: AtomicBool,
    force_quit: AtomicBool,
}

impl BridgeStatus {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            text: Arc::new(Mutex::new(String::new())),
            finished: AtomicBool::new(false),
            force_quit: AtomicBool::new(false),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Snapshot of the text decoded so far.
    pub fn message(&self) -> String {
        self.text.lock().clone()
    }

    /// True once the bridge stopped and its decode lane drained.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    /// Stop listening regardless of timing. Safe to call repeatedly, from any thread.
    pub fn force_quit(&self) {
        self.force_quit.store(true, Ordering::SeqCst);
    }

    pub fn is_force_quit(&self) -> bool {
        self.force_quit.load(Ordering::SeqCst)
    }
}

/// Receiver side of one bridge: listen loop, state machine and decode lane.
pub struct ReceiveBridge {
    machine: BridgeMachine,
    alphabet: Arc<Alphabet>,
    acceptor: Box<dyn PulseAcceptor>,
    clock: Arc<dyn PlatformClock>,
    status: Arc<BridgeStatus>,
}

impl ReceiveBridge {
    pub fn new(
        alphabet: Arc<Alphabet>,
        acceptor: Box<dyn PulseAcceptor>,
        clock: Arc<dyn PlatformClock>,
    ) -> Self {
        let status = Arc::new(BridgeStatus::new(acceptor.local()));
        Self {
            machine: BridgeMachine::new(alphabet.clone()),
            alphabet,
            acceptor,
            clock,
            status,
        }
    }

    pub fn status(&self) -> Arc<BridgeStatus> {
        self.status.clone()
    }

    /// Runs until the end-of-transmission gap, a force-quit, or an acceptor error.
    /// The bridge reports finished in every case, after every decoded window is appended.
    /// After a normal finish the listener keeps absorbing pulses for up to
    /// [`FINISH_LINGER_US`] before it is dropped.
    pub fn listen(mut self) -> HushResult<()> {
        info!("Waiting for a covert message on {}", self.status.label);

        let mut lane = DecodeLane::new(&self.status.label, self.alphabet.clone(), self.status.text.clone());
        let result = self.run(&mut lane);
        lane.close();

        self.status.finished.store(true, Ordering::SeqCst);
        if result.is_ok() {
            self.linger();
        }
        result
    }

    /// Accepts and discards until the closing pulse arrives, the linger expires or a force-quit.
    fn linger(&mut self) {
        let until = self.clock.now_us().saturating_add(FINISH_LINGER_US);
        while !self.status.is_force_quit() && self.clock.now_us() < until {
            match self.acceptor.accept() {
                Ok(()) => {
                    debug!("Closing pulse absorbed on {}", self.status.label);
                    return;
                }
                Err(nb::Error::WouldBlock) => self.clock.sleep_us(ACCEPT_POLL_US),
                Err(nb::Error::Other(e)) => {
                    debug!("Listener on {} closed early: {}", self.status.label, e);
                    return;
                }
            }
        }
    }

    fn run(&mut self, lane: &mut DecodeLane) -> HushResult<()> {
        loop {
            if self.status.is_force_quit() {
                self.machine.halt();
                info!("Bridge {} force-quit", self.status.label);
                return Ok(());
            }

            match self.acceptor.accept() {
                Ok(()) => {
                    let now = self.clock.now_us();
                    match self.machine.on_arrival(now) {
                        Arrival::Started => info!("Covert communication started on {}", self.status.label),
                        Arrival::Discarded => debug!("Non-starter window dropped on {}", self.status.label),
                        Arrival::Window(window) => lane.dispatch(window),
                        Arrival::Finished => {
                            info!("Bridge {} finished ({} windows)", self.status.label, lane.dispatched());
                            return Ok(());
                        }
                        Arrival::Seeded | Arrival::Buffered | Arrival::Ignored => {}
                    }
                }
                Err(nb::Error::WouldBlock) => self.clock.sleep_us(ACCEPT_POLL_US),
                Err(nb::Error::Other(e)) => {
                    warn!("Bridge {} stopped: {}", self.status.label, e);
                    self.machine.halt();
                    return Err(e);
                }
            }
        }
    }
}
