#![no_std]
#![forbid(unsafe_code)]

use hush_core::{HushError, HushResult};

/// Sender half of a bridge.
/// One call is one connection event: connect, push a byte, disconnect.
/// Only the moment it happens carries information.
pub trait PulseEmitter: Send {
    fn pulse(&mut self) -> HushResult<()>;

    /// Human-readable endpoint, used in logs.
    fn peer(&self) -> &str;
}

/// Receiver half of a bridge.
/// INVARIANT: Must be Non-Blocking.
pub trait PulseAcceptor: Send {
    /// `Ok(())` once a connection event carrying payload has arrived.
    /// `WouldBlock` when nothing is pending.
    fn accept(&mut self) -> nb::Result<(), HushError>;

    fn local(&self) -> &str;
}

/// The Wall Clock.
/// Gaps are measured against `now_us`; the sender paces itself with `sleep_us`.
pub trait PlatformClock: Send + Sync {
    fn now_us(&self) -> u64;
    fn sleep_us(&self, us: u64);
}
