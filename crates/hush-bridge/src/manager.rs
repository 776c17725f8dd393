use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{info, warn};

use hush_core::{HushError, HushResult};

use crate::receive::{BridgeStatus, ReceiveBridge};
use crate::transmit::TransmitBridge;

/// Share for bridge `i` is every character at `i, i + n, i + 2n, ...`.
pub fn split_round_robin(message: &str, n: usize) -> Vec<String> {
    let mut parts = vec![String::new(); n];
    if n == 0 {
        return parts;
    }
    for (pos, c) in message.chars().enumerate() {
        parts[pos % n].push(c);
    }
    parts
}

/// Inverse of `split_round_robin`. Part `i` fills positions `i, i + n, ...`.
///
/// Parts must come in the same bridge order the sender split with.
/// Out-of-range positions (inconsistent lengths) are dropped and
/// holes are left out of the result.
pub fn reassemble(parts: &[String]) -> String {
    let n = parts.len();
    let total: usize = parts.iter().map(|p| p.chars().count()).sum();
    let mut slots: Vec<Option<char>> = vec![None; total];

    for (i, part) in parts.iter().enumerate() {
        for (k, c) in part.chars().enumerate() {
            let pos = i + k * n;
            match slots.get_mut(pos) {
                Some(slot) => *slot = Some(c),
                None => warn!("Bridge {} position {} beyond message length {}", i, pos, total),
            }
        }
    }

    slots.into_iter().flatten().collect()
}

/// Result of one bridge's transmission.
#[derive(Debug)]
pub struct TransmitReport {
    pub label: String,
    pub result: HushResult<()>,
}

/// Sender-side orchestrator.
#[derive(Default)]
pub struct TransmissionManager {
    bridges: Vec<TransmitBridge>,
}

impl TransmissionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bridges are indexed in the order they are added.
    pub fn add_bridge(&mut self, bridge: TransmitBridge) {
        self.bridges.push(bridge);
    }

    pub fn bridges(&self) -> &[TransmitBridge] {
        &self.bridges
    }

    pub fn assign(&mut self, message: &str) {
        let parts = split_round_robin(message, self.bridges.len());
        for (bridge, part) in self.bridges.iter_mut().zip(parts) {
            bridge.assign(&part);
        }
    }

    /// Sends every bridge concurrently with no barrier between them.
    /// One bridge failing never stops the others.
    pub fn send_all(&mut self) -> Vec<TransmitReport> {
        thread::scope(|s| {
            let handles: Vec<_> = self
                .bridges
                .iter_mut()
                .map(|bridge| {
                    let label = bridge.label().to_string();
                    (label, s.spawn(move || bridge.send_message()))
                })
                .collect();

            handles
                .into_iter()
                .map(|(label, handle)| {
                    let result = handle.join().unwrap_or(Err(HushError::InvalidState));
                    match &result {
                        Err(HushError::LinkDown) => {
                            warn!("ERROR {}: Either the bridge and/or final receiver is down", label)
                        }
                        Err(e) => warn!("ERROR {}: {}", label, e),
                        Ok(()) => {}
                    }
                    TransmitReport { label, result }
                })
                .collect()
        })
    }
}

/// Receiver-side orchestrator: runs every bridge on its own thread, polls
/// them for completion and rebuilds the message.
pub struct ReceptionManager {
    pending: Vec<ReceiveBridge>,
    statuses: Vec<Arc<BridgeStatus>>,
    workers: Vec<(String, JoinHandle<HushResult<()>>)>,
    poll_interval: Duration,
}

impl ReceptionManager {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            pending: Vec::new(),
            statuses: Vec::new(),
            workers: Vec::new(),
            poll_interval,
        }
    }

    /// Bridges are indexed in the order they are added; this must match the sender.
    pub fn add_bridge(&mut self, bridge: ReceiveBridge) -> Arc<BridgeStatus> {
        let status = bridge.status();
        self.statuses.push(status.clone());
        self.pending.push(bridge);
        status
    }

    pub fn statuses(&self) -> &[Arc<BridgeStatus>] {
        &self.statuses
    }

    pub fn start_listening(&mut self) {
        for bridge in self.pending.drain(..) {
            let label = bridge.status().label().to_string();
            info!("Bridge {} started", label);
            self.workers.push((label, thread::spawn(move || bridge.listen())));
        }
    }

    pub fn all_finished(&self) -> bool {
        self.statuses.iter().all(|s| s.is_finished())
    }

    pub fn force_quit(&self) {
        for status in &self.statuses {
            status.force_quit();
        }
    }

    /// Blocks until every bridge reports finished, then reassembles.
    pub fn wait_for_message(&mut self) -> String {
        if !self.pending.is_empty() {
            self.start_listening();
        }

        // A worker that died without reporting still counts as done.
        while !self.all_finished() && !self.workers.iter().all(|(_, w)| w.is_finished()) {
            thread::sleep(self.poll_interval);
        }
        info!("All bridges finished!");

        for (label, worker) in self.workers.drain(..) {
            match worker.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Bridge {} failed: {}", label, e),
                Err(_) => warn!("Bridge {} panicked", label),
            }
        }

        let parts: Vec<String> = self.statuses.iter().map(|s| s.message()).collect();
        reassemble(&parts)
    }
}
