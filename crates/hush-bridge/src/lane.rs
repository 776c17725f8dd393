use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, warn};
use spin::Mutex;

use hush_codec::{decode, DecodedSymbol};
use hush_core::{Alphabet, Symbol, TimingWindow};

/// Appended when a content window decodes to the starter.
/// Keeps the bridge's character positions intact for reassembly.
pub const UNMATCHED_CHAR: char = char::REPLACEMENT_CHARACTER;

/// Orders decode results by window sequence number (Min-Heap behavior).
struct OrderedSlot {
    seq: u64,
    symbol: Symbol,
}

impl PartialEq for OrderedSlot {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}
impl Eq for OrderedSlot {}

// BinaryHeap is a Max-Heap; reversed so the lowest sequence sits on top.
impl PartialOrd for OrderedSlot {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for OrderedSlot {
    fn cmp(&self, other: &Self) -> Ordering {
        other.seq.cmp(&self.seq)
    }
}

/// Reorder buffer: accepts decode results in any order and releases
/// them in window-completion order.
#[derive(Default)]
pub struct Sequencer {
    pending: BinaryHeap<OrderedSlot>,
    next: u64,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `symbol` for window `seq`, then appends every result that is now in order.
    pub fn push(&mut self, seq: u64, symbol: Symbol, out: &mut String) {
        if seq < self.next {
            warn!("Decode result for window {} arrived twice", seq);
            return;
        }
        self.pending.push(OrderedSlot { seq, symbol });

        while let Some(head) = self.pending.peek() {
            if head.seq != self.next {
                break;
            }
            if let Some(slot) = self.pending.pop() {
                out.push(to_char(slot.symbol));
                self.next += 1;
            }
        }
    }

    /// Appends whatever is left, in order, skipping missing windows.
    pub fn flush(&mut self, out: &mut String) {
        while let Some(slot) = self.pending.pop() {
            if slot.seq != self.next {
                warn!("Windows {}..{} never decoded", self.next, slot.seq);
            }
            out.push(to_char(slot.symbol));
            self.next = slot.seq + 1;
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

fn to_char(symbol: Symbol) -> char {
    symbol.as_char().unwrap_or(UNMATCHED_CHAR)
}

/// Off-path decoding for one bridge.
///
/// Every window is decoded on its own thread so the listen loop never waits
/// on the codec. Results meet in a single appender thread, which is the only
/// writer of the bridge's text.
pub struct DecodeLane {
    label: Arc<str>,
    alphabet: Arc<Alphabet>,
    tx: Option<Sender<(u64, DecodedSymbol)>>,
    appender: Option<JoinHandle<()>>,
    next_seq: u64,
}

impl DecodeLane {
    pub fn new(label: &str, alphabet: Arc<Alphabet>, text: Arc<Mutex<String>>) -> Self {
        let (tx, rx) = mpsc::channel();
        let appender = thread::spawn(move || append_in_order(rx, text));

        Self {
            label: Arc::from(label),
            alphabet,
            tx: Some(tx),
            appender: Some(appender),
            next_seq: 0,
        }
    }

    pub fn dispatch(&mut self, window: TimingWindow) {
        let tx = match &self.tx {
            Some(tx) => tx.clone(),
            None => return,
        };
        let seq = self.next_seq;
        self.next_seq += 1;

        let alphabet = self.alphabet.clone();
        let label = self.label.clone();
        thread::spawn(move || {
            let decoded = decode(&window, &alphabet);
            debug!(
                "{:?} -> {} (delay {:.2}) on {}",
                window.content(),
                decoded.symbol,
                decoded.delay,
                label
            );
            let _ = tx.send((seq, decoded));
        });
    }

    pub fn dispatched(&self) -> u64 {
        self.next_seq
    }

    /// Waits for every dispatched window to land in the text. Idempotent.
    pub fn close(&mut self) {
        // The appender exits once the last worker drops its sender.
        self.tx.take();
        if let Some(handle) = self.appender.take() {
            if handle.join().is_err() {
                warn!("Decode appender for {} panicked", self.label);
            }
        }
    }
}

impl Drop for DecodeLane {
    fn drop(&mut self) {
        self.close();
    }
}

fn append_in_order(rx: Receiver<(u64, DecodedSymbol)>, text: Arc<Mutex<String>>) {
    let mut sequencer = Sequencer::new();
    let mut ready = String::new();

    for (seq, decoded) in rx {
        sequencer.push(seq, decoded.symbol, &mut ready);
        if !ready.is_empty() {
            text.lock().push_str(&ready);
            ready.clear();
        }
    }

    sequencer.flush(&mut ready);
    text.lock().push_str(&ready);
}
