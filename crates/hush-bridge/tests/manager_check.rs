mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hush_bridge::{
    reassemble, split_round_robin, ReceiveBridge, ReceptionManager, TransmissionManager, TransmitBridge,
    FINISH_LINGER_US,
};
use hush_core::{Alphabet, HushError};
use hush_hal::{PlatformClock, PulseAcceptor};

use common::{arrivals, DownEmitter, RecordingEmitter, ScriptedAcceptor, VirtualClock};

fn parts(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_split_stride() {
    assert_eq!(split_round_robin("ABCDEFG", 3), parts(&["ADG", "BE", "CF"]));
    assert_eq!(split_round_robin("ABCDEFG", 1), parts(&["ABCDEFG"]));
    assert_eq!(split_round_robin("AB", 4), parts(&["A", "B", "", ""]));
    assert!(split_round_robin("AB", 0).is_empty());
}

#[test]
fn test_reassembly_stride() {
    assert_eq!(reassemble(&parts(&["ADG", "BE", "CF"])), "ABCDEFG");
    assert_eq!(reassemble(&parts(&["ACEG", "BDF"])), "ABCDEFG");
    assert_eq!(reassemble(&parts(&["A", "B", "", ""])), "AB");
    assert_eq!(reassemble(&[]), "");

    for n in 1..6 {
        let msg = "THE ORDER IS RESTORED ONLY AT MERGE";
        assert_eq!(reassemble(&split_round_robin(msg, n)), msg);
    }
}

#[test]
fn test_reassembly_tolerates_bad_lengths() {
    // Bridge 1 lost a symbol: its slot stays empty, nothing panics.
    assert_eq!(reassemble(&parts(&["ACE", "B"])), "ABC");
}

#[test]
fn test_assign_uppercases_by_stride() {
    let alphabet = Arc::new(Alphabet::standard());
    let mut mgr = TransmissionManager::new();
    for i in 0..3 {
        let clock = VirtualClock::new(0);
        let (em, _) = RecordingEmitter::new(&format!("b{}", i), clock.clone());
        mgr.add_bridge(TransmitBridge::new(Box::new(em), alphabet.clone(), clock));
    }
    mgr.assign("abcdefg");

    let shares: Vec<&str> = mgr.bridges().iter().map(|b| b.message()).collect();
    assert_eq!(shares, vec!["ADG", "BE", "CF"]);
}

#[test]
fn test_failed_bridge_does_not_stop_siblings() {
    let alphabet = Arc::new(Alphabet::standard());
    let mut mgr = TransmissionManager::new();

    mgr.add_bridge(TransmitBridge::new(Box::new(DownEmitter), alphabet.clone(), VirtualClock::new(0)));
    let clock = VirtualClock::new(0);
    let (em, log) = RecordingEmitter::new("10.0.0.2:50004", clock.clone());
    mgr.add_bridge(TransmitBridge::new(Box::new(em), alphabet.clone(), clock));

    mgr.assign("HELLO");
    let reports = mgr.send_all();

    assert_eq!(reports[0].label, "10.0.0.1:50003");
    assert!(matches!(reports[0].result, Err(HushError::LinkDown)));
    assert!(reports[1].result.is_ok());
    // "EL" on bridge 1: starter + 2 symbols + terminator.
    assert_eq!(log.lock().unwrap().len(), 7 + 2 * 6 + 2);
}

#[test]
fn test_unknown_symbol_sends_nothing() {
    let alphabet = Arc::new(Alphabet::standard());
    let clock = VirtualClock::new(0);
    let (em, log) = RecordingEmitter::new("b0", clock.clone());
    let mut bridge = TransmitBridge::new(Box::new(em), alphabet, clock);

    bridge.assign("OK~");
    assert_eq!(bridge.send_message(), Err(HushError::UnknownSymbol('~')));
    assert!(log.lock().unwrap().is_empty());

    assert_eq!(bridge.send_symbol('#'), Err(HushError::UnknownSymbol('#')));
}

#[test]
fn test_send_sequence_appends_calibration() {
    let alphabet = Arc::new(Alphabet::standard());
    let clock = VirtualClock::new(0);
    let (em, log) = RecordingEmitter::new("b0", clock.clone());
    let mut bridge = TransmitBridge::new(Box::new(em), alphabet, clock);

    bridge.send_sequence(&[1.0, 2.5]).unwrap();
    assert_eq!(*log.lock().unwrap(), vec![10_000, 35_000, 135_000]);
}

#[test]
fn test_force_quit_stops_idle_bridge() {
    let alphabet = Arc::new(Alphabet::standard());
    let mut mgr = ReceptionManager::new(Duration::from_millis(2));

    // Started, then the sender goes quiet forever.
    let mut t = 0;
    let mut script = vec![t];
    script.extend(arrivals(&mut t, &[35.0, 35.0, 35.0, 35.0, 35.0, 10.0]));
    script.extend(arrivals(&mut t, &[5.0, 5.0]));

    let clock = VirtualClock::new(0);
    let acceptor = ScriptedAcceptor::new("0.0.0.0:50003", script, clock.clone());
    let status = mgr.add_bridge(ReceiveBridge::new(alphabet, Box::new(acceptor), clock));
    mgr.start_listening();

    std::thread::sleep(Duration::from_millis(20));
    assert!(!status.is_finished());

    mgr.force_quit();
    mgr.force_quit();
    assert_eq!(mgr.wait_for_message(), "");
    assert!(status.is_finished());
    assert!(status.is_force_quit());
}

#[test]
fn test_acceptor_failure_marks_finished() {
    let alphabet = Arc::new(Alphabet::standard());
    let mut mgr = ReceptionManager::new(Duration::from_millis(2));

    let mut t = 0;
    let mut script = vec![t];
    script.extend(arrivals(&mut t, &[35.0, 35.0, 35.0, 35.0, 35.0, 10.0]));
    // One full 'A' window, then the socket breaks.
    script.extend(arrivals(&mut t, &[5.0, 5.0, 5.0, 5.0, 5.0, 10.0]));

    let clock = VirtualClock::new(0);
    let acceptor = ScriptedAcceptor::failing("0.0.0.0:50003", script, clock.clone());
    mgr.add_bridge(ReceiveBridge::new(alphabet, Box::new(acceptor), clock));

    assert_eq!(mgr.wait_for_message(), "A");
}

struct CountingAcceptor {
    inner: ScriptedAcceptor,
    accepted: Arc<AtomicUsize>,
}

impl PulseAcceptor for CountingAcceptor {
    fn accept(&mut self) -> nb::Result<(), HushError> {
        self.inner.accept()?;
        self.accepted.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
    fn local(&self) -> &str { self.inner.local() }
}

#[test]
fn test_closing_pulse_is_accepted_after_finish() {
    let alphabet = Arc::new(Alphabet::standard());

    let mut t = 0;
    let mut script = vec![t];
    script.extend(arrivals(&mut t, &[35.0, 35.0, 35.0, 35.0, 35.0, 10.0]));
    script.extend(arrivals(&mut t, &[5.0, 5.0, 5.0, 5.0, 5.0, 10.0]));
    // Terminator gap, then the closing calibration pulse.
    script.extend(arrivals(&mut t, &[400.0, 10.0]));
    let total = script.len();

    let clock = VirtualClock::new(0);
    let accepted = Arc::new(AtomicUsize::new(0));
    let acceptor = CountingAcceptor {
        inner: ScriptedAcceptor::new("0.0.0.0:50003", script, clock.clone()),
        accepted: accepted.clone(),
    };
    let bridge = ReceiveBridge::new(alphabet, Box::new(acceptor), clock);
    let status = bridge.status();

    assert_eq!(bridge.listen(), Ok(()));
    assert_eq!(accepted.load(Ordering::SeqCst), total);
    assert_eq!(status.message(), "A");
    assert!(status.is_finished());
}

#[test]
fn test_linger_expires_without_closing_pulse() {
    let alphabet = Arc::new(Alphabet::standard());

    let mut t = 0;
    let mut script = vec![t];
    script.extend(arrivals(&mut t, &[35.0, 35.0, 35.0, 35.0, 35.0, 10.0]));
    script.extend(arrivals(&mut t, &[400.0]));
    let finished_at = t;

    let clock = VirtualClock::new(0);
    let acceptor = ScriptedAcceptor::new("0.0.0.0:50003", script, clock.clone());
    let bridge = ReceiveBridge::new(alphabet, Box::new(acceptor), clock.clone());

    assert_eq!(bridge.listen(), Ok(()));
    assert!(clock.now_us() >= finished_at + FINISH_LINGER_US);
}
