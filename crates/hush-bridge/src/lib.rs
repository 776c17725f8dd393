#![forbid(unsafe_code)]

pub mod lane;
pub mod machine;
pub mod manager;
pub mod receive;
pub mod transmit;

pub use lane::{DecodeLane, Sequencer};
pub use machine::{Arrival, BridgeMachine, BridgeState};
pub use manager::{reassemble, split_round_robin, ReceptionManager, TransmissionManager, TransmitReport};
pub use receive::{BridgeStatus, ReceiveBridge, ACCEPT_POLL_US, FINISH_LINGER_US};
pub use transmit::TransmitBridge;
