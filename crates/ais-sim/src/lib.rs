//! # AIS Link Simulation
//!
//! Software channel and loopback harness for exercising the `ais-core`
//! modem without radio hardware.
//!
//! ```text
//! AisMessage → Transmitter → Channel (silence, CFO, AWGN) → Receiver → LoopbackOutcome
//! ```
//!
//! - [`channel`]: seeded impairments against the burst power
//! - [`loopback`]: round trips with per-stage failure reporting
//! - [`spectrum`]: power spectrum and occupied bandwidth of a burst

pub mod channel;
pub mod loopback;
pub mod spectrum;

pub use channel::{Channel, ChannelConfig, ChannelModel, ChannelStats};
pub use loopback::{FailureStage, Loopback, LoopbackOutcome};
