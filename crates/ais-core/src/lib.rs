//! # AIS Codec and Modem
//!
//! Encodes and decodes AIS (Automatic Identification System) messages and
//! carries them over the VHF physical layer as complex baseband samples.
//!
//! ## Signal Flow
//!
//! ```text
//! TX: AisMessage → bits → CRC-16 → HDLC stuff/flags → NRZI → GMSK/FSK → I/Q
//! RX: I/Q → FM discriminator → clock recovery → NRZI → training sync
//!         → HDLC extract → CRC check → AisMessage
//! ```
//!
//! Alongside the radio path, [`nmea`] wraps the same message bits as
//! `!AIVDM` sentences.
//!
//! ## Example
//!
//! ```rust
//! use ais_core::prelude::*;
//!
//! let mut report = PositionReport::new(366_982_330);
//! report.speed_over_ground = Some(12.3);
//! let msg = AisMessage::PositionReport(report);
//!
//! let tx = Transmitter::new(Modulator::Gmsk(GmskModulator::new(48_000.0).unwrap()));
//! let out = tx.transmit(&msg).unwrap();
//!
//! let rx = Receiver::new(48_000.0).unwrap();
//! let got = rx.receive(&out.signal).unwrap();
//! assert_eq!(got.message, Some(msg));
//! ```

pub mod bits;
pub mod clock_recovery;
pub mod config;
pub mod frame_sync;
pub mod hdlc;
pub mod iq_file;
pub mod logging;
pub mod message;
pub mod modulator;
pub mod nmea;
pub mod nrzi;
pub mod quadrature_demod;
pub mod receiver;
pub mod ship;
pub mod transmitter;
pub mod types;

// Re-export main types
pub use config::{AisConfig, ConfigError};
pub use iq_file::IqFormat;
pub use message::AisMessage;
pub use modulator::{Modulation, Modulator};
pub use receiver::{decode_signal, ReceivedMessage, Receiver};
pub use transmitter::{Transmission, Transmitter};
pub use types::{AisError, Bit, IqSample, IqSignal, Result};

pub mod prelude {
    pub use crate::config::AisConfig;
    pub use crate::message::{
        AisMessage, BaseStationReport, ClassBPositionReport, ClassBStaticData, NavigationStatus, PositionReport,
        StaticVoyageData,
    };
    pub use crate::modulator::{FskModulator, GmskModulator, Modulation, Modulator};
    pub use crate::nmea::{NmeaSentence, SentenceAssembler};
    pub use crate::receiver::{ReceivedMessage, Receiver};
    pub use crate::transmitter::Transmitter;
    pub use crate::types::{AisError, Bit, IqSample, IqSignal};
}
