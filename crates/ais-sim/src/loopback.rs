//! Transmit → channel → receive round trips.
//!
//! ```rust
//! use ais_core::message::{AisMessage, PositionReport};
//! use ais_sim::channel::ChannelConfig;
//! use ais_sim::loopback::Loopback;
//!
//! let mut link = Loopback::new(48_000.0, ChannelConfig::with_snr(30.0, 48_000.0).seeded(1)).unwrap();
//! let outcome = link.run(&AisMessage::PositionReport(PositionReport::new(366_982_330))).unwrap();
//! assert!(outcome.decoded());
//! ```

use crate::channel::{Channel, ChannelConfig};
use ais_core::message::AisMessage;
use ais_core::modulator::{GmskModulator, Modulator};
use ais_core::receiver::{ReceivedMessage, Receiver};
use ais_core::transmitter::Transmitter;
use ais_core::types::{AisError, Bit, Result};

/// Receive stage that rejected the burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// No frequency activity in the window
    NoSignal,
    /// No preamble correlation or training match
    Sync,
    /// No well-formed HDLC frame
    Framing,
    Crc,
    /// CRC passed but the message did not decode
    Decode,
}

impl FailureStage {
    fn from_error(error: &AisError) -> Self {
        match error {
            AisError::NoSignal => FailureStage::NoSignal,
            AisError::FrameSyncFailure => FailureStage::Sync,
            AisError::ChecksumMismatch { .. } => FailureStage::Crc,
            AisError::Framing(_) => FailureStage::Framing,
            _ => FailureStage::Decode,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoopbackOutcome {
    /// Message bits handed to the transmitter
    pub sent: Vec<Bit>,
    pub received: Option<ReceivedMessage>,
    pub failure: Option<FailureStage>,
    /// Hamming distance between sent and received bits, counting any
    /// length difference as errors
    pub bit_errors: Option<usize>,
}

impl LoopbackOutcome {
    /// The exact message bits came back.
    pub fn decoded(&self) -> bool {
        self.failure.is_none() && self.bit_errors == Some(0)
    }

    pub fn message(&self) -> Option<&AisMessage> {
        self.received.as_ref().and_then(|r| r.message.as_ref())
    }
}

fn hamming(a: &[Bit], b: &[Bit]) -> usize {
    let common = a.iter().zip(b).filter(|(x, y)| x != y).count();
    common + a.len().abs_diff(b.len())
}

/// One transmitter, channel and receiver at a shared sample rate.
#[derive(Debug)]
pub struct Loopback {
    transmitter: Transmitter,
    channel: Channel,
    receiver: Receiver,
}

impl Loopback {
    /// GMSK link with default receiver settings.
    pub fn new(sample_rate: f64, channel: ChannelConfig) -> Result<Self> {
        let modulator = Modulator::Gmsk(GmskModulator::new(sample_rate)?);
        Self::with_parts(Transmitter::new(modulator), channel, Receiver::new(sample_rate)?)
    }

    pub fn with_parts(transmitter: Transmitter, channel: ChannelConfig, receiver: Receiver) -> Result<Self> {
        let tx_rate = transmitter.modulator().sample_rate();
        if (tx_rate - receiver.sample_rate()).abs() > 1e-6 || (tx_rate - channel.sample_rate).abs() > 1e-6 {
            return Err(AisError::InvalidParameter(format!(
                "sample rates differ: tx {} Hz, channel {} Hz, rx {} Hz",
                tx_rate,
                channel.sample_rate,
                receiver.sample_rate()
            )));
        }
        Ok(Self {
            transmitter,
            channel: Channel::new(channel),
            receiver,
        })
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Send one message through the link.
    ///
    /// Transmit-side errors are returned; a failed reception is reported in
    /// the outcome.
    pub fn run(&mut self, msg: &AisMessage) -> Result<LoopbackOutcome> {
        let tx = self.transmitter.transmit(msg)?;
        let rx_signal = self.channel.apply_signal(&tx.signal);

        let outcome = match self.receiver.receive(&rx_signal) {
            Ok(received) => {
                let bit_errors = hamming(&tx.bits, &received.bits);
                let failure = received.message.is_none().then_some(FailureStage::Decode);
                LoopbackOutcome {
                    sent: tx.bits,
                    received: Some(received),
                    failure,
                    bit_errors: Some(bit_errors),
                }
            }
            Err(e) => LoopbackOutcome {
                sent: tx.bits,
                received: None,
                failure: Some(FailureStage::from_error(&e)),
                bit_errors: None,
            },
        };

        tracing::debug!(
            mmsi = msg.mmsi(),
            decoded = outcome.decoded(),
            failure = ?outcome.failure,
            "loopback run"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ais_core::bits::dearmor;
    use ais_core::message::{ClassBStaticData, NavigationStatus, PositionReport, StaticVoyageData};
    use ais_core::modulator::FskModulator;

    fn reference_message() -> AisMessage {
        AisMessage::from_payload("15MvlfPP1so?Vt@EWFs3Jjht0000", 0).unwrap()
    }

    #[test]
    fn test_reference_bits() {
        let bits = dearmor("15MvlfPP1so?Vt@EWFs3Jjht0000", 0).unwrap();
        assert_eq!(reference_message().encode().unwrap(), bits);
    }

    #[test]
    fn test_ideal_channel() {
        for fs in [48_000.0, 96_000.0] {
            let mut link = Loopback::new(fs, ChannelConfig::ideal(fs).with_silence(0.002, 0.002)).unwrap();
            let outcome = link.run(&reference_message()).unwrap();
            assert!(outcome.decoded(), "fs {}: {:?}", fs, outcome.failure);
            assert_eq!(outcome.message(), Some(&reference_message()));
        }
    }

    #[test]
    fn test_awgn_rates() {
        for (fs, seed) in [(48_000.0, 11), (96_000.0, 12), (50_000.0, 13)] {
            let config = ChannelConfig::with_snr(25.0, fs).with_silence(0.005, 0.002).seeded(seed);
            let mut link = Loopback::new(fs, config).unwrap();
            let outcome = link.run(&reference_message()).unwrap();
            assert!(outcome.decoded(), "fs {}: {:?}", fs, outcome.failure);
            assert_eq!(outcome.bit_errors, Some(0));
        }
    }

    #[test]
    fn test_carrier_offset() {
        for (cfo, seed) in [(300.0, 21), (-500.0, 22), (450.0, 23)] {
            let fs = 48_000.0;
            let config = ChannelConfig::with_cfo(30.0, cfo, fs).with_silence(0.003, 0.0).seeded(seed);
            let mut link = Loopback::new(fs, config).unwrap();
            let outcome = link.run(&reference_message()).unwrap();
            assert!(outcome.decoded(), "cfo {}: {:?}", cfo, outcome.failure);
            assert!(outcome.received.unwrap().frequency_correction_hz.abs() <= 500.0);
        }
    }

    #[test]
    fn test_message_types_over_fsk() {
        let fs = 48_000.0;
        let tx = Transmitter::new(Modulator::Fsk(FskModulator::new(fs).unwrap()));
        let channel = ChannelConfig::with_cfo(25.0, 250.0, fs).with_silence(0.005, 0.002).seeded(31);
        let mut link = Loopback::with_parts(tx, channel, Receiver::new(fs).unwrap()).unwrap();

        let mut voyage = StaticVoyageData::new(369_190_000);
        voyage.vessel_name = "PACIFIC TRADER".into();
        voyage.call_sign = "WDC1234".into();
        voyage.destination = "OAKLAND".into();
        let mut report = PositionReport::new(538_006_231);
        report.nav_status = NavigationStatus::Moored;
        report.speed_over_ground = Some(0.0);
        report.latitude = Some(-33.8568);
        report.longitude = Some(151.2153);

        for msg in [
            AisMessage::StaticVoyageData(voyage),
            AisMessage::PositionReport(report),
            AisMessage::ClassBStaticData(ClassBStaticData::part_a(338_123_456, "SEA BREEZE")),
        ] {
            let outcome = link.run(&msg).unwrap();
            assert!(outcome.decoded(), "type {}: {:?}", msg.message_type(), outcome.failure);
            assert_eq!(outcome.message(), Some(&msg));
        }
    }

    #[test]
    fn test_buried_in_noise() {
        let fs = 48_000.0;
        let config = ChannelConfig::with_snr(-10.0, fs).with_silence(0.005, 0.002).seeded(41);
        let mut link = Loopback::new(fs, config).unwrap();
        let outcome = link.run(&reference_message()).unwrap();
        assert!(!outcome.decoded());
        assert!(outcome.failure.is_some());
    }

    #[test]
    fn test_rate_mismatch_rejected() {
        let tx = Transmitter::new(Modulator::Gmsk(GmskModulator::new(48_000.0).unwrap()));
        let result = Loopback::with_parts(tx, ChannelConfig::ideal(48_000.0), Receiver::new(96_000.0).unwrap());
        assert!(matches!(result, Err(AisError::InvalidParameter(_))));
    }

    #[test]
    fn test_hamming() {
        assert_eq!(hamming(&[0, 1, 1], &[0, 1, 1]), 0);
        assert_eq!(hamming(&[0, 1, 1], &[1, 1, 0]), 2);
        assert_eq!(hamming(&[0, 1], &[0, 1, 1, 1]), 2);
    }
}
