//! Transmit Pipeline
//!
//! `encode → CRC → HDLC frame → NRZI → modulate`, plus the matching NMEA
//! sentences for the same message.
//!
//! ## Example
//!
//! ```rust
//! use ais_core::message::{AisMessage, PositionReport};
//! use ais_core::modulator::{GmskModulator, Modulator};
//! use ais_core::transmitter::Transmitter;
//!
//! let tx = Transmitter::new(Modulator::Gmsk(GmskModulator::new(96_000.0).unwrap()));
//! let msg = AisMessage::PositionReport(PositionReport::new(366_982_330));
//! let out = tx.transmit(&msg).unwrap();
//! assert_eq!(out.bits.len(), 168);
//! assert_eq!(out.sentences.len(), 1);
//! assert!(!out.signal.is_empty());
//! ```

use crate::hdlc::encode_frame;
use crate::message::AisMessage;
use crate::modulator::Modulator;
use crate::nmea::{encode_sentences, DEFAULT_MAX_PAYLOAD_CHARS};
use crate::nrzi::nrzi_encode;
use crate::types::{AisError, Bit, IqSignal, Result};

/// Radio frame bits (before NRZI) for `msg`.
pub fn encode_message_frame(msg: &AisMessage) -> Result<Vec<Bit>> {
    Ok(encode_frame(&msg.encode()?))
}

/// Everything produced for one message.
#[derive(Debug, Clone)]
pub struct Transmission {
    /// Message bits without FCS
    pub bits: Vec<Bit>,
    /// Frame bits before line coding
    pub frame: Vec<Bit>,
    /// NRZI line levels fed to the modulator
    pub levels: Vec<Bit>,
    pub signal: IqSignal,
    pub sentences: Vec<String>,
}

/// Configured transmit pipeline.
#[derive(Debug, Clone)]
pub struct Transmitter {
    modulator: Modulator,
    channel: char,
    sequence_id: u8,
    max_payload_chars: usize,
}

impl Transmitter {
    pub fn new(modulator: Modulator) -> Self {
        Self {
            modulator,
            channel: 'A',
            sequence_id: 0,
            max_payload_chars: DEFAULT_MAX_PAYLOAD_CHARS,
        }
    }

    pub fn with_channel(mut self, channel: char) -> Self {
        self.channel = channel;
        self
    }

    /// Sequential message id for multi-sentence output (0-9).
    pub fn with_sequence_id(mut self, sequence_id: u8) -> Self {
        self.sequence_id = sequence_id;
        self
    }

    pub fn with_max_payload_chars(mut self, chars: usize) -> Self {
        self.max_payload_chars = chars;
        self
    }

    pub fn modulator(&self) -> &Modulator {
        &self.modulator
    }

    pub fn channel(&self) -> char {
        self.channel
    }

    pub fn transmit(&self, msg: &AisMessage) -> Result<Transmission> {
        let bits = msg.encode()?;
        let tx = self.transmit_bits(bits)?;
        tracing::debug!(
            msg_type = msg.message_type(),
            mmsi = msg.mmsi(),
            samples = tx.signal.len(),
            "message modulated"
        );
        Ok(tx)
    }

    /// Frame and modulate pre-encoded message bits.
    pub fn transmit_bits(&self, bits: Vec<Bit>) -> Result<Transmission> {
        if bits.is_empty() {
            return Err(AisError::InvalidParameter("no message bits to transmit".into()));
        }
        let sentences = encode_sentences(&bits, self.channel, self.sequence_id, self.max_payload_chars)?;
        let frame = encode_frame(&bits);
        let levels = nrzi_encode(&frame);
        let signal = self.modulator.modulate(&levels);
        Ok(Transmission {
            bits,
            frame,
            levels,
            signal,
            sentences,
        })
    }
}
