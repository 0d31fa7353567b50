//! Receive Pipeline
//!
//! Chains the receive stages over one buffer of samples:
//!
//! ```text
//! IQ ─► fm_demodulate ─► recover_clock ─► nrzi_decode ─► find_frame_start
//!                                                              │
//!        AisMessage ◄─ decode ◄─ verify_crc ◄─ extract_frame ◄─┘
//! ```
//!
//! Each stage yields `None` when there is nothing to find, which is the usual
//! outcome on a live channel. [`decode_signal`] keeps that silent form;
//! [`Receiver::receive`] reports which stage gave up as an [`AisError`].

use crate::clock_recovery::ClockRecovery;
use crate::frame_sync::FrameSync;
use crate::hdlc::{crc16_value, find_flag, hdlc_destuff, verify_crc};
use crate::message::AisMessage;
use crate::nmea::{encode_sentences, DEFAULT_MAX_PAYLOAD_CHARS};
use crate::nrzi::nrzi_decode;
use crate::quadrature_demod::FmDiscriminator;
use crate::types::{
    check_sample_rate, AisError, Bit, IqSample, IqSignal, Result, CRC_BITS, HDLC_FLAG, TRAINING_SEQUENCE,
};

/// Bits after the training sequence searched for the start flag
pub const DEFAULT_FLAG_SEARCH_WINDOW: usize = 10;

/// Longest stuffed body searched for the closing flag
pub const MAX_FRAME_BITS: usize = 1200;

/// Shortest accepted body: a 38-bit header plus the FCS
pub const MIN_BODY_BITS: usize = 38 + CRC_BITS;

/// Training symbols kept ahead of the flag as the NRZI reference.
const TRAINING_TAIL: usize = 2;

/// Message bits and received FCS between the two flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFrame {
    pub message: Vec<Bit>,
    pub fcs: Vec<Bit>,
}

impl ExtractedFrame {
    pub fn crc_ok(&self) -> bool {
        verify_crc(&self.message, &self.fcs)
    }
}

/// Locate the frame in symbols that start just after the training sequence.
///
/// The start flag must begin within the first 10 decoded bits. The body runs
/// to the closing flag, is destuffed, and split into message and FCS. The
/// CRC is not checked here.
pub fn extract_frame(bits_after_training: &[Bit], inverted: bool) -> Option<ExtractedFrame> {
    extract_frame_within(bits_after_training, inverted, DEFAULT_FLAG_SEARCH_WINDOW)
}

/// [`extract_frame`] with an explicit start flag window.
pub fn extract_frame_within(levels: &[Bit], inverted: bool, flag_window: usize) -> Option<ExtractedFrame> {
    let bits = nrzi_decode(levels, inverted);
    let start = find_flag(&bits, 0, flag_window)?;
    let body_start = start + HDLC_FLAG.len();
    let end = match find_flag(&bits, body_start, body_start + MAX_FRAME_BITS) {
        Some(end) => end,
        None => {
            tracing::trace!(start, "no closing flag");
            return None;
        }
    };

    let body = match hdlc_destuff(&bits[body_start..end]) {
        Ok(body) => body,
        Err(e) => {
            tracing::trace!(error = %e, "destuff failed");
            return None;
        }
    };
    if body.len() < MIN_BODY_BITS {
        tracing::trace!(len = body.len(), "frame body too short");
        return None;
    }
    let split = body.len() - CRC_BITS;
    Some(ExtractedFrame {
        fcs: body[split..].to_vec(),
        message: body[..split].to_vec(),
    })
}

/// A CRC-valid message recovered from a buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedMessage {
    /// Message bits without FCS
    pub bits: Vec<Bit>,
    /// Decoded message, when the type is supported and the layout is valid
    pub message: Option<AisMessage>,
    /// `!AIVDM` sentences for the message
    pub sentences: Vec<String>,
    /// Preamble correlation; negative when the frequency was negated
    pub correlation: f64,
    pub frequency_correction_hz: f64,
    /// Bit polarity found by frame sync
    pub inverted: bool,
    /// Sample index of the preamble
    pub sample_offset: usize,
    /// Frequency spread of the buffer
    pub activity_hz: f32,
}

/// Configured receive pipeline for one sample rate.
#[derive(Debug, Clone)]
pub struct Receiver {
    sample_rate: f64,
    discriminator: FmDiscriminator,
    clock: ClockRecovery,
    sync: FrameSync,
    flag_search_window: usize,
    channel: char,
    max_payload_chars: usize,
}

impl Receiver {
    pub fn new(sample_rate: f64) -> Result<Self> {
        let sps = check_sample_rate(sample_rate)?;
        Ok(Self {
            sample_rate,
            discriminator: FmDiscriminator::new(sample_rate),
            clock: ClockRecovery::new(sps),
            sync: FrameSync::default(),
            flag_search_window: DEFAULT_FLAG_SEARCH_WINDOW,
            channel: 'A',
            max_payload_chars: DEFAULT_MAX_PAYLOAD_CHARS,
        })
    }

    pub fn with_discriminator(mut self, discriminator: FmDiscriminator) -> Self {
        self.discriminator = discriminator;
        self
    }

    pub fn with_clock_recovery(mut self, clock: ClockRecovery) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_frame_sync(mut self, sync: FrameSync) -> Self {
        self.sync = sync;
        self
    }

    pub fn with_flag_search_window(mut self, bits: usize) -> Self {
        self.flag_search_window = bits;
        self
    }

    /// Channel letter used in generated sentences.
    pub fn with_channel(mut self, channel: char) -> Self {
        self.channel = channel;
        self
    }

    pub fn with_max_payload_chars(mut self, chars: usize) -> Self {
        self.max_payload_chars = chars;
        self
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Run the pipeline over a signal captured at this receiver's rate.
    pub fn receive(&self, signal: &IqSignal) -> Result<ReceivedMessage> {
        if (signal.sample_rate - self.sample_rate).abs() > 1e-6 {
            return Err(AisError::InvalidParameter(format!(
                "signal sampled at {} Hz, receiver configured for {} Hz",
                signal.sample_rate, self.sample_rate
            )));
        }
        self.receive_samples(&signal.samples)
    }

    /// Run the pipeline over raw samples at this receiver's rate.
    pub fn receive_samples(&self, samples: &[IqSample]) -> Result<ReceivedMessage> {
        let (freq, activity_hz) = self.discriminator.demodulate(samples).ok_or(AisError::NoSignal)?;
        let clock = self.clock.recover(&freq).ok_or(AisError::FrameSyncFailure)?;

        let bits = nrzi_decode(&clock.symbols, false);
        let start = self.sync.find(&bits).ok_or(AisError::FrameSyncFailure)?;

        let from = (start.position + TRAINING_SEQUENCE.len()).saturating_sub(TRAINING_TAIL);
        let frame = extract_frame_within(&clock.symbols[from..], start.inverted, self.flag_search_window)
            .ok_or_else(|| AisError::Framing("no complete HDLC frame after the training sequence".into()))?;

        if !frame.crc_ok() {
            let expected = bits_to_u16(&frame.fcs);
            let computed = crc16_value(&frame.message);
            tracing::debug!(expected, computed, "CRC mismatch, frame dropped");
            return Err(AisError::ChecksumMismatch { expected, computed });
        }

        let message = match AisMessage::from_bits(&frame.message) {
            Ok(msg) => Some(msg),
            Err(e) => {
                tracing::debug!(error = %e, len = frame.message.len(), "valid frame with undecodable message");
                None
            }
        };
        let sentences = encode_sentences(&frame.message, self.channel, 0, self.max_payload_chars)?;
        tracing::debug!(
            len = frame.message.len(),
            msg_type = message.as_ref().map(|m| m.message_type()),
            rho = clock.correlation,
            "message received"
        );

        Ok(ReceivedMessage {
            bits: frame.message,
            message,
            sentences,
            correlation: clock.correlation,
            frequency_correction_hz: clock.frequency_correction_hz,
            inverted: start.inverted,
            sample_offset: clock.sample_offset,
            activity_hz,
        })
    }
}

fn bits_to_u16(bits: &[Bit]) -> u16 {
    bits.iter().fold(0u16, |acc, &b| (acc << 1) | (b & 1) as u16)
}

/// Recover CRC-valid message bits from a buffer, or `None`.
pub fn decode_signal(iq: &[IqSample], sample_rate: f64) -> Option<Vec<Bit>> {
    let receiver = Receiver::new(sample_rate).ok()?;
    receiver.receive_samples(iq).ok().map(|m| m.bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hdlc::encode_frame;
    use crate::message::{NavigationStatus, PositionReport};
    use crate::modulator::{FskModulator, GmskModulator};
    use crate::nrzi::nrzi_encode;
    use crate::bits::dearmor;
    use num_complex::Complex32;

    fn reference_report() -> AisMessage {
        let mut report = PositionReport::new(366_982_330);
        report.nav_status = NavigationStatus::UnderWayUsingEngine;
        report.speed_over_ground = Some(12.3);
        report.position_accuracy = true;
        report.longitude = Some(-122.4194);
        report.latitude = Some(37.7749);
        report.course_over_ground = Some(87.5);
        report.true_heading = Some(88);
        report.timestamp = 30;
        AisMessage::PositionReport(report)
    }

    fn gmsk(bits: &[Bit], fs: f64) -> IqSignal {
        GmskModulator::new(fs).unwrap().modulate(&nrzi_encode(&encode_frame(bits)))
    }

    #[test]
    fn test_extract_frame_clean() {
        let bits = dearmor("15MvlfPP1so?Vt@EWFs3Jjht0000", 0).unwrap();
        let levels = nrzi_encode(&encode_frame(&bits));
        let frame = extract_frame(&levels[22..], false).unwrap();
        assert_eq!(frame.message, bits);
        assert!(frame.crc_ok());

        let inverted: Vec<Bit> = levels.iter().map(|l| l ^ 1).collect();
        let frame = extract_frame(&inverted[22..], false).unwrap();
        assert_eq!(frame.message, bits);
    }

    #[test]
    fn test_extract_frame_rejects() {
        let bits = dearmor("15MvlfPP1so?Vt@EWFs3Jjht0000", 0).unwrap();
        let levels = nrzi_encode(&encode_frame(&bits));
        // flag too far in
        assert!(extract_frame(&levels[..], false).is_none());
        // truncated before the closing flag
        assert!(extract_frame(&levels[22..150], false).is_none());
        assert!(extract_frame(&[], false).is_none());
        assert!(extract_frame(&[0, 1, 0], false).is_none());
    }

    #[test]
    fn test_gmsk_round_trip_reference_message() {
        let msg = reference_report();
        let bits = msg.encode().unwrap();
        for fs in [48_000.0, 96_000.0, 50_000.0] {
            let received = Receiver::new(fs).unwrap().receive(&gmsk(&bits, fs)).unwrap();
            assert_eq!(received.bits, bits, "fs {}", fs);
            assert_eq!(received.message.as_ref(), Some(&msg));
            assert_eq!(
                received.sentences,
                vec!["!AIVDM,1,1,,A,15MvlfPP1so?Vt@EWFs3Jjht0000,0*4B".to_string()]
            );
            assert!(received.correlation > 0.9);
        }
    }

    #[test]
    fn test_decode_signal_free_function() {
        let bits = dearmor("15MvlfPP1so?Vt@EWFs3Jjht0000", 0).unwrap();
        let sig = gmsk(&bits, 48_000.0);
        assert_eq!(decode_signal(&sig.samples, 48_000.0), Some(bits));
        assert_eq!(decode_signal(&sig.samples, 10_000.0), None);
    }

    #[test]
    fn test_fsk_and_long_message() {
        let mut bits = dearmor("55P5TL01VIaAL@7WKO@mBplU@<PDhh000000001S;AJ::4A80?4i@E53", 0).unwrap();
        bits.extend(dearmor("1@0000000000000", 2).unwrap());
        let fs = 48_000.0;

        let received = Receiver::new(fs).unwrap().receive(&gmsk(&bits, fs)).unwrap();
        assert_eq!(received.bits, bits);
        assert_eq!(received.sentences.len(), 2);
        assert!(matches!(received.message, Some(AisMessage::StaticVoyageData(_))));

        let fsk = FskModulator::new(fs).unwrap().modulate(&nrzi_encode(&encode_frame(&bits)));
        assert_eq!(decode_signal(&fsk.samples, fs), Some(bits));
    }

    #[test]
    fn test_conjugated_signal() {
        let bits = reference_report().encode().unwrap();
        let mut sig = gmsk(&bits, 48_000.0);
        for s in &mut sig.samples {
            *s = s.conj();
        }
        let received = Receiver::new(48_000.0).unwrap().receive(&sig).unwrap();
        assert_eq!(received.bits, bits);
        assert!(received.correlation < 0.0);
    }

    #[test]
    fn test_carrier_offset_and_leading_silence() {
        let bits = reference_report().encode().unwrap();
        let fs = 48_000.0;
        let sig = gmsk(&bits, fs);
        let cfo = 400.0f64;
        let mut samples = vec![Complex32::new(0.0, 0.0); 2000];
        samples.extend(sig.samples.iter().enumerate().map(|(i, s)| {
            let p = 2.0 * std::f64::consts::PI * cfo * i as f64 / fs;
            s * Complex32::new(p.cos() as f32, p.sin() as f32)
        }));
        let received = Receiver::new(fs).unwrap().receive_samples(&samples).unwrap();
        assert_eq!(received.bits, bits);
        assert!(received.sample_offset > 2000);
    }

    #[test]
    fn test_failure_stages() {
        let fs = 48_000.0;
        let rx = Receiver::new(fs).unwrap();
        assert_eq!(rx.receive_samples(&vec![Complex32::new(0.0, 0.0); 5000]), Err(AisError::NoSignal));
        assert_eq!(rx.receive_samples(&[]), Err(AisError::NoSignal));

        let bits = reference_report().encode().unwrap();
        let mut frame = encode_frame(&bits);
        frame[100] ^= 1;
        let sig = GmskModulator::new(fs).unwrap().modulate(&nrzi_encode(&frame));
        assert!(matches!(rx.receive(&sig), Err(AisError::ChecksumMismatch { .. })));

        let other_rate = IqSignal::new(sig.samples.clone(), 96_000.0);
        assert!(matches!(rx.receive(&other_rate), Err(AisError::InvalidParameter(_))));
    }

    #[test]
    fn test_unsupported_type_still_reported() {
        // type 8 binary broadcast: CRC-valid but not decoded
        let mut bits = vec![0, 0, 1, 0, 0, 0];
        bits.extend((0..90).map(|i| (i % 5 == 1) as Bit));
        let received = Receiver::new(48_000.0).unwrap().receive(&gmsk(&bits, 48_000.0)).unwrap();
        assert_eq!(received.bits, bits);
        assert!(received.message.is_none());
        assert_eq!(received.sentences.len(), 1);
    }
}
