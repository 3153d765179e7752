//! Single-wire sensor protocol decoder.
//!
//! Reconstructs a 40-bit data frame from a raw stream of digital level
//! samples using strict timing classification:
//!
//! 1. [`capture::PulseCapture`] wakes the sensor and samples the line until
//!    it goes idle.
//! 2. [`framing::frame_pulses`] walks the level sequence with a five-state
//!    machine and extracts the data pull-up durations.
//! 3. [`bits::decode_bits`] classifies each duration against the frame-local
//!    midpoint threshold.
//! 4. [`bits::bits_to_bytes`] packs the bits MSB-first and
//!    [`bits::verify_checksum`] validates the fifth byte.
//!
//! [`Dht11`] composes the pipeline over any [`line::LineDriver`]. A frame
//! that does not produce exactly 40 pulses is `MissingData`; a checksum
//! mismatch is `Checksum`. Neither returns partial values: a wrong
//! environmental reading is worse than a missing one.

pub mod bits;
pub mod capture;
pub mod framing;
#[cfg(feature = "gpio")]
pub mod gpio;
pub mod line;

pub use bits::{FRAME_PULSES, PulseFrame};
pub use capture::PulseCapture;
pub use line::{Level, LineDriver, SimulatedLine};

use crate::error::{Result, ThermologError};

/// One decoded sensor acquisition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSample {
    pub temperature: f64,
    pub humidity: f64,
}

/// DHT11-class sensor reader over an abstract data line.
pub struct Dht11<D> {
    line: D,
    capture: PulseCapture,
}

impl<D: LineDriver> Dht11<D> {
    pub fn new(line: D) -> Self {
        Self {
            line,
            capture: PulseCapture::default(),
        }
    }

    /// Run one full acquisition: capture, frame, decode, verify.
    pub fn read(&mut self) -> Result<SensorSample> {
        let samples = self.capture.capture(&mut self.line);
        let pulses = framing::frame_pulses(&samples);

        let frame: PulseFrame = pulses
            .try_into()
            .map_err(|rejected: Vec<u32>| ThermologError::MissingData {
                pulses: rejected.len(),
            })?;

        let decoded = bits::decode_bits(&frame);
        let bytes = bits::bits_to_bytes(&decoded);
        bits::verify_checksum(&bytes)?;

        // bytes[0]: humidity int, bytes[1]: humidity tenths,
        // bytes[2]: temperature int, bytes[3]: temperature tenths
        Ok(SensorSample {
            temperature: f64::from(bytes[2]) + f64::from(bytes[3]) / 10.0,
            humidity: f64::from(bytes[0]) + f64::from(bytes[1]) / 10.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_synthesized_frame() {
        let mut sensor = Dht11::new(SimulatedLine::for_bytes([40, 5, 23, 2]));
        let sample = sensor.read().expect("valid frame");
        assert!((sample.humidity - 40.5).abs() < 1e-9);
        assert!((sample.temperature - 23.2).abs() < 1e-9);
    }

    #[test]
    fn decodes_sample_values() {
        let mut sensor = Dht11::new(SimulatedLine::for_sample(21.5, 40.0));
        let sample = sensor.read().expect("valid frame");
        assert!((sample.temperature - 21.5).abs() < 1e-9);
        assert!((sample.humidity - 40.0).abs() < 1e-9);
    }

    #[test]
    fn silent_line_is_missing_data() {
        let mut sensor = Dht11::new(SimulatedLine::new(vec![]));
        match sensor.read() {
            Err(ThermologError::MissingData { pulses }) => assert_eq!(pulses, 0),
            other => panic!("expected MissingData, got {other:?}"),
        }
    }

    #[test]
    fn truncated_frame_is_missing_data() {
        // a valid frame cut off after the preamble and a few bits
        let full = SimulatedLine::for_bytes([1, 2, 3, 4]);
        let truncated: Vec<Level> = {
            let mut line = full;
            let mut levels = Vec::new();
            for _ in 0..60 {
                levels.push(line.read());
            }
            levels
        };
        let mut sensor = Dht11::new(SimulatedLine::new(truncated));
        match sensor.read() {
            Err(ThermologError::MissingData { pulses }) => assert!(pulses < FRAME_PULSES),
            other => panic!("expected MissingData, got {other:?}"),
        }
    }

    #[test]
    fn corrupted_checksum_is_rejected() {
        // hand-build a frame whose fifth byte is wrong
        let payload = [40u8, 0, 23, 0];
        let mut bytes = [0u8; 5];
        bytes[..4].copy_from_slice(&payload);
        bytes[4] = 0xFF; // sum is 63, deliberately wrong

        let mut frame: PulseFrame = [0; FRAME_PULSES];
        for (index, slot) in frame.iter_mut().enumerate() {
            let byte = bytes[index / 8];
            let bit = byte >> (7 - index % 8) & 1 == 1;
            *slot = if bit { 7 } else { 2 };
        }
        let decoded = bits::decode_bits(&frame);
        let assembled = bits::bits_to_bytes(&decoded);
        assert!(matches!(
            bits::verify_checksum(&assembled),
            Err(ThermologError::Checksum { .. })
        ));
    }
}
