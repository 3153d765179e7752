//! Bit decoding, byte assembly and checksum verification.
//!
//! Absolute pulse timing varies with sampling jitter and clock drift, so
//! bits are classified purely relative to the frame they arrived in: the
//! threshold is the midpoint of that frame's own shortest and longest
//! pull-up. No state is carried between frames.

use crate::error::{Result, ThermologError};

/// Number of data pulses in a valid frame (4 payload bytes + checksum).
pub const FRAME_PULSES: usize = 40;

/// The 40 pull-up durations of one valid frame.
pub type PulseFrame = [u32; FRAME_PULSES];

/// Classify each pulse against the frame-local midpoint threshold.
///
/// Threshold = min + (max − min) / 2; a pulse exactly at the threshold
/// classifies as 0.
pub fn decode_bits(frame: &PulseFrame) -> [bool; FRAME_PULSES] {
    let shortest = frame.iter().copied().min().unwrap_or(0);
    let longest = frame.iter().copied().max().unwrap_or(0);
    let halfway = f64::from(shortest) + f64::from(longest - shortest) / 2.0;

    let mut bits = [false; FRAME_PULSES];
    for (bit, &length) in bits.iter_mut().zip(frame.iter()) {
        *bit = f64::from(length) > halfway;
    }
    bits
}

/// Pack 40 bits MSB-first into 5 bytes.
pub fn bits_to_bytes(bits: &[bool; FRAME_PULSES]) -> [u8; 5] {
    let mut bytes = [0u8; 5];
    for (index, &bit) in bits.iter().enumerate() {
        bytes[index / 8] = bytes[index / 8] << 1 | u8::from(bit);
    }
    bytes
}

/// Verify the checksum byte against the masked sum of the payload bytes.
///
/// The sum is widened before masking so a carry past 8 bits cannot cause a
/// false mismatch.
pub fn verify_checksum(bytes: &[u8; 5]) -> Result<()> {
    let sum: u16 = bytes[..4].iter().map(|&b| u16::from(b)).sum();
    let computed = (sum & 0xFF) as u8;
    if bytes[4] == computed {
        Ok(())
    } else {
        Err(ThermologError::Checksum {
            expected: bytes[4],
            computed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_short_pulses_decode_to_zeros() {
        let frame: PulseFrame = [3; FRAME_PULSES];
        assert!(decode_bits(&frame).iter().all(|&b| !b));
    }

    #[test]
    fn pulses_below_midpoint_decode_to_zero_above_to_one() {
        let mut frame: PulseFrame = [2; FRAME_PULSES];
        frame[0] = 8; // midpoint is 5
        let bits = decode_bits(&frame);
        assert!(bits[0]);
        assert!(bits[1..].iter().all(|&b| !b));
    }

    #[test]
    fn pulse_exactly_at_threshold_classifies_as_zero() {
        let mut frame: PulseFrame = [2; FRAME_PULSES];
        frame[0] = 8;
        frame[1] = 5; // exactly the midpoint
        let bits = decode_bits(&frame);
        assert!(!bits[1]);
    }

    #[test]
    fn fractional_midpoint_splits_correctly() {
        // min 2, max 7 -> halfway 4.5; 4 is below, 5 is above
        let mut frame: PulseFrame = [2; FRAME_PULSES];
        frame[0] = 7;
        frame[1] = 4;
        frame[2] = 5;
        let bits = decode_bits(&frame);
        assert!(bits[0]);
        assert!(!bits[1]);
        assert!(bits[2]);
    }

    #[test]
    fn packs_msb_first() {
        let mut bits = [false; FRAME_PULSES];
        bits[0] = true; // MSB of byte 0
        bits[15] = true; // LSB of byte 1
        let bytes = bits_to_bytes(&bits);
        assert_eq!(bytes, [0b1000_0000, 0b0000_0001, 0, 0, 0]);
    }

    #[test]
    fn checksum_accepts_masked_sum() {
        verify_checksum(&[0x01, 0x02, 0x03, 0x04, 0x0A]).expect("valid checksum");
    }

    #[test]
    fn checksum_accepts_sum_past_eight_bits() {
        // 0xF0 + 0xF0 + 0x20 + 0x10 = 0x210 -> masked 0x10
        verify_checksum(&[0xF0, 0xF0, 0x20, 0x10, 0x10]).expect("carry must be masked away");
    }

    #[test]
    fn checksum_rejects_every_other_fifth_byte() {
        let payload = [0x28, 0x05, 0x17, 0x02];
        let valid = 0x28u8
            .wrapping_add(0x05)
            .wrapping_add(0x17)
            .wrapping_add(0x02);
        for fifth in 0..=u8::MAX {
            let frame = [payload[0], payload[1], payload[2], payload[3], fifth];
            let result = verify_checksum(&frame);
            if fifth == valid {
                assert!(result.is_ok());
            } else {
                match result {
                    Err(ThermologError::Checksum { expected, computed }) => {
                        assert_eq!(expected, fifth);
                        assert_eq!(computed, valid);
                    }
                    other => panic!("expected checksum error, got {other:?}"),
                }
            }
        }
    }
}
