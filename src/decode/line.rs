//! The data-line capability interface.
//!
//! The decoder never touches hardware directly. Everything it needs from the
//! physical world is expressed by [`LineDriver`]: switch the pin direction,
//! drive a level, sleep, read a level. The production implementation is a
//! GPIO pin (feature `gpio`); tests and the `sim` acquisition method use
//! [`SimulatedLine`], which replays a synthetic waveform.

use rand::Rng;
use std::time::Duration;

/// A binary level on the data line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

/// Capability trait for the single data line the sensor hangs off.
///
/// Methods are synchronous on purpose: the capture loop is a busy-wait
/// sampler whose timing an await point would destroy. Implementations run
/// under `spawn_blocking` when called from async code.
pub trait LineDriver: Send {
    /// Configure the line as an output.
    fn set_output(&mut self);
    /// Configure the line as an input with the pull-up engaged.
    fn set_input_pullup(&mut self);
    /// Drive the line while configured as an output.
    fn write(&mut self, level: Level);
    /// Block for the given duration (wake-up sequencing).
    fn sleep(&mut self, duration: Duration);
    /// Sample the line while configured as an input.
    fn read(&mut self) -> Level;
}

/// Replays a scripted level sequence; once the script runs out the line
/// reads as idle high forever, so capture terminates on the unchanged-run
/// threshold.
pub struct SimulatedLine {
    script: Vec<Level>,
    cursor: usize,
}

// Sample counts for synthesized waveforms. A zero bit's pull-up stays well
// below the frame midpoint, a one bit's well above, even with jitter.
const INIT_LOW_RUN: usize = 8;
const INIT_HIGH_RUN: usize = 4;
const SEPARATOR_LOW_RUN: usize = 3;
const ZERO_HIGH_RUN: usize = 2;
const ONE_HIGH_RUN: usize = 7;

impl SimulatedLine {
    pub fn new(script: Vec<Level>) -> Self {
        Self { script, cursor: 0 }
    }

    /// Synthesize a complete valid frame for the four payload bytes,
    /// appending the correct checksum byte.
    pub fn for_bytes(payload: [u8; 4]) -> Self {
        let checksum = payload
            .iter()
            .fold(0u8, |acc, byte| acc.wrapping_add(*byte));
        let mut bytes = [0u8; 5];
        bytes[..4].copy_from_slice(&payload);
        bytes[4] = checksum;
        Self::new(frame_waveform(&bytes))
    }

    /// Synthesize a frame encoding the given temperature and humidity the
    /// way the sensor does: integer and tenths bytes for each.
    pub fn for_sample(temperature: f64, humidity: f64) -> Self {
        let split = |value: f64| -> (u8, u8) {
            let int = value.floor();
            let frac = ((value - int) * 10.0).round();
            (int as u8, frac as u8)
        };
        let (hum_int, hum_frac) = split(humidity);
        let (temp_int, temp_frac) = split(temperature);
        Self::for_bytes([hum_int, hum_frac, temp_int, temp_frac])
    }
}

impl LineDriver for SimulatedLine {
    fn set_output(&mut self) {}

    fn set_input_pullup(&mut self) {}

    fn write(&mut self, _level: Level) {}

    fn sleep(&mut self, _duration: Duration) {}

    fn read(&mut self) -> Level {
        match self.script.get(self.cursor) {
            Some(level) => {
                self.cursor += 1;
                *level
            }
            None => Level::High,
        }
    }
}

/// Build the level sequence of one sensor response frame: initial pull-down,
/// initial pull-up, then 40 (separator, pull-up) pairs whose pull-up run
/// length encodes the bit, closed by a final separator so the last pulse
/// commits. The low runs carry ±1 sample of jitter like a real line; the
/// data pull-ups use fixed short/long counts so the encoded bits are exact
/// even for a frame of all-identical bits.
fn frame_waveform(bytes: &[u8; 5]) -> Vec<Level> {
    let mut rng = rand::thread_rng();
    let mut jittered = |base: usize| base + rng.gen_range(0..=2) - 1;

    let mut levels = Vec::new();
    let mut push = |level: Level, count: usize| {
        for _ in 0..count {
            levels.push(level);
        }
    };

    push(Level::High, 2); // line released before the sensor responds
    push(Level::Low, jittered(INIT_LOW_RUN));
    push(Level::High, jittered(INIT_HIGH_RUN));

    for byte in bytes {
        for bit_index in (0..8).rev() {
            let run = if byte >> bit_index & 1 == 1 {
                ONE_HIGH_RUN
            } else {
                ZERO_HIGH_RUN
            };
            push(Level::Low, jittered(SEPARATOR_LOW_RUN));
            push(Level::High, run);
        }
    }
    push(Level::Low, jittered(SEPARATOR_LOW_RUN));

    levels
}
