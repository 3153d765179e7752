//! Raw level capture.
//!
//! Samples the data line at the tightest achievable loop rate, appending
//! every observed level, and stops once the line has been idle (unchanged)
//! longer than a threshold. The first sample already counts as unchanged
//! relative to itself, so an always-silent line terminates immediately
//! instead of hanging.

use crate::decode::line::{Level, LineDriver};
use std::time::Duration;

/// Consecutive unchanged samples that mark the end of the transmission.
pub const MAX_UNCHANGED_SAMPLES: u32 = 100;

/// Wake-up pre-roll: hold high, then pull down, then release to input.
const WAKE_HIGH: Duration = Duration::from_millis(580);
const WAKE_LOW: Duration = Duration::from_millis(20);

/// Captures one transmission worth of levels from a data line.
#[derive(Debug, Clone)]
pub struct PulseCapture {
    max_unchanged: u32,
}

impl Default for PulseCapture {
    fn default() -> Self {
        Self {
            max_unchanged: MAX_UNCHANGED_SAMPLES,
        }
    }
}

impl PulseCapture {
    /// Capture with a custom idle-run threshold.
    pub fn with_idle_threshold(max_unchanged: u32) -> Self {
        Self { max_unchanged }
    }

    /// Run the wake-up sequence, then sample until the idle threshold trips.
    ///
    /// The sequence of levels is ephemeral; the caller hands it straight to
    /// the framer and drops it.
    pub fn capture<D: LineDriver>(&self, line: &mut D) -> Vec<Level> {
        line.set_output();
        line.write(Level::High);
        line.sleep(WAKE_HIGH);
        line.write(Level::Low);
        line.sleep(WAKE_LOW);
        line.set_input_pullup();

        self.collect(line)
    }

    fn collect<D: LineDriver>(&self, line: &mut D) -> Vec<Level> {
        let mut unchanged = 0u32;
        let mut last: Option<Level> = None;
        let mut samples = Vec::new();

        loop {
            let current = line.read();
            samples.push(current);
            if last != Some(current) {
                unchanged = 0;
                last = Some(current);
            } else {
                unchanged += 1;
                if unchanged > self.max_unchanged {
                    break;
                }
            }
        }

        samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::line::SimulatedLine;

    #[test]
    fn silent_line_terminates_on_idle_threshold() {
        let mut line = SimulatedLine::new(vec![]);
        let samples = PulseCapture::default().capture(&mut line);
        // one initial sample plus the unchanged run that trips the threshold
        assert_eq!(samples.len() as u32, MAX_UNCHANGED_SAMPLES + 2);
        assert!(samples.iter().all(|s| *s == Level::High));
    }

    #[test]
    fn captures_every_sample_including_repeats() {
        let script = vec![
            Level::Low,
            Level::Low,
            Level::High,
            Level::Low,
            Level::High,
        ];
        let mut line = SimulatedLine::new(script.clone());
        let samples = PulseCapture::with_idle_threshold(3).capture(&mut line);
        assert_eq!(&samples[..script.len()], &script[..]);
    }

    #[test]
    fn idle_tail_ends_capture_after_activity() {
        let mut script = vec![Level::Low, Level::High, Level::Low];
        script.extend(std::iter::repeat(Level::High).take(50));
        let mut line = SimulatedLine::new(script);
        let samples = PulseCapture::with_idle_threshold(10).capture(&mut line);
        // stops inside the idle tail, not at its end
        assert!(samples.len() < 50);
    }
}
