//! Pulse framing.
//!
//! Walks a captured level sequence with a five-state machine and extracts the
//! durations of the data pull-up pulses. The sensor answers the wake-up with
//! an initial pull-down and pull-up, then sends each bit as a fixed pull-down
//! separator followed by a pull-up whose length encodes the bit. A high→low
//! edge commits the just-completed pull-up's duration.
//!
//! The framer itself is length-agnostic; the caller must check for exactly 40
//! pulses and treat anything else as missing data. There is no partial-frame
//! recovery here; retry happens one level up by re-capturing from scratch.

use crate::decode::line::Level;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    InitPulldown,
    InitPullup,
    DataFirstPulldown,
    DataPullup,
    DataPulldown,
}

/// Extract the data pull-up durations (in sample counts) from a raw level
/// sequence. Levels that do not match the awaited edge simply extend the
/// current run without a state change.
pub fn frame_pulses(samples: &[Level]) -> Vec<u32> {
    let mut state = State::InitPulldown;
    let mut lengths = Vec::new();
    let mut current_length = 0u32;

    for &current in samples {
        current_length += 1;

        match state {
            State::InitPulldown => {
                if current == Level::Low {
                    state = State::InitPullup;
                }
            }
            State::InitPullup => {
                if current == Level::High {
                    state = State::DataFirstPulldown;
                }
            }
            State::DataFirstPulldown => {
                if current == Level::Low {
                    state = State::DataPullup;
                }
            }
            State::DataPullup => {
                if current == Level::High {
                    // the length of this pull-up determines the bit
                    current_length = 0;
                    state = State::DataPulldown;
                }
            }
            State::DataPulldown => {
                if current == Level::Low {
                    lengths.push(current_length);
                    state = State::DataPullup;
                }
            }
        }
    }

    lengths
}
