//! Raspberry Pi GPIO adapter for the data-line capability.
//!
//! Maps [`LineDriver`] onto an `rppal` I/O pin. The pin is claimed once at
//! construction and flipped between output (wake-up sequencing) and
//! pulled-up input (sampling) per acquisition.

use crate::decode::line::{Level, LineDriver};
use crate::error::ThermologError;
use rppal::gpio::{Gpio, IoPin, Level as PinLevel, Mode, PullUpDown};
use std::time::Duration;

pub struct GpioLine {
    pin: IoPin,
}

impl GpioLine {
    /// Claim the given BCM pin for sensor use.
    pub fn open(bcm_pin: u8) -> Result<Self, ThermologError> {
        let gpio = Gpio::new().map_err(|e| ThermologError::Acquisition(e.to_string()))?;
        let pin = gpio
            .get(bcm_pin)
            .map_err(|e| ThermologError::Acquisition(e.to_string()))?
            .into_io(Mode::Output);
        Ok(Self { pin })
    }
}

impl LineDriver for GpioLine {
    fn set_output(&mut self) {
        self.pin.set_mode(Mode::Output);
    }

    fn set_input_pullup(&mut self) {
        self.pin.set_mode(Mode::Input);
        self.pin.set_pullupdown(PullUpDown::PullUp);
    }

    fn write(&mut self, level: Level) {
        self.pin.write(match level {
            Level::High => PinLevel::High,
            Level::Low => PinLevel::Low,
        });
    }

    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }

    fn read(&mut self) -> Level {
        match self.pin.read() {
            PinLevel::High => Level::High,
            PinLevel::Low => Level::Low,
        }
    }
}
