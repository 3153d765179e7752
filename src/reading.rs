//! The reading domain model and its external representations.
//!
//! A [`Reading`] is one accepted acquisition cycle: temperature, humidity,
//! the wall-clock date/time it was taken, the node's location label, the
//! acquisition method and any anomaly flags relative to the previous accepted
//! reading. Readings are immutable once constructed, transmitted once and not
//! retained after send.
//!
//! Two representations leave this module:
//!
//! - [`WireReading`]: the JSON object carried over the wire, one per
//!   connection, wrapped in a single-element array.
//! - the canonical log row `date,time,temperature,humidity,location`
//!   produced by [`WireReading::to_row`].

use chrono::Local;
use serde::{Deserialize, Serialize};

/// Temperature delta (°C) against the previous reading that raises the TEMP
/// anomaly flag.
pub const TEMP_ANOMALY_DELTA: f64 = 5.0;
/// Humidity delta (%RH) against the previous reading that raises the HUM
/// anomaly flag.
pub const HUM_ANOMALY_DELTA: f64 = 10.0;

/// Default for the optional wire fields when a producer omits them.
pub const UNKNOWN: &str = "unknown";

/// How a reading was acquired on the sensor node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Single-wire pulse-train decoder on a GPIO pin.
    Gpio,
    /// Line-based serial transport (`"<temperature>,<humidity>"`).
    Arduino,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Gpio => "gpio",
            Method::Arduino => "arduino",
        }
    }
}

/// Markers attached to a reading that deviates from the immediately
/// preceding one beyond a fixed threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnomalyFlags {
    pub temp: bool,
    pub hum: bool,
}

impl AnomalyFlags {
    /// Compare against the previous accepted reading. `None` (first cycle)
    /// raises no flags.
    pub fn compute(previous: Option<&Reading>, temperature: f64, humidity: f64) -> Self {
        match previous {
            Some(prev) => Self {
                temp: (temperature - prev.temperature).abs() >= TEMP_ANOMALY_DELTA,
                hum: (humidity - prev.humidity).abs() >= HUM_ANOMALY_DELTA,
            },
            None => Self::default(),
        }
    }

    pub fn any(&self) -> bool {
        self.temp || self.hum
    }
}

/// One accepted acquisition cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub date: String,
    pub time: String,
    pub temperature: f64,
    pub humidity: f64,
    pub location: String,
    pub method: Method,
    pub flags: AnomalyFlags,
}

impl Reading {
    /// Build a reading stamped with the local wall clock, flagging anomalies
    /// against the previous accepted reading.
    pub fn now(
        temperature: f64,
        humidity: f64,
        location: &str,
        method: Method,
        previous: Option<&Reading>,
    ) -> Self {
        let now = Local::now();
        Self {
            date: now.format("%Y-%m-%d").to_string(),
            time: now.format("%H:%M:%S").to_string(),
            temperature,
            humidity,
            location: location.to_string(),
            method,
            flags: AnomalyFlags::compute(previous, temperature, humidity),
        }
    }

    /// The wire form of this reading.
    pub fn to_wire(&self) -> WireReading {
        WireReading {
            date: self.date.clone(),
            time: self.time.clone(),
            temperature: self.temperature,
            humidity: self.humidity,
            location: self.location.clone(),
            method: self.method.as_str().to_string(),
        }
    }
}

/// The JSON object exchanged between node and server.
///
/// `Date`, `Time`, `Temperature` and `Humidity` are required; `Location` and
/// `Method` default to `"unknown"` when a producer omits them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WireReading {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Time")]
    pub time: String,
    #[serde(rename = "Temperature")]
    pub temperature: f64,
    #[serde(rename = "Humidity")]
    pub humidity: f64,
    #[serde(rename = "Location", default = "unknown_string")]
    pub location: String,
    #[serde(rename = "Method", default = "unknown_string")]
    pub method: String,
}

fn unknown_string() -> String {
    UNKNOWN.to_string()
}

impl WireReading {
    /// The canonical delimited log row, without the trailing newline.
    pub fn to_row(&self) -> String {
        format!(
            "{},{},{},{},{}",
            self.date,
            self.time,
            fmt_float(self.temperature),
            fmt_float(self.humidity),
            self.location
        )
    }
}

/// Format a float for the log row, always keeping a decimal point
/// (`40.0`, not `40`) so rows parse uniformly downstream.
fn fmt_float(value: f64) -> String {
    format!("{value:?}")
}
