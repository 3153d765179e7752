//! Alternate line-based sensor transport.
//!
//! Some nodes carry the sensor on a microcontroller that prints one
//! `"<temperature>,<humidity>"` line per acquisition over a serial link
//! instead of exposing the raw data line. This module opens that byte
//! stream (auto-detecting the port when none is configured) and parses the
//! lines into [`SensorSample`]s.

use crate::decode::SensorSample;
use crate::error::{Result, ThermologError};
use crate::node::Acquire;
use crate::reading::Method;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{timeout, Duration};
use tokio_serial::{SerialPortBuilderExt, SerialPortType, SerialStream};
use tracing::info;

const LINE_DEADLINE: Duration = Duration::from_secs(5);

pub struct SerialSource {
    reader: BufReader<SerialStream>,
}

impl SerialSource {
    /// Open the configured port, or the first USB serial device found when
    /// the port is left empty.
    pub fn open(port: &str, baud: u32) -> Result<Self> {
        let path = if port.is_empty() {
            detect_port()?
        } else {
            port.to_string()
        };

        let stream = tokio_serial::new(&path, baud)
            .open_native_async()
            .map_err(|e| ThermologError::Acquisition(format!("open {path}: {e}")))?;
        info!(%path, baud, "serial transport opened");

        Ok(Self {
            reader: BufReader::new(stream),
        })
    }
}

#[async_trait]
impl Acquire for SerialSource {
    fn method(&self) -> Method {
        Method::Arduino
    }

    async fn acquire(&mut self) -> Result<SensorSample> {
        let mut line = String::new();
        let n = timeout(LINE_DEADLINE, self.reader.read_line(&mut line))
            .await
            .map_err(|_| ThermologError::Acquisition("serial line timed out".to_string()))?
            .map_err(|e| ThermologError::Acquisition(format!("serial read: {e}")))?;

        if n == 0 {
            return Err(ThermologError::Acquisition(
                "serial stream closed".to_string(),
            ));
        }
        parse_line(line.trim())
    }
}

/// First enumerated USB serial device.
pub fn detect_port() -> Result<String> {
    let ports = tokio_serial::available_ports()
        .map_err(|e| ThermologError::Acquisition(format!("enumerate ports: {e}")))?;

    ports
        .into_iter()
        .find(|p| matches!(p.port_type, SerialPortType::UsbPort(_)))
        .map(|p| p.port_name)
        .ok_or_else(|| ThermologError::Acquisition("no USB serial port found".to_string()))
}

/// Parse one `"<temperature>,<humidity>"` line.
fn parse_line(line: &str) -> Result<SensorSample> {
    let malformed = || ThermologError::Acquisition(format!("malformed serial line: {line:?}"));

    let (temperature, humidity) = line.split_once(',').ok_or_else(malformed)?;
    Ok(SensorSample {
        temperature: temperature.trim().parse().map_err(|_| malformed())?,
        humidity: humidity.trim().parse().map_err(|_| malformed())?,
    })
}
