//! The sensor-node acquisition loop.
//!
//! Each cycle: acquire a sample from the configured source, flag anomalies
//! against the previous accepted reading, stamp a [`Reading`], ship it to
//! the ingest server over a fresh connection and close. Cycles run on
//! wall-clock-aligned ticks so a slow acquisition does not accumulate
//! drift; transient failures back off for a fixed period and retry; the
//! shutdown signal ends the loop between cycles, never mid-acquisition.
//!
//! The previous reading is an explicit accumulator threaded through the
//! loop; there is no shared mutable state anywhere on the node.

#[cfg(feature = "serial")]
pub mod serial;

use crate::config::NodeSettings;
use crate::decode::{Dht11, SensorSample, SimulatedLine};
use crate::error::{Result, ThermologError};
use crate::reading::{Method, Reading};
use async_trait::async_trait;
use rand::Rng;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::time::{interval, sleep, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

/// A per-cycle source of sensor samples.
#[async_trait]
pub trait Acquire: Send {
    /// The acquisition method stamped on readings from this source.
    fn method(&self) -> Method;

    /// Produce one sample, or a transient error for this cycle.
    async fn acquire(&mut self) -> Result<SensorSample>;
}

/// Single-wire decoder on a GPIO pin.
#[cfg(feature = "gpio")]
pub struct GpioSource {
    sensor: Option<Dht11<crate::decode::gpio::GpioLine>>,
}

#[cfg(feature = "gpio")]
impl GpioSource {
    pub fn open(bcm_pin: u8) -> Result<Self> {
        let line = crate::decode::gpio::GpioLine::open(bcm_pin)?;
        Ok(Self {
            sensor: Some(Dht11::new(line)),
        })
    }
}

#[cfg(feature = "gpio")]
#[async_trait]
impl Acquire for GpioSource {
    fn method(&self) -> Method {
        Method::Gpio
    }

    async fn acquire(&mut self) -> Result<SensorSample> {
        // the busy-wait sampler must not run on the async runtime
        let mut sensor = self
            .sensor
            .take()
            .ok_or_else(|| ThermologError::Acquisition("sensor lost to a panic".to_string()))?;

        let (sensor, result) = tokio::task::spawn_blocking(move || {
            let result = sensor.read();
            (sensor, result)
        })
        .await
        .map_err(|e| ThermologError::Acquisition(format!("sampler task: {e}")))?;

        self.sensor = Some(sensor);
        result
    }
}

/// Synthetic sensor: random-walks a baseline and pushes each value through
/// the full decode pipeline, so the node exercises the real code path
/// without hardware.
pub struct SimSource {
    temperature: f64,
    humidity: f64,
}

impl Default for SimSource {
    fn default() -> Self {
        Self {
            temperature: 22.0,
            humidity: 45.0,
        }
    }
}

#[async_trait]
impl Acquire for SimSource {
    fn method(&self) -> Method {
        Method::Gpio
    }

    async fn acquire(&mut self) -> Result<SensorSample> {
        let mut rng = rand::thread_rng();
        self.temperature =
            ((self.temperature + rng.gen_range(-0.3..=0.3)).clamp(5.0, 40.0) * 10.0).round() / 10.0;
        self.humidity =
            ((self.humidity + rng.gen_range(-0.8..=0.8)).clamp(20.0, 90.0) * 10.0).round() / 10.0;

        let mut sensor = Dht11::new(SimulatedLine::for_sample(self.temperature, self.humidity));
        sensor.read()
    }
}

/// Build the acquisition source named in the settings.
pub fn build_source(settings: &NodeSettings) -> Result<Box<dyn Acquire>> {
    match settings.method.as_str() {
        "sim" => Ok(Box::new(SimSource::default())),
        #[cfg(feature = "gpio")]
        "gpio" => Ok(Box::new(GpioSource::open(settings.gpio_pin)?)),
        #[cfg(not(feature = "gpio"))]
        "gpio" => Err(ThermologError::Acquisition(
            "built without the 'gpio' feature".to_string(),
        )),
        #[cfg(feature = "serial")]
        "serial" | "arduino" => Ok(Box::new(serial::SerialSource::open(
            &settings.serial_port,
            settings.serial_baud,
        )?)),
        #[cfg(not(feature = "serial"))]
        "serial" | "arduino" => Err(ThermologError::Acquisition(
            "built without the 'serial' feature".to_string(),
        )),
        other => Err(ThermologError::Acquisition(format!(
            "unknown acquisition method {other:?}"
        ))),
    }
}

/// Run the acquisition loop until the shutdown signal fires.
pub async fn run(settings: NodeSettings, mut shutdown: watch::Receiver<bool>) -> Result<()> {
    let mut source = build_source(&settings)?;
    let endpoint = format!("{}:{}", settings.server_addr, settings.server_port);
    let retry = Duration::from_secs(settings.retry_secs);

    // ticks fire at start + n * period regardless of how long a cycle took
    let mut ticks = interval(Duration::from_secs(settings.interval_secs.max(1)));
    ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(%endpoint, method = settings.method, "sensor node started");
    let mut previous: Option<Reading> = None;

    loop {
        tokio::select! {
            _ = ticks.tick() => {}
            _ = shutdown.changed() => {
                info!("sensor node stopping");
                return Ok(());
            }
        }

        match run_cycle(source.as_mut(), &endpoint, &settings.location, previous.as_ref()).await {
            Ok(reading) => {
                debug!(
                    temperature = reading.temperature,
                    humidity = reading.humidity,
                    "cycle complete"
                );
                previous = Some(reading);
            }
            Err(e) if e.is_transient() => {
                warn!("acquisition failed, retrying in {}s: {e}", retry.as_secs());
                tokio::select! {
                    _ = sleep(retry) => {}
                    _ = shutdown.changed() => {
                        info!("sensor node stopping");
                        return Ok(());
                    }
                }
            }
            Err(e) => return Err(e),
        }
    }
}

/// One acquisition cycle: sample, flag, stamp, send.
async fn run_cycle(
    source: &mut dyn Acquire,
    endpoint: &str,
    location: &str,
    previous: Option<&Reading>,
) -> Result<Reading> {
    let sample = source.acquire().await?;
    let reading = Reading::now(
        sample.temperature,
        sample.humidity,
        location,
        source.method(),
        previous,
    );

    if reading.flags.temp {
        warn!(
            temperature = reading.temperature,
            "temperature anomaly against previous reading"
        );
    }
    if reading.flags.hum {
        warn!(
            humidity = reading.humidity,
            "humidity anomaly against previous reading"
        );
    }

    send_reading(endpoint, &reading).await?;
    Ok(reading)
}

/// Ship one reading over a fresh connection, then close it.
async fn send_reading(endpoint: &str, reading: &Reading) -> Result<()> {
    let transport = |e: std::io::Error| ThermologError::Acquisition(format!("send: {e}"));

    let payload = serde_json::to_vec(&[reading.to_wire()])
        .map_err(|e| ThermologError::Parse(e.to_string()))?;

    let mut socket = TcpStream::connect(endpoint).await.map_err(transport)?;
    socket.write_all(&payload).await.map_err(transport)?;
    socket.shutdown().await.map_err(transport)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NodeSettings;

    #[tokio::test]
    async fn sim_source_produces_decodable_samples() {
        let mut source = SimSource::default();
        for _ in 0..5 {
            let sample = source.acquire().await.expect("simulated frame decodes");
            assert!((5.0..=40.0).contains(&sample.temperature));
            assert!((20.0..=90.0).contains(&sample.humidity));
        }
    }

    #[test]
    fn unknown_method_is_rejected() {
        let settings = NodeSettings {
            method: "carrier-pigeon".to_string(),
            ..NodeSettings::default()
        };
        assert!(build_source(&settings).is_err());
    }

    #[tokio::test]
    async fn cycle_threads_previous_reading_through() {
        // bind a throwaway listener so send_reading succeeds
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let endpoint = listener.local_addr().expect("addr").to_string();
        tokio::spawn(async move {
            loop {
                let _ = listener.accept().await;
            }
        });

        let mut source = SimSource::default();
        let first = run_cycle(&mut source, &endpoint, "lab", None)
            .await
            .expect("first cycle");
        assert!(!first.flags.any());

        let second = run_cycle(&mut source, &endpoint, "lab", Some(&first))
            .await
            .expect("second cycle");
        // the random walk moves at most ~1 per step, far below the thresholds
        assert!(!second.flags.any());
    }
}
