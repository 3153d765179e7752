//! # Thermolog Core Library
//!
//! This crate is the core library for the `thermolog` application: a small
//! environmental telemetry system that reads temperature/humidity from
//! single-wire digital sensors on distributed nodes and persists the readings
//! centrally in an append-only CSV log.
//!
//! ## Crate Structure
//!
//! - **`config`**: Structures for loading application configuration from TOML
//!   files with CLI overrides. See [`config::Settings`].
//! - **`decode`**: The single-wire sensor protocol decoder: level capture,
//!   pulse framing, adaptive bit thresholding, byte assembly and checksum.
//! - **`error`**: The custom [`error::ThermologError`] enum for centralized
//!   error handling across the application.
//! - **`logging`**: Tracing subscriber initialization.
//! - **`node`**: The sensor-node acquisition loop that reads the sensor on a
//!   fixed interval and ships each reading to the ingest server.
//! - **`reading`**: The `Reading` domain object, its wire representation and
//!   the canonical log row format.
//! - **`server`**: The TCP ingest server and the single durable log writer.
//! - **`stats`**: Read-only aggregation over the persisted log.

pub mod config;
pub mod decode;
pub mod error;
pub mod logging;
pub mod node;
pub mod reading;
pub mod server;
pub mod stats;
