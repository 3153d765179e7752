//! Read-only aggregation over the persisted log.
//!
//! The dashboard side of the system consumes the log file one row per line
//! and never writes it. This module parses the canonical rows with the
//! `csv` crate and produces per-location aggregates for the `stats`
//! subcommand.

use crate::error::Result;
use std::collections::BTreeMap;
use std::path::Path;

/// Aggregate over one location's readings.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationSummary {
    pub count: usize,
    pub temperature_min: f64,
    pub temperature_max: f64,
    pub temperature_mean: f64,
    pub humidity_min: f64,
    pub humidity_max: f64,
    pub humidity_mean: f64,
}

/// Parse the log and fold every row into its location's summary.
///
/// Rows that do not parse are counted and skipped; a half-written tail from
/// a crashed writer must not poison the aggregates.
pub fn summarize(log_path: &Path) -> Result<(BTreeMap<String, LocationSummary>, usize)> {
    let file = std::fs::File::open(log_path)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut totals: BTreeMap<String, (usize, f64, f64, f64, f64, f64, f64)> = BTreeMap::new();
    let mut skipped = 0usize;

    for record in reader.records() {
        let record = match record {
            Ok(r) => r,
            Err(_) => {
                skipped += 1;
                continue;
            }
        };

        // date,time,temperature,humidity,location
        let parsed = (
            record.get(2).and_then(|v| v.parse::<f64>().ok()),
            record.get(3).and_then(|v| v.parse::<f64>().ok()),
            record.get(4),
        );
        let (Some(temperature), Some(humidity), Some(location)) = parsed else {
            skipped += 1;
            continue;
        };

        let entry = totals.entry(location.to_string()).or_insert((
            0,
            f64::INFINITY,
            f64::NEG_INFINITY,
            0.0,
            f64::INFINITY,
            f64::NEG_INFINITY,
            0.0,
        ));
        entry.0 += 1;
        entry.1 = entry.1.min(temperature);
        entry.2 = entry.2.max(temperature);
        entry.3 += temperature;
        entry.4 = entry.4.min(humidity);
        entry.5 = entry.5.max(humidity);
        entry.6 += humidity;
    }

    let summaries = totals
        .into_iter()
        .map(|(location, (count, t_min, t_max, t_sum, h_min, h_max, h_sum))| {
            let n = count as f64;
            (
                location,
                LocationSummary {
                    count,
                    temperature_min: t_min,
                    temperature_max: t_max,
                    temperature_mean: t_sum / n,
                    humidity_min: h_min,
                    humidity_max: h_max,
                    humidity_mean: h_sum / n,
                },
            )
        })
        .collect();

    Ok((summaries, skipped))
}

/// Render the summaries the way the `stats` subcommand prints them.
pub fn render(summaries: &BTreeMap<String, LocationSummary>, skipped: usize) -> String {
    let mut out = String::new();
    for (location, s) in summaries {
        out.push_str(&format!(
            "{location}: {} readings  temp {:.1}..{:.1} (mean {:.1})  hum {:.1}..{:.1} (mean {:.1})\n",
            s.count,
            s.temperature_min,
            s.temperature_max,
            s.temperature_mean,
            s.humidity_min,
            s.humidity_max,
            s.humidity_mean,
        ));
    }
    if skipped > 0 {
        out.push_str(&format!("({skipped} unparseable rows skipped)\n"));
    }
    out
}
