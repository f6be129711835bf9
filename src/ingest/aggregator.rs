/// Yearly Aggregation
///
/// Groups a station's sanitized readings by calendar year and reduces each
/// station-year group to a `YearlyStat`:
///
/// - `tmax_yearly` / `tmin_yearly`: mean of the reported values, tenths of °C -> °C.
///   A year with no reported value has no mean (`None`).
/// - `precip_yearly`: sum of the reported values, tenths of mm -> cm.
///   A year with no reported value sums to `0.0`.
use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, HashSet};

use crate::ingest::models::{RawReading, YearlyStat};

/// Tenths of a degree per degree Celsius
pub const TENTHS_PER_DEGREE_C: f64 = 10.0;

/// Tenths of a millimeter per centimeter
pub const TENTHS_MM_PER_CM: f64 = 100.0;

#[derive(Debug, Default)]
struct MeanAccumulator {
    sum: i64,
    count: u32,
}

impl MeanAccumulator {
    fn push(&mut self, value: Option<i32>) {
        if let Some(v) = value {
            self.sum += i64::from(v);
            self.count += 1;
        }
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum as f64 / f64::from(self.count))
    }
}

#[derive(Debug, Default)]
struct YearAccumulator {
    tmax: MeanAccumulator,
    tmin: MeanAccumulator,
    precip_sum: i64,
}

impl YearAccumulator {
    fn push(&mut self, reading: &RawReading) {
        self.tmax.push(reading.tmax);
        self.tmin.push(reading.tmin);
        if let Some(p) = reading.precip {
            self.precip_sum += i64::from(p);
        }
    }

    fn finish(self, site_id: String, year: i32) -> YearlyStat {
        YearlyStat {
            site_id,
            year,
            tmax_yearly: self.tmax.mean().map(|t| t / TENTHS_PER_DEGREE_C),
            tmin_yearly: self.tmin.mean().map(|t| t / TENTHS_PER_DEGREE_C),
            precip_yearly: self.precip_sum as f64 / TENTHS_MM_PER_CM,
        }
    }
}

/// Compute one `YearlyStat` per (site_id, calendar year) present in `readings`.
///
/// Readings must already be sanitized. A repeated (site_id, date) only counts
/// once: the first occurrence wins, matching what the store keeps. Output is
/// ordered by site then year, although callers should not depend on it.
pub fn aggregate_yearly(readings: &[RawReading]) -> Vec<YearlyStat> {
    let mut groups: BTreeMap<(&str, i32), YearAccumulator> = BTreeMap::new();
    let mut seen: HashSet<(&str, NaiveDate)> = HashSet::with_capacity(readings.len());

    for reading in readings {
        if !seen.insert((reading.site_id.as_str(), reading.date)) {
            continue;
        }
        groups
            .entry((reading.site_id.as_str(), reading.date.year()))
            .or_default()
            .push(reading);
    }

    groups
        .into_iter()
        .map(|((site_id, year), acc)| acc.finish(site_id.to_string(), year))
        .collect()
}
