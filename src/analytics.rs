//! Server-side energy analytics: consumption pattern, next-hour forecast,
//! carbon footprint and time-of-use cost.

use crate::filter::{parse_timestamp, sort_chronologically};
use crate::models::{Analysis, EnergyEntry, Recommendations};
use chrono::{Datelike, Duration, Local, NaiveDateTime, Timelike};
use std::collections::BTreeMap;

const NEIGHBOURS: usize = 5;
const MIN_SERIES_HOURS: usize = 24;
/// Forecast history is bounded to the most recent five years of hours.
const MAX_SERIES_HOURS: i64 = 24 * 365 * 5;

pub const GRID_EMISSION_FACTOR: f64 = 0.5;
pub const SOLAR_EMISSION_FACTOR: f64 = 0.0;

const PEAK_RATE: f64 = 0.20;
const OFF_PEAK_RATE: f64 = 0.10;
const SHOULDER_RATE: f64 = 0.15;
const PEAK_HOURS: [(u32, u32); 2] = [(9, 12), (17, 21)];
const OFF_PEAK_HOURS: [(u32, u32); 1] = [(0, 6)];

const NO_DATA: &str = "No data available for analysis";

pub fn analyze(entries: &[&EnergyEntry]) -> Analysis {
    analyze_at(Local::now().naive_local(), entries)
}

pub fn analyze_at(now: NaiveDateTime, entries: &[&EnergyEntry]) -> Analysis {
    if entries.is_empty() {
        return Analysis {
            current_pattern: 0.0,
            next_hour_prediction: 0.0,
            carbon_footprint: 0.0,
            energy_cost: 0.0,
            recommendations: Recommendations {
                carbon: vec![NO_DATA.to_string()],
                cost: vec![NO_DATA.to_string()],
            },
        };
    }

    let mut ordered = entries.to_vec();
    sort_chronologically(&mut ordered);

    let grid: f64 = ordered.iter().map(|e| e.electric_energy).sum();
    let solar: f64 = ordered.iter().map(|e| e.solar_energy).sum();

    Analysis {
        current_pattern: current_pattern(now, &ordered),
        next_hour_prediction: next_hour_prediction(&ordered),
        carbon_footprint: carbon_footprint(grid, solar),
        energy_cost: energy_cost(&ordered),
        recommendations: Recommendations {
            carbon: carbon_recommendations(grid, solar),
            cost: cost_recommendations(&ordered),
        },
    }
}

fn features(ts: NaiveDateTime, temperature: f64, humidity: f64) -> [f64; 5] {
    [
        f64::from(ts.hour()),
        f64::from(ts.weekday().num_days_from_monday()),
        f64::from(ts.month()),
        temperature,
        humidity,
    ]
}

/// Nearest-neighbour estimate of grid usage for the current hour, day and weather.
/// Expects `entries` in chronological order.
pub fn current_pattern(now: NaiveDateTime, entries: &[&EnergyEntry]) -> f64 {
    let samples: Vec<([f64; 5], f64)> = entries
        .iter()
        .filter_map(|entry| {
            let ts = parse_timestamp(&entry.date)?;
            Some((
                features(ts, entry.temperature, entry.humidity),
                entry.electric_energy,
            ))
        })
        .collect();

    let Some(latest) = entries.last() else {
        return 0.0;
    };
    if samples.is_empty() {
        return 0.0;
    }

    let n = samples.len() as f64;
    let mut mean = [0.0; 5];
    let mut scale = [0.0; 5];
    for i in 0..5 {
        mean[i] = samples.iter().map(|(x, _)| x[i]).sum::<f64>() / n;
        let var = samples.iter().map(|(x, _)| (x[i] - mean[i]).powi(2)).sum::<f64>() / n;
        scale[i] = var.sqrt();
    }
    let standardize = |x: &[f64; 5]| -> [f64; 5] {
        let mut out = [0.0; 5];
        for i in 0..5 {
            out[i] = if scale[i] > f64::EPSILON {
                (x[i] - mean[i]) / scale[i]
            } else {
                0.0
            };
        }
        out
    };

    let query = standardize(&features(now, latest.temperature, latest.humidity));
    let mut distances: Vec<(f64, f64)> = samples
        .iter()
        .map(|(x, y)| {
            let z = standardize(x);
            let dist = z
                .iter()
                .zip(query.iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum::<f64>();
            (dist, *y)
        })
        .collect();
    distances.sort_by(|a, b| a.0.total_cmp(&b.0));

    let k = NEIGHBOURS.min(distances.len());
    distances[..k].iter().map(|(_, y)| y).sum::<f64>() / k as f64
}

/// Grid usage averaged per hour and forward-filled between readings.
pub fn hourly_series(entries: &[&EnergyEntry]) -> Vec<f64> {
    let mut bins: BTreeMap<NaiveDateTime, (f64, u32)> = BTreeMap::new();
    for entry in entries {
        let Some(ts) = parse_timestamp(&entry.date) else {
            continue;
        };
        let Some(hour) = ts.date().and_hms_opt(ts.hour(), 0, 0) else {
            continue;
        };
        let bin = bins.entry(hour).or_insert((0.0, 0));
        bin.0 += entry.electric_energy;
        bin.1 += 1;
    }

    let (Some(first), Some(last)) = (bins.keys().next().copied(), bins.keys().next_back().copied())
    else {
        return Vec::new();
    };

    let start = last
        .checked_sub_signed(Duration::hours(MAX_SERIES_HOURS - 1))
        .map_or(first, |earliest| first.max(earliest));
    let mut current = bins
        .range(..=start)
        .next_back()
        .map(|(_, (sum, count))| sum / f64::from(*count))
        .unwrap_or(0.0);

    let mut series = Vec::new();
    let mut hour = start;
    while hour <= last {
        if let Some((sum, count)) = bins.get(&hour) {
            current = sum / f64::from(*count);
        }
        series.push(current);
        let Some(next) = hour.checked_add_signed(Duration::hours(1)) else {
            break;
        };
        hour = next;
    }
    series
}

/// One-step AR(1) forecast over the hourly series, 0.0 with under a day of history.
pub fn next_hour_prediction(entries: &[&EnergyEntry]) -> f64 {
    let series = hourly_series(entries);
    if series.len() < MIN_SERIES_HOURS {
        return 0.0;
    }
    ar1_forecast(&series)
}

fn ar1_forecast(series: &[f64]) -> f64 {
    let n = series.len() as f64;
    let mean = series.iter().sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for window in series.windows(2) {
        let prev = window[0] - mean;
        numerator += (window[1] - mean) * prev;
        denominator += prev * prev;
    }
    let phi = if denominator > f64::EPSILON {
        (numerator / denominator).clamp(-1.0, 1.0)
    } else {
        0.0
    };

    let last = series[series.len() - 1];
    mean + phi * (last - mean)
}

pub fn carbon_footprint(grid: f64, solar: f64) -> f64 {
    grid * GRID_EMISSION_FACTOR + solar * SOLAR_EMISSION_FACTOR
}

pub fn carbon_recommendations(grid: f64, solar: f64) -> Vec<String> {
    let mut recommendations = Vec::new();
    let total = grid + solar;
    if total > 0.0 {
        let solar_share = solar / total * 100.0;
        if solar_share < 30.0 {
            recommendations
                .push("Consider increasing solar energy usage to reduce carbon footprint.".to_string());
        }
        if grid > solar {
            recommendations.push(
                "Your grid energy usage is higher than solar - try to shift more usage to daylight hours."
                    .to_string(),
            );
        }
    }
    if recommendations.is_empty() {
        recommendations.push(
            "Maintain your current energy usage pattern while looking for opportunities to increase solar usage."
                .to_string(),
        );
    }
    recommendations
}

fn in_any(hour: u32, windows: &[(u32, u32)]) -> bool {
    windows.iter().any(|(start, end)| *start <= hour && hour < *end)
}

pub fn rate_for_hour(hour: u32) -> f64 {
    if in_any(hour, &PEAK_HOURS) {
        PEAK_RATE
    } else if in_any(hour, &OFF_PEAK_HOURS) {
        OFF_PEAK_RATE
    } else {
        SHOULDER_RATE
    }
}

fn entry_hour(entry: &EnergyEntry) -> u32 {
    parse_timestamp(&entry.date).map(|ts| ts.hour()).unwrap_or(0)
}

pub fn energy_cost(entries: &[&EnergyEntry]) -> f64 {
    entries
        .iter()
        .map(|entry| entry.electric_energy * rate_for_hour(entry_hour(entry)))
        .sum()
}

pub fn cost_recommendations(entries: &[&EnergyEntry]) -> Vec<String> {
    let peak = entries
        .iter()
        .filter(|entry| in_any(entry_hour(entry), &PEAK_HOURS))
        .count();

    if peak as f64 > entries.len() as f64 * 0.3 {
        vec!["Consider shifting some energy usage to off-peak hours to reduce costs.".to_string()]
    } else {
        vec!["Consider shifting energy usage to off-peak hours for cost savings".to_string()]
    }
}
