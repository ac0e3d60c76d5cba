use anyhow::{Result, bail, ensure};
use std::ops::Range;

use crate::vecutils;

/// Hours in a non-leap year.
pub const HOURS_IN_YEAR: usize = 8760;

/// Days per calendar month (no leap years).
pub const DAYS_IN_MONTH: [usize; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Absolute hour range of a 1-based month counted from the start of the simulation.
pub fn month_hours(month: usize) -> Range<usize> {
    debug_assert!(month >= 1);
    let m = month - 1;
    let years = m / 12;
    let start_of_year = years * HOURS_IN_YEAR;
    let offset: usize = DAYS_IN_MONTH[..m % 12].iter().sum::<usize>() * 24;
    let start = start_of_year + offset;
    start..start + DAYS_IN_MONTH[m % 12] * 24
}

/// Aggregated ground load of one simulated month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyLoad {
    /// Mean load in W.
    pub average: f64,
    /// Largest hourly load in W (peak extraction when positive).
    pub peak_high: f64,
    /// Smallest hourly load in W (peak rejection when negative).
    pub peak_low: f64,
    /// Hours in the month.
    pub hours: usize,
}

/// Hourly ground thermal loads in W.
///
/// Positive values extract heat from the ground, negative values reject heat
/// into it. The profile repeats when the simulation runs past its end, so a
/// single year of 8760 values covers any horizon.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadProfile {
    values: Vec<f64>,
}

impl LoadProfile {
    pub fn new(values: Vec<f64>) -> Result<Self> {
        ensure!(!values.is_empty(), "Load profile must not be empty");
        if let Some((i, v)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            bail!("Load profile has a non-finite value {v} at hour {i}");
        }
        Ok(Self { values })
    }

    /// Same load every hour of the year.
    pub fn constant(load: f64) -> Result<Self> {
        Self::new(vec![load; HOURS_IN_YEAR])
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false, a profile holds at least one hour.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Load at an absolute simulation hour.
    pub fn hour(&self, hour: usize) -> f64 {
        self.values[hour % self.values.len()]
    }

    /// Hourly loads for the first `hours` hours of the simulation.
    pub fn extend(&self, hours: usize) -> Vec<f64> {
        (0..hours).map(|h| self.hour(h)).collect()
    }

    /// Monthly mean and peak loads for months `1..=end_month`.
    pub fn monthly(&self, end_month: usize) -> Vec<MonthlyLoad> {
        (1..=end_month)
            .map(|month| {
                let loads: Vec<f64> = month_hours(month).map(|h| self.hour(h)).collect();
                MonthlyLoad {
                    average: vecutils::mean(&loads).unwrap_or(0.0),
                    peak_high: vecutils::max(&loads).unwrap_or(0.0),
                    peak_low: vecutils::min(&loads).unwrap_or(0.0),
                    hours: loads.len(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_hours() {
        assert_eq!(month_hours(1), 0..744);
        assert_eq!(month_hours(2), 744..744 + 672);
        assert_eq!(month_hours(12).end, HOURS_IN_YEAR);
        assert_eq!(month_hours(13), HOURS_IN_YEAR..HOURS_IN_YEAR + 744);
        let total: usize = (1..=12).map(|m| month_hours(m).len()).sum();
        assert_eq!(total, HOURS_IN_YEAR);
    }

    #[test]
    fn test_profile_validation() {
        assert!(LoadProfile::new(vec![]).is_err());
        assert!(LoadProfile::new(vec![1.0, f64::NAN]).is_err());
        assert_eq!(LoadProfile::constant(5.0).unwrap().len(), HOURS_IN_YEAR);
    }

    #[test]
    fn test_profile_tiles() {
        let profile = LoadProfile::new(vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(profile.hour(4), 2.0);
        assert_eq!(profile.extend(5), vec![1.0, 2.0, 3.0, 1.0, 2.0]);
    }

    #[test]
    fn test_monthly_aggregation() {
        let values: Vec<f64> = (0..HOURS_IN_YEAR)
            .map(|h| if h % 24 == 12 { 3000.0 } else { -600.0 })
            .collect();
        let profile = LoadProfile::new(values).unwrap();
        let months = profile.monthly(14);
        assert_eq!(months.len(), 14);
        let jan = months[0];
        assert_eq!(jan.hours, 744);
        assert!((jan.peak_high - 3000.0).abs() < 1e-12);
        assert!((jan.peak_low + 600.0).abs() < 1e-12);
        assert!((jan.average - (3000.0 - 23.0 * 600.0) / 24.0).abs() < 1e-9);
        // Second year repeats the first
        assert_eq!(months[12], months[0]);
    }
}
