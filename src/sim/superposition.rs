//! Reference simulator based on temporal superposition of load steps.
//!
//! The borehole wall temperature responds to every change in ground load
//! through the field's g-function:
//!
//! ```text
//! Tb(t) = Tg - sum_i (Q_i - Q_{i-1}) / (2 pi k_s L) * g(t - t_{i-1})
//! ```
//!
//! The heat pump entering fluid temperature follows from the wall
//! temperature, the borehole resistance and the fluid temperature rise
//! (see [`GheModel::entering_fluid_temperature`]).

use super::convolve::causal_convolve;
use super::gfunction::SECONDS_PER_HOUR;
use super::ghe::{GheModel, GheSimulator, PeakTemperatures, SimulationError, SimulationMethod};
use super::loads::month_hours;

/// Superposition simulator with hybrid (monthly + peak) and hourly time steps.
#[derive(Debug, Clone, Copy)]
pub struct SuperpositionSimulator {
    /// Duration of the monthly peak load pulse in hours (hybrid method).
    pub peak_duration_hours: f64,
}

impl SuperpositionSimulator {
    pub fn new() -> Self {
        Self {
            peak_duration_hours: 6.0,
        }
    }

    pub fn with_peak_duration(peak_duration_hours: f64) -> Self {
        Self {
            peak_duration_hours,
        }
    }

    /// Monthly mean loads superposed month by month, plus a peak pulse on top
    /// of each month's end-of-month wall temperature.
    fn simulate_hybrid(&self, model: &GheModel<'_>) -> PeakTemperatures {
        let bounds = model.bounds;
        let months = model.loads.monthly(bounds.end_month);
        let factor = model.wall_response_factor();
        let ground = model.context.soil.undisturbed_temperature;
        let g_peak = model
            .response
            .at(self.peak_duration_hours * SECONDS_PER_HOUR);

        let starts: Vec<f64> = (1..=months.len())
            .map(|m| month_hours(m).start as f64 * SECONDS_PER_HOUR)
            .collect();
        let mut steps = Vec::with_capacity(months.len());
        let mut previous = 0.0;
        for month in &months {
            steps.push(month.average - previous);
            previous = month.average;
        }

        let mut peaks = PeakTemperatures {
            max_eft: f64::NEG_INFINITY,
            min_eft: f64::INFINITY,
        };
        for (m, month) in months.iter().enumerate() {
            if m + 1 < bounds.start_month {
                continue;
            }
            let end = month_hours(m + 1).end as f64 * SECONDS_PER_HOUR;
            let delta: f64 = steps[..=m]
                .iter()
                .zip(&starts[..=m])
                .map(|(&dq, &start)| dq * model.response.at(end - start))
                .sum();
            let wall = ground - factor * delta;

            for peak in [month.peak_high, month.peak_low] {
                let wall_peak = wall - factor * (peak - month.average) * g_peak;
                let eft = model.entering_fluid_temperature(wall_peak, peak);
                peaks.max_eft = peaks.max_eft.max(eft);
                peaks.min_eft = peaks.min_eft.min(eft);
            }
        }
        peaks
    }

    /// Every hour of the horizon, superposed by FFT convolution.
    fn simulate_hourly(&self, model: &GheModel<'_>) -> PeakTemperatures {
        let bounds = model.bounds;
        let hours = month_hours(bounds.end_month).end;
        let first = month_hours(bounds.start_month).start;
        let factor = model.wall_response_factor();
        let ground = model.context.soil.undisturbed_temperature;

        let loads = model.loads.extend(hours);
        let mut steps = Vec::with_capacity(hours);
        let mut previous = 0.0;
        for &q in &loads {
            steps.push(q - previous);
            previous = q;
        }
        // Wall temperature change at the end of hour j after a unit step at its start
        let step_response: Vec<f64> = (1..=hours)
            .map(|j| factor * model.response.at(j as f64 * SECONDS_PER_HOUR))
            .collect();
        let delta = causal_convolve(&steps, &step_response);

        let mut peaks = PeakTemperatures {
            max_eft: f64::NEG_INFINITY,
            min_eft: f64::INFINITY,
        };
        for h in first..hours {
            let eft = model.entering_fluid_temperature(ground - delta[h], loads[h]);
            peaks.max_eft = peaks.max_eft.max(eft);
            peaks.min_eft = peaks.min_eft.min(eft);
        }
        peaks
    }
}

impl Default for SuperpositionSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl GheSimulator for SuperpositionSimulator {
    fn simulate(
        &self,
        model: &GheModel<'_>,
        method: SimulationMethod,
    ) -> Result<PeakTemperatures, SimulationError> {
        let bounds = model.bounds;
        if bounds.start_month < 1 || bounds.start_month > bounds.end_month {
            return Err(SimulationError::InvalidModel(format!(
                "invalid month window {}..={}",
                bounds.start_month, bounds.end_month
            )));
        }
        if !(self.peak_duration_hours.is_finite() && self.peak_duration_hours > 0.0) {
            return Err(SimulationError::InvalidModel(format!(
                "peak duration must be positive, got {} h",
                self.peak_duration_hours
            )));
        }

        let peaks = match method {
            SimulationMethod::Hybrid => self.simulate_hybrid(model),
            SimulationMethod::Hourly => self.simulate_hourly(model),
        };
        if !peaks.is_finite() {
            return Err(SimulationError::Diverged(format!(
                "non-finite entering fluid temperatures (max {}, min {})",
                peaks.max_eft, peaks.min_eft
            )));
        }
        Ok(peaks)
    }
}
