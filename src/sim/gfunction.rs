//! Thermal response ("g-function") interface.
//!
//! A g-function maps dimensionless time `ln(t/ts)` to the dimensionless
//! borehole wall temperature response of a whole field, with
//! `ts = H^2 / (9 alpha)`. Computing it is the expensive half of one oracle
//! evaluation, so it lives behind [`GFunctionProvider`].

use thiserror::Error;

use super::media::{BheVariant, ThermalContext};
use crate::Layout;
use crate::vecutils;

/// Seconds per hour.
pub const SECONDS_PER_HOUR: f64 = 3600.0;

/// Eskilson's 27-point `ln(t/ts)` grid.
pub const ESKILSON_LOG_TIMES: [f64; 27] = [
    -8.5, -7.8, -7.2, -6.5, -5.9, -5.2, -4.5, -3.963, -3.27, -2.864, -2.577, -2.171, -1.884,
    -1.191, -0.497, -0.274, -0.051, 0.196, 0.419, 0.642, 0.873, 1.112, 1.335, 1.679, 2.028,
    2.275, 3.003,
];

/// Returns the Eskilson log-time grid as a vector.
pub fn eskilson_log_times() -> Vec<f64> {
    ESKILSON_LOG_TIMES.to_vec()
}

/// Characteristic time `ts = H^2 / (9 alpha)` in seconds.
pub fn time_scale(height: f64, diffusivity: f64) -> f64 {
    height * height / (9.0 * diffusivity)
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GFunctionError {
    /// The provider does not support the requested field geometry.
    #[error("unsupported geometry: {0}")]
    UnsupportedGeometry(String),
    /// The geometry is supported but the computation failed.
    #[error("numerical failure: {0}")]
    Numerical(String),
}

/// Everything a provider needs to compute the response of one field.
#[derive(Debug, Clone, Copy)]
pub struct GFunctionRequest<'a> {
    /// Representative borehole spacing in m.
    pub spacing: f64,
    /// Borehole length in m.
    pub height: f64,
    /// Borehole radius in m.
    pub radius: f64,
    /// Buried depth in m.
    pub burial_depth: f64,
    /// Mass flow rate per borehole in kg/s.
    pub mass_flow_borehole: f64,
    pub bhe: BheVariant,
    /// `ln(t/ts)` points at which the response is requested.
    pub log_time: &'a [f64],
    pub layout: &'a Layout,
    pub context: &'a ThermalContext,
}

/// Computes thermal response functions.
///
/// Implementations must be deterministic: the same request always yields the
/// same response.
pub trait GFunctionProvider {
    fn compute(&self, request: &GFunctionRequest<'_>) -> Result<ThermalResponse, GFunctionError>;
}

/// Tabulated g-function of one field at one borehole length.
#[derive(Debug, Clone, PartialEq)]
pub struct ThermalResponse {
    log_time: Vec<f64>,
    values: Vec<f64>,
    time_scale: f64,
}

impl ThermalResponse {
    /// Validates and wraps a tabulated response.
    ///
    /// `log_time` must be strictly increasing with at least two points and
    /// every value must be finite.
    pub fn new(
        log_time: Vec<f64>,
        values: Vec<f64>,
        time_scale: f64,
    ) -> Result<Self, GFunctionError> {
        if log_time.len() != values.len() {
            return Err(GFunctionError::Numerical(format!(
                "{} log times but {} g values",
                log_time.len(),
                values.len()
            )));
        }
        if log_time.len() < 2 {
            return Err(GFunctionError::Numerical(
                "at least two g-function points are required".to_string(),
            ));
        }
        if !vecutils::is_strictly_increasing(&log_time) {
            return Err(GFunctionError::Numerical(
                "log times are not strictly increasing".to_string(),
            ));
        }
        if let Some(v) = values.iter().chain(log_time.iter()).find(|v| !v.is_finite()) {
            return Err(GFunctionError::Numerical(format!("non-finite g-function entry {v}")));
        }
        if !(time_scale.is_finite() && time_scale > 0.0) {
            return Err(GFunctionError::Numerical(format!(
                "invalid time scale {time_scale}"
            )));
        }
        Ok(Self {
            log_time,
            values,
            time_scale,
        })
    }

    pub fn log_time(&self) -> &[f64] {
        &self.log_time
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Characteristic time `ts` in seconds.
    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    /// g value at `ln(t/ts)`, linear inside the grid and linearly extrapolated
    /// outside it. Never negative.
    pub fn at_log_time(&self, lntts: f64) -> f64 {
        let n = self.log_time.len();
        // Segment whose end points are used for interpolation or extrapolation
        let i = match self.log_time.iter().position(|&x| x >= lntts) {
            Some(0) => 0,
            Some(i) => i - 1,
            None => n - 2,
        };
        let (x0, x1) = (self.log_time[i], self.log_time[i + 1]);
        let (y0, y1) = (self.values[i], self.values[i + 1]);
        let g = y0 + (y1 - y0) * (lntts - x0) / (x1 - x0);
        g.max(0.0)
    }

    /// g value after `seconds` of constant heat extraction. Zero for `seconds <= 0`.
    pub fn at(&self, seconds: f64) -> f64 {
        if seconds <= 0.0 {
            return 0.0;
        }
        self.at_log_time((seconds / self.time_scale).ln())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear() -> ThermalResponse {
        ThermalResponse::new(vec![-2.0, 0.0, 2.0], vec![1.0, 3.0, 4.0], 100.0).unwrap()
    }

    #[test]
    fn test_interpolation() {
        let g = linear();
        assert!((g.at_log_time(-2.0) - 1.0).abs() < 1e-12);
        assert!((g.at_log_time(-1.0) - 2.0).abs() < 1e-12);
        assert!((g.at_log_time(0.0) - 3.0).abs() < 1e-12);
        assert!((g.at_log_time(1.0) - 3.5).abs() < 1e-12);
        assert!((g.at_log_time(2.0) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_extrapolation_is_clamped() {
        let g = linear();
        assert!((g.at_log_time(-2.5) - 0.5).abs() < 1e-12);
        assert_eq!(g.at_log_time(-10.0), 0.0);
        assert!((g.at_log_time(4.0) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_at_seconds() {
        let g = linear();
        assert_eq!(g.at(0.0), 0.0);
        assert_eq!(g.at(-5.0), 0.0);
        // t = ts gives ln(t/ts) = 0
        assert!((g.at(100.0) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_tables() {
        assert!(ThermalResponse::new(vec![0.0], vec![1.0], 1.0).is_err());
        assert!(ThermalResponse::new(vec![0.0, 1.0], vec![1.0], 1.0).is_err());
        assert!(ThermalResponse::new(vec![1.0, 0.0], vec![1.0, 2.0], 1.0).is_err());
        assert!(ThermalResponse::new(vec![0.0, 1.0], vec![1.0, f64::NAN], 1.0).is_err());
        assert!(ThermalResponse::new(vec![0.0, 1.0], vec![1.0, 2.0], 0.0).is_err());
    }

    #[test]
    fn test_eskilson_grid() {
        let grid = eskilson_log_times();
        assert_eq!(grid.len(), 27);
        assert!(vecutils::is_strictly_increasing(&grid));
        assert!((time_scale(90.0, 1.0e-6) - 9.0e8).abs() < 1e-3);
    }
}
