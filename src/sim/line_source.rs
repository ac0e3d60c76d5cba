//! Reference g-function provider based on the infinite line source.
//!
//! Each borehole is an infinite line emitting a uniform heat rate per meter.
//! The field response is the borehole-averaged sum of the self response (at
//! the borehole radius) and the responses of all other boreholes:
//!
//! ```text
//! g(t) = 1/n * sum_i sum_j 1/2 * E1(d_ij^2 / (4 alpha t)),   d_ii = r_b
//! ```
//!
//! The line source has no steady state, so it overpredicts long-term
//! temperature drift of large fields compared to a finite line source.

use rayon::prelude::*;

use super::gfunction::{
    GFunctionError, GFunctionProvider, GFunctionRequest, ThermalResponse, time_scale,
};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Exponential integral `E1(x)` for `x > 0`.
///
/// Power series below 1, continued fraction (modified Lentz) above.
pub fn exp_integral_e1(x: f64) -> f64 {
    if x <= 0.0 {
        return f64::INFINITY;
    }
    if x > 700.0 {
        return 0.0;
    }
    if x <= 1.0 {
        let mut sum = 0.0;
        let mut term = 1.0;
        for k in 1..=100 {
            let k = k as f64;
            term *= -x / k;
            let contribution = term / k;
            sum += contribution;
            if contribution.abs() < 1e-17 {
                break;
            }
        }
        -EULER_GAMMA - x.ln() - sum
    } else {
        let mut b = x + 1.0;
        let mut c = 1.0 / 1e-300;
        let mut d = 1.0 / b;
        let mut h = d;
        for i in 1..=200 {
            let a = -((i * i) as f64);
            b += 2.0;
            d = 1.0 / (a * d + b);
            c = b + a / c;
            let delta = c * d;
            h *= delta;
            if (delta - 1.0).abs() < 1e-16 {
                break;
            }
        }
        h * (-x).exp()
    }
}

/// Infinite line source g-function provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineSourceGFunction;

impl LineSourceGFunction {
    pub fn new() -> Self {
        Self
    }

    fn check(request: &GFunctionRequest<'_>) -> Result<(), GFunctionError> {
        let alpha = request.context.soil.diffusivity();
        if !(request.radius.is_finite() && request.radius > 0.0) {
            return Err(GFunctionError::UnsupportedGeometry(format!(
                "borehole radius must be positive, got {}",
                request.radius
            )));
        }
        if !(request.height.is_finite() && request.height > 0.0) {
            return Err(GFunctionError::UnsupportedGeometry(format!(
                "borehole height must be positive, got {}",
                request.height
            )));
        }
        if !(request.spacing.is_finite() && request.spacing > 0.0) {
            return Err(GFunctionError::UnsupportedGeometry(format!(
                "borehole spacing must be positive, got {}",
                request.spacing
            )));
        }
        if !(alpha.is_finite() && alpha > 0.0) {
            return Err(GFunctionError::UnsupportedGeometry(format!(
                "soil diffusivity must be positive, got {alpha}"
            )));
        }
        if request.layout.len() > 1 && request.spacing < request.radius {
            return Err(GFunctionError::UnsupportedGeometry(format!(
                "boreholes overlap: spacing {:.4} m is below the borehole radius {:.4} m",
                request.spacing, request.radius
            )));
        }
        Ok(())
    }
}

impl GFunctionProvider for LineSourceGFunction {
    fn compute(&self, request: &GFunctionRequest<'_>) -> Result<ThermalResponse, GFunctionError> {
        Self::check(request)?;

        let alpha = request.context.soil.diffusivity();
        let ts = time_scale(request.height, alpha);
        let points = request.layout.points();
        let n = points.len() as f64;
        let r_b = request.radius;

        let values: Vec<f64> = request
            .log_time
            .iter()
            .map(|&lntts| {
                let four_alpha_t = 4.0 * alpha * ts * lntts.exp();
                // Row sums are reduced in index order, rayon float sums have no fixed order
                let rows: Vec<f64> = points
                    .par_iter()
                    .map(|pi| {
                        points
                            .iter()
                            .map(|pj| {
                                let d = pi.distance(pj).max(r_b);
                                0.5 * exp_integral_e1(d * d / four_alpha_t)
                            })
                            .sum::<f64>()
                    })
                    .collect();
                rows.iter().sum::<f64>() / n
            })
            .collect();

        if let Some(v) = values.iter().find(|v| !v.is_finite()) {
            return Err(GFunctionError::Numerical(format!(
                "line source produced a non-finite g value {v}"
            )));
        }
        ThermalResponse::new(request.log_time.to_vec(), values, ts)
    }
}
