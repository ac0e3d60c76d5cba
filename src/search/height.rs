//! Bisection on borehole length for a fixed layout.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::bracket::{ExcessTemperature, Sign, brackets, is_feasible, sign};
use super::error::SizingError;
use super::oracle::{ExcessTemperatureOracle, evaluate_finite};
use super::state::SearchPhase;
use crate::Layout;
use crate::sim::bounds::SimulationBounds;

/// One oracle evaluation at a given height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeightSample {
    pub height: f64,
    pub excess: ExcessTemperature,
}

/// Trace of one [`HeightBisector::size`] run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeightSizing {
    /// Endpoint evaluation at the minimum height.
    pub at_min: HeightSample,
    /// Endpoint evaluation at the maximum height.
    pub at_max: HeightSample,
    /// Last infeasible point of the bracket (or `at_min`).
    pub lower: HeightSample,
    /// Last feasible point of the bracket (or `at_max`).
    pub upper: HeightSample,
    /// Minimal feasible height found, `None` when infeasible in range.
    pub sized: Option<HeightSample>,
    /// Midpoint evaluations.
    pub iterations: usize,
    /// Oracle calls made by this run, endpoints included.
    pub evaluations: usize,
    pub hit_iteration_limit: bool,
    pub phase: SearchPhase,
}

impl HeightSizing {
    pub fn is_feasible(&self) -> bool {
        self.sized.is_some()
    }

    pub fn height(&self) -> Option<f64> {
        self.sized.map(|s| s.height)
    }

    pub fn bracket_width(&self) -> f64 {
        self.upper.height - self.lower.height
    }
}

/// Finds the shortest borehole satisfying the temperature bounds.
///
/// Assumes the excess temperature is non-increasing in height. Plain
/// bisection is used since the oracle gives no derivative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightBisector {
    /// Absolute height tolerance in m.
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl HeightBisector {
    pub fn new() -> Self {
        Self {
            tolerance: 0.1,
            max_iterations: 50,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Checks the bisection settings and the height range.
    pub fn validate(&self, bounds: &SimulationBounds) -> Result<(), SizingError> {
        bounds
            .validate()
            .map_err(|e| SizingError::precondition(format!("{e:#}")))?;
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(SizingError::precondition(format!(
                "height tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if self.max_iterations == 0 {
            return Err(SizingError::precondition(
                "maximum iteration count must be at least 1",
            ));
        }
        Ok(())
    }

    /// Sizes `layout` within `[bounds.min_height, bounds.max_height]`.
    ///
    /// Returns a sizing with `sized == None` when the layout is too hot or
    /// too cold even at the maximum height. A layout that passes at the
    /// minimum height but fails at the maximum height is reported as a
    /// [`SizingError::SearchPrecondition`].
    pub fn size<O>(
        &self,
        oracle: &O,
        layout: &Layout,
        bounds: &SimulationBounds,
    ) -> Result<HeightSizing, SizingError>
    where
        O: ExcessTemperatureOracle + ?Sized,
    {
        self.validate(bounds)?;
        self.size_with(oracle, layout, bounds, None)
    }

    /// Same as [`size`](Self::size) without validation, reusing a known
    /// excess at the maximum height.
    pub(crate) fn size_with<O>(
        &self,
        oracle: &O,
        layout: &Layout,
        bounds: &SimulationBounds,
        known_at_max: Option<ExcessTemperature>,
    ) -> Result<HeightSizing, SizingError>
    where
        O: ExcessTemperatureOracle + ?Sized,
    {
        let mut phase = SearchPhase::Unbracketed;
        let mut evaluations = 0;
        let mut sample = |height: f64| -> Result<HeightSample, SizingError> {
            evaluations += 1;
            let excess = evaluate_finite(oracle, layout, height)?;
            Ok(HeightSample { height, excess })
        };

        let at_min = sample(bounds.min_height)?;
        let at_max = match known_at_max {
            Some(excess) => HeightSample {
                height: bounds.max_height,
                excess,
            },
            None => sample(bounds.max_height)?,
        };

        let mut lower = at_min;
        let mut upper = at_max;
        let mut iterations = 0;
        let sized = if brackets(at_min.excess, at_max.excess) {
            if sign(at_max.excess) == Sign::Zero {
                Some(at_max)
            } else {
                phase.advance(SearchPhase::Bracketed, "height");
                while upper.height - lower.height > self.tolerance
                    && iterations < self.max_iterations
                {
                    let mid = sample(0.5 * (lower.height + upper.height))?;
                    iterations += 1;
                    match sign(mid.excess) {
                        Sign::Positive => lower = mid,
                        Sign::Negative => upper = mid,
                        Sign::Zero => {
                            upper = mid;
                            break;
                        }
                    }
                }
                Some(upper)
            }
        } else if is_feasible(at_min.excess) {
            if !is_feasible(at_max.excess) {
                return Err(SizingError::precondition(format!(
                    "excess is {:.3} K at {} m but {:.3} K at {} m for {} boreholes, \
                     the thermal model is not monotone in height",
                    at_min.excess,
                    at_min.height,
                    at_max.excess,
                    at_max.height,
                    layout.len()
                )));
            }
            upper = at_min;
            Some(at_min)
        } else {
            None
        };

        let hit_iteration_limit = sized.is_some()
            && sign(upper.excess) != Sign::Zero
            && upper.height - lower.height > self.tolerance
            && iterations >= self.max_iterations;
        if hit_iteration_limit {
            warn!(
                boreholes = layout.len(),
                width = upper.height - lower.height,
                tolerance = self.tolerance,
                iterations,
                "height bisection stopped on the iteration limit"
            );
        }
        phase.advance(
            if sized.is_some() {
                SearchPhase::Converged
            } else {
                SearchPhase::Infeasible
            },
            "height",
        );
        debug!(
            boreholes = layout.len(),
            height = ?sized.map(|s| s.height),
            iterations,
            evaluations,
            "height sizing finished"
        );

        Ok(HeightSizing {
            at_min,
            at_max,
            lower,
            upper,
            sized,
            iterations,
            evaluations,
            hit_iteration_limit,
            phase,
        })
    }
}

impl Default for HeightBisector {
    fn default() -> Self {
        Self::new()
    }
}
