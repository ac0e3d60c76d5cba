//! Excess temperature oracle: one full thermal simulation reduced to a
//! signed scalar.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use super::bracket::ExcessTemperature;
use super::error::{SizingError, Trial};
use crate::Layout;
use crate::sim::bounds::SimulationBounds;
use crate::sim::gfunction::{GFunctionProvider, GFunctionRequest, eskilson_log_times};
use crate::sim::ghe::{GheModel, GheSimulator, PeakTemperatures, SimulationError, SimulationMethod};
use crate::sim::loads::LoadProfile;
use crate::sim::media::ThermalContext;

/// Maps a layout and a borehole length to an excess temperature.
///
/// Implementations must be deterministic: the same arguments always give
/// the same result.
pub trait ExcessTemperatureOracle {
    fn evaluate(&self, layout: &Layout, height: f64) -> Result<ExcessTemperature, SizingError>;
}

impl<F> ExcessTemperatureOracle for F
where
    F: Fn(&Layout, f64) -> Result<ExcessTemperature, SizingError>,
{
    fn evaluate(&self, layout: &Layout, height: f64) -> Result<ExcessTemperature, SizingError> {
        self(layout, height)
    }
}

/// Worst violation of the fluid temperature bounds.
///
/// Positive when the maximum EFT exceeds its limit or the minimum EFT falls
/// below its limit; the magnitude is the larger of the two violations.
pub fn excess_temperature(peaks: &PeakTemperatures, bounds: &SimulationBounds) -> ExcessTemperature {
    (peaks.max_eft - bounds.max_eft).max(bounds.min_eft - peaks.min_eft)
}

/// Calls `oracle` and rejects non-finite excess values.
pub(crate) fn evaluate_finite<O>(
    oracle: &O,
    layout: &Layout,
    height: f64,
) -> Result<ExcessTemperature, SizingError>
where
    O: ExcessTemperatureOracle + ?Sized,
{
    let excess = oracle.evaluate(layout, height)?;
    if !excess.is_finite() {
        return Err(SizingError::SimulationDiverged {
            trial: Trial::new(layout.len(), height),
            reason: format!("non-finite excess temperature {excess}"),
        });
    }
    Ok(excess)
}

/// Raw outcome of one [`GheOracle`] evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EvaluationRecord {
    pub boreholes: usize,
    pub height: f64,
    pub spacing: f64,
    pub peaks: PeakTemperatures,
    pub excess: ExcessTemperature,
}

/// Oracle backed by a g-function provider and a ground heat exchanger simulator.
///
/// Every call computes a fresh response function and a fresh [`GheModel`].
pub struct GheOracle<'a, G, S> {
    gfunction: G,
    simulator: S,
    context: &'a ThermalContext,
    bounds: &'a SimulationBounds,
    loads: &'a LoadProfile,
    method: SimulationMethod,
    log_time: Vec<f64>,
    history: RefCell<Vec<EvaluationRecord>>,
}

impl<'a, G, S> GheOracle<'a, G, S>
where
    G: GFunctionProvider,
    S: GheSimulator,
{
    pub fn new(
        gfunction: G,
        simulator: S,
        context: &'a ThermalContext,
        bounds: &'a SimulationBounds,
        loads: &'a LoadProfile,
    ) -> Self {
        Self {
            gfunction,
            simulator,
            context,
            bounds,
            loads,
            method: SimulationMethod::default(),
            log_time: eskilson_log_times(),
            history: RefCell::new(Vec::new()),
        }
    }

    pub fn with_method(mut self, method: SimulationMethod) -> Self {
        self.method = method;
        self
    }

    /// Every successful evaluation so far, in call order.
    pub fn history(&self) -> Vec<EvaluationRecord> {
        self.history.borrow().clone()
    }

    /// Runs the simulation and returns its peak temperatures.
    pub fn simulate(&self, layout: &Layout, height: f64) -> Result<EvaluationRecord, SizingError> {
        let trial = Trial::new(layout.len(), height);
        if !(height.is_finite() && height > 0.0) {
            return Err(SizingError::ModelConstruction {
                trial,
                reason: format!("borehole height must be positive, got {height}"),
            });
        }

        // A lone borehole has no neighbor, its length stands in for the spacing
        let spacing = layout.spacing().unwrap_or(height);
        let request = GFunctionRequest {
            spacing,
            height,
            radius: self.context.borehole.radius,
            burial_depth: self.context.borehole.burial_depth,
            mass_flow_borehole: self.context.borehole_mass_flow(),
            bhe: self.context.bhe,
            log_time: &self.log_time,
            layout,
            context: self.context,
        };
        let response =
            self.gfunction
                .compute(&request)
                .map_err(|e| SizingError::ModelConstruction {
                    trial,
                    reason: e.to_string(),
                })?;

        let model = GheModel::new(
            self.context,
            self.bounds,
            self.loads,
            layout,
            height,
            spacing,
            response,
        )
        .map_err(|e| simulation_error(trial, e))?;
        let peaks = self
            .simulator
            .simulate(&model, self.method)
            .map_err(|e| simulation_error(trial, e))?;
        if !peaks.is_finite() {
            return Err(SizingError::SimulationDiverged {
                trial,
                reason: format!(
                    "non-finite peak temperatures (max {}, min {})",
                    peaks.max_eft, peaks.min_eft
                ),
            });
        }

        let record = EvaluationRecord {
            boreholes: layout.len(),
            height,
            spacing,
            peaks,
            excess: excess_temperature(&peaks, self.bounds),
        };
        debug!(
            boreholes = record.boreholes,
            height = record.height,
            min_eft = peaks.min_eft,
            max_eft = peaks.max_eft,
            excess = record.excess,
            "evaluated ground heat exchanger"
        );
        self.history.borrow_mut().push(record);
        Ok(record)
    }
}

impl<G, S> ExcessTemperatureOracle for GheOracle<'_, G, S>
where
    G: GFunctionProvider,
    S: GheSimulator,
{
    fn evaluate(&self, layout: &Layout, height: f64) -> Result<ExcessTemperature, SizingError> {
        self.simulate(layout, height).map(|record| record.excess)
    }
}

fn simulation_error(trial: Trial, err: SimulationError) -> SizingError {
    match err {
        SimulationError::InvalidModel(reason) => SizingError::ModelConstruction { trial, reason },
        SimulationError::Diverged(reason) => SizingError::SimulationDiverged { trial, reason },
    }
}

/// Caches results of another oracle by `(layout, height)`.
///
/// Failed evaluations are not cached.
pub struct MemoizedOracle<O> {
    inner: O,
    cache: RefCell<HashMap<Layout, HashMap<u64, ExcessTemperature>>>,
    hits: Cell<usize>,
}

impl<O: ExcessTemperatureOracle> MemoizedOracle<O> {
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            cache: RefCell::new(HashMap::new()),
            hits: Cell::new(0),
        }
    }

    pub fn inner(&self) -> &O {
        &self.inner
    }

    /// Number of evaluations answered from the cache.
    pub fn hits(&self) -> usize {
        self.hits.get()
    }

    /// Number of distinct `(layout, height)` pairs stored.
    pub fn len(&self) -> usize {
        self.cache.borrow().values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<O: ExcessTemperatureOracle> ExcessTemperatureOracle for MemoizedOracle<O> {
    fn evaluate(&self, layout: &Layout, height: f64) -> Result<ExcessTemperature, SizingError> {
        let key = height.to_bits();
        let cached = self
            .cache
            .borrow()
            .get(layout)
            .and_then(|heights| heights.get(&key))
            .copied();
        if let Some(excess) = cached {
            self.hits.set(self.hits.get() + 1);
            return Ok(excess);
        }

        let excess = self.inner.evaluate(layout, height)?;
        self.cache
            .borrow_mut()
            .entry(layout.clone())
            .or_default()
            .insert(key, excess);
        Ok(excess)
    }
}
