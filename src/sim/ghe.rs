//! Ground heat exchanger model and simulator interface.
//!
//! A [`GheModel`] is built from scratch for every (layout, height) pair and is
//! never modified afterwards, so successive evaluations cannot leak state into
//! each other.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::bhe;
use super::bounds::SimulationBounds;
use super::gfunction::ThermalResponse;
use super::loads::LoadProfile;
use super::media::ThermalContext;
use crate::Layout;

/// Time stepping used by a simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationMethod {
    /// Every hour of the horizon.
    Hourly,
    /// Monthly loads with a peak pulse per month.
    #[default]
    Hybrid,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// The model cannot be built from the given inputs.
    #[error("invalid model: {0}")]
    InvalidModel(String),
    /// The simulation ran but produced unusable output.
    #[error("simulation diverged: {0}")]
    Diverged(String),
}

/// Extreme heat pump entering fluid temperatures over the checked months, °C.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakTemperatures {
    pub max_eft: f64,
    pub min_eft: f64,
}

impl PeakTemperatures {
    pub fn is_finite(&self) -> bool {
        self.max_eft.is_finite() && self.min_eft.is_finite()
    }
}

/// Immutable ground heat exchanger at one layout and one borehole length.
#[derive(Debug, Clone)]
pub struct GheModel<'a> {
    pub context: &'a ThermalContext,
    pub bounds: &'a SimulationBounds,
    pub loads: &'a LoadProfile,
    pub response: ThermalResponse,
    /// Borehole length in m.
    pub height: f64,
    pub boreholes: usize,
    /// Representative spacing used for the response function in m.
    pub spacing: f64,
    /// Field volumetric flow rate in L/s.
    pub system_flow_rate: f64,
    /// Effective borehole thermal resistance in m*K/W.
    pub borehole_resistance: f64,
}

impl<'a> GheModel<'a> {
    pub fn new(
        context: &'a ThermalContext,
        bounds: &'a SimulationBounds,
        loads: &'a LoadProfile,
        layout: &Layout,
        height: f64,
        spacing: f64,
        response: ThermalResponse,
    ) -> Result<Self, SimulationError> {
        if !(height.is_finite() && height > 0.0) {
            return Err(SimulationError::InvalidModel(format!(
                "borehole height must be positive, got {height}"
            )));
        }
        let borehole_resistance = bhe::effective_resistance(
            context.bhe,
            &context.fluid,
            &context.pipe,
            &context.grout,
            context.borehole.radius,
            context.borehole_mass_flow(),
        )?;

        Ok(Self {
            context,
            bounds,
            loads,
            response,
            height,
            boreholes: layout.len(),
            spacing,
            system_flow_rate: context.system_flow_rate(layout.len()),
            borehole_resistance,
        })
    }

    /// Total drilled length in m.
    pub fn total_length(&self) -> f64 {
        self.height * self.boreholes as f64
    }

    /// Field mass flow rate in kg/s.
    pub fn system_mass_flow(&self) -> f64 {
        self.system_flow_rate / 1000.0 * self.context.fluid.density
    }

    /// Ground-side wall temperature change per watt of step load per unit g, K/W.
    pub fn wall_response_factor(&self) -> f64 {
        1.0 / (2.0 * std::f64::consts::PI * self.context.soil.conductivity * self.total_length())
    }

    /// Heat pump entering fluid temperature for borehole wall temperature
    /// `wall` (°C) and field load `load` (W, positive extracts heat).
    pub fn entering_fluid_temperature(&self, wall: f64, load: f64) -> f64 {
        let mean_fluid = wall - load / self.total_length() * self.borehole_resistance;
        mean_fluid + load / (2.0 * self.system_mass_flow() * self.context.fluid.specific_heat)
    }
}

/// Runs a ground heat exchanger over the bounds' horizon.
pub trait GheSimulator {
    fn simulate(
        &self,
        model: &GheModel<'_>,
        method: SimulationMethod,
    ) -> Result<PeakTemperatures, SimulationError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::gfunction::eskilson_log_times;
    use crate::sim::media::{BheVariant, BoreholeGeometry, Fluid, Pipe, Soil, ThermalProperty};

    fn context() -> ThermalContext {
        ThermalContext {
            fluid: Fluid::water(),
            pipe: Pipe::hdpe_single_u(),
            grout: ThermalProperty::new(1.0, 3_901_000.0),
            soil: Soil {
                conductivity: 2.0,
                volumetric_heat_capacity: 2_343_493.0,
                undisturbed_temperature: 18.3,
            },
            borehole: BoreholeGeometry {
                burial_depth: 2.0,
                radius: 0.075,
            },
            bhe: BheVariant::SingleUTube,
            flow_rate_per_borehole: 0.2,
        }
    }

    fn response() -> ThermalResponse {
        let log_time = eskilson_log_times();
        let values = log_time.iter().map(|x| 2.0 + 0.5 * x).collect();
        ThermalResponse::new(log_time, values, 1.0e9).unwrap()
    }

    #[test]
    fn test_model_derived_quantities() {
        let ctx = context();
        let bounds = SimulationBounds::new();
        let loads = LoadProfile::constant(1000.0).unwrap();
        let layout = Layout::rectangle(2, 2, 5.0, 5.0).unwrap();
        let model = GheModel::new(&ctx, &bounds, &loads, &layout, 100.0, 5.0, response()).unwrap();
        assert_eq!(model.boreholes, 4);
        assert!((model.total_length() - 400.0).abs() < 1e-12);
        assert!((model.system_flow_rate - 0.8).abs() < 1e-12);
        assert!(model.borehole_resistance > 0.0);
    }

    #[test]
    fn test_extraction_cools_the_fluid() {
        let ctx = context();
        let bounds = SimulationBounds::new();
        let loads = LoadProfile::constant(1000.0).unwrap();
        let layout = Layout::rectangle(2, 2, 5.0, 5.0).unwrap();
        let model = GheModel::new(&ctx, &bounds, &loads, &layout, 100.0, 5.0, response()).unwrap();
        let wall = 15.0;
        let mean_fluid = wall - 1000.0 / 400.0 * model.borehole_resistance;
        assert!(mean_fluid < wall);
        let eft = model.entering_fluid_temperature(wall, 1000.0);
        assert!(eft > mean_fluid && eft < wall);
    }

    #[test]
    fn test_non_positive_height_is_invalid() {
        let ctx = context();
        let bounds = SimulationBounds::new();
        let loads = LoadProfile::constant(1000.0).unwrap();
        let layout = Layout::rectangle(1, 1, 5.0, 5.0).unwrap();
        let result = GheModel::new(&ctx, &bounds, &loads, &layout, 0.0, 5.0, response());
        assert!(matches!(result, Err(SimulationError::InvalidModel(_))));
    }

    #[test]
    fn test_oversized_pipe_is_invalid() {
        let mut ctx = context();
        ctx.pipe.outer_radius = 0.08;
        let bounds = SimulationBounds::new();
        let loads = LoadProfile::constant(1000.0).unwrap();
        let layout = Layout::rectangle(1, 1, 5.0, 5.0).unwrap();
        let result = GheModel::new(&ctx, &bounds, &loads, &layout, 100.0, 5.0, response());
        assert!(matches!(
            result,
            Err(SimulationError::InvalidModel(reason)) if reason.contains("pipe outer radius")
        ));
    }
}
