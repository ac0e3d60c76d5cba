//! Lumped effective borehole thermal resistance.
//!
//! Reference approximation for the fluid-to-borehole-wall resistance `Rb`:
//! all pipe legs are replaced by one equivalent pipe of radius
//! `sqrt(legs) * r_out` for the grout term, and the legs' conduction plus
//! convection resistances act in parallel.

use std::f64::consts::PI;

use super::ghe::SimulationError;
use super::media::{BheVariant, Fluid, Pipe, ThermalProperty};

/// Reynolds number below which pipe flow is treated as laminar.
const LAMINAR_REYNOLDS: f64 = 2300.0;
/// Fully developed laminar Nusselt number (constant wall temperature).
const LAMINAR_NUSSELT: f64 = 3.66;

/// Reynolds number of flow `mass_flow` (kg/s) through a pipe of radius `radius`.
pub fn reynolds(fluid: &Fluid, mass_flow: f64, radius: f64) -> f64 {
    2.0 * mass_flow / (PI * radius * fluid.viscosity)
}

/// Inner-wall convection coefficient in W/(m^2*K).
pub fn convection_coefficient(fluid: &Fluid, mass_flow: f64, radius: f64) -> f64 {
    let re = reynolds(fluid, mass_flow, radius);
    let nusselt = if re < LAMINAR_REYNOLDS {
        LAMINAR_NUSSELT
    } else {
        // Dittus-Boelter, fluid being heated
        0.023 * re.powf(0.8) * fluid.prandtl().powf(0.4)
    };
    nusselt * fluid.conductivity / (2.0 * radius)
}

/// Effective borehole thermal resistance in m*K/W.
///
/// `mass_flow_borehole` is the flow through the whole borehole; a double
/// U-tube splits it between its two circuits.
pub fn effective_resistance(
    variant: BheVariant,
    fluid: &Fluid,
    pipe: &Pipe,
    grout: &ThermalProperty,
    borehole_radius: f64,
    mass_flow_borehole: f64,
) -> Result<f64, SimulationError> {
    if !(pipe.inner_radius > 0.0 && pipe.inner_radius < pipe.outer_radius) {
        return Err(SimulationError::InvalidModel(format!(
            "pipe inner radius {} must be positive and below the outer radius {}",
            pipe.inner_radius, pipe.outer_radius
        )));
    }
    if pipe.outer_radius >= borehole_radius {
        return Err(SimulationError::InvalidModel(format!(
            "pipe outer radius {} does not fit in borehole radius {}",
            pipe.outer_radius, borehole_radius
        )));
    }
    if !(mass_flow_borehole.is_finite() && mass_flow_borehole > 0.0) {
        return Err(SimulationError::InvalidModel(format!(
            "mass flow must be positive, got {mass_flow_borehole}"
        )));
    }
    if !(grout.conductivity > 0.0 && pipe.material.conductivity > 0.0) {
        return Err(SimulationError::InvalidModel(
            "grout and pipe conductivities must be positive".to_string(),
        ));
    }

    let circuits = variant.circuits() as f64;
    let legs = match variant {
        BheVariant::Coaxial => 1.0,
        _ => 2.0 * circuits,
    };

    let h = convection_coefficient(fluid, mass_flow_borehole / circuits, pipe.inner_radius);
    let r_convection = 1.0 / (2.0 * PI * pipe.inner_radius * h);
    let r_conduction =
        (pipe.outer_radius / pipe.inner_radius).ln() / (2.0 * PI * pipe.material.conductivity);
    let r_pipe = (r_convection + r_conduction) / legs;

    let equivalent_radius = (legs.sqrt() * pipe.outer_radius).min(0.99 * borehole_radius);
    let r_grout = (borehole_radius / equivalent_radius).ln() / (2.0 * PI * grout.conductivity);

    Ok(r_grout + r_pipe)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grout() -> ThermalProperty {
        ThermalProperty::new(1.0, 3_901_000.0)
    }

    #[test]
    fn test_flow_regimes() {
        let fluid = Fluid::water();
        let r = Pipe::hdpe_single_u().inner_radius;
        assert!(reynolds(&fluid, 0.2, r) > LAMINAR_REYNOLDS);
        assert!(reynolds(&fluid, 0.01, r) < LAMINAR_REYNOLDS);
        let h_turbulent = convection_coefficient(&fluid, 0.2, r);
        let h_laminar = convection_coefficient(&fluid, 0.01, r);
        assert!(h_turbulent > h_laminar);
        assert!((h_laminar - LAMINAR_NUSSELT * fluid.conductivity / (2.0 * r)).abs() < 1e-9);
    }

    #[test]
    fn test_single_u_tube_resistance_is_plausible() {
        let rb = effective_resistance(
            BheVariant::SingleUTube,
            &Fluid::water(),
            &Pipe::hdpe_single_u(),
            &grout(),
            0.075,
            0.2,
        )
        .unwrap();
        assert!(rb > 0.05 && rb < 0.5, "Rb = {rb}");
    }

    #[test]
    fn test_double_u_tube_is_better_than_single() {
        let single = effective_resistance(
            BheVariant::SingleUTube,
            &Fluid::water(),
            &Pipe::hdpe_single_u(),
            &grout(),
            0.075,
            0.2,
        )
        .unwrap();
        let double = effective_resistance(
            BheVariant::DoubleUTube,
            &Fluid::water(),
            &Pipe::hdpe_single_u(),
            &grout(),
            0.075,
            0.2,
        )
        .unwrap();
        assert!(double < single);
    }

    #[test]
    fn test_invalid_geometry() {
        let mut pipe = Pipe::hdpe_single_u();
        pipe.outer_radius = 0.1;
        let result = effective_resistance(
            BheVariant::SingleUTube,
            &Fluid::water(),
            &pipe,
            &grout(),
            0.075,
            0.2,
        );
        assert!(matches!(
            result,
            Err(SimulationError::InvalidModel(reason)) if reason.contains("does not fit")
        ));

        let result = effective_resistance(
            BheVariant::Coaxial,
            &Fluid::water(),
            &Pipe::hdpe_single_u(),
            &grout(),
            0.075,
            0.0,
        );
        assert!(matches!(result, Err(SimulationError::InvalidModel(_))));
    }
}
