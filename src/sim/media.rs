use serde::{Deserialize, Serialize};

/// Heat-carrier fluid properties.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fluid {
    /// Density in kg/m^3.
    pub density: f64,
    /// Specific heat capacity in J/(kg*K).
    pub specific_heat: f64,
    /// Dynamic viscosity in Pa*s.
    pub viscosity: f64,
    /// Thermal conductivity in W/(m*K).
    pub conductivity: f64,
}

impl Fluid {
    /// Pure water at roughly 20 °C.
    pub fn water() -> Self {
        Self {
            density: 998.2,
            specific_heat: 4182.0,
            viscosity: 1.0e-3,
            conductivity: 0.598,
        }
    }

    /// Prandtl number.
    pub fn prandtl(&self) -> f64 {
        self.specific_heat * self.viscosity / self.conductivity
    }
}

impl Default for Fluid {
    fn default() -> Self {
        Self::water()
    }
}

/// Conductivity and volumetric heat capacity of a solid medium (grout, pipe wall).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThermalProperty {
    /// Thermal conductivity in W/(m*K).
    pub conductivity: f64,
    /// Volumetric heat capacity in J/(m^3*K).
    pub volumetric_heat_capacity: f64,
}

impl ThermalProperty {
    pub fn new(conductivity: f64, volumetric_heat_capacity: f64) -> Self {
        Self {
            conductivity,
            volumetric_heat_capacity,
        }
    }
}

/// U-tube or coaxial pipe geometry and material.
///
/// For a coaxial exchanger the radii describe the outer pipe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pipe {
    /// Inner radius in m.
    pub inner_radius: f64,
    /// Outer radius in m.
    pub outer_radius: f64,
    /// Center-to-center distance between the two legs of a U-tube in m.
    pub shank_spacing: f64,
    /// Surface roughness in m.
    pub roughness: f64,
    /// Pipe wall conductivity and heat capacity.
    pub material: ThermalProperty,
}

impl Pipe {
    /// 1-1/4" SDR-11 HDPE U-tube.
    pub fn hdpe_single_u() -> Self {
        Self {
            inner_radius: 21.6e-3 / 2.0,
            outer_radius: 26.67e-3 / 2.0,
            shank_spacing: 32.3e-3,
            roughness: 1.0e-6,
            material: ThermalProperty::new(0.4, 1_542_000.0),
        }
    }
}

/// Ground properties.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Soil {
    /// Thermal conductivity in W/(m*K).
    pub conductivity: f64,
    /// Volumetric heat capacity in J/(m^3*K).
    pub volumetric_heat_capacity: f64,
    /// Undisturbed ground temperature in °C.
    pub undisturbed_temperature: f64,
}

impl Soil {
    /// Thermal diffusivity in m^2/s.
    pub fn diffusivity(&self) -> f64 {
        self.conductivity / self.volumetric_heat_capacity
    }
}

/// Borehole dimensions that stay fixed while the length is searched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoreholeGeometry {
    /// Buried depth of the borehole head in m.
    pub burial_depth: f64,
    /// Borehole radius in m.
    pub radius: f64,
}

/// Borehole heat exchanger variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BheVariant {
    #[default]
    SingleUTube,
    DoubleUTube,
    Coaxial,
}

impl BheVariant {
    /// Number of independent U-tubes (flow circuits) in the borehole.
    pub fn circuits(&self) -> usize {
        match self {
            BheVariant::SingleUTube | BheVariant::Coaxial => 1,
            BheVariant::DoubleUTube => 2,
        }
    }
}

/// Everything about the heat exchanger that is fixed for a whole sizing run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThermalContext {
    pub fluid: Fluid,
    pub pipe: Pipe,
    pub grout: ThermalProperty,
    pub soil: Soil,
    pub borehole: BoreholeGeometry,
    pub bhe: BheVariant,
    /// Volumetric flow rate per borehole in L/s.
    pub flow_rate_per_borehole: f64,
}

impl ThermalContext {
    /// Mass flow rate through one borehole in kg/s.
    pub fn borehole_mass_flow(&self) -> f64 {
        self.flow_rate_per_borehole / 1000.0 * self.fluid.density
    }

    /// Volumetric flow rate of the whole field in L/s.
    pub fn system_flow_rate(&self, boreholes: usize) -> f64 {
        self.flow_rate_per_borehole * boreholes as f64
    }
}
