//! JSON description of one sizing problem.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::search::HeightBisector;
use crate::sim::bounds::SimulationBounds;
use crate::sim::ghe::SimulationMethod;
use crate::sim::loads::LoadProfile;
use crate::sim::media::{
    BheVariant, BoreholeGeometry, Fluid, Pipe, Soil, ThermalContext, ThermalProperty,
};
use crate::sim::superposition::SuperpositionSimulator;
use crate::{Layout, LayoutDomain, NestedLayoutDomain, Point};

/// Candidate layouts as coordinate lists, `[x, y]` in m.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainConfig {
    /// One size-ordered list of layouts.
    Single(Vec<Vec<[f64; 2]>>),
    /// One size-ordered list of layouts per outer level.
    Nested(Vec<Vec<Vec<[f64; 2]>>>),
}

/// Layout catalog built from a [`DomainConfig`].
#[derive(Debug, Clone)]
pub enum Domain {
    Single(LayoutDomain),
    Nested(NestedLayoutDomain),
}

/// Sizing problem: thermal context, bounds, loads and candidate layouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizingConfig {
    pub borehole: BoreholeGeometry,
    /// Volumetric flow rate per borehole in L/s.
    pub flow_rate_per_borehole: f64,
    #[serde(default = "Fluid::water")]
    pub fluid: Fluid,
    #[serde(default = "Pipe::hdpe_single_u")]
    pub pipe: Pipe,
    pub grout: ThermalProperty,
    pub soil: Soil,
    #[serde(default)]
    pub bhe: BheVariant,
    #[serde(default)]
    pub bounds: SimulationBounds,
    #[serde(default)]
    pub method: SimulationMethod,
    #[serde(default)]
    pub bisection: HeightBisector,
    #[serde(default = "default_peak_duration")]
    pub peak_duration_hours: f64,
    /// Hourly ground loads in W, positive for extraction. Tiled over the horizon.
    pub loads: Vec<f64>,
    pub domain: DomainConfig,
}

fn default_peak_duration() -> f64 {
    6.0
}

impl SizingConfig {
    /// Reads a configuration from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let config: Self = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize config")
    }

    pub fn validate(&self) -> Result<()> {
        self.bounds.validate()?;
        ensure!(
            self.flow_rate_per_borehole.is_finite() && self.flow_rate_per_borehole > 0.0,
            "Flow rate per borehole must be positive, got {} L/s",
            self.flow_rate_per_borehole
        );
        ensure!(
            self.borehole.radius > 0.0 && self.borehole.burial_depth >= 0.0,
            "Borehole radius must be positive and burial depth non-negative"
        );
        ensure!(
            self.soil.conductivity > 0.0 && self.soil.volumetric_heat_capacity > 0.0,
            "Soil conductivity and heat capacity must be positive"
        );
        ensure!(
            self.bisection.tolerance > 0.0 && self.bisection.max_iterations > 0,
            "Bisection tolerance and iteration limit must be positive"
        );
        ensure!(
            self.peak_duration_hours > 0.0,
            "Peak duration must be positive, got {} h",
            self.peak_duration_hours
        );
        Ok(())
    }

    pub fn context(&self) -> ThermalContext {
        ThermalContext {
            fluid: self.fluid,
            pipe: self.pipe,
            grout: self.grout,
            soil: self.soil,
            borehole: self.borehole,
            bhe: self.bhe,
            flow_rate_per_borehole: self.flow_rate_per_borehole,
        }
    }

    pub fn load_profile(&self) -> Result<LoadProfile> {
        LoadProfile::new(self.loads.clone()).context("Invalid hourly loads")
    }

    pub fn simulator(&self) -> SuperpositionSimulator {
        SuperpositionSimulator::with_peak_duration(self.peak_duration_hours)
    }

    pub fn domain(&self) -> Result<Domain> {
        match &self.domain {
            DomainConfig::Single(layouts) => Ok(Domain::Single(layout_domain(layouts)?)),
            DomainConfig::Nested(levels) => {
                let levels = levels
                    .iter()
                    .enumerate()
                    .map(|(i, layouts)| {
                        layout_domain(layouts).with_context(|| format!("Invalid level {i}"))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Domain::Nested(NestedLayoutDomain::new(levels)?))
            }
        }
    }
}

fn layout_domain(layouts: &[Vec<[f64; 2]>]) -> Result<LayoutDomain> {
    let layouts = layouts
        .iter()
        .enumerate()
        .map(|(i, coords)| {
            Layout::new(coords.iter().copied().map(Point::from).collect())
                .with_context(|| format!("Invalid layout {i}"))
        })
        .collect::<Result<Vec<_>>>()?;
    LayoutDomain::new(layouts)
}
