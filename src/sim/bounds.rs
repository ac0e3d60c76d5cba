use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};

/// Simulation window, fluid temperature limits and allowed borehole lengths.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationBounds {
    /// First month (1-based) whose peak temperatures are checked.
    pub start_month: usize,
    /// Last simulated month (1-based, inclusive), e.g. `20 * 12` for 20 years.
    pub end_month: usize,
    /// Maximum allowable heat pump entering fluid temperature in °C.
    pub max_eft: f64,
    /// Minimum allowable heat pump entering fluid temperature in °C.
    pub min_eft: f64,
    /// Maximum allowable borehole length in m.
    pub max_height: f64,
    /// Minimum allowable borehole length in m.
    pub min_height: f64,
}

impl SimulationBounds {
    /// Twenty years, 5..35 °C, 60..150 m.
    pub fn new() -> Self {
        Self {
            start_month: 1,
            end_month: 240,
            max_eft: 35.0,
            min_eft: 5.0,
            max_height: 150.0,
            min_height: 60.0,
        }
    }

    /// Checks the invariants the height and layout searches rely on.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.min_height.is_finite() && self.max_height.is_finite(),
            "Height bounds must be finite (min = {}, max = {})",
            self.min_height,
            self.max_height
        );
        ensure!(
            self.min_height > 0.0,
            "Minimum height must be positive, got {}",
            self.min_height
        );
        ensure!(
            self.min_height < self.max_height,
            "Minimum height {} must be below maximum height {}",
            self.min_height,
            self.max_height
        );
        ensure!(
            self.min_eft < self.max_eft,
            "Minimum EFT {} must be below maximum EFT {}",
            self.min_eft,
            self.max_eft
        );
        ensure!(self.start_month >= 1, "Start month is 1-based");
        ensure!(
            self.start_month <= self.end_month,
            "Start month {} is after end month {}",
            self.start_month,
            self.end_month
        );
        Ok(())
    }
}

impl Default for SimulationBounds {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let bounds = SimulationBounds::default();
        assert!(bounds.validate().is_ok());
        assert_eq!(bounds.end_month, 240);
    }

    #[test]
    fn test_inverted_heights_are_rejected() {
        let bounds = SimulationBounds {
            min_height: 150.0,
            max_height: 60.0,
            ..SimulationBounds::new()
        };
        assert!(bounds.validate().is_err());

        let bounds = SimulationBounds {
            min_height: 100.0,
            max_height: 100.0,
            ..SimulationBounds::new()
        };
        assert!(bounds.validate().is_err());
    }

    #[test]
    fn test_non_positive_height_is_rejected() {
        let bounds = SimulationBounds {
            min_height: 0.0,
            ..SimulationBounds::new()
        };
        assert!(bounds.validate().is_err());
    }

    #[test]
    fn test_month_window() {
        let bounds = SimulationBounds {
            start_month: 13,
            end_month: 12,
            ..SimulationBounds::new()
        };
        assert!(bounds.validate().is_err());

        let bounds = SimulationBounds {
            start_month: 7,
            end_month: 18,
            ..SimulationBounds::new()
        };
        assert!(bounds.validate().is_ok());
    }
}
