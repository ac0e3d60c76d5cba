use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Inputs of one oracle call, kept so a failure can be reproduced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Trial {
    /// Outer level of a nested domain, when known.
    pub level: Option<usize>,
    /// Index of the layout within its domain, when known.
    pub layout_index: Option<usize>,
    pub boreholes: usize,
    /// Borehole length in m.
    pub height: f64,
}

impl Trial {
    pub fn new(boreholes: usize, height: f64) -> Self {
        Self {
            level: None,
            layout_index: None,
            boreholes,
            height,
        }
    }
}

impl fmt::Display for Trial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.layout_index {
            Some(i) => write!(f, "layout {i}")?,
            None => write!(f, "layout")?,
        }
        if let Some(level) = self.level {
            write!(f, " of level {level}")?;
        }
        write!(
            f,
            " ({} boreholes) at H = {:.3} m",
            self.boreholes, self.height
        )
    }
}

/// Errors that abort a sizing search.
///
/// An infeasible design space is not an error; it is reported through
/// [`SearchOutcome::Infeasible`](super::state::SearchOutcome::Infeasible).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SizingError {
    /// The g-function or the heat exchanger model could not be built.
    #[error("failed to build thermal model for {trial}: {reason}")]
    ModelConstruction { trial: Trial, reason: String },
    /// The simulation produced non-finite or non-convergent output.
    #[error("simulation diverged for {trial}: {reason}")]
    SimulationDiverged { trial: Trial, reason: String },
    /// Bracket invariants do not hold: invalid bounds or a non-monotone model.
    #[error("search precondition violated: {reason}")]
    SearchPrecondition { reason: String },
}

impl SizingError {
    pub fn precondition(reason: impl Into<String>) -> Self {
        Self::SearchPrecondition {
            reason: reason.into(),
        }
    }

    /// The failing trial, if the error came from an oracle call.
    pub fn trial(&self) -> Option<&Trial> {
        match self {
            Self::ModelConstruction { trial, .. } | Self::SimulationDiverged { trial, .. } => {
                Some(trial)
            }
            Self::SearchPrecondition { .. } => None,
        }
    }

    /// Records the domain index of the failing layout unless one is already set.
    pub fn at_layout(mut self, index: usize) -> Self {
        if let Some(trial) = self.trial_mut()
            && trial.layout_index.is_none()
        {
            trial.layout_index = Some(index);
        }
        self
    }

    /// Records the nested-domain level of the failing layout unless one is already set.
    pub fn at_level(mut self, level: usize) -> Self {
        if let Some(trial) = self.trial_mut()
            && trial.level.is_none()
        {
            trial.level = Some(level);
        }
        self
    }

    fn trial_mut(&mut self) -> Option<&mut Trial> {
        match self {
            Self::ModelConstruction { trial, .. } | Self::SimulationDiverged { trial, .. } => {
                Some(trial)
            }
            Self::SearchPrecondition { .. } => None,
        }
    }
}
