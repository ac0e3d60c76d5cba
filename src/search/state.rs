use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, trace};

use super::bracket::ExcessTemperature;
use super::height::HeightSizing;
use crate::Layout;

/// Phase of a bracket-and-bisect search.
///
/// A failed search has no phase: it ends with `Err(SizingError)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SearchPhase {
    /// Endpoints not evaluated yet.
    Unbracketed,
    /// Endpoints straddle the feasibility boundary, bisection is narrowing it.
    Bracketed,
    /// A feasible point was found.
    Converged,
    /// Nothing in the searched range satisfies the temperature bounds.
    Infeasible,
}

impl SearchPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Converged | Self::Infeasible)
    }

    pub(crate) fn advance(&mut self, next: SearchPhase, search: &'static str) {
        if *self != next {
            debug!(search, from = ?*self, to = ?next, "search phase changed");
            *self = next;
        }
    }
}

/// Selected layout and its sizing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    /// Outer level of a nested domain, `None` for a single domain.
    pub level: Option<usize>,
    pub layout_index: usize,
    pub layout: Layout,
    /// Sized borehole length in m.
    pub height: f64,
    pub excess: ExcessTemperature,
    pub sizing: HeightSizing,
    /// `height * boreholes`, in m.
    pub total_drilling_length: f64,
}

impl Selection {
    pub fn new(layout_index: usize, layout: Layout, sizing: HeightSizing) -> Option<Self> {
        let sized = sizing.sized?;
        Some(Self {
            level: None,
            layout_index,
            total_drilling_length: sized.height * layout.len() as f64,
            layout,
            height: sized.height,
            excess: sized.excess,
            sizing,
        })
    }

    pub fn boreholes(&self) -> usize {
        self.layout.len()
    }
}

/// Terminal outcome of a layout search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SearchOutcome {
    Selected(Selection),
    /// Even the largest candidate violates the bounds at the maximum height.
    Infeasible {
        /// Excess of the most compact candidate at the maximum height.
        smallest_excess: ExcessTemperature,
        /// Excess of the largest candidate at the maximum height.
        largest_excess: ExcessTemperature,
    },
}

/// Mutable bookkeeping of one layout search.
#[derive(Debug, Clone)]
pub struct SearchState {
    phase: SearchPhase,
    /// Excess at the maximum height, by domain index.
    evaluated: BTreeMap<usize, ExcessTemperature>,
    search: &'static str,
}

impl SearchState {
    pub fn new(search: &'static str) -> Self {
        Self {
            phase: SearchPhase::Unbracketed,
            evaluated: BTreeMap::new(),
            search,
        }
    }

    pub fn phase(&self) -> SearchPhase {
        self.phase
    }

    pub fn evaluated(&self) -> &BTreeMap<usize, ExcessTemperature> {
        &self.evaluated
    }

    pub fn get(&self, index: usize) -> Option<ExcessTemperature> {
        self.evaluated.get(&index).copied()
    }

    pub fn record(&mut self, index: usize, height: f64, excess: ExcessTemperature) {
        trace!(search = self.search, index, height, excess, "recorded candidate");
        self.evaluated.insert(index, excess);
    }

    pub fn advance(&mut self, next: SearchPhase) {
        self.phase.advance(next, self.search);
    }

    /// Finalizes the search into an immutable result.
    pub fn finish(mut self, outcome: SearchOutcome) -> SelectionResult {
        let terminal = match outcome {
            SearchOutcome::Selected(_) => SearchPhase::Converged,
            SearchOutcome::Infeasible { .. } => SearchPhase::Infeasible,
        };
        self.advance(terminal);
        SelectionResult {
            outcome,
            evaluated: self.evaluated,
            phase: self.phase,
        }
    }
}

/// Result of a [`LayoutBracketSearch`](super::layout::LayoutBracketSearch).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionResult {
    pub outcome: SearchOutcome,
    /// Excess at the maximum height of every domain index tried.
    pub evaluated: BTreeMap<usize, ExcessTemperature>,
    pub phase: SearchPhase,
}

impl SelectionResult {
    pub fn selection(&self) -> Option<&Selection> {
        match &self.outcome {
            SearchOutcome::Selected(selection) => Some(selection),
            SearchOutcome::Infeasible { .. } => None,
        }
    }

    pub fn is_feasible(&self) -> bool {
        self.selection().is_some()
    }

    pub fn evaluated_indices(&self) -> Vec<usize> {
        self.evaluated.keys().copied().collect()
    }
}
