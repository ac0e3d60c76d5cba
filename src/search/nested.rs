//! Two-level search over a nested layout domain.
//!
//! The outer candidates are the smallest layout of the first level followed
//! by the largest layout of every level (see
//! [`NestedLayoutDomain::outer_domain`]). They are bracketed at the maximum
//! height, then the level holding the boundary is searched by a
//! [`LayoutBracketSearch`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::bracket::{ExcessTemperature, brackets, is_feasible};
use super::error::SizingError;
use super::layout::{LayoutBracketSearch, bisect_indices};
use super::oracle::{ExcessTemperatureOracle, evaluate_finite};
use super::state::{SearchOutcome, SearchPhase, SearchState, Selection, SelectionResult};
use crate::sim::bounds::SimulationBounds;
use crate::{LayoutDomain, NestedLayoutDomain};

/// Result of a [`NestedDomainSearch`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NestedSearchResult {
    /// Excess at the maximum height, by outer-domain index.
    pub outer_evaluated: BTreeMap<usize, ExcessTemperature>,
    /// Inner search results, by level.
    pub levels: BTreeMap<usize, SelectionResult>,
    pub selected_level: Option<usize>,
    pub outcome: SearchOutcome,
    pub phase: SearchPhase,
}

impl NestedSearchResult {
    pub fn selection(&self) -> Option<&Selection> {
        match &self.outcome {
            SearchOutcome::Selected(selection) => Some(selection),
            SearchOutcome::Infeasible { .. } => None,
        }
    }

    pub fn is_feasible(&self) -> bool {
        self.selection().is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NestedDomainSearch {
    pub inner: LayoutBracketSearch,
}

impl NestedDomainSearch {
    pub fn new(inner: LayoutBracketSearch) -> Self {
        Self { inner }
    }

    pub fn select<O>(
        &self,
        oracle: &O,
        nested: &NestedLayoutDomain,
        bounds: &SimulationBounds,
    ) -> Result<NestedSearchResult, SizingError>
    where
        O: ExcessTemperatureOracle + ?Sized,
    {
        self.inner.bisector.validate(bounds)?;
        let outer = nested
            .outer_domain()
            .map_err(|e| SizingError::precondition(format!("{e:#}")))?;
        let mut state = SearchState::new("nested");
        let last = outer.last_index();

        let smallest = probe(oracle, nested, &outer, 0, bounds, &mut state)?;
        let level = if is_feasible(smallest) {
            0
        } else {
            let largest = probe(oracle, nested, &outer, last, bounds, &mut state)?;
            if !brackets(smallest, largest) {
                info!(
                    levels = nested.len(),
                    smallest_excess = smallest,
                    largest_excess = largest,
                    "no level satisfies the temperature bounds"
                );
                let result = state.finish(SearchOutcome::Infeasible {
                    smallest_excess: smallest,
                    largest_excess: largest,
                });
                return Ok(NestedSearchResult {
                    outer_evaluated: result.evaluated,
                    levels: BTreeMap::new(),
                    selected_level: None,
                    outcome: result.outcome,
                    phase: result.phase,
                });
            }
            state.advance(SearchPhase::Bracketed);
            let index = bisect_indices(0, last, |k| {
                probe(oracle, nested, &outer, k, bounds, &mut state).map(is_feasible)
            })?;
            index - 1
        };

        let mut inner = self
            .inner
            .select_validated(oracle, &nested[level], bounds)
            .map_err(|e| e.at_level(level))?;
        let SearchOutcome::Selected(selection) = &mut inner.outcome else {
            return Err(SizingError::precondition(format!(
                "level {level} is feasible at its largest layout but its layout search \
                 found no feasible layout"
            )));
        };
        selection.level = Some(level);
        let selection = selection.clone();
        info!(
            level,
            index = selection.layout_index,
            boreholes = selection.boreholes(),
            height = selection.height,
            "selected level"
        );

        let result = state.finish(SearchOutcome::Selected(selection));
        let mut levels = BTreeMap::new();
        levels.insert(level, inner);
        Ok(NestedSearchResult {
            outer_evaluated: result.evaluated,
            levels,
            selected_level: Some(level),
            outcome: result.outcome,
            phase: result.phase,
        })
    }
}

/// Evaluates outer candidate `k` at the maximum height.
fn probe<O>(
    oracle: &O,
    nested: &NestedLayoutDomain,
    outer: &LayoutDomain,
    k: usize,
    bounds: &SimulationBounds,
    state: &mut SearchState,
) -> Result<ExcessTemperature, SizingError>
where
    O: ExcessTemperatureOracle + ?Sized,
{
    let (level, index) = match k {
        0 => (0, 0),
        k => (k - 1, nested[k - 1].last_index()),
    };
    let excess = evaluate_finite(oracle, &outer[k], bounds.max_height)
        .map_err(|e| e.at_level(level).at_layout(index))?;
    state.record(k, bounds.max_height, excess);
    Ok(excess)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Layout;

    /// Levels of `nx x ny` grids: level `j` holds `ny = j + 1` and `nx = 1..=4`.
    fn nested() -> NestedLayoutDomain {
        let levels = (1..=3)
            .map(|ny| {
                let layouts = (1..=4)
                    .map(|nx| Layout::rectangle(nx, ny, 5.0, 5.0).unwrap())
                    .collect();
                LayoutDomain::new(layouts).unwrap()
            })
            .collect();
        NestedLayoutDomain::new(levels).unwrap()
    }

    fn demand(total: f64) -> impl Fn(&Layout, f64) -> Result<f64, SizingError> {
        move |layout: &Layout, h: f64| Ok(total / (layout.len() as f64 * h) - 1.0)
    }

    #[test]
    fn test_first_level_when_smallest_is_feasible() {
        let result = NestedDomainSearch::default()
            .select(&demand(50.0), &nested(), &SimulationBounds::new())
            .unwrap();
        assert_eq!(result.selected_level, Some(0));
        let selection = result.selection().unwrap();
        assert_eq!(selection.level, Some(0));
        assert_eq!(selection.layout_index, 0);
        assert_eq!(selection.height, 60.0);
    }

    #[test]
    fn test_boundary_in_second_level() {
        // 4 boreholes at 150 m fail, 8 pass
        let result = NestedDomainSearch::default()
            .select(&demand(1000.0), &nested(), &SimulationBounds::new())
            .unwrap();
        assert_eq!(result.selected_level, Some(1));
        let selection = result.selection().unwrap();
        assert_eq!(selection.level, Some(1));
        assert_eq!(selection.boreholes(), 8);
        assert!((selection.height - 125.0).abs() <= 0.1);
        assert!(result.outer_evaluated[&1] > 0.0);
        assert!(result.outer_evaluated[&2] <= 0.0);
        assert!(result.levels.contains_key(&1));
        assert_eq!(result.phase, SearchPhase::Converged);
    }

    #[test]
    fn test_infeasible_nested_domain() {
        let result = NestedDomainSearch::default()
            .select(&demand(5000.0), &nested(), &SimulationBounds::new())
            .unwrap();
        assert!(!result.is_feasible());
        assert!(result.levels.is_empty());
        assert_eq!(result.phase, SearchPhase::Infeasible);
        let keys: Vec<usize> = result.outer_evaluated.keys().copied().collect();
        assert_eq!(keys, vec![0, 3]);
    }

    #[test]
    fn test_inner_errors_name_the_level() {
        let oracle = |layout: &Layout, h: f64| {
            if layout.len() == 6 {
                Err(SizingError::ModelConstruction {
                    trial: crate::search::error::Trial::new(layout.len(), h),
                    reason: "unsupported".to_string(),
                })
            } else {
                Ok(1000.0 / (layout.len() as f64 * h) - 1.0)
            }
        };
        let err = NestedDomainSearch::default()
            .select(&oracle, &nested(), &SimulationBounds::new())
            .unwrap_err();
        let trial = err.trial().unwrap();
        assert_eq!(trial.level, Some(1));
        assert_eq!(trial.boreholes, 6);
    }
}
