//! Bracket search over a size-ordered layout domain.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::bracket::{brackets, is_feasible};
use super::error::SizingError;
use super::height::HeightBisector;
use super::oracle::{ExcessTemperatureOracle, evaluate_finite};
use super::state::{SearchOutcome, SearchPhase, SearchState, Selection, SelectionResult};
use crate::LayoutDomain;
use crate::sim::bounds::SimulationBounds;

/// Narrows `[lo, hi]` until `hi - lo <= 1`, keeping `lo` infeasible and
/// `hi` feasible. Returns `hi`.
pub(crate) fn bisect_indices<F>(
    mut lo: usize,
    mut hi: usize,
    mut feasible_at: F,
) -> Result<usize, SizingError>
where
    F: FnMut(usize) -> Result<bool, SizingError>,
{
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if feasible_at(mid)? {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    Ok(hi)
}

/// Selects the most compact layout of a domain that can be sized within
/// the height bounds.
///
/// Intermediate layouts are only evaluated at the maximum height; the full
/// height bisection runs on the smallest layout and on the final pick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutBracketSearch {
    pub bisector: HeightBisector,
}

impl LayoutBracketSearch {
    pub fn new(bisector: HeightBisector) -> Self {
        Self { bisector }
    }

    pub fn select<O>(
        &self,
        oracle: &O,
        domain: &LayoutDomain,
        bounds: &SimulationBounds,
    ) -> Result<SelectionResult, SizingError>
    where
        O: ExcessTemperatureOracle + ?Sized,
    {
        self.bisector.validate(bounds)?;
        self.select_validated(oracle, domain, bounds)
    }

    pub(crate) fn select_validated<O>(
        &self,
        oracle: &O,
        domain: &LayoutDomain,
        bounds: &SimulationBounds,
    ) -> Result<SelectionResult, SizingError>
    where
        O: ExcessTemperatureOracle + ?Sized,
    {
        let mut state = SearchState::new("layout");
        let max_height = bounds.max_height;

        let smallest = self
            .bisector
            .size_with(oracle, domain.smallest(), bounds, None)
            .map_err(|e| e.at_layout(0))?;
        state.record(0, max_height, smallest.at_max.excess);
        if let Some(selection) = Selection::new(0, domain.smallest().clone(), smallest) {
            return Ok(selected(state, selection));
        }

        let last = domain.last_index();
        let largest = if last == 0 {
            smallest.at_max.excess
        } else {
            let excess = evaluate_finite(oracle, domain.largest(), max_height)
                .map_err(|e| e.at_layout(last))?;
            state.record(last, max_height, excess);
            excess
        };
        if !brackets(smallest.at_max.excess, largest) {
            info!(
                layouts = domain.len(),
                smallest_excess = smallest.at_max.excess,
                largest_excess = largest,
                "no layout satisfies the temperature bounds"
            );
            return Ok(state.finish(SearchOutcome::Infeasible {
                smallest_excess: smallest.at_max.excess,
                largest_excess: largest,
            }));
        }

        state.advance(SearchPhase::Bracketed);
        let index = bisect_indices(0, last, |i| {
            let excess =
                evaluate_finite(oracle, &domain[i], max_height).map_err(|e| e.at_layout(i))?;
            state.record(i, max_height, excess);
            Ok(is_feasible(excess))
        })?;

        let sizing = self
            .bisector
            .size_with(oracle, &domain[index], bounds, state.get(index))
            .map_err(|e| e.at_layout(index))?;
        match Selection::new(index, domain[index].clone(), sizing) {
            Some(selection) => Ok(selected(state, selection)),
            None => Err(SizingError::precondition(format!(
                "layout {index} is feasible at {max_height} m but could not be sized"
            ))),
        }
    }
}

fn selected(state: SearchState, selection: Selection) -> SelectionResult {
    info!(
        index = selection.layout_index,
        boreholes = selection.boreholes(),
        height = selection.height,
        drilling_length = selection.total_drilling_length,
        "selected layout"
    );
    state.finish(SearchOutcome::Selected(selection))
}
