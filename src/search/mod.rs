//! Bracket-and-bisect sizing of a borefield.
//!
//! [`NestedDomainSearch`] drives a [`LayoutBracketSearch`] on one level of a
//! nested domain, which drives a [`HeightBisector`] on one layout, which
//! calls an [`ExcessTemperatureOracle`] per trial height.

pub mod bracket;
pub mod error;
pub mod height;
pub mod layout;
pub mod nested;
pub mod oracle;
pub mod state;

pub use bracket::ExcessTemperature;
pub use error::{SizingError, Trial};
pub use height::{HeightBisector, HeightSample, HeightSizing};
pub use layout::LayoutBracketSearch;
pub use nested::{NestedDomainSearch, NestedSearchResult};
pub use oracle::{EvaluationRecord, ExcessTemperatureOracle, GheOracle, MemoizedOracle};
pub use state::{SearchOutcome, SearchPhase, SearchState, Selection, SelectionResult};
