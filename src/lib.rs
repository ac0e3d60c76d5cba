pub mod config;
pub mod geom;
pub mod search;
pub mod sim;
pub mod vecutils;

// Prelude
pub use geom::layout::{Layout, LayoutDomain, NestedLayoutDomain};
pub use geom::point::Point;
pub use search::{
    ExcessTemperatureOracle, HeightBisector, LayoutBracketSearch, NestedDomainSearch,
    SearchOutcome, SizingError,
};
pub use sim::bounds::SimulationBounds;
