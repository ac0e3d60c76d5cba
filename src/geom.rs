pub mod layout;
pub mod point;

/// Geometric precision
const EPS: f64 = 1e-9;
