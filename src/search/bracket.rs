//! Sign and bracket helpers for excess temperatures.
//!
//! Positive excess means a temperature bound is violated; zero or negative
//! means the design is feasible.

use serde::Serialize;

/// Signed worst violation of the fluid temperature bounds, in K.
pub type ExcessTemperature = f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sign {
    Negative,
    Zero,
    Positive,
}

/// Sign of an excess temperature.
pub fn sign(excess: ExcessTemperature) -> Sign {
    if excess > 0.0 {
        Sign::Positive
    } else if excess < 0.0 {
        Sign::Negative
    } else {
        Sign::Zero
    }
}

/// True when the design satisfies both temperature bounds.
pub fn is_feasible(excess: ExcessTemperature) -> bool {
    excess <= 0.0
}

/// True when going from `lower` to `upper` crosses from infeasible to feasible.
pub fn brackets(lower: ExcessTemperature, upper: ExcessTemperature) -> bool {
    sign(lower) == Sign::Positive && sign(upper) != Sign::Positive
}
