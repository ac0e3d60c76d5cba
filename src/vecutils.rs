//! Slice utility functions like min(), max(), mean()

/// Largest value, ordered by `f64::total_cmp`. `None` for an empty slice.
pub fn max(vec: &[f64]) -> Option<f64> {
    vec.iter().cloned().max_by(f64::total_cmp)
}

/// Smallest value, ordered by `f64::total_cmp`. `None` for an empty slice.
pub fn min(vec: &[f64]) -> Option<f64> {
    vec.iter().cloned().min_by(f64::total_cmp)
}

/// Arithmetic mean. `None` for an empty slice.
pub fn mean(vec: &[f64]) -> Option<f64> {
    if vec.is_empty() {
        return None;
    }
    Some(vec.iter().sum::<f64>() / vec.len() as f64)
}

/// Checks that every element is larger than the one before it.
pub fn is_strictly_increasing(vec: &[f64]) -> bool {
    vec.windows(2).all(|w| w[0] < w[1])
}
