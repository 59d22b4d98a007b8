use super::types::{OutcomeSet, Statistics};

/// Reduces an outcome set to its summary statistics.
///
/// The median is the element at index `len / 2` of the ascending order, so
/// for even-sized sets it is the upper of the two middle values rather than
/// their average.
///
/// # Panics
///
/// Panics if `outcomes` is empty. Ensembles always hold at least one run.
pub fn summarize(outcomes: &OutcomeSet) -> Statistics {
    summarize_values(outcomes.values())
}

pub fn summarize_values(values: &[f64]) -> Statistics {
    assert!(
        !values.is_empty(),
        "cannot summarize an empty outcome set"
    );

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len();
    Statistics {
        average: values.iter().sum::<f64>() / n as f64,
        median: sorted[n / 2],
        min: sorted[0],
        max: sorted[n - 1],
    }
}
