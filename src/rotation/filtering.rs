//! Robust statistics used by the rotation: medians and the odd-length median filter.
use log::warn;
use ndarray::{Array1, ArrayView1};

/// Median of a sequence of values. Even-length input averages the two middle values.
///
/// Returns `None` for empty input.
pub fn median<'a, I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a f64>,
{
    let mut sorted: Vec<f64> = values.into_iter().copied().collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Rounds a smoothing window down to the nearest odd length.
/// A window of 0 stays 0 (smoothing disabled).
pub fn odd_window(window: usize) -> usize {
    if window == 0 || window % 2 == 1 {
        window
    } else {
        warn!("Smoothing window {window} is not odd, using {}", window - 1);
        window - 1
    }
}

/// Applies a median filter of odd length `window` to `data`.
///
/// Samples beyond either end are replaced by the nearest edge sample, so a constant
/// series passes through unchanged. A window of 1 returns a copy of the input.
pub fn median_filter(data: ArrayView1<f64>, window: usize) -> Array1<f64> {
    let n = data.len();
    if n == 0 || window <= 1 {
        return data.to_owned();
    }
    let half = window / 2;
    let mut buffer: Vec<f64> = Vec::with_capacity(window);
    let mut filtered = Array1::zeros(n);
    for i in 0..n {
        buffer.clear();
        for k in 0..window {
            // index i - half + k, clamped to [0, n - 1]
            let j = (i + k).saturating_sub(half).min(n - 1);
            buffer.push(data[j]);
        }
        buffer.sort_by(f64::total_cmp);
        filtered[i] = buffer[half];
    }
    filtered
}
