//! Histogram counts and densities over shared edges.
//!
//! Value `v` falls in bin `i` when `edges[i] <= v < edges[i + 1]`. The last
//! bin is closed on both ends so the maximum is never dropped.

/// Locates the bin index for a value, or `None` when it lies outside the
/// edges.
fn bin_index(value: f64, edges: &[f64]) -> Option<usize> {
    let bin_count = edges.len().checked_sub(1)?;
    if bin_count == 0 || !value.is_finite() {
        return None;
    }

    let first = edges[0];
    let last = edges[bin_count];
    if value < first || value > last {
        return None;
    }

    // Last bin is closed on the right.
    if value >= edges[bin_count - 1] {
        return Some(bin_count - 1);
    }

    // First edge strictly greater than value; the bin is the one before it.
    let upper = edges.partition_point(|&edge| edge <= value);
    upper.checked_sub(1).map(|idx| idx.min(bin_count - 1))
}

/// Counts series values per bin.
///
/// Returns an empty vector when fewer than two edges are given or the
/// series is empty. Values outside `[edges[0], edges[last]]` and
/// non-finite values are not counted.
pub fn hist_counts(series: &[f64], edges: &[f64]) -> Vec<u64> {
    if edges.len() < 2 || series.is_empty() {
        return Vec::new();
    }

    let mut counts = vec![0u64; edges.len() - 1];
    for &value in series {
        if let Some(idx) = bin_index(value, edges) {
            counts[idx] += 1;
        }
    }
    counts
}

/// Normalized density per bin: `counts[i] / (n * bin_width)`.
///
/// `bin_width` is `edges[1] - edges[0]` (uniform bins). For collapsed
/// edges (zero width) the probability mass `counts[i] / n` is returned
/// instead of dividing by zero.
pub fn hist_density(series: &[f64], edges: &[f64]) -> Vec<f64> {
    let counts = hist_counts(series, edges);
    if counts.is_empty() {
        return Vec::new();
    }

    let n = series.len() as f64;
    let bin_width = edges[1] - edges[0];
    let scale = if bin_width > 0.0 { n * bin_width } else { n };

    counts.iter().map(|&c| c as f64 / scale).collect()
}
