//! Shared-edge binning.
//!
//! Real and synthetic columns must be histogrammed against the *same*
//! edges for their densities to be comparable, so edges are computed over
//! the flattened union of every series passed in.
//!
//! # Examples
//!
//! ```
//! use vitalcert_core::stats::binning::make_bins;
//!
//! let real = [60.0, 70.0, 80.0];
//! let synthetic = [65.0, 100.0];
//! let bins = make_bins(&[&real[..], &synthetic[..]], 4).unwrap();
//!
//! assert_eq!(bins.edges, vec![60.0, 70.0, 80.0, 90.0, 100.0]);
//! assert_eq!(bins.centers, vec![65.0, 75.0, 85.0, 95.0]);
//! ```

use serde::{Deserialize, Serialize};

use crate::{Result, VitalCertError};

/// Largest supported number of bins.
pub const MAX_BIN_COUNT: usize = 10_000;

/// Bin edges, width and centers shared by one or more series.
///
/// `centers[i] == edges[i] + width / 2`. A collapsed set (all values
/// equal) has `width == 0` and every edge equal to that value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BinSet {
    /// `bin_count + 1` non-decreasing edges
    pub edges: Vec<f64>,
    /// Uniform bin width
    pub width: f64,
    /// `bin_count` bin centers
    pub centers: Vec<f64>,
}

impl BinSet {
    /// Number of bins described by the edges.
    pub fn bin_count(&self) -> usize {
        self.edges.len().saturating_sub(1)
    }

    /// Returns true if no edges were produced (empty input).
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Returns true if all input values were identical.
    pub fn is_collapsed(&self) -> bool {
        !self.edges.is_empty() && self.width == 0.0
    }
}

/// Computes bins shared across several series.
///
/// Extremes are taken over the flattened input, ignoring non-finite
/// values. Empty input yields an empty [`BinSet`].
///
/// # Errors
/// Returns a configuration error when `bin_count` is zero or above
/// [`MAX_BIN_COUNT`].
pub fn make_bins(series: &[&[f64]], bin_count: usize) -> Result<BinSet> {
    if bin_count == 0 {
        return Err(VitalCertError::configuration(
            "bin_count must be at least 1",
        ));
    }
    let edge_count = bin_count
        .checked_add(1)
        .filter(|_| bin_count <= MAX_BIN_COUNT)
        .ok_or_else(|| {
            VitalCertError::configuration(format!(
                "bin_count must be at most {}, got {}",
                MAX_BIN_COUNT, bin_count
            ))
        })?;

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut seen = false;
    for value in series.iter().flat_map(|s| s.iter()).copied() {
        if !value.is_finite() {
            continue;
        }
        seen = true;
        min = min.min(value);
        max = max.max(value);
    }

    if !seen {
        return Ok(BinSet::default());
    }

    if min == max {
        return Ok(BinSet {
            edges: vec![min; edge_count],
            width: 0.0,
            centers: vec![min; bin_count],
        });
    }

    let width = (max - min) / bin_count as f64;
    let mut edges: Vec<f64> = (0..=bin_count).map(|i| min + i as f64 * width).collect();
    // Accumulated rounding must not move the last edge below the maximum.
    edges[bin_count] = max;

    let centers = edges[..bin_count].iter().map(|e| e + width / 2.0).collect();

    Ok(BinSet {
        edges,
        width,
        centers,
    })
}

/// Computes bins for a single series.
pub fn make_bins_single(series: &[f64], bin_count: usize) -> Result<BinSet> {
    make_bins(&[series], bin_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_series_edges() {
        let bins = make_bins_single(&[0.0, 10.0], 5).unwrap();

        assert_eq!(bins.edges, vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(bins.width, 2.0);
        assert_eq!(bins.centers, vec![1.0, 3.0, 5.0, 7.0, 9.0]);
        assert_eq!(bins.bin_count(), 5);
    }

    #[test]
    fn test_joint_extremes_are_shared() {
        let real = [5.0, 6.0, 7.0];
        let synthetic = [1.0, 9.0];

        let bins = make_bins(&[&real[..], &synthetic[..]], 4).unwrap();

        assert_eq!(bins.edges.first(), Some(&1.0));
        assert_eq!(bins.edges.last(), Some(&9.0));
        assert_eq!(bins.width, 2.0);
    }

    #[test]
    fn test_empty_input() {
        let bins = make_bins(&[&[], &[]], 10).unwrap();

        assert!(bins.is_empty());
        assert_eq!(bins.width, 0.0);
        assert!(bins.centers.is_empty());
    }

    #[test]
    fn test_collapsed_input() {
        let bins = make_bins_single(&[72.0, 72.0, 72.0], 3).unwrap();

        assert!(bins.is_collapsed());
        assert_eq!(bins.edges, vec![72.0; 4]);
        assert_eq!(bins.centers, vec![72.0; 3]);
    }

    #[test]
    fn test_zero_bin_count_rejected() {
        let result = make_bins_single(&[1.0, 2.0], 0);
        assert!(matches!(result, Err(VitalCertError::Configuration { .. })));
    }

    #[test]
    fn test_oversized_bin_count_rejected() {
        let err = make_bins(&[&[1.0, 2.0][..]], usize::MAX).unwrap_err();
        assert!(err.to_string().contains("bin_count"));
        assert!(make_bins_single(&[1.0, 2.0], MAX_BIN_COUNT + 1).is_err());
        assert_eq!(make_bins_single(&[1.0, 2.0], MAX_BIN_COUNT).unwrap().centers.len(), MAX_BIN_COUNT);
    }

    #[test]
    fn test_non_finite_values_ignored() {
        let bins = make_bins_single(&[f64::NAN, 1.0, 3.0, f64::INFINITY], 2).unwrap();
        assert_eq!(bins.edges, vec![1.0, 2.0, 3.0]);

        let bins = make_bins_single(&[f64::NAN], 2).unwrap();
        assert!(bins.is_empty());
    }

    #[test]
    fn test_last_edge_is_exact_max() {
        let values = [0.1, 0.7, 0.3];
        let bins = make_bins_single(&values, 7).unwrap();

        assert_eq!(bins.edges[7], 0.7);
        assert!(bins.edges.windows(2).all(|w| w[0] <= w[1]));
    }
}
