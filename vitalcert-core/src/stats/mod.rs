//! Pure statistical helpers used by the quality and privacy engines.
//!
//! - **Binning**: shared bin edges across one or several series
//! - **Histogram**: per-bin counts and normalized densities
//! - **Box plot**: quartiles, whiskers and outliers
//! - **Descriptive**: mean, spread, quantiles and correlation
//!
//! Every function here is side-effect free over borrowed input and safe
//! to call concurrently across columns. Degenerate input (empty series,
//! non-finite values) resolves to documented zero results instead of
//! errors.

pub mod binning;
pub mod boxplot;
pub mod descriptive;
pub mod histogram;

pub use binning::{BinSet, MAX_BIN_COUNT, make_bins, make_bins_single};
pub use boxplot::{BoxPlotStats, calculate_box_plot_stats};
pub use descriptive::SummaryStats;
pub use histogram::{hist_counts, hist_density};
