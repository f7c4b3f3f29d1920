//! The data model for yearly contribution metrics.
//!
//! A [`YearRange`] describes one requested calendar year. Scanning a
//! repository classifies each item into at most one range and bumps the
//! matching [`MetricCounters`] inside a [`YearlyReport`]. Reports for
//! different repositories are merged by summation, so the order in which
//! repositories complete does not affect the final result.

mod metric;
mod metric_counters;
mod repository_ref;
mod year_range;
mod yearly_report;

pub use metric::Metric;
pub use metric_counters::MetricCounters;
pub use repository_ref::RepositoryRef;
pub use year_range::{YearRange, parse_year, year_of, year_ranges};
pub use yearly_report::YearlyReport;
