use super::{Metric, MetricCounters, YearRange};
use serde::Serialize;
use std::collections::BTreeMap;

/// Per-year contribution counts summed across repositories.
///
/// Every requested year is present from construction onward, so a run that
/// finds no activity still reports explicit zeros.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct YearlyReport {
    years: BTreeMap<i32, MetricCounters>,
}

impl YearlyReport {
    #[must_use]
    pub fn new(ranges: &[YearRange]) -> Self {
        Self {
            years: ranges.iter().map(|range| (range.year(), MetricCounters::default())).collect(),
        }
    }

    /// Count one item for `year`. Years that were not requested are ignored.
    pub fn record(&mut self, year: i32, metric: Metric) {
        if let Some(counters) = self.years.get_mut(&year) {
            counters.increment(metric);
        }
    }

    /// Add another report's counts into this one.
    pub fn merge(&mut self, other: &Self) {
        for (year, counters) in &other.years {
            *self.years.entry(*year).or_default() += *counters;
        }
    }

    #[must_use]
    pub fn get(&self, year: i32) -> Option<&MetricCounters> {
        self.years.get(&year)
    }

    /// Years in ascending order with their counters.
    pub fn iter(&self) -> impl Iterator<Item = (i32, &MetricCounters)> {
        self.years.iter().map(|(year, counters)| (*year, counters))
    }

    /// Returns `true` when no year has any activity.
    #[must_use]
    pub fn is_all_zero(&self) -> bool {
        self.years.values().all(MetricCounters::is_zero)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::year_ranges;

    #[test]
    fn test_new_report_has_zero_entry_per_year() {
        let report = YearlyReport::new(&year_ranges([2024, 2025]).unwrap());
        assert_eq!(report.iter().count(), 2);
        assert_eq!(report.get(2024), Some(&MetricCounters::default()));
        assert_eq!(report.get(2025), Some(&MetricCounters::default()));
        assert!(report.is_all_zero());
    }

    #[test]
    fn test_record_ignores_unrequested_years() {
        let mut report = YearlyReport::new(&year_ranges([2024]).unwrap());
        report.record(2024, Metric::Commits);
        report.record(2023, Metric::Commits);
        assert_eq!(report.get(2024), Some(&MetricCounters::new(1, 0, 0, 0)));
        assert_eq!(report.get(2023), None);
    }

    #[test]
    fn test_merge_is_order_independent() {
        let ranges = year_ranges([2024, 2025]).unwrap();
        let mut a = YearlyReport::new(&ranges);
        a.record(2024, Metric::Commits);
        a.record(2025, Metric::Issues);
        let mut b = YearlyReport::new(&ranges);
        b.record(2024, Metric::PullRequests);
        b.record(2024, Metric::Commits);

        let mut ab = YearlyReport::new(&ranges);
        ab.merge(&a);
        ab.merge(&b);
        let mut ba = YearlyReport::new(&ranges);
        ba.merge(&b);
        ba.merge(&a);

        assert_eq!(ab, ba);
        assert_eq!(ab.get(2024), Some(&MetricCounters::new(2, 1, 0, 0)));
        assert_eq!(ab.get(2025), Some(&MetricCounters::new(0, 0, 0, 1)));
    }

    #[test]
    fn test_iter_is_year_ascending() {
        let report = YearlyReport::new(&year_ranges([2025, 2021, 2023]).unwrap());
        let years: Vec<_> = report.iter().map(|(year, _)| year).collect();
        assert_eq!(years, [2021, 2023, 2025]);
    }
}
