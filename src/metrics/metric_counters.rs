use super::Metric;
use core::ops::AddAssign;
use serde::{Deserialize, Serialize};

/// Contribution counts for a single year.
///
/// Counters only ever grow: they are bumped one item at a time while scanning
/// and combined by addition when per-repository results are merged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricCounters {
    commits: u64,
    prs: u64,
    merged: u64,
    issues: u64,
}

impl MetricCounters {
    #[must_use]
    pub const fn new(commits: u64, prs: u64, merged: u64, issues: u64) -> Self {
        Self {
            commits,
            prs,
            merged,
            issues,
        }
    }

    #[must_use]
    pub const fn get(&self, metric: Metric) -> u64 {
        match metric {
            Metric::Commits => self.commits,
            Metric::PullRequests => self.prs,
            Metric::MergedPullRequests => self.merged,
            Metric::Issues => self.issues,
        }
    }

    pub const fn increment(&mut self, metric: Metric) {
        let slot = match metric {
            Metric::Commits => &mut self.commits,
            Metric::PullRequests => &mut self.prs,
            Metric::MergedPullRequests => &mut self.merged,
            Metric::Issues => &mut self.issues,
        };
        *slot += 1;
    }

    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.commits == 0 && self.prs == 0 && self.merged == 0 && self.issues == 0
    }
}

impl AddAssign for MetricCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.commits += rhs.commits;
        self.prs += rhs.prs;
        self.merged += rhs.merged;
        self.issues += rhs.issues;
    }
}
