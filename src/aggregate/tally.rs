//! Classification of individual commits, pull requests, and issues.

use crate::github::Identity;
use crate::metrics::{Metric, YearRange, YearlyReport, year_of};
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct UserRef {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Actor {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitAuthor {
    pub user: Option<UserRef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitNode {
    pub committed_date: DateTime<Utc>,
    pub author: Option<CommitAuthor>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestNode {
    pub created_at: DateTime<Utc>,
    pub merged: bool,
    pub author: Option<Actor>,
    pub merged_by: Option<Actor>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueNode {
    #[serde(rename = "__typename")]
    pub typename: String,
    pub created_at: DateTime<Utc>,
    pub author: Option<Actor>,
}

const ISSUE_TYPENAME: &str = "Issue";

/// Accumulates one repository's items into a [`YearlyReport`].
///
/// Only items attributed to `identity` and dated inside one of the requested
/// ranges are counted; everything else is dropped.
#[derive(Debug)]
pub struct Tally<'a> {
    identity: &'a Identity,
    ranges: &'a [YearRange],
    report: YearlyReport,
}

impl<'a> Tally<'a> {
    #[must_use]
    pub fn new(identity: &'a Identity, ranges: &'a [YearRange]) -> Self {
        Self {
            identity,
            ranges,
            report: YearlyReport::new(ranges),
        }
    }

    /// Returns `true` if `instant` predates every requested year.
    ///
    /// Scans ordered newest-first can stop at the first such item.
    #[must_use]
    pub fn is_before_window(&self, instant: DateTime<Utc>) -> bool {
        self.ranges.iter().all(|range| instant < range.start())
    }

    pub fn commit(&mut self, commit: &CommitNode) {
        let by_identity = commit
            .author
            .as_ref()
            .and_then(|author| author.user.as_ref())
            .is_some_and(|user| user.id == self.identity.id);

        if by_identity && let Some(year) = year_of(self.ranges, commit.committed_date) {
            self.report.record(year, Metric::Commits);
        }
    }

    /// Count a pull request as created, and as merged when the identity both opened and merged it.
    ///
    /// Both counts use the creation date so a year's merged count never exceeds its created count.
    pub fn pull_request(&mut self, pr: &PullRequestNode) {
        if !self.is_identity(pr.author.as_ref()) {
            return;
        }

        let Some(year) = year_of(self.ranges, pr.created_at) else {
            return;
        };

        self.report.record(year, Metric::PullRequests);
        if pr.merged && self.is_identity(pr.merged_by.as_ref()) {
            self.report.record(year, Metric::MergedPullRequests);
        }
    }

    /// Count an issue. Pull requests showing up in an issue listing are never counted.
    pub fn issue(&mut self, issue: &IssueNode) {
        if issue.typename != ISSUE_TYPENAME || !self.is_identity(issue.author.as_ref()) {
            return;
        }

        if let Some(year) = year_of(self.ranges, issue.created_at) {
            self.report.record(year, Metric::Issues);
        }
    }

    fn is_identity(&self, actor: Option<&Actor>) -> bool {
        actor.is_some_and(|actor| self.identity.is_login(&actor.login))
    }

    #[must_use]
    pub fn into_report(self) -> YearlyReport {
        self.report
    }
}
