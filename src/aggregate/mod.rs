//! Per-year contribution counting.
//!
//! [`Tally`] classifies individual commits, pull requests, and issues, while
//! [`Aggregator`] drives the paginated queries for each repository and merges
//! the per-repository results into one [`YearlyReport`](crate::metrics::YearlyReport).

mod aggregator;
mod tally;

pub use aggregator::Aggregator;
pub use tally::{Actor, CommitAuthor, CommitNode, IssueNode, PullRequestNode, Tally, UserRef};
