use super::tally::{CommitNode, IssueNode, PullRequestNode, Tally};
use crate::Result;
use crate::github::queries::{AUTHORED_ISSUES, COMMIT_HISTORY, PULL_REQUESTS};
use crate::github::{Client, Connection, Identity};
use crate::metrics::{RepositoryRef, YearRange, YearlyReport};
use chrono::{DateTime, SecondsFormat, Utc};
use core::pin::pin;
use futures::{StreamExt, TryStreamExt, stream};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Log target for aggregation
const LOG_TARGET: &str = "aggregate";

#[derive(Debug, Deserialize)]
struct CommitData {
    repository: Option<CommitRepository>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitRepository {
    default_branch_ref: Option<BranchRef>,
}

#[derive(Debug, Deserialize)]
struct BranchRef {
    target: Option<BranchTarget>,
}

// Non-commit targets deserialize as an empty object.
#[derive(Debug, Deserialize)]
struct BranchTarget {
    history: Option<Connection<CommitNode>>,
}

#[derive(Debug, Deserialize)]
struct PullRequestData {
    repository: Option<PullRequestRepository>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PullRequestRepository {
    pull_requests: Connection<PullRequestNode>,
}

#[derive(Debug, Deserialize)]
struct IssueData {
    repository: Option<IssueRepository>,
}

#[derive(Debug, Deserialize)]
struct IssueRepository {
    issues: Connection<IssueNode>,
}

/// Counts the contributions of one identity across repositories for a fixed set of years.
#[derive(Debug, Clone)]
pub struct Aggregator {
    client: Client,
    identity: Identity,
    ranges: Vec<YearRange>,
}

impl Aggregator {
    #[must_use]
    pub fn new(client: Client, identity: Identity, ranges: Vec<YearRange>) -> Self {
        Self { client, identity, ranges }
    }

    /// Aggregate every repository, running at most `concurrency` repositories at a time.
    ///
    /// Repositories that no longer resolve are skipped with a warning. Any
    /// other failure aborts the whole aggregation.
    pub async fn aggregate_all(&self, repositories: &[RepositoryRef], concurrency: usize) -> Result<YearlyReport> {
        let start_time = std::time::Instant::now();
        let mut report = YearlyReport::new(&self.ranges);
        let mut skipped = 0usize;

        let mut results = stream::iter(repositories)
            .map(|repository| async move { (repository, self.aggregate_repository(repository).await) })
            .buffer_unordered(concurrency.max(1));

        while let Some((repository, result)) = results.next().await {
            match result {
                Ok(repo_report) => report.merge(&repo_report),
                Err(e) if e.is_not_found() => {
                    log::warn!(target: LOG_TARGET, "Skipping '{repository}': {e}");
                    skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        log::info!(
            target: LOG_TARGET,
            "Aggregated {} repositories ({skipped} skipped) in {:.3}s",
            repositories.len() - skipped,
            start_time.elapsed().as_secs_f64()
        );

        Ok(report)
    }

    /// Count one repository's commits, pull requests, and issues for the requested years.
    pub async fn aggregate_repository(&self, repository: &RepositoryRef) -> Result<YearlyReport> {
        let mut tally = Tally::new(&self.identity, &self.ranges);
        let (Some(earliest), Some(latest)) = (self.ranges.first(), self.ranges.last()) else {
            return Ok(tally.into_report());
        };

        self.count_commits(repository, earliest.start(), latest.end(), &mut tally).await?;
        self.count_pull_requests(repository, &mut tally).await?;
        self.count_issues(repository, &mut tally).await?;

        let report = tally.into_report();
        log::debug!(target: LOG_TARGET, "Finished '{repository}'");
        Ok(report)
    }

    async fn count_commits(
        &self,
        repository: &RepositoryRef,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
        tally: &mut Tally<'_>,
    ) -> Result<()> {
        let mut variables = repository_variables(repository);
        let _ = variables.insert("authorId".to_string(), Value::from(self.identity.id.as_str()));
        let _ = variables.insert("since".to_string(), Value::from(timestamp(since)));
        let _ = variables.insert("until".to_string(), Value::from(timestamp(until)));

        let pages = self.client.paginate("commits", COMMIT_HISTORY, variables, |data: CommitData| {
            data.repository?.default_branch_ref?.target?.history
        });

        let mut pages = pin!(pages);
        while let Some(page) = pages.try_next().await? {
            for commit in &page {
                tally.commit(commit);
            }
        }

        Ok(())
    }

    async fn count_pull_requests(&self, repository: &RepositoryRef, tally: &mut Tally<'_>) -> Result<()> {
        let pages = self
            .client
            .paginate("pull requests", PULL_REQUESTS, repository_variables(repository), |data: PullRequestData| {
                data.repository.map(|repository| repository.pull_requests)
            });

        let mut pages = pin!(pages);
        let mut scanned = 0usize;
        'pages: while let Some(page) = pages.try_next().await? {
            scanned += 1;
            for pr in &page {
                if tally.is_before_window(pr.created_at) {
                    log::debug!(target: LOG_TARGET, "Reached pull requests older than {} in '{repository}'", self.earliest_year());
                    break 'pages;
                }
                tally.pull_request(pr);
            }
        }

        log::info!(target: LOG_TARGET, "Scanned {scanned} page(s) of pull requests in '{repository}'");
        Ok(())
    }

    async fn count_issues(&self, repository: &RepositoryRef, tally: &mut Tally<'_>) -> Result<()> {
        let mut variables = repository_variables(repository);
        let _ = variables.insert("login".to_string(), Value::from(self.identity.login.as_str()));

        let pages = self.client.paginate("issues", AUTHORED_ISSUES, variables, |data: IssueData| {
            data.repository.map(|repository| repository.issues)
        });

        let mut pages = pin!(pages);
        let mut scanned = 0usize;
        'pages: while let Some(page) = pages.try_next().await? {
            scanned += 1;
            for issue in &page {
                if tally.is_before_window(issue.created_at) {
                    log::debug!(target: LOG_TARGET, "Reached issues older than {} in '{repository}'", self.earliest_year());
                    break 'pages;
                }
                tally.issue(issue);
            }
        }

        log::info!(target: LOG_TARGET, "Scanned {scanned} page(s) of issues in '{repository}'");
        Ok(())
    }

    fn earliest_year(&self) -> i32 {
        self.ranges.first().map_or(0, YearRange::year)
    }
}

fn repository_variables(repository: &RepositoryRef) -> Map<String, Value> {
    let mut variables = Map::new();
    let _ = variables.insert("owner".to_string(), Value::from(repository.owner()));
    let _ = variables.insert("name".to_string(), Value::from(repository.name()));
    variables
}

fn timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}
