//! Repository discovery for the authenticated viewer.

use super::client::LOG_TARGET;
use super::queries::{CONTRIBUTED_REPOSITORIES, OWNED_REPOSITORIES};
use super::{Client, Connection};
use crate::Result;
use crate::config::Config;
use crate::metrics::RepositoryRef;
use core::pin::pin;
use futures::{Stream, TryStreamExt};
use serde::Deserialize;
use serde_json::Map;
use std::collections::BTreeSet;

#[derive(Debug, Deserialize)]
struct OwnerNode {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RepositoryNode {
    name: String,
    owner: OwnerNode,
}

#[derive(Debug, Deserialize)]
struct OwnedData {
    viewer: OwnedViewer,
}

#[derive(Debug, Deserialize)]
struct OwnedViewer {
    repositories: Connection<RepositoryNode>,
}

#[derive(Debug, Deserialize)]
struct ContributedData {
    viewer: ContributedViewer,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContributedViewer {
    repositories_contributed_to: Connection<RepositoryNode>,
}

/// Enumerate the repositories visible to the viewer.
///
/// Owned, collaborator, and organization repositories are combined with the
/// ones the viewer contributed to. The result is deduplicated and sorted by
/// `owner/name`.
pub async fn discover_repositories(client: &Client, config: &Config) -> Result<Vec<RepositoryRef>> {
    let start_time = std::time::Instant::now();
    let mut found = BTreeSet::new();

    let mut variables = Map::new();
    let _ = variables.insert("affiliations".to_string(), serde_json::to_value(&config.owner_affiliations)?);
    let owned = client.paginate("repositories", OWNED_REPOSITORIES, variables, |data: OwnedData| {
        Some(data.viewer.repositories)
    });
    let owned_count = collect(owned, &mut found).await?;

    let mut contributed_count = 0;
    if config.include_contributed {
        let contributed = client.paginate("repositories", CONTRIBUTED_REPOSITORIES, Map::new(), |data: ContributedData| {
            Some(data.viewer.repositories_contributed_to)
        });
        contributed_count = collect(contributed, &mut found).await?;
    }

    log::info!(
        target: LOG_TARGET,
        "Discovered {} repositories ({owned_count} affiliated, {contributed_count} contributed to) in {:.3}s",
        found.len(),
        start_time.elapsed().as_secs_f64()
    );

    Ok(found.into_iter().collect())
}

async fn collect(
    pages: impl Stream<Item = Result<Vec<RepositoryNode>>>,
    found: &mut BTreeSet<RepositoryRef>,
) -> Result<usize> {
    let mut pages = pin!(pages);
    let mut seen = 0;
    while let Some(page) = pages.try_next().await? {
        seen += page.len();
        found.extend(page.into_iter().map(|node| RepositoryRef::new(node.owner.login, node.name)));
    }
    Ok(seen)
}
