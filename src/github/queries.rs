//! GraphQL documents sent to the API.
//!
//! Every paginated query takes `$pageSize: Int!` and `$cursor: String`, which
//! [`Client::paginate`](super::Client::paginate) fills in.

pub const VIEWER_IDENTITY: &str = "query ViewerIdentity { viewer { login id } }";

pub const OWNED_REPOSITORIES: &str = r"
query OwnedRepositories($pageSize: Int!, $cursor: String, $affiliations: [RepositoryAffiliation]) {
  viewer {
    repositories(first: $pageSize, after: $cursor, ownerAffiliations: $affiliations, orderBy: {field: NAME, direction: ASC}) {
      pageInfo { hasNextPage endCursor }
      nodes { name owner { login } }
    }
  }
}";

pub const CONTRIBUTED_REPOSITORIES: &str = r"
query ContributedRepositories($pageSize: Int!, $cursor: String) {
  viewer {
    repositoriesContributedTo(first: $pageSize, after: $cursor, includeUserRepositories: true, contributionTypes: [COMMIT, PULL_REQUEST, ISSUE, REPOSITORY]) {
      pageInfo { hasNextPage endCursor }
      nodes { name owner { login } }
    }
  }
}";

pub const COMMIT_HISTORY: &str = r"
query CommitHistory($owner: String!, $name: String!, $authorId: ID!, $since: GitTimestamp!, $until: GitTimestamp!, $pageSize: Int!, $cursor: String) {
  repository(owner: $owner, name: $name) {
    defaultBranchRef {
      target {
        ... on Commit {
          history(first: $pageSize, after: $cursor, author: {id: $authorId}, since: $since, until: $until) {
            pageInfo { hasNextPage endCursor }
            nodes { committedDate author { user { id } } }
          }
        }
      }
    }
  }
}";

pub const PULL_REQUESTS: &str = r"
query PullRequests($owner: String!, $name: String!, $pageSize: Int!, $cursor: String) {
  repository(owner: $owner, name: $name) {
    pullRequests(first: $pageSize, after: $cursor, orderBy: {field: CREATED_AT, direction: DESC}) {
      pageInfo { hasNextPage endCursor }
      nodes { createdAt merged author { login } mergedBy { login } }
    }
  }
}";

pub const AUTHORED_ISSUES: &str = r"
query AuthoredIssues($owner: String!, $name: String!, $login: String!, $pageSize: Int!, $cursor: String) {
  repository(owner: $owner, name: $name) {
    issues(first: $pageSize, after: $cursor, filterBy: {createdBy: $login}, orderBy: {field: CREATED_AT, direction: DESC}) {
      pageInfo { hasNextPage endCursor }
      nodes { __typename createdAt author { login } }
    }
  }
}";
