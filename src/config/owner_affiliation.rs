use serde::{Deserialize, Serialize};
use strum::Display;

/// The viewer's relationship to a repository, as understood by the GraphQL API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum OwnerAffiliation {
    Owner,
    Collaborator,
    OrganizationMember,
}
