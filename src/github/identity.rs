use super::Client;
use super::queries::VIEWER_IDENTITY;
use crate::Result;
use serde::Deserialize;
use serde_json::Map;

/// The authenticated account whose contributions are counted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Identity {
    /// Login name, as shown in URLs.
    pub login: String,

    /// Opaque GraphQL node id.
    pub id: String,
}

impl Identity {
    /// Logins are case-insensitive on the platform.
    #[must_use]
    pub fn is_login(&self, login: &str) -> bool {
        self.login.eq_ignore_ascii_case(login)
    }
}

#[derive(Debug, Deserialize)]
struct ViewerData {
    viewer: Identity,
}

/// Ask the API who the token belongs to.
pub async fn fetch_identity(client: &Client) -> Result<Identity> {
    let data: ViewerData = client.query("identity", VIEWER_IDENTITY, &Map::new()).await?;
    Ok(data.viewer)
}
