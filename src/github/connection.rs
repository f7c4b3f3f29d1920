use serde::Deserialize;

/// Cursor information returned with every paginated GraphQL connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

impl PageInfo {
    /// The cursor to request the following page with, or `None` on the last page.
    #[must_use]
    pub fn next_cursor(self) -> Option<String> {
        if self.has_next_page { self.end_cursor } else { None }
    }
}

/// One page of a GraphQL connection.
///
/// The API may return `null` entries for nodes the viewer cannot see; these are skipped by [`Connection::into_parts`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<N> {
    pub page_info: PageInfo,

    #[serde(default = "Vec::new")]
    pub nodes: Vec<Option<N>>,
}

impl<N> Connection<N> {
    /// Split into the page's visible nodes and the cursor for the next page.
    #[must_use]
    pub fn into_parts(self) -> (Vec<N>, Option<String>) {
        (self.nodes.into_iter().flatten().collect(), self.page_info.next_cursor())
    }
}
