use core::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;

/// Identifies a remote repository by owner and name.
///
/// Ordering is by owner, then name, which keeps discovery output stable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RepositoryRef {
    owner: Arc<str>,
    name: Arc<str>,
}

impl RepositoryRef {
    #[must_use]
    pub fn new(owner: impl AsRef<str>, name: impl AsRef<str>) -> Self {
        Self {
            owner: Arc::from(owner.as_ref()),
            name: Arc::from(name.as_ref()),
        }
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for RepositoryRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
