use strum::EnumIter;

/// The kinds of contribution counted per year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Metric {
    Commits,
    PullRequests,
    MergedPullRequests,
    Issues,
}

impl Metric {
    /// Column name used in machine-readable outputs.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Commits => "commits",
            Self::PullRequests => "prs",
            Self::MergedPullRequests => "merged",
            Self::Issues => "issues",
        }
    }

    /// Column title used in the console table.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Commits => "Commits",
            Self::PullRequests => "PRs Created",
            Self::MergedPullRequests => "PRs Merged",
            Self::Issues => "Issues",
        }
    }
}
