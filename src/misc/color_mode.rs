//! Color mode selection for console output.

use clap::ValueEnum;
use std::io::IsTerminal;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Always,
    Never,
    #[default]
    Auto,
}

impl ColorMode {
    /// Whether to emit ANSI styling. `Auto` colors only when stdout is a terminal
    /// and `NO_COLOR` is unset.
    #[must_use]
    pub fn enabled(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal(),
        }
    }
}
