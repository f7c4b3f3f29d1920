//! contrib-metrics crate
//!
//! This crate is an implementation detail of the `contrib-metrics` tool. This crate's API is fluid and may change without warning
//! and in a semver-incompatible way.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

#[doc(hidden)]
pub mod aggregate;

#[doc(hidden)]
pub mod commands;

#[doc(hidden)]
pub mod config;

#[doc(hidden)]
pub mod github;

#[doc(hidden)]
pub mod metrics;

#[doc(hidden)]
pub mod misc;

#[doc(hidden)]
pub mod progress;

#[doc(hidden)]
pub mod reports;

mod error;

pub use commands::{Host, run};
pub use error::{Error, NetworkError, Result};
