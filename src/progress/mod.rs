//! Progress reporting for the query phase.

mod progress_reporter;
mod request_tracker;

pub use progress_reporter::{ProgressReporter, VisibilityTaskGuard};
pub use request_tracker::RequestTracker;
