//! Request tracking for monitoring outstanding GraphQL requests.

use super::ProgressReporter;
use core::sync::atomic::{AtomicU64, Ordering};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct RequestCounter {
    issued: AtomicU64,
    completed: AtomicU64,
}

/// Tracks issued and completed requests per category and mirrors them into a progress bar.
///
/// Categories are free-form names such as "repositories" or "commits". The
/// progress message lists them alphabetically as `completed/issued name`.
#[derive(Debug, Clone)]
pub struct RequestTracker {
    counters: Arc<Mutex<BTreeMap<String, Arc<RequestCounter>>>>,
    progress: ProgressReporter,
}

impl RequestTracker {
    #[must_use]
    pub fn new(progress: ProgressReporter) -> Self {
        Self {
            counters: Arc::new(Mutex::new(BTreeMap::new())),
            progress,
        }
    }

    fn counter(&self, category: &str) -> Arc<RequestCounter> {
        let mut counters = self.counters.lock().expect("lock poisoned");
        Arc::clone(counters.entry(category.to_string()).or_default())
    }

    pub fn add_request(&self, category: &str) {
        let _ = self.counter(category).issued.fetch_add(1, Ordering::Relaxed);
        self.update_progress();
    }

    pub fn complete_request(&self, category: &str) {
        let _ = self.counter(category).completed.fetch_add(1, Ordering::Relaxed);
        self.update_progress();
    }

    /// Total `(completed, issued)` across all categories.
    #[must_use]
    pub fn totals(&self) -> (u64, u64) {
        let counters = self.counters.lock().expect("lock poisoned");
        counters.values().fold((0, 0), |(completed, issued), counter| {
            (
                completed + counter.completed.load(Ordering::Relaxed),
                issued + counter.issued.load(Ordering::Relaxed),
            )
        })
    }

    fn update_progress(&self) {
        let counters = self.counters.lock().expect("lock poisoned");

        let mut total_issued = 0u64;
        let mut total_completed = 0u64;
        let mut parts = Vec::with_capacity(counters.len());

        for (name, counter) in counters.iter() {
            let issued = counter.issued.load(Ordering::Relaxed);
            let completed = counter.completed.load(Ordering::Relaxed);
            if issued > 0 {
                total_issued += issued;
                total_completed += completed;
                parts.push(format!("{completed}/{issued} {name}"));
            }
        }

        if total_issued > 0 {
            self.progress.set_length(total_issued);
            self.progress.set_position(total_completed);
            self.progress.set_message(parts.join(", "));
        }
    }
}
