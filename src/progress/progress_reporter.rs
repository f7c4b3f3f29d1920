//! Delayed progress bar for the query phase.

use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::Arc;
use std::time::Instant;

const BAR_TEMPLATE: &str = "{prefix:>12.bold.cyan} [{bar:25}] {msg}";
const SPINNER_TEMPLATE: &str = "{prefix:>12.bold.cyan} {spinner} {msg}";

#[derive(Debug)]
struct DelayedProgressState {
    start_time: Instant,
    delay: Duration,
    visible: AtomicBool,
    has_content: AtomicBool,
    spinning: AtomicBool,
}

/// A progress bar that stays hidden until work has been running for `delay`.
///
/// Quick runs finish without the bar ever flashing on screen. Drawing goes to
/// stderr so stdout carries only the report.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    bar: ProgressBar,
    state: Arc<DelayedProgressState>,
}

impl ProgressReporter {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        let bar = ProgressBar::hidden();
        bar.set_style(bar_style());
        bar.set_length(0);
        bar.set_draw_target(ProgressDrawTarget::hidden());

        Self {
            bar,
            state: Arc::new(DelayedProgressState {
                start_time: Instant::now(),
                delay,
                visible: AtomicBool::new(false),
                has_content: AtomicBool::new(false),
                spinning: AtomicBool::new(false),
            }),
        }
    }

    fn ensure_visible(&self) {
        if !self.state.visible.load(Ordering::Relaxed)
            && self.state.has_content.load(Ordering::Relaxed)
            && self.state.start_time.elapsed() >= self.state.delay
        {
            self.state.visible.store(true, Ordering::Relaxed);
            self.bar.set_draw_target(ProgressDrawTarget::stderr_with_hz(10));
        }
    }

    fn stop_spinning(&self) {
        if self.state.spinning.swap(false, Ordering::Relaxed) {
            self.bar.disable_steady_tick();
            self.bar.set_style(bar_style());
        }
    }

    /// Show a spinner while the amount of remaining work is unknown.
    pub fn spin(&self, msg: impl AsRef<str>) {
        if !self.state.spinning.swap(true, Ordering::Relaxed) {
            self.bar.set_style(
                ProgressStyle::default_spinner()
                    .template(SPINNER_TEMPLATE)
                    .expect("spinner template should be valid"),
            );
            self.bar.enable_steady_tick(Duration::from_millis(100));
        }
        self.set_message(msg);
    }

    /// Switch to a bar of `len` steps, leaving spinner mode if needed.
    pub fn set_length(&self, len: u64) {
        self.stop_spinning();
        if len > 0 {
            self.state.has_content.store(true, Ordering::Relaxed);
        }
        self.ensure_visible();
        self.bar.set_length(len);
    }

    pub fn set_position(&self, pos: u64) {
        self.stop_spinning();
        self.ensure_visible();
        self.bar.set_position(pos);
    }

    pub fn set_message(&self, msg: impl AsRef<str>) {
        let msg = msg.as_ref();
        if !msg.is_empty() {
            self.state.has_content.store(true, Ordering::Relaxed);
        }
        self.ensure_visible();
        self.bar.set_message(msg.to_string());
    }

    pub fn set_prefix(&self, prefix: &str) {
        self.bar.set_prefix(prefix.to_string());
    }

    pub fn finish_and_clear(&self) {
        if self.state.visible.load(Ordering::Relaxed) {
            self.bar.finish_and_clear();
        }
    }

    /// Periodically re-check visibility so the bar appears during long awaits.
    ///
    /// The returned guard stops the background task when dropped.
    #[must_use]
    pub fn start_visibility_checking(&self) -> VisibilityTaskGuard {
        let progress = self.clone();
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(250));
            loop {
                let _ = interval.tick().await;
                if !progress.state.visible.load(Ordering::Relaxed) {
                    progress.ensure_visible();
                }
            }
        });
        VisibilityTaskGuard(task)
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(BAR_TEMPLATE)
        .expect("progress bar template should be valid")
        .progress_chars("=> ")
}

/// Guard that aborts the visibility checking task when dropped.
#[derive(Debug)]
pub struct VisibilityTaskGuard(tokio::task::JoinHandle<()>);

impl Drop for VisibilityTaskGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}
