//! Remaining-time estimates for epochs and prediction batches.

use std::time::Duration;

/// Estimates the time left after `completed` of `total` equal units of work
/// took `elapsed` in total.
///
/// Returns zero before any unit has completed or once all are done.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use steer_training::eta;
///
/// // 2 of 5 epochs took 10s, so 3 more take about 15s.
/// assert_eq!(eta(Duration::from_secs(10), 2, 5), Duration::from_secs(15));
/// ```
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn eta(elapsed: Duration, completed: usize, total: usize) -> Duration {
    if completed == 0 || completed >= total {
        return Duration::ZERO;
    }
    let remaining = (total - completed) as u32;
    let completed = completed as u32;
    elapsed / completed * remaining
}

/// Estimates the time left in a batched pass over `total` items, reported
/// after the batch starting at item `index`.
///
/// Computed as `elapsed / (index + 1) * (total - index - 1)`.
#[must_use]
pub fn item_eta(elapsed: Duration, index: usize, total: usize) -> Duration {
    eta(elapsed, index + 1, total)
}

/// Formats a duration as whole seconds for log lines.
#[must_use]
pub fn format_secs(duration: Duration) -> String {
    format!("{:.1}s", duration.as_secs_f32())
}
