//! Progress reporting for encode and decode operations.
//!
//! Operations report `(message, percentage)` pairs synchronously on the
//! calling task. On the success path the percentage never decreases and the
//! final report is 100; a failure is reported once with percentage 0.

/// Receiver of progress updates.
///
/// Implemented for any `Fn(&str, f64)`, so a closure can be passed directly:
///
/// ```
/// use pzip::ProgressSink;
///
/// let sink = |message: &str, percent: f64| eprintln!("[{:5.1}%] {}", percent, message);
/// sink.report("Compressing chunk 1/4", 25.0);
/// ```
pub trait ProgressSink {
    fn report(&self, message: &str, percent: f64);
}

impl<F> ProgressSink for F
where
    F: Fn(&str, f64),
{
    fn report(&self, message: &str, percent: f64) {
        self(message, percent)
    }
}

/// Sink that discards every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _message: &str, _percent: f64) {}
}

/// Percentage of `done` out of `total`, treating an empty job as complete.
pub(crate) fn percent(done: u32, total: u32) -> f64 {
    if total == 0 {
        100.0
    } else {
        done as f64 / total as f64 * 100.0
    }
}
