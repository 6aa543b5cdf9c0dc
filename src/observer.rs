//! Where computed lag goes.

use std::fmt::Debug;
use std::io::Write;

pub type ObserverError = Box<dyn std::error::Error + Send + Sync>;

/// Receives one lag value per `(group, topic, partition)` per poll cycle.
///
/// `observe` is called from the monitor task and must not block.
pub trait Observer: Send + Sync + Debug {
    fn observe(&self, group: &str, topic: &str, partition: i32, lag: i64);

    /// Called after every cycle that produced values.
    fn flush(&self) -> Result<(), ObserverError> {
        Ok(())
    }

    /// Called once when the monitor stops.
    fn close(&self) -> Result<(), ObserverError> {
        self.flush()
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NopObserver;

impl Observer for NopObserver {
    fn observe(&self, _group: &str, _topic: &str, _partition: i32, _lag: i64) {}
}

/// Prints `group/topic/partition => lag` lines to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutObserver;

impl Observer for StdoutObserver {
    fn observe(&self, group: &str, topic: &str, partition: i32, lag: i64) {
        println!("{}", format_lag(group, topic, partition, lag));
    }

    fn flush(&self) -> Result<(), ObserverError> {
        std::io::stdout().flush()?;
        Ok(())
    }
}

pub(crate) fn format_lag(group: &str, topic: &str, partition: i32, lag: i64) -> String {
    format!("{group}/{topic}/{partition} => {lag}")
}

/// Adapts a closure.
pub struct ObserverFn<F>(pub F);

impl<F> Observer for ObserverFn<F>
where
    F: Fn(&str, &str, i32, i64) + Send + Sync,
{
    fn observe(&self, group: &str, topic: &str, partition: i32, lag: i64) {
        (self.0)(group, topic, partition, lag)
    }
}

impl<F> Debug for ObserverFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ObserverFn").finish_non_exhaustive()
    }
}
