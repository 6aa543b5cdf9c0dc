//! Helpers to honour throttling hints within the Kafka protocol.
//!
//! A broker that throttles a client says so in its response (`throttle_time_ms`); the client is
//! expected to hold back its next request to that broker for the given time.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Earliest time the next request to one broker may be sent.
#[derive(Debug, Default)]
pub struct Throttle {
    until: Mutex<Option<Instant>>,
}

impl Throttle {
    /// Records the throttle time of a response.
    pub fn note(&self, throttle_time_ms: i32) {
        let throttle_time_ms: u64 = match throttle_time_ms.try_into() {
            Ok(t) => t,
            Err(_) => {
                warn!(throttle_time_ms, "Invalid throttle time");
                return;
            }
        };

        if throttle_time_ms == 0 {
            return;
        }

        let until = Instant::now() + Duration::from_millis(throttle_time_ms);
        let mut current = self.until.lock();
        if current.map_or(true, |c| c < until) {
            *current = Some(until);
        }
    }

    /// Sleeps until the last recorded throttle time has passed.
    pub async fn wait(&self) {
        let until = self.until.lock().take();
        if let Some(until) = until {
            if until > Instant::now() {
                debug!(delay = ?(until - Instant::now()), "Throttled by broker");
                tokio::time::sleep_until(until).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_wait() {
        let throttle = Throttle::default();

        let start = Instant::now();
        throttle.wait().await;
        assert_eq!(start.elapsed(), Duration::ZERO);

        throttle.note(-5);
        throttle.note(0);
        throttle.wait().await;
        assert_eq!(start.elapsed(), Duration::ZERO);

        throttle.note(100);
        throttle.note(20);
        throttle.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(100));

        // consumed by the first wait
        let start = Instant::now();
        throttle.wait().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
