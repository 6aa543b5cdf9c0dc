//! Prints consumer lag of a cluster until interrupted.
//!
//! ```text
//! KAFKA_BROKERS=localhost:9092 POLL_INTERVAL_SECS=10 cargo run --example lag
//! ```
//!
//! Both variables may also come from a `.env` file.

use std::sync::Arc;
use std::time::Duration;

use kafka_lag::monitor::MonitorBuilder;
use kafka_lag::observer::StdoutObserver;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let brokers: Vec<String> = std::env::var("KAFKA_BROKERS")
        .unwrap_or_else(|_| "localhost:9092".to_string())
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    let interval = match std::env::var("POLL_INTERVAL_SECS") {
        Ok(secs) => Duration::from_secs(secs.parse()?),
        Err(_) => Duration::from_secs(10),
    };

    let monitor = MonitorBuilder::new(brokers)
        .interval(interval)
        .cooldown(interval)
        .observer(Arc::new(StdoutObserver))
        .build()
        .await?;

    let mut snapshots = monitor.snapshots();
    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if let Some(snapshot) = snapshot {
                    println!("{}", serde_json::to_string_pretty(snapshot.as_ref())?);
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    monitor.stop().await;
    Ok(())
}
