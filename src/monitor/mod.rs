//! The long-running lag monitor.
//!
//! A [`Monitor`] owns one background task cycling through
//!
//! ```text
//! Discovering --ok--> Polling --drift--> Discovering
//!      ^    |            |
//!      |    +--error--+  +--error--+
//!      |              v            v
//!      +---------- cooldown <------+
//! ```
//!
//! until [`Monitor::stop`] moves it to [`MonitorState::Stopped`].

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

mod broker_set;
mod cluster;
pub mod discovery;
pub mod error;

pub use cluster::{Cluster, Snapshot};
pub use error::{Error, Result};

use crate::config::Config;
use crate::connection::transport::Resolver;
use crate::observer::{NopObserver, Observer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Discovering,

    /// `generation` counts successful discoveries, starting at 1.
    Polling { generation: u64 },

    Stopped,
}

/// Builder for [`Monitor`].
pub struct MonitorBuilder {
    config: Config,
    observer: Arc<dyn Observer>,
}

impl MonitorBuilder {
    /// Create a new [`MonitorBuilder`] with the list of seed brokers
    pub fn new(seed_brokers: Vec<String>) -> Self {
        Self::from_config(Config::new(seed_brokers))
    }

    pub fn from_config(config: Config) -> Self {
        Self {
            config,
            observer: Arc::new(NopObserver),
        }
    }

    /// Sets client ID.
    pub fn client_id(mut self, client_id: impl Into<Arc<str>>) -> Self {
        self.config.client_id = client_id.into();
        self
    }

    /// Time between two poll cycles.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.config.interval = interval;
        self
    }

    /// Wait before rediscovering after a failure.
    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.config.cooldown = cooldown;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set maximum size (in bytes) of message frames that can be received from a broker.
    ///
    /// Metadata of large clusters needs a generous limit.
    pub fn max_message_size(mut self, max_message_size: usize) -> Self {
        self.config.max_message_size = max_message_size;
        self
    }

    /// Setup TLS.
    #[cfg(feature = "transport-tls")]
    pub fn tls_config(mut self, tls_config: Arc<rustls::ClientConfig>) -> Self {
        self.config.tls_config = Some(tls_config);
        self
    }

    /// Resolve broker host names with `resolver`.
    pub fn resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.config.resolver = Some(resolver);
        self
    }

    /// Receives the computed lag. Defaults to [`NopObserver`].
    pub fn observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    /// Validates the configuration and starts the background task.
    pub async fn build(self) -> Result<Monitor> {
        self.config.validate()?;

        let (stop_tx, stop_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(MonitorState::Discovering);
        let (snapshot_tx, snapshot_rx) = watch::channel(None);

        let task = Task {
            config: self.config,
            observer: self.observer,
            stop: stop_rx,
            state: state_tx,
            snapshots: snapshot_tx,
        };
        let handle = tokio::spawn(task.run());

        Ok(Monitor {
            stop: stop_tx,
            state: state_rx,
            snapshots: snapshot_rx,
            handle: Mutex::new(Some(handle)),
        })
    }
}

impl std::fmt::Debug for MonitorBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorBuilder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Handle to a running lag monitor.
///
/// Must be constructed using [`MonitorBuilder`]. Dropping it stops the background task without
/// waiting for it.
#[derive(Debug)]
pub struct Monitor {
    stop: watch::Sender<bool>,
    state: watch::Receiver<MonitorState>,
    snapshots: watch::Receiver<Option<Arc<Snapshot>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Monitor {
    pub fn state(&self) -> MonitorState {
        *self.state.borrow()
    }

    /// Follows state transitions.
    pub fn state_changes(&self) -> watch::Receiver<MonitorState> {
        self.state.clone()
    }

    /// The latest snapshot, replaced after every successful cycle.
    pub fn snapshots(&self) -> watch::Receiver<Option<Arc<Snapshot>>> {
        self.snapshots.clone()
    }

    /// Stops the monitor and waits for its connections and observer to be closed.
    ///
    /// A cycle in flight is finished first.
    pub async fn stop(&self) {
        self.stop.send_replace(true);

        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                error!(%err, "Monitor task failed");
            }
        }
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.stop.send_replace(true);
    }
}

/// How a generation ended.
enum Outcome {
    Stopped,
    Drift,
    Failed,
}

struct Task {
    config: Config,
    observer: Arc<dyn Observer>,
    stop: watch::Receiver<bool>,
    state: watch::Sender<MonitorState>,
    snapshots: watch::Sender<Option<Arc<Snapshot>>>,
}

impl Task {
    async fn run(mut self) {
        let mut generation = 0;

        while !self.is_stopped() {
            self.state.send_replace(MonitorState::Discovering);

            let cluster = match Cluster::discover(&self.config).await {
                Ok(cluster) => cluster,
                Err(err) => {
                    error!(%err, "Discovery failed");
                    if self.cooldown().await {
                        break;
                    }
                    continue;
                }
            };

            generation += 1;
            self.state.send_replace(MonitorState::Polling { generation });

            let outcome = self.poll(&cluster).await;
            cluster.close().await;

            match outcome {
                Outcome::Stopped => break,
                Outcome::Drift => {}
                Outcome::Failed => {
                    if self.cooldown().await {
                        break;
                    }
                }
            }
        }

        if let Err(err) = self.observer.close() {
            warn!(%err, "Cannot close observer");
        }
        self.state.send_replace(MonitorState::Stopped);
        info!("Monitor stopped");
    }

    fn is_stopped(&self) -> bool {
        *self.stop.borrow()
    }

    /// Polls `cluster` on every tick until a cycle fails or the monitor is stopped.
    async fn poll(&mut self, cluster: &Cluster) -> Outcome {
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = stopped(&mut self.stop) => return Outcome::Stopped,
                _ = ticker.tick() => {}
            }

            match cluster.poll(self.observer.as_ref()).await {
                Ok(snapshot) => {
                    self.snapshots.send_replace(Some(Arc::new(snapshot)));
                }
                Err(err @ Error::TopologyDrift { .. }) => {
                    info!(%err, "Rediscovering cluster");
                    return Outcome::Drift;
                }
                Err(err) => {
                    error!(%err, "Poll failed");
                    return Outcome::Failed;
                }
            }
        }
    }

    /// Waits out the cooldown. Returns `true` if the monitor was stopped meanwhile.
    async fn cooldown(&mut self) -> bool {
        tokio::select! {
            biased;

            _ = stopped(&mut self.stop) => true,
            _ = tokio::time::sleep(self.config.cooldown) => false,
        }
    }
}

/// Resolves once stop was requested or the [`Monitor`] is gone.
async fn stopped(stop: &mut watch::Receiver<bool>) {
    let _ = stop.wait_for(|stopped| *stopped).await.map(|_| ());
}
