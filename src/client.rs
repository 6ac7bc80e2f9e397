//! Wiring of the offline delivery components from configuration.

use color_eyre::{eyre::eyre, Result};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::cache::{NoopStorage, ReadCache, SqliteStorage as CacheSqlite};
use crate::classify::KeywordClassifier;
use crate::config::Config;
use crate::connectivity::ConnectivityMonitor;
use crate::db::Database;
use crate::gateway::RequestGateway;
use crate::probe::ConnectivityProbe;
use crate::queue::{DurableQueue, SqliteStorage as QueueSqlite};
use crate::sync::{DrainPolicy, SyncCoordinator};
use crate::transport::{HttpTransport, Transport};

/// Request gateway plus the background sync machinery, built from one config.
pub struct OfflineClient {
  gateway: RequestGateway,
  coordinator: SyncCoordinator,
  monitor: Arc<ConnectivityMonitor>,
  probe: Option<ConnectivityProbe>,
  config: Config,
}

impl OfflineClient {
  /// Create a client whose connectivity starts as `initially_connected`.
  pub fn new(config: Config, initially_connected: bool) -> Result<Self> {
    let base_url = config.base_url()?;

    let db_path = match &config.offline.database {
      Some(path) => path.clone(),
      None => Database::default_path()?,
    };
    let db = Database::open(&db_path)
      .map_err(|e| eyre!("Failed to open offline database at {}: {}", db_path.display(), e))?;

    let queue = DurableQueue::new(QueueSqlite::new(db.clone()));
    let cache = if config.offline.cache_enabled {
      ReadCache::new(CacheSqlite::new(db))
    } else {
      ReadCache::new(NoopStorage)
    };

    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(config.request_timeout())?);
    let monitor = Arc::new(ConnectivityMonitor::new(initially_connected));
    let classifier = Arc::new(KeywordClassifier::new(
      config.offline.emergency_keywords.iter().cloned(),
    ));

    let gateway = RequestGateway::new(
      base_url.clone(),
      Arc::clone(&transport),
      Arc::clone(&monitor),
      queue.clone(),
      cache,
      classifier,
    );
    let coordinator = SyncCoordinator::new(
      queue,
      transport,
      base_url.clone(),
      DrainPolicy::from_retain_failed(config.offline.retain_failed_entries),
    );
    let probe = ConnectivityProbe::for_url(&base_url, config.probe_timeout());

    Ok(Self {
      gateway,
      coordinator,
      monitor,
      probe,
      config,
    })
  }

  /// Create a client seeded with a live reachability check.
  pub async fn connect(config: Config) -> Result<Self> {
    let mut client = Self::new(config, false)?;
    if let Some(probe) = &client.probe {
      client.monitor.set_connected(probe.check().await);
    }
    Ok(client)
  }

  /// Start draining on every reconnect.
  pub fn spawn_sync(&self) -> JoinHandle<()> {
    self.coordinator.clone().spawn(&self.monitor)
  }

  /// Start feeding probe results into the monitor. None if the URL has no host.
  pub fn spawn_probe(&mut self) -> Option<JoinHandle<()>> {
    let probe = self.probe.take()?;
    let monitor = Arc::clone(&self.monitor);
    let interval = self.config.probe_interval();
    Some(tokio::spawn(probe.run(monitor, interval)))
  }

  pub fn gateway(&self) -> &RequestGateway {
    &self.gateway
  }

  pub fn coordinator(&self) -> &SyncCoordinator {
    &self.coordinator
  }

  pub fn monitor(&self) -> &Arc<ConnectivityMonitor> {
    &self.monitor
  }

  pub fn config(&self) -> &Config {
    &self.config
  }
}
