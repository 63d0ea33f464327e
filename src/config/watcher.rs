//! Configuration file watcher for hot reload.
//!
//! Editors often emit several events for one save, so a reload is only
//! forwarded when the parsed config differs from the last one sent.

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::MonitorConfig;

/// Watches the monitor's config file and emits validated configs.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<MonitorConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and a receiver for validated configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<MonitorConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Start watching. The returned handle must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self { path, update_tx } = self;
        let watched = path.clone();
        let mut last_sent: Option<MonitorConfig> = None;

        let handler = move |res: notify::Result<Event>| match res {
            Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                match load_config(&watched) {
                    Ok(config) if last_sent.as_ref() == Some(&config) => {
                        tracing::trace!(path = ?watched, "Config unchanged, skipping reload");
                    }
                    Ok(config) => {
                        tracing::info!(path = ?watched, "Config file changed, applying");
                        last_sent = Some(config.clone());
                        if update_tx.send(config).is_err() {
                            tracing::debug!("Config receiver dropped, ignoring reload");
                        }
                    }
                    Err(e) => {
                        tracing::error!(path = ?watched, error = %e, "Rejected config reload, keeping current settings");
                    }
                }
            }
            Ok(_) => {}
            Err(e) => tracing::error!(error = ?e, "Config watch error"),
        };

        let mut watcher =
            RecommendedWatcher::new(handler, Config::default().with_poll_interval(Duration::from_secs(2)))?;
        watcher.watch(&path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?path, "Config watcher started");
        Ok(watcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_change_is_forwarded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[probes]\ntimeout_ms = 2000").unwrap();
        file.flush().unwrap();

        let (watcher, mut updates) = ConfigWatcher::new(file.path());
        let _handle = watcher.run().unwrap();

        std::fs::write(file.path(), "[circuit_breaker]\nfailure_threshold = 2\n").unwrap();

        // The truncating write may surface an intermediate empty file first.
        let applied = tokio::time::timeout(Duration::from_secs(5), async {
            while let Some(config) = updates.recv().await {
                if config.circuit_breaker.failure_threshold == 2 {
                    return config;
                }
            }
            panic!("watcher closed the channel");
        })
        .await
        .expect("reload should arrive");
        assert_eq!(applied.probes.timeout_ms, 10_000);
    }
}
