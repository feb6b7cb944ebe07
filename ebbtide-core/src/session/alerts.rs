//! Background task draining the engine's alert stream.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::engine::{EngineAlert, TorrentEngine};

/// Cooperative alert-draining task.
///
/// Polls the engine on a fixed interval and logs each alert. The task runs
/// for the lifetime of the session and must be stopped via
/// [`shutdown`](Self::shutdown) before the engine is torn down; the stop
/// signal is checked every iteration and the task is joined, never detached.
pub struct AlertPump {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl AlertPump {
    /// Spawns the pump over a shared engine reference.
    pub fn spawn<E>(engine: Arc<E>, poll_interval: Duration) -> Self
    where
        E: TorrentEngine + 'static,
    {
        let (stop, mut stop_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            tracing::debug!("alert pump started");
            loop {
                tokio::select! {
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                    _ = tokio::time::sleep(poll_interval) => {
                        for alert in engine.pop_alerts().await {
                            log_alert(&alert);
                        }
                    }
                }
            }
            tracing::debug!("alert pump stopped");
        });

        Self { stop, task }
    }

    /// Signals the task to stop and waits for it to finish.
    pub async fn shutdown(self) {
        let _ = self.stop.send(true);
        let _ = self.task.await;
    }
}

fn log_alert(alert: &EngineAlert) {
    match alert {
        EngineAlert::TorrentAdded { id } => tracing::debug!(%id, "engine alert: torrent added"),
        EngineAlert::TorrentRemoved { id, deleted_files } => {
            tracing::debug!(%id, deleted_files, "engine alert: torrent removed");
        }
        EngineAlert::MetadataReceived { id } => {
            tracing::debug!(%id, "engine alert: metadata received");
        }
        EngineAlert::TorrentFinished { id } => {
            tracing::info!(%id, "engine alert: torrent finished");
        }
        EngineAlert::EngineFault { message } => {
            tracing::warn!(%message, "engine alert: fault");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::engine::SimulationTorrentEngine;

    #[tokio::test]
    async fn test_pump_shuts_down_cleanly() {
        let engine = Arc::new(SimulationTorrentEngine::new(SimulationConfig::default()));
        let pump = AlertPump::spawn(engine, Duration::from_millis(5));

        tokio::time::timeout(Duration::from_secs(1), pump.shutdown())
            .await
            .expect("alert pump did not stop in time");
    }

    #[tokio::test]
    async fn test_pump_drains_alert_queue() {
        let engine = Arc::new(SimulationTorrentEngine::new(SimulationConfig::default()));
        let pump = AlertPump::spawn(Arc::clone(&engine), Duration::from_millis(5));

        // Generate an alert and give the pump a few poll cycles to drain it.
        use crate::engine::{AddTorrentRequest, InfoHashes, TorrentEngine, TorrentSource};
        use crate::parsing::MagnetLink;
        engine
            .add_torrent(AddTorrentRequest {
                source: TorrentSource::Magnet(MagnetLink {
                    info_hashes: InfoHashes::from_v1([9; 20]),
                    display_name: None,
                    trackers: Vec::new(),
                }),
                save_path: std::path::PathBuf::from("/tmp/downloads"),
                start_paused: false,
                auto_managed: false,
            })
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(engine.pop_alerts().await.is_empty());

        pump.shutdown().await;
    }
}
