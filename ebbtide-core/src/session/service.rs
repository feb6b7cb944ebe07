//! Public lifecycle operations over the registry and translators.

use std::path::Path;
use std::sync::Arc;

use super::registry::TorrentRegistry;
use super::snapshot::{PeerSnapshot, TorrentSnapshot};
use super::{AlertPump, SessionError, TorrentId};
use crate::config::EbbtideConfig;
use crate::engine::{RemoveMode, TorrentEngine};

/// Consumer-facing torrent session service.
///
/// Thin composition: each operation is resolve-or-derive, one engine call,
/// then translate. Nothing is retried internally and all methods take
/// `&self`, so callers may invoke them concurrently; serialization is the
/// engine's concern. Owns the alert pump for its lifetime.
pub struct TorrentService<E: TorrentEngine + 'static> {
    registry: TorrentRegistry<E>,
    alert_pump: AlertPump,
}

impl<E: TorrentEngine + 'static> TorrentService<E> {
    /// Builds the service over a shared engine and starts the alert pump.
    pub fn new(config: &EbbtideConfig, engine: Arc<E>) -> Self {
        let alert_pump =
            AlertPump::spawn(Arc::clone(&engine), config.session.alert_poll_interval);
        Self {
            registry: TorrentRegistry::new(engine),
            alert_pump,
        }
    }

    /// Registers a torrent from a magnet descriptor.
    ///
    /// The slow part (metadata fetch) happens asynchronously inside the
    /// engine; observe it via subsequent [`torrent`](Self::torrent) polls.
    ///
    /// # Errors
    /// - `SessionError::InvalidPath` - Empty or uncreatable download path.
    /// - `SessionError::Parse` - Malformed magnet URI.
    /// - `SessionError::Engine` - Registration rejected by the engine.
    pub async fn add_magnet_link(
        &self,
        magnet_uri: &str,
        download_path: impl AsRef<Path>,
    ) -> Result<TorrentId, SessionError> {
        self.registry
            .add_from_magnet(magnet_uri, download_path.as_ref())
            .await
    }

    /// Registers a torrent from a .torrent file.
    ///
    /// # Errors
    /// - `SessionError::InvalidPath` - Empty or uncreatable download path.
    /// - `SessionError::Parse` - Unreadable or malformed torrent file.
    /// - `SessionError::Engine` - Registration rejected by the engine.
    pub async fn add_torrent_file(
        &self,
        torrent_path: impl AsRef<Path>,
        download_path: impl AsRef<Path>,
    ) -> Result<TorrentId, SessionError> {
        self.registry
            .add_from_file(torrent_path.as_ref(), download_path.as_ref())
            .await
    }

    /// Gracefully pauses a torrent.
    ///
    /// # Errors
    /// - `SessionError::NotFound` - Identity does not resolve.
    pub async fn pause_torrent(&self, id: &TorrentId) -> Result<(), SessionError> {
        self.registry.pause(id).await
    }

    /// Resumes a paused torrent.
    ///
    /// # Errors
    /// - `SessionError::NotFound` - Identity does not resolve.
    pub async fn resume_torrent(&self, id: &TorrentId) -> Result<(), SessionError> {
        self.registry.resume(id).await
    }

    /// Deregisters a torrent, keeping downloaded files on disk.
    ///
    /// # Errors
    /// - `SessionError::NotFound` - Identity does not resolve.
    pub async fn cancel_torrent(&self, id: &TorrentId) -> Result<(), SessionError> {
        self.registry.remove(id, RemoveMode::KeepFiles).await
    }

    /// Deregisters a torrent and deletes downloaded content from disk.
    ///
    /// # Errors
    /// - `SessionError::NotFound` - Identity does not resolve.
    pub async fn delete_torrent(&self, id: &TorrentId) -> Result<(), SessionError> {
        self.registry.remove(id, RemoveMode::DeleteFiles).await
    }

    /// Fresh snapshot of one torrent.
    ///
    /// # Errors
    /// - `SessionError::NotFound` - Identity does not resolve.
    pub async fn torrent(&self, id: &TorrentId) -> Result<TorrentSnapshot, SessionError> {
        let handle = self.registry.resolve(id).await?;
        let status = self.registry.engine().status(&handle).await?;
        Ok(TorrentSnapshot::from_status(&status))
    }

    /// Snapshots of all live torrents, sorted by display name
    /// (case-sensitive) for deterministic presentation.
    ///
    /// Handles that die between enumeration and the status call are skipped,
    /// never surfaced as errors.
    pub async fn torrents(&self) -> Vec<TorrentSnapshot> {
        let mut snapshots = Vec::new();
        for handle in self.registry.live_handles().await {
            if let Ok(status) = self.registry.engine().status(&handle).await {
                snapshots.push(TorrentSnapshot::from_status(&status));
            }
        }
        snapshots.sort_by(|a, b| a.name.cmp(&b.name));
        snapshots
    }

    /// Snapshots of every peer connected to the torrent at this instant.
    ///
    /// # Errors
    /// - `SessionError::NotFound` - Identity does not resolve.
    pub async fn torrent_peers(
        &self,
        id: &TorrentId,
    ) -> Result<Vec<PeerSnapshot>, SessionError> {
        let handle = self.registry.resolve(id).await?;
        let peers = self.registry.engine().peer_details(&handle).await?;
        Ok(peers.iter().map(PeerSnapshot::from_details).collect())
    }

    /// Direct engine access, for engine-specific hooks such as simulation
    /// controls.
    pub fn engine(&self) -> &E {
        self.registry.engine()
    }

    /// Stops the alert pump and waits for it to finish.
    ///
    /// Call before tearing down the engine so the pump never polls a
    /// destroyed session.
    pub async fn shutdown(self) {
        self.alert_pump.shutdown().await;
    }
}
