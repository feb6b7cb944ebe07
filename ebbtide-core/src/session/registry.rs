//! Identity-to-handle resolution and lifecycle operations.

use std::path::Path;
use std::sync::Arc;

use super::{SessionError, TorrentId};
use crate::engine::{
    AddTorrentRequest, PauseMode, RemoveMode, TorrentEngine, TorrentSource,
};
use crate::parsing::{MagnetLink, TorrentMetadata};

/// Bridge between stable identities and live engine handles.
///
/// The registry owns no torrent state of its own: the engine's handle set is
/// the single source of truth, so lookups re-scan it on every call instead of
/// maintaining an identity index that could go stale when the engine
/// invalidates handles asynchronously.
pub struct TorrentRegistry<E: TorrentEngine> {
    engine: Arc<E>,
}

impl<E: TorrentEngine> TorrentRegistry<E> {
    pub fn new(engine: Arc<E>) -> Self {
        Self { engine }
    }

    /// Shared engine reference, for read paths that query status directly.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Registers a torrent from a magnet descriptor and returns its identity.
    ///
    /// The auto-managed and start-paused flags are cleared so the torrent
    /// begins actively downloading immediately.
    ///
    /// # Errors
    /// - `SessionError::InvalidPath` - Empty or uncreatable download path.
    /// - `SessionError::Parse` - Malformed magnet URI.
    /// - `SessionError::Engine` - Registration rejected, e.g. duplicate.
    pub async fn add_from_magnet(
        &self,
        magnet_uri: &str,
        download_path: &Path,
    ) -> Result<TorrentId, SessionError> {
        ensure_download_path(download_path).await?;
        let magnet = MagnetLink::parse(magnet_uri)?;
        let id = self
            .register(TorrentSource::Magnet(magnet), download_path)
            .await?;
        tracing::info!(%id, path = %download_path.display(), "added torrent from magnet");
        Ok(id)
    }

    /// Registers a torrent from a .torrent file and returns its identity.
    ///
    /// # Errors
    /// - `SessionError::InvalidPath` - Empty or uncreatable download path.
    /// - `SessionError::Parse` - Unreadable or malformed torrent file.
    /// - `SessionError::Engine` - Registration rejected, e.g. duplicate.
    pub async fn add_from_file(
        &self,
        torrent_path: &Path,
        download_path: &Path,
    ) -> Result<TorrentId, SessionError> {
        ensure_download_path(download_path).await?;
        let bytes = tokio::fs::read(torrent_path)
            .await
            .map_err(|e| SessionError::Parse {
                reason: format!(
                    "failed to read torrent file '{}': {e}",
                    torrent_path.display()
                ),
            })?;
        let metadata = TorrentMetadata::from_bencode(&bytes)?;
        let id = self
            .register(TorrentSource::Metadata(metadata), download_path)
            .await?;
        tracing::info!(%id, path = %download_path.display(), "added torrent from file");
        Ok(id)
    }

    async fn register(
        &self,
        source: TorrentSource,
        download_path: &Path,
    ) -> Result<TorrentId, SessionError> {
        let request = AddTorrentRequest {
            source,
            save_path: download_path.to_path_buf(),
            start_paused: false,
            auto_managed: false,
        };
        let handle = self.engine.add_torrent(request).await?;
        let hashes = self.engine.info_hashes(&handle).await.unwrap_or_default();
        Ok(TorrentId::derive(&hashes))
    }

    /// Resolves an identity to a live handle by scanning the engine's
    /// current handle set. Invalid handles are skipped.
    ///
    /// # Errors
    /// - `SessionError::NotFound` - No live handle carries this identity.
    pub async fn resolve(&self, id: &TorrentId) -> Result<E::Handle, SessionError> {
        for handle in self.engine.torrent_handles().await {
            if !self.engine.is_valid(&handle).await {
                continue;
            }
            if let Some(hashes) = self.engine.info_hashes(&handle).await
                && TorrentId::derive(&hashes) == *id
            {
                return Ok(handle);
            }
        }
        Err(SessionError::NotFound { id: id.clone() })
    }

    /// Requests a graceful pause: in-flight network operations complete
    /// rather than being aborted.
    ///
    /// # Errors
    /// - `SessionError::NotFound` - Identity does not resolve.
    pub async fn pause(&self, id: &TorrentId) -> Result<(), SessionError> {
        let handle = self.resolve(id).await?;
        self.engine.pause_torrent(&handle, PauseMode::Graceful).await?;
        tracing::debug!(%id, "paused torrent");
        Ok(())
    }

    /// Clears the pause state.
    ///
    /// # Errors
    /// - `SessionError::NotFound` - Identity does not resolve.
    pub async fn resume(&self, id: &TorrentId) -> Result<(), SessionError> {
        let handle = self.resolve(id).await?;
        self.engine.resume_torrent(&handle).await?;
        tracing::debug!(%id, "resumed torrent");
        Ok(())
    }

    /// Deregisters a torrent, optionally deleting downloaded content.
    ///
    /// # Errors
    /// - `SessionError::NotFound` - Identity does not resolve.
    pub async fn remove(&self, id: &TorrentId, mode: RemoveMode) -> Result<(), SessionError> {
        let handle = self.resolve(id).await?;
        self.engine.remove_torrent(&handle, mode).await?;
        tracing::info!(%id, ?mode, "removed torrent");
        Ok(())
    }

    /// Returns every currently valid handle; invalid handles are silently
    /// skipped, never surfaced as errors.
    pub async fn live_handles(&self) -> Vec<E::Handle> {
        let mut live = Vec::new();
        for handle in self.engine.torrent_handles().await {
            if self.engine.is_valid(&handle).await {
                live.push(handle);
            }
        }
        live
    }
}

/// Validates the download path and creates the directory if necessary.
///
/// Creation failure is tolerated when the directory exists anyway (e.g. a
/// concurrent caller created it first).
async fn ensure_download_path(path: &Path) -> Result<(), SessionError> {
    if path.as_os_str().is_empty() {
        return Err(SessionError::InvalidPath {
            reason: "download path cannot be empty".to_string(),
        });
    }

    if let Err(error) = tokio::fs::create_dir_all(path).await
        && !path.is_dir()
    {
        return Err(SessionError::InvalidPath {
            reason: format!(
                "failed to create download directory '{}': {error}",
                path.display()
            ),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::engine::SimulationTorrentEngine;

    const MAGNET: &str = "magnet:?xt=urn:btih:0123456789abcdef0123456789abcdef01234567";

    fn registry() -> TorrentRegistry<SimulationTorrentEngine> {
        let engine = Arc::new(SimulationTorrentEngine::new(SimulationConfig::default()));
        TorrentRegistry::new(engine)
    }

    #[tokio::test]
    async fn test_empty_download_path_rejected_before_registration() {
        let registry = registry();
        let result = registry.add_from_magnet(MAGNET, Path::new("")).await;
        assert!(matches!(result, Err(SessionError::InvalidPath { .. })));
        assert!(registry.engine().torrent_handles().await.is_empty());
    }

    #[tokio::test]
    async fn test_add_creates_download_directory() {
        let registry = registry();
        let dir = tempfile::tempdir().unwrap();
        let download_path = dir.path().join("nested").join("downloads");

        registry.add_from_magnet(MAGNET, &download_path).await.unwrap();
        assert!(download_path.is_dir());
    }

    #[tokio::test]
    async fn test_add_then_resolve_round_trip() {
        let registry = registry();
        let dir = tempfile::tempdir().unwrap();

        let id = registry.add_from_magnet(MAGNET, dir.path()).await.unwrap();
        assert_eq!(id.as_str(), "0123456789abcdef0123456789abcdef01234567");

        let handle = registry.resolve(&id).await.unwrap();
        assert!(registry.engine().is_valid(&handle).await);
    }

    #[tokio::test]
    async fn test_resolve_unknown_identity_fails() {
        let registry = registry();
        let result = registry.resolve(&TorrentId::new("feed".repeat(10))).await;
        assert!(matches!(result, Err(SessionError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_remove_makes_identity_unresolvable() {
        let registry = registry();
        let dir = tempfile::tempdir().unwrap();

        let id = registry.add_from_magnet(MAGNET, dir.path()).await.unwrap();
        registry.remove(&id, RemoveMode::KeepFiles).await.unwrap();

        let result = registry.resolve(&id).await;
        assert!(matches!(result, Err(SessionError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_malformed_magnet_is_parse_error() {
        let registry = registry();
        let dir = tempfile::tempdir().unwrap();
        let result = registry.add_from_magnet("magnet:?dn=nohash", dir.path()).await;
        assert!(matches!(result, Err(SessionError::Parse { .. })));
    }

    #[tokio::test]
    async fn test_unreadable_torrent_file_is_parse_error() {
        let registry = registry();
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.torrent");
        let result = registry.add_from_file(&missing, dir.path()).await;
        assert!(matches!(result, Err(SessionError::Parse { .. })));
    }
}
