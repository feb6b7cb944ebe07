//! Deterministic in-memory engine for tests, demos, and development.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{
    AddTorrentRequest, EngineAlert, EngineState, InfoHashes, PauseMode, PeerDetails,
    RemoveMode, TorrentEngine, TorrentSource, TorrentStatus,
};
use crate::config::SimulationConfig;
use crate::session::{SessionError, TorrentId};

/// In-memory [`TorrentEngine`] implementation.
///
/// Holds all torrents and the alert queue behind one lock, so removal is
/// atomic with respect to handle enumeration: a resolve racing a remove sees
/// either the live entry or nothing. Progress only advances when
/// [`simulate_download_progress`](Self::simulate_download_progress) is
/// called, keeping tests deterministic.
pub struct SimulationTorrentEngine {
    config: SimulationConfig,
    state: RwLock<SimState>,
    next_handle: AtomicU64,
}

/// Transient token referencing one registered simulated torrent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationHandle(u64);

#[derive(Default)]
struct SimState {
    torrents: HashMap<u64, SimTorrent>,
    alerts: VecDeque<EngineAlert>,
}

struct SimTorrent {
    info_hashes: InfoHashes,
    name: String,
    state: EngineState,
    paused: bool,
    save_path: PathBuf,
    total: u64,
    total_wanted: u64,
    total_done: u64,
    download_rate: u64,
    upload_rate: u64,
    num_peers: u32,
    num_seeds: u32,
    peer_details: Vec<PeerDetails>,
}

impl SimTorrent {
    fn from_request(request: AddTorrentRequest) -> (InfoHashes, Self) {
        let (info_hashes, name, state, total) = match request.source {
            TorrentSource::Magnet(magnet) => (
                magnet.info_hashes,
                // Real engines report an empty name until metadata arrives;
                // the dn hint is used when present.
                magnet.display_name.unwrap_or_default(),
                EngineState::DownloadingMetadata,
                0,
            ),
            TorrentSource::Metadata(metadata) => (
                metadata.info_hashes(),
                metadata.name.clone(),
                EngineState::Downloading,
                metadata.total_length,
            ),
        };

        let torrent = Self {
            info_hashes,
            name,
            state,
            paused: request.start_paused,
            save_path: request.save_path,
            total,
            total_wanted: total,
            total_done: 0,
            download_rate: 0,
            upload_rate: 0,
            num_peers: 0,
            num_seeds: 0,
            peer_details: Vec::new(),
        };
        (info_hashes, torrent)
    }

    fn status(&self) -> TorrentStatus {
        let progress = if self.total_wanted > 0 {
            self.total_done as f32 / self.total_wanted as f32
        } else {
            0.0
        };
        TorrentStatus {
            info_hashes: self.info_hashes,
            name: self.name.clone(),
            state: self.state,
            paused: self.paused,
            progress,
            save_path: self.save_path.clone(),
            download_rate: self.download_rate,
            upload_rate: self.upload_rate,
            total_done: self.total_done,
            total_wanted: self.total_wanted,
            total: self.total,
            num_peers: self.num_peers,
            num_seeds: self.num_seeds,
        }
    }
}

impl SimulationTorrentEngine {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            state: RwLock::new(SimState::default()),
            next_handle: AtomicU64::new(1),
        }
    }

    /// Advances every unpaused downloading torrent by one tick of the
    /// configured simulated speed. Completed torrents flip to seeding and
    /// post a finished alert.
    pub async fn simulate_download_progress(&self) {
        let mut state = self.state.write().await;
        let mut finished = Vec::new();

        for torrent in state.torrents.values_mut() {
            if torrent.paused || torrent.state != EngineState::Downloading {
                continue;
            }

            torrent.download_rate = self.config.simulated_download_speed;
            torrent.num_peers = self.config.simulated_peer_count;
            torrent.total_done = (torrent.total_done
                + self.config.simulated_download_speed)
                .min(torrent.total_wanted);

            if torrent.total_wanted > 0 && torrent.total_done >= torrent.total_wanted {
                torrent.state = EngineState::Seeding;
                torrent.download_rate = 0;
                finished.push(TorrentId::derive(&torrent.info_hashes));
            }
        }

        for id in finished {
            state.alerts.push_back(EngineAlert::TorrentFinished { id });
        }
    }

    /// Simulates metadata arrival for a magnet-added torrent: sets the
    /// resolved name and sizes and moves it to the downloading state.
    ///
    /// # Errors
    /// - `SessionError::Engine` - No torrent with this identity.
    pub async fn resolve_metadata(
        &self,
        id: &TorrentId,
        name: &str,
        total: u64,
    ) -> Result<(), SessionError> {
        let mut state = self.state.write().await;
        let torrent = find_by_id(&mut state.torrents, id)?;
        torrent.name = name.to_string();
        torrent.total = total;
        torrent.total_wanted = total;
        torrent.state = EngineState::Downloading;
        state
            .alerts
            .push_back(EngineAlert::MetadataReceived { id: id.clone() });
        Ok(())
    }

    /// Forces the engine-internal state of a torrent.
    ///
    /// # Errors
    /// - `SessionError::Engine` - No torrent with this identity.
    pub async fn set_state(
        &self,
        id: &TorrentId,
        engine_state: EngineState,
    ) -> Result<(), SessionError> {
        let mut state = self.state.write().await;
        find_by_id(&mut state.torrents, id)?.state = engine_state;
        Ok(())
    }

    /// Installs the peer records returned by [`TorrentEngine::peer_details`].
    ///
    /// # Errors
    /// - `SessionError::Engine` - No torrent with this identity.
    pub async fn set_peer_details(
        &self,
        id: &TorrentId,
        peers: Vec<PeerDetails>,
    ) -> Result<(), SessionError> {
        let mut state = self.state.write().await;
        let torrent = find_by_id(&mut state.torrents, id)?;
        torrent.num_peers = peers.len() as u32;
        torrent.num_seeds = peers.iter().filter(|peer| peer.flags.seed).count() as u32;
        torrent.peer_details = peers;
        Ok(())
    }
}

fn find_by_id<'a>(
    torrents: &'a mut HashMap<u64, SimTorrent>,
    id: &TorrentId,
) -> Result<&'a mut SimTorrent, SessionError> {
    torrents
        .values_mut()
        .find(|torrent| TorrentId::derive(&torrent.info_hashes) == *id)
        .ok_or_else(|| SessionError::Engine {
            reason: format!("no torrent with identity {id}"),
        })
}

fn invalid_handle() -> SessionError {
    SessionError::Engine {
        reason: "invalid torrent handle".to_string(),
    }
}

#[async_trait]
impl TorrentEngine for SimulationTorrentEngine {
    type Handle = SimulationHandle;

    async fn add_torrent(
        &self,
        request: AddTorrentRequest,
    ) -> Result<Self::Handle, SessionError> {
        let mut state = self.state.write().await;
        let (info_hashes, torrent) = SimTorrent::from_request(request);
        let id = TorrentId::derive(&info_hashes);

        let duplicate = state
            .torrents
            .values()
            .any(|existing| TorrentId::derive(&existing.info_hashes) == id);
        if duplicate {
            return Err(SessionError::Engine {
                reason: format!("duplicate torrent: {id}"),
            });
        }

        let key = self.next_handle.fetch_add(1, Ordering::Relaxed);
        state.torrents.insert(key, torrent);
        state.alerts.push_back(EngineAlert::TorrentAdded { id });
        Ok(SimulationHandle(key))
    }

    async fn remove_torrent(
        &self,
        handle: &Self::Handle,
        mode: RemoveMode,
    ) -> Result<(), SessionError> {
        let mut state = self.state.write().await;
        let torrent = state.torrents.remove(&handle.0).ok_or_else(invalid_handle)?;
        state.alerts.push_back(EngineAlert::TorrentRemoved {
            id: TorrentId::derive(&torrent.info_hashes),
            deleted_files: mode == RemoveMode::DeleteFiles,
        });
        Ok(())
    }

    async fn pause_torrent(
        &self,
        handle: &Self::Handle,
        _mode: PauseMode,
    ) -> Result<(), SessionError> {
        let mut state = self.state.write().await;
        let torrent = state
            .torrents
            .get_mut(&handle.0)
            .ok_or_else(invalid_handle)?;
        torrent.paused = true;
        torrent.download_rate = 0;
        torrent.upload_rate = 0;
        Ok(())
    }

    async fn resume_torrent(&self, handle: &Self::Handle) -> Result<(), SessionError> {
        let mut state = self.state.write().await;
        state
            .torrents
            .get_mut(&handle.0)
            .ok_or_else(invalid_handle)?
            .paused = false;
        Ok(())
    }

    async fn torrent_handles(&self) -> Vec<Self::Handle> {
        let state = self.state.read().await;
        state.torrents.keys().map(|key| SimulationHandle(*key)).collect()
    }

    async fn is_valid(&self, handle: &Self::Handle) -> bool {
        self.state.read().await.torrents.contains_key(&handle.0)
    }

    async fn info_hashes(&self, handle: &Self::Handle) -> Option<InfoHashes> {
        let state = self.state.read().await;
        state
            .torrents
            .get(&handle.0)
            .map(|torrent| torrent.info_hashes)
    }

    async fn status(&self, handle: &Self::Handle) -> Result<TorrentStatus, SessionError> {
        let state = self.state.read().await;
        state
            .torrents
            .get(&handle.0)
            .map(SimTorrent::status)
            .ok_or_else(invalid_handle)
    }

    async fn peer_details(
        &self,
        handle: &Self::Handle,
    ) -> Result<Vec<PeerDetails>, SessionError> {
        let state = self.state.read().await;
        state
            .torrents
            .get(&handle.0)
            .map(|torrent| torrent.peer_details.clone())
            .ok_or_else(invalid_handle)
    }

    async fn pop_alerts(&self) -> Vec<EngineAlert> {
        self.state.write().await.alerts.drain(..).collect()
    }
}
