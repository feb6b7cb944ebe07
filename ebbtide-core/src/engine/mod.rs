//! Engine seam: the contract an external BitTorrent engine must satisfy.
//!
//! The session layer treats the engine as a thread-safe request/response API
//! plus an optional alert stream. Handles are transient tokens minted by the
//! engine; they must be re-resolved by identity before any lifecycle-mutating
//! call because the engine may invalidate them asynchronously.

pub mod simulation;

use std::net::SocketAddr;
use std::path::PathBuf;

use async_trait::async_trait;

pub use simulation::SimulationTorrentEngine;

use crate::parsing::{MagnetLink, TorrentMetadata};
use crate::session::{SessionError, TorrentId};

/// Content hashes reported by the engine for a torrent.
///
/// v1 is the 20-byte SHA-1 info hash, v2 the 32-byte SHA-256 hash of the
/// newer format. Hybrid torrents carry both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct InfoHashes {
    pub v1: Option<[u8; 20]>,
    pub v2: Option<[u8; 32]>,
}

impl InfoHashes {
    /// Creates hashes holding only a v1 (SHA-1) info hash.
    pub fn from_v1(hash: [u8; 20]) -> Self {
        Self {
            v1: Some(hash),
            v2: None,
        }
    }

    /// Creates hashes holding only a v2 (SHA-256) info hash.
    pub fn from_v2(hash: [u8; 32]) -> Self {
        Self {
            v1: None,
            v2: Some(hash),
        }
    }

    /// True when neither hash version is present.
    pub fn is_empty(&self) -> bool {
        self.v1.is_none() && self.v2.is_none()
    }
}

/// Engine-internal state machine positions for a torrent.
///
/// Closed enumeration: states the session layer does not model (such as
/// `Allocating`) translate to the `unknown` snapshot label rather than
/// failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    CheckingFiles,
    DownloadingMetadata,
    Downloading,
    Finished,
    Seeding,
    CheckingResumeData,
    Allocating,
}

/// Raw flattened status as reported by the engine for one torrent.
///
/// Volatile input to [`crate::session::TorrentSnapshot::from_status`]; never
/// handed to consumers directly.
#[derive(Debug, Clone)]
pub struct TorrentStatus {
    pub info_hashes: InfoHashes,
    /// Engine-resolved name; empty until metadata is fetched for a magnet.
    pub name: String,
    pub state: EngineState,
    /// Pause flag, tracked separately from the state machine.
    pub paused: bool,
    /// Completion in [0, 1].
    pub progress: f32,
    pub save_path: PathBuf,
    /// Download rate in bytes per second.
    pub download_rate: u64,
    /// Upload rate in bytes per second.
    pub upload_rate: u64,
    /// Bytes downloaded and verified.
    pub total_done: u64,
    /// Bytes wanted by the current file selection; zero when unknown.
    pub total_wanted: u64,
    /// Total torrent size in bytes.
    pub total: u64,
    pub num_peers: u32,
    pub num_seeds: u32,
}

/// Independent per-peer condition flags.
///
/// Any combination may be set at once. String rendering order is fixed by
/// [`crate::session::PeerSnapshot`], not by this type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeerFlags {
    pub seed: bool,
    pub interesting: bool,
    pub remote_interested: bool,
    pub choked: bool,
    pub remote_choked: bool,
    pub connecting: bool,
}

/// Raw per-peer record as reported by the engine.
#[derive(Debug, Clone)]
pub struct PeerDetails {
    /// Peer endpoint; engines report the unspecified address before the
    /// connection resolves.
    pub address: SocketAddr,
    /// Client identification string, e.g. "qBittorrent 4.6".
    pub client: String,
    /// Fraction of the torrent this peer has, in [0, 1].
    pub progress: f32,
    pub download_rate: u64,
    pub upload_rate: u64,
    pub flags: PeerFlags,
}

/// Where the torrent content description comes from.
#[derive(Debug, Clone)]
pub enum TorrentSource {
    /// Magnet descriptor: hashes plus optional metadata hints.
    Magnet(MagnetLink),
    /// Fully parsed .torrent metadata.
    Metadata(TorrentMetadata),
}

/// Registration request handed to the engine.
#[derive(Debug, Clone)]
pub struct AddTorrentRequest {
    pub source: TorrentSource,
    pub save_path: PathBuf,
    /// When set, the torrent starts paused. The registry clears this on the
    /// public add paths so downloads begin immediately.
    pub start_paused: bool,
    /// When set, the engine's queue manager may pause/resume the torrent on
    /// its own. The registry clears this too.
    pub auto_managed: bool,
}

/// How a pause request treats in-flight network operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseMode {
    /// Let in-flight operations finish before pausing.
    Graceful,
    /// Abort outstanding operations immediately.
    Abort,
}

/// Whether deregistration also deletes downloaded content from disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveMode {
    KeepFiles,
    DeleteFiles,
}

/// Asynchronous events posted by the engine.
///
/// Consumed by the session's alert pump; ordering relative to foreground
/// calls is not guaranteed.
#[derive(Debug, Clone)]
pub enum EngineAlert {
    TorrentAdded { id: TorrentId },
    TorrentRemoved { id: TorrentId, deleted_files: bool },
    MetadataReceived { id: TorrentId },
    TorrentFinished { id: TorrentId },
    EngineFault { message: String },
}

/// Contract for the external BitTorrent engine.
///
/// Implementations must be internally thread-safe: the session layer invokes
/// these methods concurrently from multiple callers without serializing them.
/// Removal must be atomic with respect to handle enumeration, so a resolve
/// racing a remove observes either the live handle or nothing.
#[async_trait]
pub trait TorrentEngine: Send + Sync {
    /// Live, transient reference to a registered torrent.
    type Handle: Clone + Send + Sync;

    /// Registers a torrent with the engine.
    ///
    /// # Errors
    /// - `SessionError::Engine` - Registration rejected, e.g. duplicate
    ///   content already registered.
    async fn add_torrent(
        &self,
        request: AddTorrentRequest,
    ) -> Result<Self::Handle, SessionError>;

    /// Deregisters a torrent, optionally deleting downloaded content.
    ///
    /// # Errors
    /// - `SessionError::Engine` - Handle no longer valid.
    async fn remove_torrent(
        &self,
        handle: &Self::Handle,
        mode: RemoveMode,
    ) -> Result<(), SessionError>;

    /// Requests a pause of the torrent.
    ///
    /// # Errors
    /// - `SessionError::Engine` - Handle no longer valid.
    async fn pause_torrent(
        &self,
        handle: &Self::Handle,
        mode: PauseMode,
    ) -> Result<(), SessionError>;

    /// Clears the pause state of the torrent.
    ///
    /// # Errors
    /// - `SessionError::Engine` - Handle no longer valid.
    async fn resume_torrent(&self, handle: &Self::Handle) -> Result<(), SessionError>;

    /// Returns every handle currently registered, valid or not.
    async fn torrent_handles(&self) -> Vec<Self::Handle>;

    /// True while the handle refers to a registered torrent.
    async fn is_valid(&self, handle: &Self::Handle) -> bool;

    /// Content hashes for the handle, or `None` once invalidated.
    async fn info_hashes(&self, handle: &Self::Handle) -> Option<InfoHashes>;

    /// Point-in-time raw status for the handle.
    ///
    /// # Errors
    /// - `SessionError::Engine` - Handle no longer valid.
    async fn status(&self, handle: &Self::Handle) -> Result<TorrentStatus, SessionError>;

    /// Raw records for every peer connected at this instant.
    ///
    /// # Errors
    /// - `SessionError::Engine` - Handle no longer valid.
    async fn peer_details(
        &self,
        handle: &Self::Handle,
    ) -> Result<Vec<PeerDetails>, SessionError>;

    /// Drains and returns all alerts posted since the last call.
    async fn pop_alerts(&self) -> Vec<EngineAlert>;
}
