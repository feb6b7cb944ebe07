//! Translation of volatile engine status into immutable consumer snapshots.
//!
//! Pure mappings with no engine calls: every snapshot is constructed fresh on
//! query, never mutated in place, and superseded by the next query.

use serde::Serialize;

use super::TorrentId;
use crate::engine::{EngineState, PeerDetails, PeerFlags, TorrentStatus};

/// Consumer-facing torrent state labels.
///
/// Closed set: engine states without a counterpart here report as `Unknown`.
/// `Paused` takes priority over the underlying state machine whenever the
/// pause flag is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TorrentState {
    CheckingFiles,
    DownloadingMetadata,
    Downloading,
    Finished,
    Seeding,
    CheckingResumeData,
    Paused,
    Unknown,
}

impl TorrentState {
    /// Stable string label, matching the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            TorrentState::CheckingFiles => "checking_files",
            TorrentState::DownloadingMetadata => "downloading_metadata",
            TorrentState::Downloading => "downloading",
            TorrentState::Finished => "finished",
            TorrentState::Seeding => "seeding",
            TorrentState::CheckingResumeData => "checking_resume_data",
            TorrentState::Paused => "paused",
            TorrentState::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for TorrentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<EngineState> for TorrentState {
    fn from(state: EngineState) -> Self {
        match state {
            EngineState::CheckingFiles => TorrentState::CheckingFiles,
            EngineState::DownloadingMetadata => TorrentState::DownloadingMetadata,
            EngineState::Downloading => TorrentState::Downloading,
            EngineState::Finished => TorrentState::Finished,
            EngineState::Seeding => TorrentState::Seeding,
            EngineState::CheckingResumeData => TorrentState::CheckingResumeData,
            EngineState::Allocating => TorrentState::Unknown,
        }
    }
}

/// Immutable point-in-time view of one torrent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TorrentSnapshot {
    pub id: TorrentId,
    /// Engine-reported name, or the identity string while metadata is
    /// unresolved; never empty for an identifiable torrent.
    pub name: String,
    /// Completion in [0, 1].
    pub progress: f32,
    pub status: TorrentState,
    pub save_path: String,
    /// Bytes per second.
    pub download_rate: u64,
    /// Bytes per second.
    pub upload_rate: u64,
    pub downloaded_bytes: u64,
    /// Wanted bytes when the selection is known, total size otherwise.
    pub total_bytes: u64,
    pub peers: u32,
    pub seeds: u32,
    pub paused: bool,
}

impl TorrentSnapshot {
    /// Flattens raw engine status into a snapshot.
    ///
    /// The pause flag is evaluated before the state machine when choosing
    /// the status label.
    pub fn from_status(status: &TorrentStatus) -> Self {
        let id = TorrentId::derive(&status.info_hashes);
        let name = if status.name.is_empty() {
            id.to_string()
        } else {
            status.name.clone()
        };
        let state = if status.paused {
            TorrentState::Paused
        } else {
            TorrentState::from(status.state)
        };
        let total_bytes = if status.total_wanted > 0 {
            status.total_wanted
        } else {
            status.total
        };

        Self {
            id,
            name,
            progress: status.progress,
            status: state,
            save_path: status.save_path.display().to_string(),
            download_rate: status.download_rate,
            upload_rate: status.upload_rate,
            downloaded_bytes: status.total_done,
            total_bytes,
            peers: status.num_peers,
            seeds: status.num_seeds,
            paused: status.paused,
        }
    }
}

/// Immutable view of one peer connection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerSnapshot {
    /// `"ip:port"`, or the literal `"unknown"` before the address resolves.
    pub endpoint: String,
    pub client: String,
    /// Fraction of the torrent this peer has, in [0, 1].
    pub progress: f32,
    pub download_rate: u64,
    pub upload_rate: u64,
    /// Comma-joined flag names in fixed enumeration order, or `"none"`.
    pub flags: String,
}

impl PeerSnapshot {
    /// Flattens a raw engine peer record into a snapshot.
    pub fn from_details(details: &PeerDetails) -> Self {
        let endpoint = if details.address.ip().is_unspecified() {
            "unknown".to_string()
        } else {
            details.address.to_string()
        };

        Self {
            endpoint,
            client: details.client.clone(),
            progress: details.progress,
            download_rate: details.download_rate,
            upload_rate: details.upload_rate,
            flags: flags_summary(&details.flags),
        }
    }
}

/// Joins set flags in fixed enumeration order so the string is deterministic
/// for a given flag combination.
fn flags_summary(flags: &PeerFlags) -> String {
    let labels = [
        (flags.seed, "seed"),
        (flags.interesting, "interesting"),
        (flags.remote_interested, "remote_interested"),
        (flags.choked, "choked"),
        (flags.remote_choked, "remote_choked"),
        (flags.connecting, "connecting"),
    ];

    let set: Vec<&str> = labels
        .into_iter()
        .filter_map(|(set, label)| set.then_some(label))
        .collect();

    if set.is_empty() {
        "none".to_string()
    } else {
        set.join(",")
    }
}
