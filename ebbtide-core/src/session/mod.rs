//! Session-level torrent management.
//!
//! Bridges stable torrent identities to live engine handles and translates
//! volatile engine status into immutable snapshots for consumers. The engine
//! itself (wire protocol, piece scheduling, disk I/O) lives behind the
//! [`crate::engine::TorrentEngine`] seam and is never reimplemented here.

pub mod alerts;
pub mod registry;
pub mod service;
pub mod snapshot;

use std::fmt;

use serde::Serialize;

pub use alerts::AlertPump;
pub use registry::TorrentRegistry;
pub use service::TorrentService;
pub use snapshot::{PeerSnapshot, TorrentSnapshot, TorrentState};

use crate::engine::InfoHashes;

/// Stable string identity for a torrent, derived from its content hashes.
///
/// Identical content always yields the identical identity, independent of
/// session restarts. The v1 (SHA-1) hash wins when both hash versions are
/// present; hybrid torrents therefore keep one identity for their lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TorrentId(String);

impl TorrentId {
    /// Derives the identity from engine-reported content hashes.
    ///
    /// Lowercase hex, high nibble first. Returns an empty identity when
    /// neither hash version is present; callers must treat an empty identity
    /// as unidentifiable and never register it for lookup.
    pub fn derive(hashes: &InfoHashes) -> Self {
        if let Some(v1) = &hashes.v1 {
            Self(hex::encode(v1))
        } else if let Some(v2) = &hashes.v2 {
            Self(hex::encode(v2))
        } else {
            Self(String::new())
        }
    }

    /// Wraps an identity string received from a consumer (CLI input, API).
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the degenerate identity of a torrent with no content hash.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TorrentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors surfaced by session operations.
///
/// Every failure is terminal for the triggering call; the session layer never
/// retries internally. `NotFound` is expected in normal operation (another
/// caller may have removed the torrent) and is kept separate from `Engine`
/// so callers can treat it as "already gone" rather than a fault.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to parse torrent source: {reason}")]
    Parse { reason: String },

    #[error("invalid download path: {reason}")]
    InvalidPath { reason: String },

    #[error("engine rejected operation: {reason}")]
    Engine { reason: String },

    #[error("torrent {id} not found")]
    NotFound { id: TorrentId },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_prefers_v1_hash() {
        let hashes = InfoHashes {
            v1: Some([0xab; 20]),
            v2: Some([0xcd; 32]),
        };
        assert_eq!(TorrentId::derive(&hashes).as_str(), "ab".repeat(20));
    }

    #[test]
    fn test_identity_falls_back_to_v2_hash() {
        let hashes = InfoHashes {
            v1: None,
            v2: Some([0x01; 32]),
        };
        assert_eq!(TorrentId::derive(&hashes).as_str(), "01".repeat(32));
    }

    #[test]
    fn test_identity_empty_without_hashes() {
        let id = TorrentId::derive(&InfoHashes::default());
        assert!(id.is_empty());
    }

    #[test]
    fn test_identity_is_deterministic_and_distinct() {
        let first = InfoHashes::from_v1([0x11; 20]);
        let second = InfoHashes::from_v1([0x22; 20]);

        assert_eq!(TorrentId::derive(&first), TorrentId::derive(&first));
        assert_ne!(TorrentId::derive(&first), TorrentId::derive(&second));
    }

    #[test]
    fn test_identity_hex_is_lowercase_high_nibble_first() {
        let mut hash = [0u8; 20];
        hash[0] = 0xF0;
        hash[1] = 0x0D;
        let id = TorrentId::derive(&InfoHashes::from_v1(hash));
        assert!(id.as_str().starts_with("f00d"));
    }

    #[test]
    fn test_not_found_error_carries_identity() {
        let err = SessionError::NotFound {
            id: TorrentId::new("abc123"),
        };
        assert_eq!(err.to_string(), "torrent abc123 not found");
    }
}
