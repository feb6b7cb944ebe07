//! Parsed torrent source representations.

use crate::engine::InfoHashes;

/// Parsed magnet descriptor: content hashes plus optional metadata hints.
#[derive(Debug, Clone)]
pub struct MagnetLink {
    pub info_hashes: InfoHashes,
    /// `dn` parameter; the engine resolves the real name once metadata is
    /// fetched.
    pub display_name: Option<String>,
    /// `tr` parameters in order of appearance.
    pub trackers: Vec<String>,
}

/// Metadata extracted from a .torrent file.
#[derive(Debug, Clone)]
pub struct TorrentMetadata {
    /// SHA-1 hash of the bencoded info dictionary.
    pub info_hash: [u8; 20],
    pub name: String,
    pub piece_length: u64,
    /// Sum of all file lengths.
    pub total_length: u64,
    pub files: Vec<TorrentFileEntry>,
    pub announce_urls: Vec<String>,
}

impl TorrentMetadata {
    /// Content hashes for registration; .torrent files here are v1-only.
    pub fn info_hashes(&self) -> InfoHashes {
        InfoHashes::from_v1(self.info_hash)
    }
}

/// One file within a torrent's content layout.
#[derive(Debug, Clone)]
pub struct TorrentFileEntry {
    /// Path components relative to the download directory.
    pub path: Vec<String>,
    pub length: u64,
}
