//! Torrent source parsing: magnet URIs and .torrent metadata.

pub mod bencode;
pub mod magnet;
pub mod types;

pub use types::{MagnetLink, TorrentFileEntry, TorrentMetadata};
