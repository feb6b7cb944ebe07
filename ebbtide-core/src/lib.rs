//! Ebbtide Core - session-level torrent lifecycle management
//!
//! This crate provides the building blocks for managing a collection of
//! in-flight torrents atop a pluggable BitTorrent engine: stable torrent
//! identities, lifecycle operations (add, pause, resume, remove), and
//! translation of volatile engine status into immutable snapshots.

pub mod config;
pub mod engine;
pub mod parsing;
pub mod session;
pub mod tracing_setup;

// Re-export main types for convenient access
pub use config::EbbtideConfig;
pub use engine::{SimulationTorrentEngine, TorrentEngine};
pub use session::{
    PeerSnapshot, SessionError, TorrentId, TorrentService, TorrentSnapshot, TorrentState,
};

pub type Result<T> = std::result::Result<T, SessionError>;
