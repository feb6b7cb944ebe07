//! End-to-end tests of the session facade over the simulation engine.

use std::sync::Arc;
use std::time::Duration;

use ebbtide_core::config::EbbtideConfig;
use ebbtide_core::engine::{PeerDetails, PeerFlags, SimulationTorrentEngine};
use ebbtide_core::session::{SessionError, TorrentId, TorrentService, TorrentState};

const V1_HEX: &str = "0123456789abcdef0123456789abcdef01234567";

/// Service with a pump interval long enough that tests can inspect the
/// engine's alert queue themselves without racing the pump.
fn service() -> TorrentService<SimulationTorrentEngine> {
    let mut config = EbbtideConfig::default();
    config.session.alert_poll_interval = Duration::from_secs(3600);
    config.simulation.simulated_download_speed = 512;
    let engine = Arc::new(SimulationTorrentEngine::new(config.simulation.clone()));
    TorrentService::new(&config, engine)
}

fn magnet(hex: &str) -> String {
    format!("magnet:?xt=urn:btih:{hex}")
}

#[tokio::test]
async fn test_add_magnet_round_trip() {
    let service = service();
    let dir = tempfile::tempdir().unwrap();

    let id = service.add_magnet_link(&magnet(V1_HEX), dir.path()).await.unwrap();
    assert_eq!(id.as_str(), V1_HEX);

    let snapshot = service.torrent(&id).await.unwrap();
    assert_eq!(snapshot.id, id);
    assert_eq!(snapshot.status, TorrentState::DownloadingMetadata);
    assert!(!snapshot.paused);

    service.shutdown().await;
}

#[tokio::test]
async fn test_unresolved_metadata_name_falls_back_to_identity() {
    let service = service();
    let dir = tempfile::tempdir().unwrap();

    let id = service.add_magnet_link(&magnet(V1_HEX), dir.path()).await.unwrap();
    let snapshot = service.torrent(&id).await.unwrap();
    assert_eq!(snapshot.name, V1_HEX);

    service.shutdown().await;
}

#[tokio::test]
async fn test_magnet_display_name_used_when_present() {
    let service = service();
    let dir = tempfile::tempdir().unwrap();

    let uri = format!("magnet:?xt=urn:btih:{V1_HEX}&dn=Named+Torrent");
    let id = service.add_magnet_link(&uri, dir.path()).await.unwrap();
    let snapshot = service.torrent(&id).await.unwrap();
    assert_eq!(snapshot.name, "Named Torrent");

    service.shutdown().await;
}

#[tokio::test]
async fn test_v2_magnet_identity_uses_32_byte_hash() {
    let service = service();
    let dir = tempfile::tempdir().unwrap();
    let digest = "cd".repeat(32);

    let uri = format!("magnet:?xt=urn:btmh:1220{digest}");
    let id = service.add_magnet_link(&uri, dir.path()).await.unwrap();
    assert_eq!(id.as_str(), digest);

    service.shutdown().await;
}

#[tokio::test]
async fn test_empty_download_path_rejected() {
    let service = service();

    let result = service.add_magnet_link(&magnet(V1_HEX), "").await;
    assert!(matches!(result, Err(SessionError::InvalidPath { .. })));
    assert!(service.torrents().await.is_empty());

    service.shutdown().await;
}

#[tokio::test]
async fn test_duplicate_add_rejected_by_engine() {
    let service = service();
    let dir = tempfile::tempdir().unwrap();

    service.add_magnet_link(&magnet(V1_HEX), dir.path()).await.unwrap();
    let result = service.add_magnet_link(&magnet(V1_HEX), dir.path()).await;

    match result {
        Err(SessionError::Engine { reason }) => assert!(reason.contains("duplicate")),
        other => panic!("expected engine rejection, got {other:?}"),
    }

    service.shutdown().await;
}

#[tokio::test]
async fn test_pause_overrides_reported_state() {
    let service = service();
    let dir = tempfile::tempdir().unwrap();

    let id = service.add_magnet_link(&magnet(V1_HEX), dir.path()).await.unwrap();
    service
        .engine()
        .resolve_metadata(&id, "payload.bin", 4096)
        .await
        .unwrap();

    service.pause_torrent(&id).await.unwrap();
    let snapshot = service.torrent(&id).await.unwrap();
    assert_eq!(snapshot.status, TorrentState::Paused);
    assert_eq!(snapshot.status.as_str(), "paused");
    assert!(snapshot.paused);

    service.resume_torrent(&id).await.unwrap();
    let snapshot = service.torrent(&id).await.unwrap();
    assert_eq!(snapshot.status, TorrentState::Downloading);
    assert!(!snapshot.paused);

    service.shutdown().await;
}

#[tokio::test]
async fn test_delete_makes_torrent_unqueryable() {
    let service = service();
    let dir = tempfile::tempdir().unwrap();

    let id = service.add_magnet_link(&magnet(V1_HEX), dir.path()).await.unwrap();
    service.delete_torrent(&id).await.unwrap();

    let result = service.torrent(&id).await;
    assert!(matches!(result, Err(SessionError::NotFound { .. })));

    let result = service.pause_torrent(&id).await;
    assert!(matches!(result, Err(SessionError::NotFound { .. })));

    service.shutdown().await;
}

#[tokio::test]
async fn test_cancel_keeps_files_delete_removes_them() {
    use ebbtide_core::engine::{EngineAlert, TorrentEngine};

    let service = service();
    let dir = tempfile::tempdir().unwrap();

    let kept = service.add_magnet_link(&magnet(&"aa".repeat(20)), dir.path()).await.unwrap();
    let deleted = service.add_magnet_link(&magnet(&"bb".repeat(20)), dir.path()).await.unwrap();
    service.engine().pop_alerts().await;

    service.cancel_torrent(&kept).await.unwrap();
    service.delete_torrent(&deleted).await.unwrap();

    let alerts = service.engine().pop_alerts().await;
    let removal = |target: &TorrentId| {
        alerts.iter().find_map(|alert| match alert {
            EngineAlert::TorrentRemoved { id, deleted_files } if id == target => {
                Some(*deleted_files)
            }
            _ => None,
        })
    };
    assert_eq!(removal(&kept), Some(false));
    assert_eq!(removal(&deleted), Some(true));

    service.shutdown().await;
}

#[tokio::test]
async fn test_torrents_sorted_by_name() {
    let service = service();
    let dir = tempfile::tempdir().unwrap();

    for (hash_byte, name) in [(1u8, "zeta"), (2, "alpha"), (3, "mid")] {
        let hex = format!("{hash_byte:02x}").repeat(20);
        let id = service.add_magnet_link(&magnet(&hex), dir.path()).await.unwrap();
        service.engine().resolve_metadata(&id, name, 1024).await.unwrap();
    }

    let names: Vec<String> = service
        .torrents()
        .await
        .into_iter()
        .map(|snapshot| snapshot.name)
        .collect();
    assert_eq!(names, vec!["alpha", "mid", "zeta"]);

    service.shutdown().await;
}

#[tokio::test]
async fn test_peer_snapshots_translate_flags_and_endpoints() {
    let service = service();
    let dir = tempfile::tempdir().unwrap();

    let id = service.add_magnet_link(&magnet(V1_HEX), dir.path()).await.unwrap();
    service
        .engine()
        .set_peer_details(
            &id,
            vec![
                PeerDetails {
                    address: "192.0.2.1:6881".parse().unwrap(),
                    client: "transmission 4.0".to_string(),
                    progress: 1.0,
                    download_rate: 0,
                    upload_rate: 9000,
                    flags: PeerFlags {
                        seed: true,
                        choked: true,
                        ..PeerFlags::default()
                    },
                },
                PeerDetails {
                    address: "0.0.0.0:0".parse().unwrap(),
                    client: String::new(),
                    progress: 0.0,
                    download_rate: 0,
                    upload_rate: 0,
                    flags: PeerFlags {
                        connecting: true,
                        ..PeerFlags::default()
                    },
                },
            ],
        )
        .await
        .unwrap();

    let peers = service.torrent_peers(&id).await.unwrap();
    assert_eq!(peers.len(), 2);
    assert_eq!(peers[0].endpoint, "192.0.2.1:6881");
    assert_eq!(peers[0].flags, "seed,choked");
    assert_eq!(peers[1].endpoint, "unknown");
    assert_eq!(peers[1].flags, "connecting");

    let snapshot = service.torrent(&id).await.unwrap();
    assert_eq!(snapshot.peers, 2);
    assert_eq!(snapshot.seeds, 1);

    service.shutdown().await;
}

#[tokio::test]
async fn test_add_torrent_file_round_trip() {
    use sha1::{Digest, Sha1};

    let service = service();
    let dir = tempfile::tempdir().unwrap();

    let info =
        b"d6:lengthi2048e4:name9:file.data12:piece lengthi16384e6:pieces20:AAAAAAAAAAAAAAAAAAAAe";
    let mut torrent_bytes = Vec::new();
    torrent_bytes.extend_from_slice(b"d8:announce31:http://tracker.example/announce4:info");
    torrent_bytes.extend_from_slice(info);
    torrent_bytes.extend_from_slice(b"e");

    let torrent_path = dir.path().join("file.torrent");
    std::fs::write(&torrent_path, &torrent_bytes).unwrap();

    let id = service
        .add_torrent_file(&torrent_path, dir.path().join("downloads"))
        .await
        .unwrap();
    let expected: [u8; 20] = Sha1::digest(info).into();
    assert_eq!(id.as_str(), hex::encode(expected));

    let snapshot = service.torrent(&id).await.unwrap();
    assert_eq!(snapshot.name, "file.data");
    assert_eq!(snapshot.total_bytes, 2048);
    assert_eq!(snapshot.status, TorrentState::Downloading);

    service.shutdown().await;
}

#[tokio::test]
async fn test_simulated_download_completes_to_seeding() {
    let service = service();
    let dir = tempfile::tempdir().unwrap();

    let id = service.add_magnet_link(&magnet(V1_HEX), dir.path()).await.unwrap();
    service.engine().resolve_metadata(&id, "small.bin", 1024).await.unwrap();

    service.engine().simulate_download_progress().await;
    service.engine().simulate_download_progress().await;

    let snapshot = service.torrent(&id).await.unwrap();
    assert_eq!(snapshot.status, TorrentState::Seeding);
    assert!((snapshot.progress - 1.0).abs() < f32::EPSILON);
    assert_eq!(snapshot.downloaded_bytes, 1024);

    service.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_resolves_promptly() {
    let service = service();
    tokio::time::timeout(Duration::from_secs(1), service.shutdown())
        .await
        .expect("shutdown did not resolve in time");
}
