//! CLI command implementations.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Subcommand;
use ebbtide_core::config::EbbtideConfig;
use ebbtide_core::engine::SimulationTorrentEngine;
use ebbtide_core::session::{TorrentId, TorrentService, TorrentSnapshot};
use ebbtide_core::{Result, SessionError};

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Add a torrent from a magnet link or .torrent file
    Add {
        /// Magnet link or path to a torrent file
        source: String,
        /// Output directory for downloads
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List all torrents
    List,
    /// Show the snapshot of one torrent
    Status {
        /// 40 or 64 character hex torrent identity
        id: String,
    },
    /// Gracefully pause a torrent
    Pause { id: String },
    /// Resume a paused torrent
    Resume { id: String },
    /// Remove a torrent, keeping downloaded files
    Cancel { id: String },
    /// Remove a torrent and delete downloaded files
    Delete { id: String },
    /// Show peers connected to a torrent
    Peers { id: String },
    /// Run a short simulated download lifecycle
    Demo {
        /// Number of simulated progress ticks
        #[arg(long, default_value_t = 4)]
        ticks: u32,
    },
}

/// Handle the CLI command
///
/// # Errors
/// Returns the underlying session error when the command fails.
pub async fn handle_command(command: Commands) -> Result<()> {
    match command {
        Commands::Add { source, output } => add_torrent(source, output).await,
        Commands::List => list_torrents().await,
        Commands::Status { id } => show_status(id).await,
        Commands::Pause { id } => lifecycle_op(id, LifecycleOp::Pause).await,
        Commands::Resume { id } => lifecycle_op(id, LifecycleOp::Resume).await,
        Commands::Cancel { id } => lifecycle_op(id, LifecycleOp::Cancel).await,
        Commands::Delete { id } => lifecycle_op(id, LifecycleOp::Delete).await,
        Commands::Peers { id } => show_peers(id).await,
        Commands::Demo { ticks } => run_demo(ticks).await,
    }
}

type SimService = TorrentService<SimulationTorrentEngine>;

fn service() -> (EbbtideConfig, SimService) {
    let config = EbbtideConfig::default();
    let engine = Arc::new(SimulationTorrentEngine::new(config.simulation.clone()));
    let service = TorrentService::new(&config, engine);
    (config, service)
}

async fn add_torrent(source: String, output: Option<PathBuf>) -> Result<()> {
    let (config, service) = service();
    let download_path =
        output.unwrap_or_else(|| PathBuf::from(config.session.default_download_dir));

    let id = if source.starts_with("magnet:") {
        println!("Adding magnet link: {source}");
        service.add_magnet_link(&source, &download_path).await?
    } else {
        println!("Adding torrent file: {source}");
        service.add_torrent_file(&source, &download_path).await?
    };

    println!("Successfully added torrent: {id}");
    let snapshot = service.torrent(&id).await?;
    print_snapshot(&snapshot);

    service.shutdown().await;
    Ok(())
}

async fn list_torrents() -> Result<()> {
    let (_, service) = service();

    println!("Torrent List");
    println!("{:-<60}", "");

    let torrents = service.torrents().await;
    if torrents.is_empty() {
        println!("No torrents registered with this engine.");
        println!("Engine state does not persist between invocations; try 'ebbtide demo'.");
    } else {
        for snapshot in &torrents {
            print_snapshot(snapshot);
        }
    }

    service.shutdown().await;
    Ok(())
}

async fn show_status(id: String) -> Result<()> {
    let (_, service) = service();

    match service.torrent(&TorrentId::new(id)).await {
        Ok(snapshot) => print_snapshot(&snapshot),
        Err(SessionError::NotFound { id }) => print_not_found(&id),
        Err(other) => return Err(other),
    }

    service.shutdown().await;
    Ok(())
}

enum LifecycleOp {
    Pause,
    Resume,
    Cancel,
    Delete,
}

async fn lifecycle_op(id: String, op: LifecycleOp) -> Result<()> {
    let (_, service) = service();
    let id = TorrentId::new(id);

    let (result, verb) = match op {
        LifecycleOp::Pause => (service.pause_torrent(&id).await, "paused"),
        LifecycleOp::Resume => (service.resume_torrent(&id).await, "resumed"),
        LifecycleOp::Cancel => (service.cancel_torrent(&id).await, "cancelled"),
        LifecycleOp::Delete => (service.delete_torrent(&id).await, "deleted"),
    };

    match result {
        Ok(()) => println!("Torrent {id} {verb}."),
        Err(SessionError::NotFound { id }) => print_not_found(&id),
        Err(other) => return Err(other),
    }

    service.shutdown().await;
    Ok(())
}

async fn show_peers(id: String) -> Result<()> {
    let (_, service) = service();

    match service.torrent_peers(&TorrentId::new(id)).await {
        Ok(peers) if peers.is_empty() => println!("No peers connected."),
        Ok(peers) => {
            for peer in peers {
                println!(
                    "{:<24} {:<20} {:>6.1}%  down {}  up {}  [{}]",
                    peer.endpoint,
                    peer.client,
                    peer.progress * 100.0,
                    peer.download_rate,
                    peer.upload_rate,
                    peer.flags
                );
            }
        }
        Err(SessionError::NotFound { id }) => print_not_found(&id),
        Err(other) => return Err(other),
    }

    service.shutdown().await;
    Ok(())
}

async fn run_demo(ticks: u32) -> Result<()> {
    let (config, service) = service();
    let download_path = PathBuf::from(config.session.default_download_dir);

    let magnet = "magnet:?xt=urn:btih:0123456789abcdef0123456789abcdef01234567&dn=Demo+Payload";
    println!("Adding: {magnet}");
    let id = service.add_magnet_link(magnet, &download_path).await?;

    let total = config.simulation.simulated_download_speed * u64::from(ticks.max(1));
    service.engine().resolve_metadata(&id, "Demo Payload", total).await?;

    for tick in 1..=ticks {
        service.engine().simulate_download_progress().await;
        let snapshot = service.torrent(&id).await?;
        println!(
            "tick {tick}: {:>5.1}%  {}  down {} B/s",
            snapshot.progress * 100.0,
            snapshot.status,
            snapshot.download_rate
        );
    }

    service.pause_torrent(&id).await?;
    println!("paused: {}", service.torrent(&id).await?.status);
    service.resume_torrent(&id).await?;
    println!("resumed: {}", service.torrent(&id).await?.status);

    service.delete_torrent(&id).await?;
    println!("deleted; {} torrents remain", service.torrents().await.len());

    service.shutdown().await;
    Ok(())
}

fn print_snapshot(snapshot: &TorrentSnapshot) {
    println!("{} [{}]", snapshot.name, snapshot.status);
    println!("  id:       {}", snapshot.id);
    println!(
        "  progress: {:.1}% of {} bytes",
        snapshot.progress * 100.0,
        snapshot.total_bytes
    );
    println!(
        "  rates:    down {} B/s, up {} B/s",
        snapshot.download_rate, snapshot.upload_rate
    );
    println!(
        "  peers:    {} ({} seeds), save path {}",
        snapshot.peers, snapshot.seeds, snapshot.save_path
    );
}

fn print_not_found(id: &TorrentId) {
    println!("Torrent {id} not found.");
    println!("Engine state does not persist between invocations; try 'ebbtide demo'.");
}
