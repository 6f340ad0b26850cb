use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use mapsync_core::{sync_jumps, sync_portals, ProjectPaths};

#[derive(Parser, Debug)]
#[command(name = "mapsync", version, about = "Synchronize editor map JSON against extracted game data")]
struct Cli {
    #[command(flatten)]
    paths: PathArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct PathArgs {
    /// Editor project root (holds the maps directory and lock rules)
    #[arg(long, value_name = "PATH", default_value = ".")]
    root: PathBuf,

    /// Extracted game source root (default: <root>/source)
    #[arg(long = "source-root", value_name = "PATH")]
    source_root: Option<PathBuf>,

    /// Editor maps directory (default: <root>/maps)
    #[arg(long = "maps-dir", value_name = "PATH")]
    maps_dir: Option<PathBuf>,

    /// Portal lock rule file (default: <root>/data/portal-locks.json)
    #[arg(long = "locks", value_name = "PATH")]
    locks_path: Option<PathBuf>,

    /// Layout registry (default: <source-root>/data/layouts/layouts.json)
    #[arg(long = "layouts", value_name = "PATH")]
    layouts_path: Option<PathBuf>,
}

impl PathArgs {
    fn resolve(&self) -> ProjectPaths {
        let source_root = self
            .source_root
            .clone()
            .unwrap_or_else(|| self.root.join("source"));
        let mut paths = ProjectPaths::from_roots(&self.root, &source_root);
        if let Some(dir) = &self.maps_dir {
            paths.maps_dir = dir.clone();
        }
        if let Some(path) = &self.locks_path {
            paths.locks_path = path.clone();
        }
        if let Some(path) = &self.layouts_path {
            paths.layouts_path = path.clone();
        }
        paths
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rewrite `jumps` from layout block data and tileset attributes
    Jumps,
    /// Rewrite `events`/`npcs` from source warps and connections
    Portals,
    /// Run both passes
    All,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_ansi(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let cli = Cli::parse();
    let paths = cli.paths.resolve();
    info!(?paths, "starting mapsync");

    match cli.command {
        Command::Jumps => {
            let summary = sync_jumps(&paths).context("jump sync failed")?;
            info!(%summary, "jumps done");
        }
        Command::Portals => {
            let summary = sync_portals(&paths).context("portal sync failed")?;
            info!(%summary, "portals done");
        }
        Command::All => {
            let jumps = sync_jumps(&paths).context("jump sync failed")?;
            info!(%jumps, "jumps done");
            let portals = sync_portals(&paths).context("portal sync failed")?;
            info!(%portals, "portals done");
        }
    }

    Ok(())
}
