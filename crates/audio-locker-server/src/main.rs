mod api;
mod auth;
mod config;
mod cover_cache;
mod error;
mod identity;
mod library;
mod openapi;
mod safe_path;
mod startup;
mod state;
mod tag_reader;
mod tag_writer;
#[cfg(test)]
mod test_support;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

pub(crate) const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_SHA"),
    ", built ",
    env!("BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "audio-locker-server", version = VERSION)]
pub(crate) struct Args {
    /// HTTP bind address, e.g. 0.0.0.0:5000
    #[arg(long)]
    bind: Option<std::net::SocketAddr>,

    /// Directory holding uploaded tracks and their covers
    #[arg(long)]
    storage_dir: Option<PathBuf>,

    /// Optional server config file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[actix_web::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,actix_web=info,audio_locker_server=info")
        }))
        .init();

    startup::run(args).await
}
