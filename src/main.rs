// SPDX-License-Identifier: MPL-2.0

mod cli;

use anyhow::{Context, bail};
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use soundcloud_provider::{
    Config, EntityCache, MediaKind, SoundCloudClient, SoundCloudProvider, TrackDownload, keyring,
};

use crate::cli::{Args, Commands};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{e:#}");
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let mut config = Config::load(args.config.as_deref())?;
    debug!("configuration: {config:?}");

    match &args.command {
        Commands::Login { token } => {
            let token = token.strip_prefix("OAuth ").unwrap_or(token.as_str()).trim();
            if token.is_empty() {
                bail!("token is empty");
            }
            keyring::store_token(token).context("storing token in keyring")?;
            info!("token stored in keyring");
            drop_plaintext_token(&mut config, args.config.as_deref());
            return Ok(());
        }
        Commands::Logout => {
            keyring::delete_token().context("removing token from keyring")?;
            info!("token removed from keyring");
            drop_plaintext_token(&mut config, args.config.as_deref());
            return Ok(());
        }
        _ => {}
    }

    let Some(token) = config.resolve_token(args.token.as_deref()) else {
        bail!("no token: run `soundcloud-provider login <token>` or set SOUNDCLOUD_TOKEN");
    };
    let provider = SoundCloudProvider::new(token, &config)?;
    let mut cache = EntityCache::new();

    match args.command {
        Commands::Resolve { url } => print_json(&provider.resolve(&url, &mut cache).await?),
        Commands::Search { kind, query, limit } => {
            let kind: MediaKind = kind.parse()?;
            print_json(&provider.search(kind, &query, limit, &mut cache).await?)
        }
        Commands::Track { id } => print_json(&provider.get_track(id, &mut cache).await?),
        Commands::Album { id } => print_json(&provider.get_album(id, &mut cache).await?),
        Commands::Playlist { id } => print_json(&provider.get_playlist(id, &mut cache).await?),
        Commands::Artist { id } => print_json(&provider.get_artist(&id, &mut cache).await?),
        Commands::Download { target, output } => {
            download(&provider, &target, output, &mut cache).await
        }
        Commands::Preview { id } => match provider.preview_stream_url(id).await {
            Some(url) => print_json(&serde_json::json!({ "track_id": id, "url": url })),
            None => bail!("track {id} has no playable stream"),
        },
        Commands::Login { .. } | Commands::Logout => Ok(()),
    }
}

/// The keyring holds the token now; remove the deprecated copy from the config file
fn drop_plaintext_token(config: &mut Config, path: Option<&Path>) {
    if config.access_token.take().is_none() {
        return;
    }
    match config.save(path) {
        Ok(()) => info!("removed plaintext token from config file"),
        Err(e) => warn!("could not rewrite config file: {e}"),
    }
}

#[derive(Serialize)]
struct Downloaded {
    track_id: u64,
    path: PathBuf,
    codec: String,
}

async fn download(
    provider: &SoundCloudProvider,
    target: &str,
    output: Option<PathBuf>,
    cache: &mut EntityCache,
) -> anyhow::Result<()> {
    let track_id = match target.parse::<u64>() {
        Ok(id) => id,
        Err(_) => {
            let media = provider.resolve(target, cache).await?;
            if media.kind != MediaKind::Track {
                bail!("{target} is a {}, not a track", media.kind);
            }
            media.id
        }
    };

    let track = provider.get_track(track_id, cache).await?;
    if !track.is_downloadable() {
        match &track.diagnostic {
            Some(d) => bail!("track {track_id} cannot be downloaded: {d}"),
            None => bail!("track {track_id} cannot be downloaded"),
        }
    }

    let remuxer = provider.downloader().remuxer();
    if track.download.needs_remux() && !remuxer.is_available().await {
        if track.download.is_hls {
            bail!(
                "track {track_id} is an HLS stream and {} is not available to remux it",
                remuxer.program().display()
            );
        }
        warn!(
            "{} is not available; the AAC download will be saved without remuxing",
            remuxer.program().display()
        );
    }

    let result = provider.get_track_download(&track.download).await?;
    let extension = match &result {
        TrackDownload::TempFile { path } => path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| track.codec.container_extension().to_string()),
        TrackDownload::Url { .. } => track.codec.container_extension().to_string(),
    };
    let destination = output.unwrap_or_else(|| {
        PathBuf::from(format!("{}.{extension}", file_stem(&track.name, track_id)))
    });

    match result {
        TrackDownload::TempFile { path } => move_file(&path, &destination).await?,
        TrackDownload::Url { url, .. } => {
            let bytes = fetch_to(provider.client(), &url, &destination).await?;
            debug!("{bytes} bytes written");
        }
    }
    info!("saved {}", destination.display());

    print_json(&Downloaded {
        track_id,
        path: destination,
        codec: track.codec.to_string(),
    })
}

/// Download next to `destination` and move into place only once complete
async fn fetch_to(client: &SoundCloudClient, url: &str, destination: &Path) -> anyhow::Result<u64> {
    let dir = match destination.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let partial = tempfile::Builder::new()
        .prefix(".soundcloud-")
        .suffix(".part")
        .tempfile_in(dir)?
        .into_temp_path();
    let bytes = client.download_to(url, &partial).await?;
    partial
        .persist(destination)
        .with_context(|| format!("saving {}", destination.display()))?;
    Ok(bytes)
}

/// Rename, falling back to copy when the temp dir is on another filesystem
async fn move_file(from: &Path, to: &Path) -> anyhow::Result<()> {
    if tokio::fs::rename(from, to).await.is_ok() {
        return Ok(());
    }
    tokio::fs::copy(from, to)
        .await
        .with_context(|| format!("copying {} to {}", from.display(), to.display()))?;
    tokio::fs::remove_file(from).await?;
    Ok(())
}

fn file_stem(name: &str, track_id: u64) -> String {
    let stem: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect();
    let stem = stem.trim();
    if stem.is_empty() {
        track_id.to_string()
    } else {
        stem.to_string()
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(verbose),
        )
        .with(filter)
        .init();
}
