use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};

use feedwriter::config::load_descriptor;
use feedwriter::feed::{read_rss, RssRenderer};

/// Writes the document next to `dst` and renames it into place, so readers
/// polling the feed file never see a half-written document.
fn atomic_write(content: &[u8], dst: &Path) -> Result<()> {
    // SEC-009: unpredictable sibling name, created exclusively
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos() ^ std::process::id())
        .unwrap_or_else(|_| std::process::id());
    let staging = dst.with_extension(format!("partial.{:08x}", nonce));

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&staging)
        .with_context(|| format!("Failed to create '{}'", staging.display()))?;

    let synced = file.write_all(content).and_then(|()| file.sync_all());
    drop(file);

    let written = synced.and_then(|()| {
        #[cfg(windows)]
        if dst.exists() {
            std::fs::remove_file(dst)?;
        }
        std::fs::rename(&staging, dst)
    });

    if written.is_err() {
        std::fs::remove_file(&staging).ok();
    }
    written.with_context(|| format!("Failed to write RSS document to '{}'", dst.display()))
}

#[derive(Parser, Debug)]
#[command(name = "feedwriter", about = "Render a feed descriptor as an RSS 2.0 document")]
struct Args {
    /// TOML file describing the feed
    #[arg(value_name = "DESCRIPTOR")]
    descriptor: PathBuf,

    /// Write the document to FILE instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Read the rendered document back and check the channel round-trips
    #[arg(long)]
    verify: bool,
}

fn main() -> Result<()> {
    // Initialize tracing for debug logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let descriptor = load_descriptor(&args.descriptor).with_context(|| {
        format!(
            "Failed to load feed descriptor '{}'",
            args.descriptor.display()
        )
    })?;

    let document = RssRenderer::new(&descriptor)
        .render()
        .context("Feed descriptor cannot be rendered as RSS 2.0")?;
    let bytes = document
        .to_bytes()
        .context("Failed to serialize RSS document")?;

    if args.verify {
        let channel = read_rss(&bytes).context("Rendered document did not read back")?;
        anyhow::ensure!(
            channel.title == descriptor.title,
            "Title changed in round trip: {:?} became {:?}",
            descriptor.title,
            channel.title
        );
        tracing::info!(
            title = channel.title.as_deref().unwrap_or(""),
            encoding = %channel.encoding,
            categories = channel.categories.len(),
            "Verified rendered document"
        );
    }

    match &args.output {
        Some(path) => {
            atomic_write(&bytes, path)?;
            tracing::info!(path = %path.display(), bytes = bytes.len(), "Wrote RSS document");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(&bytes)
                .context("Failed to write RSS document to stdout")?;
            stdout.flush().context("Failed to flush stdout")?;
        }
    }

    Ok(())
}
