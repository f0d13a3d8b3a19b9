mod api;
mod cli;
mod model;
mod orchestrator;
mod text_output;
mod timecode;
#[cfg(feature = "tui")]
mod tui;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Log to stderr in text mode. The dashboard owns the terminal, so there
/// logs go to a file under the cache directory instead.
fn init_tracing(interactive: bool) {
    if interactive {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let Some(file) = open_log_file() else {
            return;
        };
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .try_init();
    } else {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}

fn open_log_file() -> Option<std::fs::File> {
    let dir = dirs::cache_dir()?.join("karaoke-dash");
    std::fs::create_dir_all(&dir).ok()?;
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("karaoke-dash.log"))
        .ok()
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let is_non_tui = !args.is_interactive();
    init_tracing(!is_non_tui);

    cli::run(args).await?;
    // Blocking stdin readers may still be parked; don't wait for them.
    if is_non_tui {
        std::process::exit(0);
    }
    Ok(())
}
