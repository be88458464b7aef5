use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;

use clap::Parser;
use color_eyre::Result;
use spectator_core::{load_config, HttpGameServer, SyncRuntime};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod app;
mod ui;

use app::SpectatorApp;

/// Forwards formatted log events to the on-screen log panel, one line per message.
///
/// Write errors are swallowed: once the UI has gone the events have nowhere to land.
#[derive(Clone)]
struct ChannelWriter {
    sender: Sender<String>,
}

impl std::io::Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let text = String::from_utf8_lossy(buf);
        for line in text.lines().filter(|line| !line.trim().is_empty()) {
            if self.sender.send(line.to_string()).is_err() {
                break;
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Terminal spectator for the Beast game server", long_about = None)]
struct Cli {
    /// Base URL of the game server. Overrides the configured value.
    #[arg(long, env = "BEAST_SERVER_URL")]
    server: Option<String>,
    /// JSON file with server, sync and display settings.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let (log_tx, log_rx) = mpsc::channel::<String>();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .with_ansi(false)
        .with_writer(move || ChannelWriter {
            sender: log_tx.clone(),
        })
        .init();

    let cli = Cli::parse();
    let (mut config, source) = load_config(cli.config.as_deref());
    if let Some(server) = cli.server {
        config = config.with_base_url(server);
    }

    let server = HttpGameServer::new(&config.server)?;
    info!(
        target: "beast_spectator::server",
        base_url = server.base_url(),
        ?source,
        "Watching game server"
    );

    let (handle, sync_task) = SyncRuntime::spawn(Arc::new(server), config.sync.clone());

    let ui_handle = handle.clone();
    let display = config.display.clone();
    let ui_result = tokio::task::spawn_blocking(move || -> Result<()> {
        let app = SpectatorApp::new(ui_handle, log_rx, &display)?;
        app.run()
    })
    .await;

    handle.shutdown();
    if let Err(err) = sync_task.await {
        warn!(error = %err, "Sync runtime ended abnormally");
    }

    ui_result??;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn channel_writer_splits_events_into_lines() {
        let (sender, receiver) = mpsc::channel();
        let mut writer = ChannelWriter { sender };
        let payload = b"first event\n\nsecond \xF0 event\n";

        assert_eq!(writer.write(payload).unwrap(), payload.len());

        let lines: Vec<String> = receiver.try_iter().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "first event");
        assert!(lines[1].starts_with("second "));
    }

    #[test]
    fn channel_writer_survives_closed_panel() {
        let (sender, receiver) = mpsc::channel();
        drop(receiver);
        let mut writer = ChannelWriter { sender };
        assert_eq!(writer.write(b"late event\n").unwrap(), 11);
    }
}
