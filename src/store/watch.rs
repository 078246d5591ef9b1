//! File watching for the JSON store.
//!
//! Watches the directory containing the store file (the file itself is
//! replaced by rename on every save) and sends a freshly loaded
//! [`ConfigSnapshot`] after each burst of changes settles for `debounce`.
//!
//! Exit:
//! - `cancel` is triggered, or
//! - the receiver side of `tx` is dropped.

use std::path::PathBuf;
use std::time::Duration;

use notify::{RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::ConfigSnapshot;
use super::file::read_state;
use crate::error::{ConsoleError, ConsoleResult};

/// Watch `path` and publish a snapshot every time it changes.
pub async fn watch_document(
    path: PathBuf,
    debounce: Duration,
    tx: mpsc::Sender<ConfigSnapshot>,
    cancel: CancellationToken,
) -> ConsoleResult<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .ok_or_else(|| ConsoleError::Store(format!("not a file path: {}", path.display())))?;

    let (event_tx, mut event_rx) = mpsc::channel::<notify::Result<notify::Event>>(128);
    let mut watcher = notify::recommended_watcher(move |res| {
        if event_tx.blocking_send(res).is_err() {
            debug!(target: "atmconsole::watch", "Watch channel closed");
        }
    })
    .map_err(|e| ConsoleError::Store(format!("failed to start watcher: {e}")))?;
    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .map_err(|e| ConsoleError::Store(format!("failed to watch {}: {e}", dir.display())))?;

    info!(target: "atmconsole::watch", path = %path.display(), ?debounce, "Watching store file");

    let mut deadline: Option<Instant> = None;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            incoming = event_rx.recv() => {
                match incoming {
                    Some(Ok(event)) => {
                        if event.paths.iter().any(|p| p.file_name() == Some(file_name.as_os_str())) {
                            deadline = Some(Instant::now() + debounce);
                        }
                    }
                    Some(Err(e)) => {
                        warn!(target: "atmconsole::watch", error = %e, "Watcher error");
                    }
                    None => break,
                }
            }
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                deadline = None;
                match read_state(&path).await {
                    Ok(state) => {
                        if tx.send(ConfigSnapshot::new(state.config)).await.is_err() {
                            debug!(target: "atmconsole::watch", "Snapshot receiver dropped");
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(target: "atmconsole::watch", error = %e, "Failed to reload store file");
                    }
                }
            }
        }
    }

    info!(target: "atmconsole::watch", path = %path.display(), "Watch ended");
    Ok(())
}
