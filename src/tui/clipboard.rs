//! Clipboard access for copying the preview URL.
//!
//! On Linux the clipboard content lives only as long as the owning
//! `arboard::Clipboard`, so a background thread holds each copy for a while
//! instead of dropping it on the UI thread right away.

use anyhow::Result;
use std::sync::mpsc as std_mpsc;
use std::sync::OnceLock;
use std::time::Duration;

const HOLD_FOR: Duration = Duration::from_secs(2);

static CLIPBOARD_TX: OnceLock<std_mpsc::Sender<String>> = OnceLock::new();

fn clipboard_worker() -> &'static std_mpsc::Sender<String> {
    CLIPBOARD_TX.get_or_init(|| {
        let (tx, rx) = std_mpsc::channel::<String>();
        std::thread::spawn(move || {
            for text in rx {
                match arboard::Clipboard::new() {
                    Ok(mut clipboard) => match clipboard.set_text(text) {
                        Ok(()) => std::thread::sleep(HOLD_FOR),
                        Err(e) => tracing::warn!("clipboard write failed: {e}"),
                    },
                    Err(e) => tracing::warn!("clipboard unavailable: {e}"),
                }
            }
        });
        tx
    })
}

/// Queue `text` for the clipboard and return without blocking.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    clipboard_worker()
        .send(text.to_string())
        .map_err(|_| anyhow::anyhow!("clipboard worker stopped"))
}
