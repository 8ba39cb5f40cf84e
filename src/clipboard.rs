//! Copy-to-clipboard export: places the embeddable widget snippet on the
//! clipboard and tracks the short-lived "copied" acknowledgment.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::normalize::widget_snippet;

/// How long the "copied" acknowledgment stays visible.
pub const COPY_ACK: Duration = Duration::from_secs(3);

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),

    #[error("failed to set clipboard text: {0}")]
    Write(String),
}

pub trait ClipboardSink: Send + Sync {
    fn set_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// The desktop clipboard via `arboard`. A handle is opened per copy since
/// the platform clipboard may not be shareable across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn set_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
        clipboard
            .set_text(text.to_owned())
            .map_err(|e| ClipboardError::Write(e.to_string()))
    }
}

/// Holds the last copied text.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Mutex<Option<String>>,
}

impl MemoryClipboard {
    pub fn contents(&self) -> Option<String> {
        self.contents.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl ClipboardSink for MemoryClipboard {
    fn set_text(&self, text: &str) -> Result<(), ClipboardError> {
        *self.contents.lock().unwrap_or_else(|e| e.into_inner()) = Some(text.to_owned());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyStatus {
    Idle,
    Copied,
}

/// Copies fragments and remembers when the last copy succeeded.
pub struct CopyTracker<C> {
    clipboard: C,
    last_copy: Mutex<Option<Instant>>,
}

impl<C: ClipboardSink> CopyTracker<C> {
    pub fn new(clipboard: C) -> Self {
        Self {
            clipboard,
            last_copy: Mutex::new(None),
        }
    }

    pub fn clipboard(&self) -> &C {
        &self.clipboard
    }

    /// Place the widget snippet for `fragment` on the clipboard. Copying the
    /// same fragment again leaves the clipboard with identical contents.
    pub fn copy_fragment(&self, fragment: &str) -> bool {
        self.copy_fragment_at(fragment, Instant::now())
    }

    pub fn copy_fragment_at(&self, fragment: &str, now: Instant) -> bool {
        match self.clipboard.set_text(&widget_snippet(fragment)) {
            Ok(()) => {
                *self.last_copy.lock().unwrap_or_else(|e| e.into_inner()) = Some(now);
                log::info!("copied widget snippet ({} bytes of fragment)", fragment.len());
                true
            }
            Err(e) => {
                log::error!("copy failed: {e}");
                false
            }
        }
    }

    pub fn status(&self) -> CopyStatus {
        self.status_at(Instant::now())
    }

    /// `Copied` for [`COPY_ACK`] after a successful copy, then `Idle`.
    pub fn status_at(&self, now: Instant) -> CopyStatus {
        match *self.last_copy.lock().unwrap_or_else(|e| e.into_inner()) {
            Some(at) if now.saturating_duration_since(at) < COPY_ACK => CopyStatus::Copied,
            _ => CopyStatus::Idle,
        }
    }
}
