//! Error types for the export subsystem.

use std::time::Duration;

use thiserror::Error;

use crate::content::ContentGenerationError;
use crate::download::DownloadError;

/// Errors raised by the layout engine while turning a document into PDF bytes.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The requested container id is not present in the document.
    #[error("container #{0} not found in document")]
    ContainerNotFound(String),

    /// Layout computation failed.
    #[error("layout error: {0}")]
    Layout(String),

    /// PDF assembly failed.
    #[error("paint error: {0}")]
    Paint(String),
}

impl From<taffy::TaffyError> for EngineError {
    fn from(err: taffy::TaffyError) -> Self {
        EngineError::Layout(err.to_string())
    }
}

/// Terminal failure of one export attempt.
#[derive(Debug, Error)]
pub enum ExportError {
    /// No rendering engine is installed for the local path.
    #[error("local renderer unavailable; use the remote export instead")]
    RendererUnavailable,

    /// The local engine failed or panicked mid-render.
    #[error("local render failed: {0}")]
    RenderFailure(String),

    /// The render service rejected the request for quota reasons.
    #[error("too many exports; wait {}s and try again", .retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    /// Any other remote failure (status, transport, empty body).
    #[error("export failed: {0}; check that the render service is reachable")]
    ExportFailure(String),

    /// The upstream content generator failed. Propagated untouched.
    #[error(transparent)]
    ContentGeneration(#[from] ContentGenerationError),

    /// The remote path never sends an empty fragment.
    #[error("nothing to export: the HTML fragment is empty")]
    EmptyFragment,

    /// The artifact was produced but could not be handed to the download surface.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Another export is already in flight for this controller.
    #[error("an export is already in progress")]
    Busy,
}

impl ExportError {
    /// Data-only kind of this failure, as stored by the export state machine.
    /// `Busy` never reaches the state machine and has no kind.
    pub fn kind(&self) -> Option<FailureKind> {
        Some(match self {
            ExportError::RendererUnavailable => FailureKind::RendererUnavailable,
            ExportError::RenderFailure(_) => FailureKind::RenderFailure,
            ExportError::RateLimited { .. } => FailureKind::RateLimited,
            ExportError::ExportFailure(_) | ExportError::EmptyFragment => FailureKind::ExportFailure,
            ExportError::ContentGeneration(_) => FailureKind::ContentGeneration,
            ExportError::Download(_) => FailureKind::Download,
            ExportError::Busy => return None,
        })
    }

    /// True when the same request may succeed if the user retries later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExportError::RateLimited { .. } | ExportError::ExportFailure(_) | ExportError::Busy
        )
    }
}

/// Failure kinds surfaced by [`crate::session::ExportState::Failed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    RendererUnavailable,
    RenderFailure,
    RateLimited,
    ExportFailure,
    ContentGeneration,
    Download,
}

/// Invalid configuration value.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid endpoint url: {0}")]
    Endpoint(#[from] url::ParseError),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}
