//! Local exporter: renders the preview card in-process, no network.

use std::sync::Arc;

use crate::engine::{ForgeEngine, RenderEngine};
use crate::error::ExportError;
use crate::exporter::Exporter;
use crate::normalize::normalize;
use crate::pipeline::PipelineConfig;
use crate::request::{local_filename, ExportArtifact, ExportRequest, ExportStrategy, Orientation};

/// Renders through an installed [`RenderEngine`]. Output is always portrait.
#[derive(Clone)]
pub struct LocalExporter {
    engine: Option<Arc<dyn RenderEngine>>,
    config: PipelineConfig,
}

impl LocalExporter {
    pub fn new(engine: Arc<dyn RenderEngine>) -> Self {
        Self {
            engine: Some(engine),
            config: PipelineConfig::default(),
        }
    }

    /// An exporter with the in-process engine installed.
    pub fn forge() -> Self {
        Self::new(Arc::new(ForgeEngine))
    }

    /// An exporter with no engine; every export fails with
    /// [`ExportError::RendererUnavailable`].
    pub fn unavailable() -> Self {
        Self {
            engine: None,
            config: PipelineConfig::default(),
        }
    }

    /// Override page/raster settings. Orientation is always forced to portrait.
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = PipelineConfig {
            orientation: Orientation::Portrait,
            ..config
        };
        self
    }
}

impl std::fmt::Debug for LocalExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalExporter")
            .field("engine", &self.engine.as_ref().map(|e| e.name().to_string()))
            .field("config", &self.config)
            .finish()
    }
}

impl Exporter for LocalExporter {
    async fn export(&self, request: &ExportRequest) -> Result<ExportArtifact, ExportError> {
        let Some(engine) = self.engine.clone() else {
            log::error!("local export requested but no renderer is installed");
            return Err(ExportError::RendererUnavailable);
        };
        if request.orientation == Orientation::Landscape {
            log::warn!("local export only renders portrait; ignoring landscape request");
        }

        let document = normalize(&request.fragment);
        let config = self.config.clone();
        log::info!("local export started ({} engine)", engine.name());

        let rendered = tokio::task::spawn_blocking(move || engine.render(&document, &config))
            .await
            .map_err(|e| {
                if e.is_panic() {
                    ExportError::RenderFailure("renderer panicked".to_string())
                } else {
                    ExportError::RenderFailure(e.to_string())
                }
            })?
            .map_err(|e| ExportError::RenderFailure(e.to_string()))?;

        if rendered.is_empty() {
            return Err(ExportError::RenderFailure("renderer produced no bytes".to_string()));
        }

        log::info!("local export finished ({} bytes)", rendered.len());
        Ok(ExportArtifact {
            filename: local_filename(),
            bytes: rendered,
            orientation: Orientation::Portrait,
            strategy: ExportStrategy::Local,
        })
    }
}
