//! Rendering engines usable by the local exporter.

use crate::error::EngineError;
use crate::normalize::NormalizedDocument;
use crate::pipeline::{generate_pdf, PipelineConfig};

/// Turns a normalized document into PDF bytes. Implementations are called
/// from a blocking worker thread and may take their time.
pub trait RenderEngine: Send + Sync {
    fn name(&self) -> &str;

    fn render(&self, document: &NormalizedDocument, config: &PipelineConfig) -> Result<Vec<u8>, EngineError>;
}

/// The in-process engine: parse, style, lay out with taffy, paint with printpdf.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForgeEngine;

impl RenderEngine for ForgeEngine {
    fn name(&self) -> &str {
        "forge"
    }

    fn render(&self, document: &NormalizedDocument, config: &PipelineConfig) -> Result<Vec<u8>, EngineError> {
        let (bytes, layout) = generate_pdf(document.html(), config)?;
        log::info!(
            "{} rendered {} page(s), {} bytes",
            self.name(),
            layout.pages.len(),
            bytes.len()
        );
        Ok(bytes)
    }
}
