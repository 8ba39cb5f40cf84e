//! The export capability shared by both strategies, and the service that
//! picks one per request.

use std::future::Future;

use crate::error::ExportError;
use crate::local::LocalExporter;
use crate::remote::RemoteExporter;
use crate::request::{ExportArtifact, ExportRequest, ExportStrategy};

/// Converts one request into a PDF artifact.
pub trait Exporter {
    fn export(&self, request: &ExportRequest) -> impl Future<Output = Result<ExportArtifact, ExportError>> + Send;
}

/// Holds both exporters; the only place that branches on strategy.
#[derive(Debug, Clone)]
pub struct ExportService {
    local: LocalExporter,
    remote: RemoteExporter,
}

impl ExportService {
    pub fn new(local: LocalExporter, remote: RemoteExporter) -> Self {
        Self { local, remote }
    }

    pub fn local(&self) -> &LocalExporter {
        &self.local
    }

    pub fn remote(&self) -> &RemoteExporter {
        &self.remote
    }
}

impl Exporter for ExportService {
    async fn export(&self, request: &ExportRequest) -> Result<ExportArtifact, ExportError> {
        log::info!(
            "export requested: strategy={} orientation={}",
            request.strategy,
            request.orientation
        );
        match request.strategy {
            ExportStrategy::Local => self.local.export(request).await,
            ExportStrategy::Remote => self.remote.export(request).await,
        }
    }
}
