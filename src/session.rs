//! Single-flight export controller.
//!
//! One export may be in flight per controller. The controller owns the
//! state machine, runs the exporter, and hands successful artifacts to the
//! download sink; failures never reach the sink.

use std::sync::{Mutex, MutexGuard};

use crate::content::ContentSource;
use crate::download::{Delivered, DownloadSink};
use crate::error::{ExportError, FailureKind};
use crate::exporter::Exporter;
use crate::request::{ExportRequest, ExportStrategy, Orientation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportState {
    Idle,
    Exporting,
    Succeeded,
    Failed(FailureKind),
}

impl ExportState {
    pub fn is_busy(&self) -> bool {
        *self == ExportState::Exporting
    }
}

pub struct ExportController<E, S> {
    exporter: E,
    sink: S,
    state: Mutex<ExportState>,
}

/// Marks the controller busy; dropping it before `finish` (a cancelled
/// export) returns the controller to `Idle`.
struct InFlight<'a> {
    state: &'a Mutex<ExportState>,
    finished: bool,
}

impl InFlight<'_> {
    fn finish<T>(mut self, result: &Result<T, ExportError>) {
        let next = match result {
            Ok(_) => ExportState::Succeeded,
            Err(e) => e.kind().map_or(ExportState::Idle, ExportState::Failed),
        };
        *lock(self.state) = next;
        self.finished = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.finished {
            *lock(self.state) = ExportState::Idle;
        }
    }
}

fn lock(state: &Mutex<ExportState>) -> MutexGuard<'_, ExportState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

impl<E: Exporter, S: DownloadSink> ExportController<E, S> {
    pub fn new(exporter: E, sink: S) -> Self {
        Self {
            exporter,
            sink,
            state: Mutex::new(ExportState::Idle),
        }
    }

    pub fn state(&self) -> ExportState {
        *lock(&self.state)
    }

    pub fn exporter(&self) -> &E {
        &self.exporter
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn begin(&self) -> Result<InFlight<'_>, ExportError> {
        let mut state = lock(&self.state);
        if state.is_busy() {
            log::warn!("export rejected: another export is in progress");
            return Err(ExportError::Busy);
        }
        *state = ExportState::Exporting;
        Ok(InFlight {
            state: &self.state,
            finished: false,
        })
    }

    /// Export `request` and deliver the artifact. A call made while another
    /// export is running fails with [`ExportError::Busy`] and changes nothing.
    pub async fn run(&self, request: ExportRequest) -> Result<Delivered, ExportError> {
        let in_flight = self.begin()?;
        let result = self.export_and_deliver(&request).await;
        in_flight.finish(&result);
        result
    }

    /// Generate the fragment from `source`, then export it. A generation
    /// failure is propagated unchanged.
    pub async fn generate_and_export<C: ContentSource>(
        &self,
        source: &C,
        input: &str,
        orientation: Orientation,
        strategy: ExportStrategy,
    ) -> Result<Delivered, ExportError> {
        let in_flight = self.begin()?;
        let result = match source.generate(input).await {
            Ok(fragment) => {
                self.export_and_deliver(&ExportRequest::new(fragment, orientation, strategy))
                    .await
            }
            Err(e) => Err(ExportError::from(e)),
        };
        in_flight.finish(&result);
        result
    }

    async fn export_and_deliver(&self, request: &ExportRequest) -> Result<Delivered, ExportError> {
        let outcome = match self.exporter.export(request).await {
            Ok(artifact) => self.sink.deliver(&artifact).map_err(ExportError::from),
            Err(e) => Err(e),
        };
        if let Err(e) = &outcome {
            log::error!("export failed: {e}");
        }
        outcome
    }
}
