//! Download surface: where finished artifacts are handed to the user.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;
use thiserror::Error;

use crate::request::ExportArtifact;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("download directory {0} does not exist")]
    MissingDirectory(PathBuf),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("refusing to deliver an empty artifact")]
    EmptyArtifact,
}

/// Record of one completed delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivered {
    pub filename: String,
    /// Final location, when the sink writes to disk.
    pub path: Option<PathBuf>,
    pub len: usize,
}

pub trait DownloadSink: Send + Sync {
    /// Deliver the whole artifact or nothing.
    fn deliver(&self, artifact: &ExportArtifact) -> Result<Delivered, DownloadError>;
}

/// Saves artifacts into a directory. Bytes go to a temporary file in the
/// same directory which is renamed into place once fully written; on any
/// error the temporary file is removed and no partial file is left behind.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSink for DirectorySink {
    fn deliver(&self, artifact: &ExportArtifact) -> Result<Delivered, DownloadError> {
        if artifact.is_empty() {
            return Err(DownloadError::EmptyArtifact);
        }
        if !self.dir.is_dir() {
            return Err(DownloadError::MissingDirectory(self.dir.clone()));
        }
        let target = self.dir.join(&artifact.filename);
        let write_err = |source| DownloadError::Write {
            path: target.clone(),
            source,
        };

        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(write_err)?;
        tmp.write_all(&artifact.bytes).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&target).map_err(|e| write_err(e.error))?;

        log::info!("saved {} ({} bytes)", target.display(), artifact.len());
        Ok(Delivered {
            filename: artifact.filename.clone(),
            path: Some(target),
            len: artifact.len(),
        })
    }
}

/// Keeps deliveries in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    deliveries: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// File names delivered so far, in order.
    pub fn filenames(&self) -> Vec<String> {
        self.lock().iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn count(&self) -> usize {
        self.lock().len()
    }

    /// Bytes of the most recent delivery.
    pub fn last_bytes(&self) -> Option<Vec<u8>> {
        self.lock().last().map(|(_, bytes)| bytes.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(String, Vec<u8>)>> {
        // A poisoned log is still a valid log.
        self.deliveries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl DownloadSink for MemorySink {
    fn deliver(&self, artifact: &ExportArtifact) -> Result<Delivered, DownloadError> {
        if artifact.is_empty() {
            return Err(DownloadError::EmptyArtifact);
        }
        self.lock()
            .push((artifact.filename.clone(), artifact.bytes.clone()));
        Ok(Delivered {
            filename: artifact.filename.clone(),
            path: None,
            len: artifact.len(),
        })
    }
}

impl<T: DownloadSink + ?Sized> DownloadSink for std::sync::Arc<T> {
    fn deliver(&self, artifact: &ExportArtifact) -> Result<Delivered, DownloadError> {
        (**self).deliver(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{ExportStrategy, Orientation};

    fn artifact(bytes: &[u8]) -> ExportArtifact {
        ExportArtifact {
            filename: "guia-comunidadfeliz.pdf".to_string(),
            bytes: bytes.to_vec(),
            orientation: Orientation::Portrait,
            strategy: ExportStrategy::Local,
        }
    }

    #[test]
    fn directory_sink_writes_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path());
        let delivered = sink.deliver(&artifact(b"%PDF-1.7")).unwrap();
        let path = delivered.path.unwrap();
        assert_eq!(path, dir.path().join("guia-comunidadfeliz.pdf"));
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.7");
        // Only the final file remains.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn directory_sink_rejects_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path().join("nope"));
        assert!(matches!(
            sink.deliver(&artifact(b"%PDF")),
            Err(DownloadError::MissingDirectory(_))
        ));
    }

    #[test]
    fn empty_artifacts_are_never_delivered() {
        let dir = tempfile::tempdir().unwrap();
        assert!(DirectorySink::new(dir.path()).deliver(&artifact(b"")).is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

        let mem = MemorySink::new();
        assert!(mem.deliver(&artifact(b"")).is_err());
        assert_eq!(mem.count(), 0);
    }
}
