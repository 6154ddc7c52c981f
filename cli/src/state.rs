//! Snapshot-backed registry state on disk.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ecn_registry::{CertificateRegistry, RegistrySnapshot};
use ecn_types::Clock;

use crate::CliError;

/// The single file holding a registry snapshot.
#[derive(Clone, Debug)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn io_error(&self, source: std::io::Error) -> CliError {
        CliError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Read and restore the registry. Restoring re-checks the accounting, so
    /// a tampered file is refused here rather than used.
    pub fn load(&self, clock: Arc<dyn Clock>) -> Result<CertificateRegistry, CliError> {
        let bytes = std::fs::read(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => CliError::NotInitialised(self.path.clone()),
            _ => self.io_error(e),
        })?;
        let snapshot = RegistrySnapshot::from_bytes(&bytes)?;
        Ok(CertificateRegistry::restore(snapshot, clock)?)
    }

    /// Sibling file the next snapshot is staged in. Distinct from the state
    /// file whatever its extension, and from other writers' staging files.
    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".tmp-{}", std::process::id()));
        self.path.with_file_name(name)
    }

    /// Write via a sibling temp file and rename, so a crash mid-write leaves
    /// the previous snapshot intact. The temp file is removed on failure.
    pub fn save(&self, snapshot: &RegistrySnapshot) -> Result<(), CliError> {
        let bytes = snapshot.to_bytes()?;
        let staging = self.staging_path();
        let written =
            std::fs::write(&staging, bytes).and_then(|()| std::fs::rename(&staging, &self.path));
        if let Err(e) = written {
            let _ = std::fs::remove_file(&staging);
            return Err(self.io_error(e));
        }
        tracing::debug!(path = %self.path.display(), "state saved");
        Ok(())
    }
}
