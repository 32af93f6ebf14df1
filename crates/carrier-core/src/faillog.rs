use crate::error::Result;
use std::io::Write;
use std::path::PathBuf;

/// Append-only log of unit names the endpoint rejected, one per line.
///
/// Written for offline triage; the controller never reads it back. No
/// dedup — the same name may appear more than once across runs.
pub struct FailureLog {
    path: PathBuf,
}

impl FailureLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn append(&self, name: &str) -> Result<()> {
        let mut f = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(f, "{name}")?;
        Ok(())
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}
