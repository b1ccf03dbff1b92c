use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::{NamedTempFile, TempPath};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure output directory exists; create if missing. Idempotent.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    Ok(())
}

/// Writes whole files into one directory via a temp file and a rename, so a
/// reader never observes a half-written target.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write(&self, filename: &str, content: &str) -> Result<PathBuf, PersistError> {
        let mut tmp = self.stage()?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        self.commit(tmp.into_temp_path(), filename)
    }

    /// Open a temp file in the target directory for callers that stream content.
    pub fn stage(&self) -> Result<NamedTempFile, PersistError> {
        ensure_output_dir(&self.dir)?;
        Ok(NamedTempFile::new_in(&self.dir)?)
    }

    /// Move a staged file to `{dir}/{filename}`, replacing any previous file.
    pub fn commit(&self, staged: TempPath, filename: &str) -> Result<PathBuf, PersistError> {
        let target = self.dir.join(filename);
        if target.exists() {
            fs::remove_file(&target)?;
        }
        staged.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}
