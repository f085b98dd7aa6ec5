use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use tempfile::NamedTempFile;

use crate::error::Error;

/// Error unless the input file is already there. Every configured input
/// is checked up front rather than failing halfway through aggregation.
pub(crate) fn require_file_exists(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(Error::MissingInput(path.to_path_buf()).into());
    }
    Ok(())
}

/// Create the directory if it doesn’t exist; error if a non-directory
/// exists there.
pub(crate) fn ensure_dir_exists(path: &Path) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            anyhow::bail!("Path exists but is not a directory: {}", path.display());
        }
    } else {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory {}", path.display()))?;
    }
    Ok(())
}

/// Opens a possibly gzip-compressed input for buffered reading. MATSim
/// writes its XML outputs gzipped by default.
pub(crate) fn open_maybe_gzip(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    Ok(if path.extension().is_some_and(|ext| ext == "gz") {
        Box::new(BufReader::new(GzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    })
}

/// Write-then-rename wrapper for table outputs.
pub(crate) struct PendingWrite {
    target: PathBuf,
    tmp: Option<NamedTempFile>,
}

pub(crate) fn open_for_write(target: &Path) -> Result<PendingWrite> {
    let parent = target.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = parent {
        fs::create_dir_all(parent)
            .with_context(|| format!("create dir {}", parent.display()))?;
    }
    let tmp = NamedTempFile::new_in(parent.unwrap_or(Path::new(".")))
        .context("create temp file")?;
    Ok(PendingWrite { target: target.to_path_buf(), tmp: Some(tmp) })
}

impl Write for PendingWrite {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.tmp.as_mut().unwrap().write(buf)
    }
    fn flush(&mut self) -> std::io::Result<()> {
        self.tmp.as_mut().unwrap().flush()
    }
}

pub(crate) fn finalize_write(mut pending: PendingWrite) -> Result<()> {
    let tmp = pending.tmp.take().expect("not finalized");
    tmp.as_file().sync_all().ok(); // best-effort fsync
    tmp.persist(&pending.target)
        .with_context(|| format!("rename to {}", pending.target.display()))?;
    Ok(())
}
