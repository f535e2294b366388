//! Run log sink.
//!
//! One [`LogSink`] is opened per run and handed by `&mut` to every component
//! that produces subprocess output. Nothing writes to a global log.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use anyhow::{Context, Result};

use crate::util::process::ProcessBuilder;

/// Destination for image-build and container output.
#[derive(Debug)]
pub enum LogSink {
    /// Append to a file on disk.
    File { path: PathBuf, file: File },
    /// Collect in memory.
    Memory(Vec<u8>),
    /// Drop everything.
    Discard,
}

impl LogSink {
    /// Open (or create) a log file in append mode.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create log directory: {}", parent.display())
                })?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open log file: {}", path.display()))?;

        Ok(LogSink::File { path, file })
    }

    pub fn memory() -> Self {
        LogSink::Memory(Vec::new())
    }

    pub fn discard() -> Self {
        LogSink::Discard
    }

    /// Path of the backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            LogSink::File { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Collected output of a memory sink.
    pub fn contents(&self) -> Option<&[u8]> {
        match self {
            LogSink::Memory(buf) => Some(buf),
            _ => None,
        }
    }

    /// Run a process with both output streams sent to this sink.
    pub fn run(&mut self, process: &ProcessBuilder) -> Result<ExitStatus> {
        match self {
            LogSink::File { path, file } => {
                let out = file
                    .try_clone()
                    .with_context(|| format!("failed to share log file: {}", path.display()))?;
                let err = file
                    .try_clone()
                    .with_context(|| format!("failed to share log file: {}", path.display()))?;
                process.status_to(Stdio::from(out), Stdio::from(err))
            }
            LogSink::Memory(buf) => {
                let output = process.exec()?;
                buf.extend_from_slice(&output.stdout);
                buf.extend_from_slice(&output.stderr);
                Ok(output.status)
            }
            LogSink::Discard => process.status_to(Stdio::null(), Stdio::null()),
        }
    }
}

impl Write for LogSink {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        match self {
            LogSink::File { file, .. } => file.write(data),
            LogSink::Memory(buf) => buf.write(data),
            LogSink::Discard => Ok(data.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            LogSink::File { file, .. } => file.flush(),
            _ => Ok(()),
        }
    }
}
