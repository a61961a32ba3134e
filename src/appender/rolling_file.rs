//! Size-triggered rotation of one growing file into a bounded backup chain.
//!
//! The active file lives at `path`; backups are `path.1` (newest) through
//! `path.N` (oldest). A rollover drops `path.N`, shifts every other backup
//! one slot up, renames `path` to `path.1` and starts a fresh `path`. With
//! `N == 0` the active file is truncated in place instead.

use super::{AppendEngine, AppenderError, AppenderSkeleton, ConfigError, Layout, options};
use crate::domain::LoggingEvent;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10MB
const DEFAULT_MAX_BACKUP_INDEX: u32 = 1;
const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

struct ActiveFile {
    writer: BufWriter<File>,
}

pub struct RollingFileWriter {
    path: Option<PathBuf>,
    append: bool,
    immediate_flush: bool,
    buffer_size: usize,
    max_file_size: u64,
    max_backup_index: u32,

    name: String,
    output: Option<ActiveFile>,
    // Bytes in the active file, including what was there when it was opened.
    written: u64,
    // Raised past `max_file_size` after a failed rollover.
    next_rollover: u64,
}

impl RollingFileWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    pub fn with_max_backup_index(mut self, count: u32) -> Self {
        self.max_backup_index = count;
        self
    }

    pub fn with_append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    pub fn with_immediate_flush(mut self, immediate_flush: bool) -> Self {
        self.immediate_flush = immediate_flush;
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    pub fn max_backup_index(&self) -> u32 {
        self.max_backup_index
    }

    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    fn required_path(&self) -> Result<PathBuf, ConfigError> {
        self.path
            .clone()
            .ok_or_else(|| ConfigError::MissingOption("File".to_string()))
    }

    fn open(&mut self, path: &Path, append: bool) -> Result<(), AppenderError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|source| AppenderError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        }

        let mut open_options = OpenOptions::new();
        open_options.create(true);
        if append {
            open_options.append(true);
        } else {
            open_options.write(true).truncate(true);
        }

        let file = open_options.open(path).map_err(|source| AppenderError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        self.written = if append {
            file.metadata().map(|m| m.len()).unwrap_or(0)
        } else {
            0
        };
        self.output = Some(ActiveFile {
            writer: BufWriter::with_capacity(self.buffer_size, file),
        });

        debug!(
            appender = %self.name,
            path = %path.display(),
            size = self.written,
            "opened log file"
        );
        Ok(())
    }

    fn close_output(&mut self) {
        if let Some(mut active) = self.output.take()
            && let Err(e) = active.writer.flush()
        {
            warn!(appender = %self.name, error = %e, "failed to flush log file on close");
        }
    }

    /// Shifts the backup chain and starts a fresh active file.
    ///
    /// On failure the active file is reopened for append so nothing already
    /// written is lost, and the next attempt is deferred by another
    /// `max_file_size` bytes.
    fn roll_over(&mut self) -> Result<(), AppenderError> {
        let path = self.required_path()?;
        let size_before = self.written;

        // Buffered bytes must reach the file before it is renamed away.
        if let Some(active) = self.output.as_mut()
            && let Err(source) = active.writer.flush()
        {
            error!(
                appender = %self.name,
                path = %path.display(),
                error = %source,
                "flush before rollover failed, keeping current file"
            );
            self.next_rollover = self.written.saturating_add(self.max_file_size);
            return Err(AppenderError::Rollover { path, source });
        }
        self.close_output();

        if self.max_backup_index == 0 {
            self.open(&path, false)?;
            self.next_rollover = self.max_file_size;
            info!(
                appender = %self.name,
                path = %path.display(),
                size = size_before,
                "truncated log file in place"
            );
            return Ok(());
        }

        match shift_backups(&path, self.max_backup_index) {
            Ok(()) => {
                self.open(&path, false)?;
                self.next_rollover = self.max_file_size;
                info!(
                    appender = %self.name,
                    path = %path.display(),
                    size = size_before,
                    backups = self.max_backup_index,
                    "rolled over log file"
                );
                Ok(())
            }
            Err(source) => {
                error!(
                    appender = %self.name,
                    path = %path.display(),
                    error = %source,
                    "rollover failed, continuing with current file"
                );
                self.open(&path, true)?;
                self.next_rollover = self.written.saturating_add(self.max_file_size);
                Err(AppenderError::Rollover { path, source })
            }
        }
    }
}

impl Default for RollingFileWriter {
    fn default() -> Self {
        Self {
            path: None,
            append: true,
            immediate_flush: true,
            buffer_size: DEFAULT_BUFFER_SIZE,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_backup_index: DEFAULT_MAX_BACKUP_INDEX,
            name: String::new(),
            output: None,
            written: 0,
            next_rollover: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl AppendEngine for RollingFileWriter {
    fn requires_layout(&self) -> bool {
        true
    }

    fn set_option(&mut self, option: &str, value: &str) -> Result<(), ConfigError> {
        if option.eq_ignore_ascii_case("File") {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Err(ConfigError::invalid_option(option, value, "path is empty"));
            }
            self.path = Some(PathBuf::from(trimmed));
        } else if option.eq_ignore_ascii_case("Append") {
            self.append = options::to_bool(option, value)?;
        } else if option.eq_ignore_ascii_case("ImmediateFlush") {
            self.immediate_flush = options::to_bool(option, value)?;
        } else if option.eq_ignore_ascii_case("BufferSize") {
            self.buffer_size = options::to_usize(option, value)?;
        } else if option.eq_ignore_ascii_case("MaxFileSize") {
            self.max_file_size = options::to_file_size(option, value)?;
        } else if option.eq_ignore_ascii_case("MaxBackupIndex") {
            self.max_backup_index = options::to_u32(option, value)?;
        }
        Ok(())
    }

    fn activate(&mut self, name: &str) -> Result<(), AppenderError> {
        let path = self.required_path()?;
        self.name = name.to_string();
        self.open(&path, self.append)?;
        self.next_rollover = self.max_file_size;
        Ok(())
    }

    fn append(&mut self, event: &LoggingEvent, layout: Option<&dyn Layout>) -> Result<(), AppenderError> {
        let Some(layout) = layout else {
            return Err(ConfigError::MissingLayout(self.name.clone()).into());
        };

        if self.output.is_none() {
            // A previous rollover could not reopen the file; try again.
            let path = self.required_path()?;
            self.open(&path, true)?;
        }

        let text = layout.format(event);
        if let Some(active) = self.output.as_mut() {
            active.writer.write_all(text.as_bytes())?;
            if self.immediate_flush {
                active.writer.flush()?;
            }
        }
        self.written = self.written.saturating_add(text.len() as u64);

        if self.written >= self.max_file_size && self.written >= self.next_rollover {
            self.roll_over()?;
        }
        Ok(())
    }

    fn release(&mut self, _name: &str) {
        self.close_output();
    }
}

impl AppenderSkeleton<RollingFileWriter> {
    pub fn file_path(&self) -> Option<PathBuf> {
        self.with_engine(|engine| engine.path.clone())
    }

    /// Size of the active file as tracked by the writer.
    pub fn bytes_written(&self) -> u64 {
        self.with_engine(|engine| engine.bytes_written())
    }
}

/// `path.k`
pub fn backup_path(path: &Path, index: u32) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

fn shift_backups(path: &Path, max_backup_index: u32) -> io::Result<()> {
    let oldest = backup_path(path, max_backup_index);
    if oldest.exists() {
        fs::remove_file(&oldest)?;
    }

    for index in (1..max_backup_index).rev() {
        let from = backup_path(path, index);
        if from.exists() {
            fs::rename(&from, backup_path(path, index + 1))?;
        }
    }

    fs::rename(path, backup_path(path, 1))
}
