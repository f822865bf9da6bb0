//! Size-based rotating file writer
//!
//! The active file keeps its configured name; rotated backups are numbered
//! `<name>.1` (newest) to `<name>.N` (oldest), with a `.gz` suffix when
//! compression is enabled. Rotation, retention and age purging all happen
//! under the same lock as the write that triggered them.

use crate::core::{LoggerError, Result, WriteSyncer};
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

const BYTES_PER_MB: u64 = 1024 * 1024;
const GZ_SUFFIX: &str = ".gz";

/// Retention and size limits for a rotating file
///
/// # Examples
///
/// ```
/// use tee_logger::writers::RotationPolicy;
/// use std::time::Duration;
///
/// // 50 MB files, keep 7 compressed backups for at most a week
/// let policy = RotationPolicy::new()
///     .with_max_size_mb(50)
///     .with_max_backups(7)
///     .with_max_age(Duration::from_secs(7 * 24 * 3600))
///     .with_compression(true);
/// assert_eq!(policy.max_bytes, 50 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Size at which the active file is rotated; `0` disables rotation
    pub max_bytes: u64,
    /// Backups to keep; `0` keeps all of them
    pub max_backups: usize,
    /// Backups older than this are deleted; `None` keeps them forever
    pub max_age: Option<Duration>,
    /// Gzip backups as they are rotated out
    pub compress: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_bytes: 100 * BYTES_PER_MB,
            max_backups: 0,
            max_age: None,
            compress: false,
        }
    }
}

impl RotationPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_size(mut self, bytes: u64) -> Self {
        self.max_bytes = bytes;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_size_mb(mut self, megabytes: u64) -> Self {
        self.max_bytes = megabytes.saturating_mul(BYTES_PER_MB);
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_backups(mut self, count: usize) -> Self {
        self.max_backups = count;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_age(mut self, age: Duration) -> Self {
        self.max_age = Some(age);
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }

    fn should_rotate(&self, current_size: u64, incoming: u64) -> bool {
        self.max_bytes > 0 && current_size > 0 && current_size + incoming > self.max_bytes
    }
}

struct ActiveFile {
    file: Option<File>,
    size: u64,
}

/// Rotating file writer
///
/// # Examples
///
/// ```no_run
/// use tee_logger::writers::{RotatingFileWriter, RotationPolicy};
/// use tee_logger::WriteSyncer;
///
/// let writer = RotatingFileWriter::new(
///     "/var/log/app.log",
///     RotationPolicy::new().with_max_size_mb(10).with_max_backups(5),
/// )
/// .unwrap();
/// writer.write(b"started\n").unwrap();
/// writer.sync().unwrap();
/// ```
pub struct RotatingFileWriter {
    path: PathBuf,
    name: String,
    policy: RotationPolicy,
    state: Mutex<ActiveFile>,
}

impl RotatingFileWriter {
    /// Open (creating if needed) the active file and prime it: a pre-existing
    /// file already at its size limit is rotated immediately and expired
    /// backups are purged.
    ///
    /// # Errors
    ///
    /// Returns error if the directory or file cannot be created, or the
    /// priming rotation fails
    pub fn new<P: AsRef<Path>>(path: P, policy: RotationPolicy) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let name = path.display().to_string();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation(
                    "create log directory",
                    format!("Failed to create directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        let (file, size) = open_append(&path)?;
        let writer = Self {
            path,
            name,
            policy,
            state: Mutex::new(ActiveFile {
                file: Some(file),
                size,
            }),
        };

        {
            let mut state = writer.state.lock();
            if writer.policy.max_bytes > 0 && state.size >= writer.policy.max_bytes {
                writer.rotate(&mut state)?;
            } else {
                writer.purge_expired();
            }
        }

        Ok(writer)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    /// Bytes in the active file as tracked by the writer
    pub fn current_size(&self) -> u64 {
        self.state.lock().size
    }

    /// Existing backups, newest first
    pub fn backups(&self) -> Vec<PathBuf> {
        let mut backups = self.scan_backups();
        backups.sort_by_key(|(index, _)| *index);
        backups.into_iter().map(|(_, path)| path).collect()
    }

    fn rotate(&self, state: &mut ActiveFile) -> Result<()> {
        // Close the active handle before renaming it
        if let Some(file) = state.file.take() {
            file.sync_all().map_err(|e| {
                LoggerError::file_rotation(
                    self.name.clone(),
                    format!("Failed to sync before rotation: {}", e),
                )
            })?;
        }

        let mut backups = self.scan_backups();
        backups.sort_by(|a, b| b.0.cmp(&a.0));
        for (index, path) in backups {
            if self.policy.max_backups > 0 && index >= self.policy.max_backups {
                if let Err(e) = fs::remove_file(&path) {
                    eprintln!(
                        "[LOGGER WARNING] Failed to remove old backup {}: {}",
                        path.display(),
                        e
                    );
                }
                continue;
            }
            let compressed = path.to_string_lossy().ends_with(GZ_SUFFIX);
            let target = self.backup_path(index + 1, compressed);
            fs::rename(&path, &target).map_err(|e| {
                LoggerError::file_rotation(
                    path.display().to_string(),
                    format!("Failed to shift backup: {}", e),
                )
            })?;
        }

        let newest = self.backup_path(1, false);
        fs::rename(&self.path, &newest).map_err(|e| {
            LoggerError::file_rotation(
                self.name.clone(),
                format!("Failed to rotate current log file: {}", e),
            )
        })?;
        if self.policy.compress {
            compress_file(&newest, &self.backup_path(1, true))?;
        }

        let (file, size) = open_append(&self.path)?;
        state.file = Some(file);
        state.size = size;

        self.purge_expired();
        Ok(())
    }

    fn purge_expired(&self) {
        let Some(max_age) = self.policy.max_age else {
            return;
        };
        let Some(cutoff) = SystemTime::now().checked_sub(max_age) else {
            return;
        };

        for (_, path) in self.scan_backups() {
            let modified = fs::metadata(&path).and_then(|m| m.modified());
            if matches!(modified, Ok(time) if time < cutoff) {
                if let Err(e) = fs::remove_file(&path) {
                    eprintln!(
                        "[LOGGER WARNING] Failed to remove expired backup {}: {}",
                        path.display(),
                        e
                    );
                }
            }
        }
    }

    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn backup_path(&self, index: usize, compressed: bool) -> PathBuf {
        let suffix = if compressed { GZ_SUFFIX } else { "" };
        self.path
            .with_file_name(format!("{}.{}{}", self.file_name(), index, suffix))
    }

    /// Backups next to the active file as `(index, path)`, in directory order
    fn scan_backups(&self) -> Vec<(usize, PathBuf)> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let Ok(entries) = fs::read_dir(&dir) else {
            return Vec::new();
        };

        let prefix = format!("{}.", self.file_name());
        entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                let rest = name.strip_prefix(&prefix)?;
                let digits = rest.strip_suffix(GZ_SUFFIX).unwrap_or(rest);
                let index = digits.parse::<usize>().ok().filter(|i| *i > 0)?;
                Some((index, entry.path()))
            })
            .collect()
    }
}

impl WriteSyncer for RotatingFileWriter {
    fn write(&self, bytes: &[u8]) -> Result<usize> {
        let mut state = self.state.lock();

        if self.policy.should_rotate(state.size, bytes.len() as u64) {
            if let Err(e) = self.rotate(&mut state) {
                eprintln!(
                    "[LOGGER WARNING] Log rotation failed: {}. Continuing with current file.",
                    e
                );
                if state.file.is_none() {
                    let (file, size) = open_append(&self.path).map_err(|reopen_err| {
                        eprintln!(
                            "[LOGGER ERROR] Failed to reopen log file after rotation failure: {}",
                            reopen_err
                        );
                        e
                    })?;
                    state.file = Some(file);
                    state.size = size;
                }
            }
        }

        if state.file.is_none() {
            let (file, size) = open_append(&self.path)?;
            state.file = Some(file);
            state.size = size;
        }

        let state = &mut *state;
        if let Some(ref mut file) = state.file {
            file.write_all(bytes).map_err(|e| {
                LoggerError::file_appender(self.name.clone(), format!("Failed to write: {}", e))
            })?;
            state.size += bytes.len() as u64;
        }
        Ok(bytes.len())
    }

    fn sync(&self) -> Result<()> {
        let state = self.state.lock();
        match state.file {
            Some(ref file) => file.sync_all().map_err(|e| {
                LoggerError::file_appender(self.name.clone(), format!("Failed to sync: {}", e))
            }),
            None => Err(LoggerError::file_appender(
                self.name.clone(),
                "Log file is not open",
            )),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn open_append(path: &Path) -> Result<(File, u64)> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            LoggerError::file_appender(path.display().to_string(), format!("Failed to open: {}", e))
        })?;
    let size = file
        .metadata()
        .map_err(|e| {
            LoggerError::file_appender(
                path.display().to_string(),
                format!("Cannot access file metadata: {}", e),
            )
        })?
        .len();
    Ok((file, size))
}

/// Gzip `source` into `target`, removing `source` only once the archive is complete
fn compress_file(source: &Path, target: &Path) -> Result<()> {
    use std::io::{BufReader, BufWriter};

    let temp = target.with_file_name(format!(
        "{}.tmp",
        target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    ));
    let compress_err = |message: String, e: std::io::Error| {
        let _ = fs::remove_file(&temp);
        LoggerError::io_operation("compress log file", message, e)
    };

    let input = File::open(source).map_err(|e| {
        compress_err(format!("Failed to open {}", source.display()), e)
    })?;
    let output = File::create(&temp).map_err(|e| {
        compress_err(format!("Failed to create {}", temp.display()), e)
    })?;

    let mut reader = BufReader::with_capacity(64 * 1024, input);
    let mut encoder = flate2::write::GzEncoder::new(
        BufWriter::with_capacity(64 * 1024, output),
        flate2::Compression::default(),
    );
    std::io::copy(&mut reader, &mut encoder)
        .map_err(|e| compress_err(format!("Failed to compress {}", source.display()), e))?;
    encoder
        .finish()
        .and_then(|mut out| out.flush())
        .map_err(|e| compress_err("Failed to finish compression".to_string(), e))?;

    fs::rename(&temp, target)
        .map_err(|e| compress_err(format!("Failed to rename to {}", target.display()), e))?;

    if let Err(e) = fs::remove_file(source) {
        eprintln!(
            "[LOGGER WARNING] Compressed {} but failed to remove the original: {}",
            source.display(),
            e
        );
    }
    Ok(())
}
