//! RotatingFile - size based rotation with backup retention
//!
//! Backups are named `<name>-<YYYY-MM-DDTHH-MM-SS.mmm>.<ext>` next to the
//! active file and pruned by count and age after every rotation.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{Local, NaiveDateTime, SubsecRound, TimeDelta, Utc};
use contracts::RotationConfig;
use tracing::{debug, warn};

const BACKUP_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.3f";
const MEGABYTE: u64 = 1024 * 1024;

/// Rotation limits in the units the writer works with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotatingFileOptions {
    /// Maximum size of the active file in bytes
    pub max_size: u64,
    /// Backups kept (0 = unlimited)
    pub max_backups: usize,
    /// Backups older than this are removed (zero = unlimited)
    pub max_age: Duration,
    /// Name backups in local time instead of UTC
    pub local_time: bool,
}

impl From<&RotationConfig> for RotatingFileOptions {
    fn from(config: &RotationConfig) -> Self {
        Self {
            max_size: config.max_size_mb.saturating_mul(MEGABYTE),
            max_backups: config.max_backups,
            max_age: Duration::from_secs(config.max_age_days.saturating_mul(24 * 60 * 60)),
            local_time: config.local_time,
        }
    }
}

pub struct RotatingFile {
    path: PathBuf,
    options: RotatingFileOptions,
    file: File,
    size: u64,
    last_backup: Option<NaiveDateTime>,
}

impl RotatingFile {
    /// Open `path` for appending, creating parent directories as needed
    pub fn open(path: impl Into<PathBuf>, options: RotatingFileOptions) -> io::Result<Self> {
        let path = path.into();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let file = open_append(&path)?;
        let size = file.metadata()?.len();

        Ok(Self {
            path,
            options,
            file,
            size,
            last_backup: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes in the active file
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Move the active file to a timestamped backup and start a new one
    pub fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        let stamp = self.next_backup_stamp();
        let backup = self.backup_path(stamp);
        fs::rename(&self.path, &backup)?;
        self.file = open_append(&self.path)?;
        self.size = 0;
        debug!(path = %self.path.display(), backup = %backup.display(), "Rotated log file");

        if let Err(e) = self.prune_backups() {
            warn!(path = %self.path.display(), error = %e, "Failed to prune log backups");
        }
        Ok(())
    }

    fn now(&self) -> NaiveDateTime {
        let now = if self.options.local_time {
            Local::now().naive_local()
        } else {
            Utc::now().naive_utc()
        };
        now.trunc_subsecs(3)
    }

    /// Backup timestamps strictly increase so names never collide
    fn next_backup_stamp(&mut self) -> NaiveDateTime {
        let mut stamp = self.now();
        if let Some(last) = self.last_backup {
            if stamp <= last {
                stamp = last + TimeDelta::milliseconds(1);
            }
        }
        self.last_backup = Some(stamp);
        stamp
    }

    fn name_parts(&self) -> (String, String) {
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = self
            .path
            .extension()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "log".to_string());
        (stem, ext)
    }

    fn backup_path(&self, stamp: NaiveDateTime) -> PathBuf {
        let (stem, ext) = self.name_parts();
        let name = format!("{stem}-{}.{ext}", stamp.format(BACKUP_TIME_FORMAT));
        self.path.with_file_name(name)
    }

    /// Backups of this file, newest first
    pub fn backups(&self) -> io::Result<Vec<PathBuf>> {
        Ok(self
            .dated_backups()?
            .into_iter()
            .map(|(_, path)| path)
            .collect())
    }

    fn dated_backups(&self) -> io::Result<Vec<(NaiveDateTime, PathBuf)>> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let (stem, ext) = self.name_parts();
        let prefix = format!("{stem}-");
        let suffix = format!(".{ext}");

        let mut backups = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(stamp) = name
                .strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(&suffix))
                .and_then(|stamp| NaiveDateTime::parse_from_str(stamp, BACKUP_TIME_FORMAT).ok())
            else {
                continue;
            };
            backups.push((stamp, entry.path()));
        }
        backups.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(backups)
    }

    fn prune_backups(&self) -> io::Result<()> {
        let backups = self.dated_backups()?;
        let cutoff = if self.options.max_age.is_zero() {
            None
        } else {
            TimeDelta::from_std(self.options.max_age)
                .ok()
                .map(|age| self.now() - age)
        };

        for (index, (stamp, path)) in backups.iter().enumerate() {
            let over_count = self.options.max_backups > 0 && index >= self.options.max_backups;
            let too_old = cutoff.is_some_and(|cutoff| *stamp < cutoff);
            if over_count || too_old {
                fs::remove_file(path)?;
                debug!(backup = %path.display(), "Removed log backup");
            }
        }
        Ok(())
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let len = buf.len() as u64;
        if len > self.options.max_size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "write length {len} exceeds maximum file size {}",
                    self.options.max_size
                ),
            ));
        }
        if self.size + len > self.options.max_size {
            self.rotate()?;
        }

        self.file.write_all(buf)?;
        self.size += len;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl std::fmt::Debug for RotatingFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotatingFile")
            .field("path", &self.path)
            .field("size", &self.size)
            .finish()
    }
}
