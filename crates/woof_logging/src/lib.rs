//! Shared logging setup for woof binaries.
//!
//! Every run writes to a size-rotated file under `<WOOF_HOME>/logs` and to
//! stderr. Stdout is left to command output (reports, JSON).

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "woof=info";
const VERBOSE_LOG_FILTER: &str = "woof=debug";
const JSON_MODE_LOG_FILTER: &str = "warn";
const MAX_LOG_FILES: usize = 5;
const MAX_LOG_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Logging options chosen by the binary at startup.
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    /// Raise console output to debug level.
    pub verbose: bool,
    /// Keep the console quiet so stdout carries only machine-readable output.
    pub json_mode: bool,
}

/// Install the global tracing subscriber.
///
/// A log directory that cannot be created disables the file layer only; the
/// console layer is always installed.
pub fn init_logging(config: LogConfig<'_>) -> Result<()> {
    let file_layer = match open_log_file(config.app_name) {
        Ok(writer) => Some(
            fmt::layer()
                .with_writer(Mutex::new(writer))
                .with_ansi(false)
                .with_filter(env_filter_or(DEFAULT_LOG_FILTER)),
        ),
        Err(err) => {
            eprintln!("Warning: file logging disabled: {:#}", err);
            None
        }
    };

    let console_filter = if config.verbose {
        EnvFilter::new(VERBOSE_LOG_FILTER)
    } else if config.json_mode {
        EnvFilter::new(JSON_MODE_LOG_FILTER)
    } else {
        env_filter_or(DEFAULT_LOG_FILTER)
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .with_filter(console_filter),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

fn env_filter_or(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

fn open_log_file(app_name: &str) -> Result<RotatingFile> {
    let dir = ensure_logs_dir()?;
    RotatingFile::open(&dir, app_name, MAX_LOG_FILES, MAX_LOG_FILE_SIZE)
        .with_context(|| format!("Failed to open log file for {} in {}", app_name, dir.display()))
}

/// Resolve the woof home directory.
///
/// Priority:
/// 1) WOOF_HOME
/// 2) ~/.woof
/// 3) ./.woof
pub fn woof_home() -> PathBuf {
    if let Ok(override_path) = std::env::var("WOOF_HOME") {
        return PathBuf::from(override_path);
    }
    dirs::home_dir()
        .map(|home| home.join(".woof"))
        .unwrap_or_else(|| PathBuf::from(".").join(".woof"))
}

/// Get the logs directory: <WOOF_HOME>/logs
pub fn logs_dir() -> PathBuf {
    woof_home().join("logs")
}

/// Ensure the logs directory exists.
pub fn ensure_logs_dir() -> Result<PathBuf> {
    let logs = logs_dir();
    fs::create_dir_all(&logs)
        .with_context(|| format!("Failed to create logs directory: {}", logs.display()))?;
    Ok(logs)
}

/// Append-only log file that rolls over to `<name>.log.1`, `<name>.log.2`, ...
/// once `max_bytes` would be exceeded. At most `keep` files exist at a time.
struct RotatingFile {
    dir: PathBuf,
    stem: String,
    keep: usize,
    max_bytes: u64,
    file: File,
    written: u64,
}

impl RotatingFile {
    fn open(dir: &Path, app_name: &str, keep: usize, max_bytes: u64) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let stem = sanitize_name(app_name);
        let current = dir.join(format!("{}.log", stem));
        let file = OpenOptions::new().create(true).append(true).open(&current)?;
        let written = file.metadata()?.len();
        let mut rotating = Self {
            dir: dir.to_path_buf(),
            stem,
            keep: keep.max(1),
            max_bytes,
            file,
            written,
        };
        if rotating.written > rotating.max_bytes {
            rotating.rotate()?;
        }
        Ok(rotating)
    }

    /// Generation 0 is the live file.
    fn path_for(&self, generation: usize) -> PathBuf {
        if generation == 0 {
            self.dir.join(format!("{}.log", self.stem))
        } else {
            self.dir.join(format!("{}.log.{}", self.stem, generation))
        }
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        for generation in (1..self.keep).rev() {
            let from = self.path_for(generation - 1);
            if !from.exists() {
                continue;
            }
            let to = self.path_for(generation);
            if to.exists() {
                fs::remove_file(&to)?;
            }
            fs::rename(&from, &to)?;
        }

        let current = self.path_for(0);
        if current.exists() {
            fs::remove_file(&current)?;
        }
        self.file = OpenOptions::new().create(true).append(true).open(&current)?;
        self.written = 0;
        Ok(())
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_bytes {
            self.rotate()?;
        }
        let bytes = self.file.write(buf)?;
        self.written += bytes as u64;
        Ok(bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' { ch } else { '_' })
        .collect()
}
