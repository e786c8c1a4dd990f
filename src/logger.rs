use anyhow::{Context, Result};
use std::{
    fmt::Display,
    fs::{File, OpenOptions},
    io::{self, Write},
    path::Path,
};

/// Log file used when none is configured.
pub const DEFAULT_LOG_FILE: &str = "log.txt";

/// How an existing log file is treated.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LogMode {
    Append,

    /// Truncate the file for a fresh run.
    Clear,
}

/// Writes everything to stdout and to the log file.
struct Tee {
    file: File,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stdout().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()?;
        self.file.flush()
    }
}

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A log line: local timestamp, padded level, message.
fn log_line(level: log::Level, message: impl Display) -> String {
    format!(
        "{} {:<5} {}",
        chrono::Local::now().format(TIMESTAMP_FORMAT),
        level,
        message
    )
}

pub(crate) fn open_log_file(path: &Path, mode: LogMode) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true);
    match mode {
        LogMode::Append => options.append(true),
        LogMode::Clear => options.write(true).truncate(true),
    };

    options.open(path)
}

/// Installs the global logger. Every record is printed to stdout and
/// appended to `path` with a local timestamp.
///
/// The level defaults to `info` and can be changed with `RUST_LOG`.
pub fn init(path: &Path, mode: LogMode) -> Result<()> {
    let file = open_log_file(path, mode)
        .with_context(|| format!("failed opening log file {}", path.display()))?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| writeln!(buf, "{}", log_line(record.level(), record.args())))
        .target(env_logger::Target::Pipe(Box::new(Tee { file })))
        .try_init()
        .context("failed installing logger")
}
