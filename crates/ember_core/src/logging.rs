//! File-backed logger behind the `log` facade.
//!
//! The logger is constructed explicitly at startup, configured with a
//! level filter and a root folder, and then handed to the facade with
//! [`FileLogger::install`]. Call sites stay the usual `log::info!` etc.
//!
//! Records are appended to `<root>/ember.log`. The sink path sits behind
//! a mutex and every write takes the lock, so the logger is safe to call
//! from any thread even though the engine core itself is single-threaded.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

pub const DEFAULT_LOG_FILE: &str = "ember.log";

pub struct FileLogger {
    level: LevelFilter,
    start: Instant,
    sink: Mutex<PathBuf>,
}

impl FileLogger {
    pub fn new() -> Self {
        Self {
            level: LevelFilter::Debug,
            start: Instant::now(),
            sink: Mutex::new(PathBuf::from(DEFAULT_LOG_FILE)),
        }
    }

    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    pub fn with_root_folder(self, root: impl AsRef<Path>) -> Self {
        self.set_root_folder(root);
        self
    }

    /// Point the sink at `<root>/ember.log`.
    pub fn set_root_folder(&self, root: impl AsRef<Path>) {
        *self.lock_sink() = root.as_ref().join(DEFAULT_LOG_FILE);
    }

    pub fn log_file(&self) -> PathBuf {
        self.lock_sink().clone()
    }

    /// Hand the logger to the `log` facade. Fails if a logger was
    /// already installed for this process.
    pub fn install(self) -> Result<(), SetLoggerError> {
        let level = self.level;
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(level);
        Ok(())
    }

    fn lock_sink(&self) -> std::sync::MutexGuard<'_, PathBuf> {
        match self.sink.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for FileLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let path = self.lock_sink();
        match OpenOptions::new().create(true).append(true).open(&*path) {
            Ok(mut file) => {
                let elapsed = self.start.elapsed().as_secs_f64();
                let _ = writeln!(
                    file,
                    "[{elapsed:>10.3}s] [{level:<5}] {target}: {args}",
                    level = record.level(),
                    target = record.target(),
                    args = record.args()
                );
            }
            Err(err) => {
                eprintln!(
                    "FileLogger: failed to open '{}': {err}",
                    path.display()
                );
            }
        }
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_log_root(name_hint: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        let root = std::env::temp_dir().join(format!(
            "ember_log_test_{}_{}_{}",
            name_hint,
            std::process::id(),
            nanos
        ));
        fs::create_dir_all(&root).expect("create temp log root");
        root
    }

    fn emit(logger: &FileLogger, level: Level, message: &str) {
        logger.log(
            &Record::builder()
                .args(format_args!("{message}"))
                .level(level)
                .target("ember_test")
                .build(),
        );
    }

    #[test]
    fn records_append_with_level_tag() {
        let root = temp_log_root("append");
        let logger = FileLogger::new().with_root_folder(&root);

        emit(&logger, Level::Info, "engine started");
        emit(&logger, Level::Warn, "low on widgets");

        let contents = fs::read_to_string(logger.log_file()).expect("read log file");
        assert!(contents.contains("[INFO "));
        assert!(contents.contains("engine started"));
        assert!(contents.contains("[WARN "));
        assert!(contents.contains("low on widgets"));

        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn records_below_filter_are_dropped() {
        let root = temp_log_root("filtered");
        let logger = FileLogger::new()
            .with_level(LevelFilter::Info)
            .with_root_folder(&root);

        emit(&logger, Level::Debug, "noisy detail");
        emit(&logger, Level::Error, "something broke");

        let contents = fs::read_to_string(logger.log_file()).expect("read log file");
        assert!(!contents.contains("noisy detail"));
        assert!(contents.contains("something broke"));

        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn set_root_folder_moves_the_sink() {
        let first = temp_log_root("first");
        let second = temp_log_root("second");
        let logger = FileLogger::new().with_root_folder(&first);

        emit(&logger, Level::Info, "before move");
        logger.set_root_folder(&second);
        emit(&logger, Level::Info, "after move");

        let first_contents =
            fs::read_to_string(first.join(DEFAULT_LOG_FILE)).expect("read first log");
        let second_contents =
            fs::read_to_string(second.join(DEFAULT_LOG_FILE)).expect("read second log");
        assert!(first_contents.contains("before move"));
        assert!(!first_contents.contains("after move"));
        assert!(second_contents.contains("after move"));

        let _ = fs::remove_dir_all(first);
        let _ = fs::remove_dir_all(second);
    }

    #[test]
    fn missing_sink_folder_does_not_panic() {
        let root = temp_log_root("vanished");
        let logger = FileLogger::new().with_root_folder(root.join("nope"));

        // The open fails (parent folder does not exist); the record is
        // dropped and reported to stderr.
        emit(&logger, Level::Error, "into the void");

        let _ = fs::remove_dir_all(root);
    }
}
