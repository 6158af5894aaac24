//! # tmlog
//! Process-wide plain text logger with a narrow info/debug/error interface.
//!
//! ## Usage
//! ```toml
//! // Cargo.toml
//! ...
//! [dependencies]
//! tmlog = "0.1.0"
//! ```
//!
//! ```rust
//! use tmlog::{Logger, process_logger};
//!
//! // Plain text, debug level, no color, written to stderr.
//! process_logger().info("Hello, world!");
//! process_logger().error("Something went wrong");
//! ```
//!
//! ## Explicit loggers
//! Components that log should receive a logger rather than reach for the global one.
//!
//! ```rust
//! use tmlog::{LogBuffer, Logger, logger_config};
//!
//! fn start(logger: &dyn Logger) {
//!     logger.info("starting");
//! }
//!
//! let buffer = LogBuffer::new();
//! let logger = logger_config()
//!     .no_console()
//!     .with_writer(buffer.clone())
//!     .with_name("p2p")
//!     .build();
//! start(&logger);
//! assert!(buffer.lines()[0].ends_with("INFO] starting module=p2p"));
//! ```
//!
//! ## Logging to files
//! The log file is created if it does not exist and appended to if it does.
//!
//! ```rust
//! use tmlog::{Logger, logger_config};
//!
//! let (logger, guard) = logger_config()
//!     .with_log_file("/tmp/tmlog_app.log")
//!     .expect("Unable to create log file")
//!     .no_console()
//!     .in_background()
//!     .build_with_guard();
//!
//! logger.info("Hello, world!");
//! drop(guard); // ensure logs are flushed
//! assert!(std::fs::read_to_string("/tmp/tmlog_app.log").unwrap().ends_with("Hello, world!\n"));
//! ```

mod logger;

use std::{
    path::Path,
    sync::{Arc, LazyLock, Mutex},
};

use log::LevelFilter;
use tmlog_core::{LogSender, spawn_log_thread};

pub use logger::{Logger, ProcessLogger};
pub use tmlog_core::{
    ConsoleStream, Error, LogBuffer, LogConsole, LogFile, LogFormat, LogWriter, LoggerGuard,
    Result, parse_level,
};

use logger::Sink;

/// The logger shared by the whole process.
static PROCESS_LOGGER: LazyLock<ProcessLogger> =
    LazyLock::new(|| must_new_default_logger("plain", "debug", false));

/// Returns the process-wide logger, creating it on first use.
///
/// It writes plain text at debug level without color to stderr, and lives
/// until the process exits.
pub fn process_logger() -> &'static ProcessLogger {
    &PROCESS_LOGGER
}

/// Builds a console logger from textual settings.
pub fn new_default_logger(format: &str, level: &str, colored: bool) -> Result<ProcessLogger> {
    Ok(logger_config()
        .with_format(format.parse()?)
        .with_level(parse_level(level)?)
        .with_color(colored)
        .build())
}

/// Like [`new_default_logger`], but panics on invalid settings.
pub fn must_new_default_logger(format: &str, level: &str, colored: bool) -> ProcessLogger {
    new_default_logger(format, level, colored)
        .unwrap_or_else(|err| panic!("Unable to create the default logger: {err}"))
}

/// Builder for configuring a [`ProcessLogger`].
pub struct ConfigBuilder {
    format: LogFormat,
    level: LevelFilter,
    colored: bool,
    console: Option<ConsoleStream>,
    log_file: Option<LogFile>,
    writers: Vec<Box<dyn LogWriter + Send>>,
    name: Option<String>,
    background: bool,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            format: LogFormat::Plain,
            level: LevelFilter::Debug,
            colored: false,
            console: Some(ConsoleStream::Stderr),
            log_file: None,
            writers: Vec::new(),
            name: None,
            background: false,
        }
    }
}

impl ConfigBuilder {
    fn into_parts(self) -> (ProcessLogger, Vec<Arc<LogSender>>) {
        let Self {
            format,
            level,
            colored,
            console,
            log_file,
            mut writers,
            name,
            background,
        } = self;
        let mut all: Vec<Box<dyn LogWriter + Send>> = Vec::new();
        if let Some(stream) = console {
            all.push(Box::new(LogConsole::new(stream)));
        }
        if let Some(log_file) = log_file {
            all.push(Box::new(log_file));
        }
        all.append(&mut writers);

        let mut senders = Vec::new();
        let sinks = all
            .into_iter()
            .map(|writer| {
                if background {
                    let sender = Arc::new(spawn_log_thread(writer));
                    senders.push(Arc::clone(&sender));
                    Sink::Background(sender)
                } else {
                    Sink::Inline(Mutex::new(writer))
                }
            })
            .collect();
        let fields = name
            .map(|name| vec![("module".to_string(), name)])
            .unwrap_or_default();
        (
            ProcessLogger::new(format, level, colored, fields, sinks),
            senders,
        )
    }

    /// Sets the line format.
    pub fn with_format(self, format: LogFormat) -> Self {
        Self { format, ..self }
    }
    /// Sets the maximum level written.
    pub fn with_level(self, level: LevelFilter) -> Self {
        Self { level, ..self }
    }
    /// Colors the level tag of plain lines.
    pub fn with_color(self, colored: bool) -> Self {
        Self { colored, ..self }
    }
    /// Writes to the given console stream.
    pub fn with_console(self, stream: ConsoleStream) -> Self {
        Self {
            console: Some(stream),
            ..self
        }
    }
    /// Ignore console logging
    pub fn no_console(self) -> Self {
        Self {
            console: None,
            ..self
        }
    }
    /// Sets a log file.
    pub fn with_log_file<P: AsRef<Path>>(self, path: P) -> Result<Self> {
        Ok(Self {
            log_file: Some(LogFile::new(path)?),
            ..self
        })
    }
    /// Maybe sets a log file.
    pub fn maybe_with_log_file<P: AsRef<Path>>(self, path: Option<P>) -> Result<Self> {
        Ok(Self {
            log_file: path.map(LogFile::new).transpose()?,
            ..self
        })
    }
    /// Adds a custom sink.
    pub fn with_writer<W: LogWriter + Send + 'static>(mut self, writer: W) -> Self {
        self.writers.push(Box::new(writer));
        self
    }
    /// Tags every line with `module=<name>`
    pub fn with_name(self, name: &str) -> Self {
        Self {
            name: Some(name.into()),
            ..self
        }
    }
    /// Maybe sets a log name
    pub fn maybe_with_name(self, name: Option<&str>) -> Self {
        Self {
            name: name.map(String::from),
            ..self
        }
    }
    /// Write from dedicated threads instead of the calling thread.
    pub fn in_background(self) -> Self {
        Self {
            background: true,
            ..self
        }
    }

    /// Builds the logger. Background writers stop once the last clone is dropped.
    pub fn build(self) -> ProcessLogger {
        self.into_parts().0
    }

    /// Builds the logger and a guard that flushes and stops background writers when dropped.
    #[must_use = "LoggerGuard must be kept alive to ensure logging works. Do \"let (logger, _guard) = logger_config().build_with_guard();\""]
    pub fn build_with_guard(self) -> (ProcessLogger, LoggerGuard) {
        let (logger, senders) = self.into_parts();
        (logger, LoggerGuard::new(senders))
    }
}


/// Returns a default ConfigBuilder: plain, debug, no color, stderr.
pub fn logger_config() -> ConfigBuilder {
    ConfigBuilder::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    fn buffered(level: LevelFilter) -> (ProcessLogger, LogBuffer) {
        let buffer = LogBuffer::new();
        let logger = logger_config()
            .no_console()
            .with_level(level)
            .with_writer(buffer.clone())
            .build();
        (logger, buffer)
    }

    #[test]
    fn test_process_logger_is_shared() {
        let first = process_logger();
        let second = process_logger();
        assert!(std::ptr::eq(first, second));
        assert_eq!(first.format(), LogFormat::Plain);
        assert_eq!(first.level(), LevelFilter::Debug);
        assert!(!first.colored());
        first.debug("process logger test line");
    }

    #[test]
    fn test_info_then_error_in_order() {
        let (logger, buffer) = buffered(LevelFilter::Debug);
        logger.info("hello");
        logger.error("boom");
        let lines = buffer.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" INFO] hello"), "{}", lines[0]);
        assert!(lines[1].ends_with(" ERROR] boom"), "{}", lines[1]);
    }

    #[test]
    fn test_severities() {
        let (logger, buffer) = buffered(LevelFilter::Debug);
        let dyn_logger: &dyn Logger = &logger;
        dyn_logger.debug("m");
        dyn_logger.info("m");
        dyn_logger.error("m");
        let tags: Vec<_> = buffer
            .lines()
            .iter()
            .map(|l| l.split_once("] ").unwrap().0.rsplit(' ').next().unwrap().to_string())
            .collect();
        assert_eq!(tags, vec!["DEBUG", "INFO", "ERROR"]);
    }

    #[test]
    fn test_empty_message() {
        let (logger, buffer) = buffered(LevelFilter::Debug);
        logger.info("");
        let lines = buffer.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with(" INFO] "));
    }

    #[test]
    fn test_level_filter() {
        let (logger, buffer) = buffered(LevelFilter::Info);
        assert!(!logger.enabled(Level::Debug));
        logger.debug("hidden");
        logger.info("shown");
        logger.error("shown too");
        assert_eq!(buffer.lines().len(), 2);
        assert!(buffer.lines().iter().all(|l| !l.contains("hidden")));

        let (logger, buffer) = buffered(LevelFilter::Off);
        logger.error("nothing");
        assert!(buffer.lines().is_empty());
    }

    #[test]
    fn test_with_context() {
        let buffer = LogBuffer::new();
        let root = logger_config()
            .no_console()
            .with_writer(buffer.clone())
            .with_name("consensus")
            .build();
        let child = root.with("height", 42).with("peer", "node 1");
        root.info("root");
        child.info("child");
        let lines = buffer.lines();
        assert!(lines[0].ends_with("] root module=consensus"));
        assert!(lines[1].ends_with("] child module=consensus height=42 peer=\"node 1\""));
    }

    #[test]
    fn test_multi_threaded_lines_stay_intact() {
        let (logger, buffer) = buffered(LevelFilter::Debug);
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let logger = logger.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        logger.info(&format!("thread {t} message {i}"));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let lines = buffer.lines();
        assert_eq!(lines.len(), 400);
        for t in 0..8 {
            let own: Vec<_> = lines
                .iter()
                .filter_map(|l| l.split_once(" INFO] ").map(|(_, m)| m))
                .filter(|m| m.starts_with(&format!("thread {t} ")))
                .map(String::from)
                .collect();
            let expected: Vec<_> = (0..50).map(|i| format!("thread {t} message {i}")).collect();
            assert_eq!(own, expected);
        }
    }

    #[test]
    fn test_json_format() {
        let buffer = LogBuffer::new();
        let logger = logger_config()
            .no_console()
            .with_format(LogFormat::Json)
            .with_writer(buffer.clone())
            .build();
        logger.error("boom");
        let line = &buffer.lines()[0];
        assert!(line.starts_with('{') && line.ends_with('}'));
        assert!(line.contains("\"level\":\"error\""));
        assert!(line.contains("\"message\":\"boom\""));
    }

    #[test]
    fn test_new_default_logger() {
        let logger = new_default_logger("json", "ERROR", true).unwrap();
        assert_eq!(logger.format(), LogFormat::Json);
        assert_eq!(logger.level(), LevelFilter::Error);
        assert!(logger.colored());
        assert!(matches!(
            new_default_logger("yaml", "debug", false),
            Err(Error::UnknownFormat(_))
        ));
        assert!(matches!(
            new_default_logger("plain", "verbose", false),
            Err(Error::UnknownLevel(_))
        ));
    }

    #[test]
    #[should_panic(expected = "Unable to create the default logger")]
    fn test_must_new_default_logger_panics() {
        must_new_default_logger("plain", "chatty", false);
    }

    #[test]
    fn test_background_file_with_guard() {
        let path = "/tmp/tmlog_test_background_file.log";
        std::fs::remove_file(path).ok();
        let (logger, guard) = logger_config()
            .no_console()
            .with_log_file(path)
            .unwrap()
            .in_background()
            .build_with_guard();
        logger.info("hello");
        logger.error("boom");
        drop(guard);
        let content = std::fs::read_to_string(path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" INFO] hello"));
        assert!(lines[1].ends_with(" ERROR] boom"));
    }

    #[test]
    fn test_background_flush() {
        let buffer = LogBuffer::new();
        let logger = logger_config()
            .no_console()
            .with_writer(buffer.clone())
            .in_background()
            .build();
        for i in 0..10 {
            logger.debug(&format!("line {i}"));
        }
        logger.flush();
        assert_eq!(buffer.lines().len(), 10);
    }

    #[test]
    fn test_maybe_with_log_file() {
        assert!(logger_config().maybe_with_log_file(None::<&str>).is_ok());
        assert!(matches!(
            logger_config().maybe_with_log_file(Some("/nonexistent-tmlog-dir/a.log")),
            Err(Error::LogFile { .. })
        ));
    }

    #[test]
    fn test_install_routes_log_macros() {
        let (logger, buffer) = buffered(LevelFilter::Info);
        logger.install().unwrap();
        log::info!("from the facade {}", 1);
        log::debug!("filtered");
        assert!(logger.install().is_err());
        let lines = buffer.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with(" INFO] from the facade 1"));
    }
}
