use std::{
    fmt::Display,
    sync::{Arc, Mutex, PoisonError},
};

use log::{Level, LevelFilter, Log, SetLoggerError};
use tmlog_core::{LogFormat, LogMessage, LogSender, LogWriter};

/// The three severities a host can log at.
///
/// This is the whole surface the call-in boundary depends on, so the
/// boundary can be exercised against any implementation.
pub trait Logger: Send + Sync {
    fn info(&self, message: &str);
    fn debug(&self, message: &str);
    fn error(&self, message: &str);
}

pub(crate) enum Sink {
    /// Written on the calling thread.
    Inline(Mutex<Box<dyn LogWriter + Send>>),
    /// Handed to a writer thread.
    Background(Arc<LogSender>),
}

impl Sink {
    fn write(&self, line: &str) {
        match self {
            Sink::Inline(writer) => writer
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .regular(line),
            Sink::Background(sender) => sender.send_line(line.to_string()),
        }
    }

    fn flush(&self) {
        match self {
            Sink::Inline(writer) => writer.lock().unwrap_or_else(PoisonError::into_inner).flush(),
            Sink::Background(sender) => sender.flush(),
        }
    }
}

/// Handle on a configured logger. Clones share sinks and configuration.
///
/// Configuration is fixed at construction; the only way to derive a
/// different logger is [`ProcessLogger::with`], which adds context.
#[derive(Clone)]
pub struct ProcessLogger {
    format: LogFormat,
    level: LevelFilter,
    colored: bool,
    fields: Arc<Vec<(String, String)>>,
    sinks: Arc<Vec<Sink>>,
}

impl ProcessLogger {
    pub(crate) fn new(
        format: LogFormat,
        level: LevelFilter,
        colored: bool,
        fields: Vec<(String, String)>,
        sinks: Vec<Sink>,
    ) -> Self {
        Self {
            format,
            level,
            colored,
            fields: Arc::new(fields),
            sinks: Arc::new(sinks),
        }
    }

    pub fn format(&self) -> LogFormat {
        self.format
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }

    pub fn colored(&self) -> bool {
        self.colored
    }

    pub fn enabled(&self, level: Level) -> bool {
        level <= self.level
    }

    /// Writes one line at `level` to every sink, unless filtered out.
    pub fn log(&self, level: Level, message: &str) {
        if !self.enabled(level) {
            return;
        }
        let record = LogMessage::new(level, message).with_fields(&self.fields);
        let line = self.format.render(&record, self.colored);
        for sink in self.sinks.iter() {
            sink.write(&line);
        }
    }

    /// Returns a logger that appends `key=value` to every line it writes.
    pub fn with(&self, key: &str, value: impl Display) -> Self {
        let mut fields = (*self.fields).clone();
        fields.push((key.to_string(), value.to_string()));
        Self {
            fields: Arc::new(fields),
            ..self.clone()
        }
    }

    /// Blocks until every sink has written what it was given.
    pub fn flush(&self) {
        for sink in self.sinks.iter() {
            sink.flush();
        }
    }

    /// Routes the `log` crate macros through this logger.
    pub fn install(&self) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(self.clone()))?;
        log::set_max_level(self.level);
        Ok(())
    }
}

impl Logger for ProcessLogger {
    fn info(&self, message: &str) {
        self.log(Level::Info, message)
    }

    fn debug(&self, message: &str) {
        self.log(Level::Debug, message)
    }

    fn error(&self, message: &str) {
        self.log(Level::Error, message)
    }
}

impl Log for ProcessLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        ProcessLogger::enabled(self, metadata.level())
    }

    fn log(&self, record: &log::Record) {
        ProcessLogger::log(self, record.level(), &record.args().to_string())
    }

    fn flush(&self) {
        ProcessLogger::flush(self)
    }
}

impl std::fmt::Debug for ProcessLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessLogger")
            .field("format", &self.format)
            .field("level", &self.level)
            .field("colored", &self.colored)
            .field("fields", &self.fields)
            .field("sinks", &self.sinks.len())
            .finish()
    }
}
