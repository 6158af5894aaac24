use std::{
    fs::File,
    io::{self, BufWriter, Seek, SeekFrom, Write},
    path::Path,
    sync::{Arc, Mutex, PoisonError},
};

use crate::error::Error;

/// Destination for rendered log lines.
///
/// Implementations absorb their own I/O failures: a line that cannot be
/// written is lost, the caller is never told.
pub trait LogWriter {
    fn regular(&mut self, line: &str);
    fn flush(&mut self);
}

impl<W: LogWriter + ?Sized> LogWriter for Box<W> {
    fn regular(&mut self, line: &str) {
        (**self).regular(line)
    }

    fn flush(&mut self) {
        (**self).flush()
    }
}

pub struct LogFile {
    file: BufWriter<File>,
}

impl LogFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let open = || -> io::Result<File> {
            let mut file = File::options()
                .create(true)
                .truncate(false)
                .write(true)
                .open(&path)?;
            file.seek(SeekFrom::End(0))?;
            Ok(file)
        };
        let file = open().map_err(|source| Error::LogFile {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        Ok(Self {
            file: BufWriter::new(file),
        })
    }
}

impl LogWriter for LogFile {
    fn regular(&mut self, line: &str) {
        writeln!(self.file, "{line}").ok();
    }

    fn flush(&mut self) {
        self.file.flush().ok();
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConsoleStream {
    Stdout,
    #[default]
    Stderr,
}

/// Writes every line straight to the process console and flushes it.
#[derive(Debug, Default)]
pub struct LogConsole {
    stream: ConsoleStream,
}

impl LogConsole {
    pub fn new(stream: ConsoleStream) -> Self {
        Self { stream }
    }

    pub fn stream(&self) -> ConsoleStream {
        self.stream
    }
}

impl LogWriter for LogConsole {
    fn regular(&mut self, line: &str) {
        // Holding the stream lock keeps the line whole next to other writers.
        match self.stream {
            ConsoleStream::Stdout => {
                let mut out = io::stdout().lock();
                writeln!(out, "{line}").and_then(|_| out.flush()).ok();
            }
            ConsoleStream::Stderr => {
                let mut out = io::stderr().lock();
                writeln!(out, "{line}").and_then(|_| out.flush()).ok();
            }
        }
    }

    fn flush(&mut self) {
        match self.stream {
            ConsoleStream::Stdout => io::stdout().flush().ok(),
            ConsoleStream::Stderr => io::stderr().flush().ok(),
        };
    }
}

/// In-memory sink. Clones share the same lines.
#[derive(Debug, Clone, Default)]
pub struct LogBuffer {
    lines: Arc<Mutex<Vec<String>>>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every line written so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear(&self) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl LogWriter for LogBuffer {
    fn regular(&mut self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
    }

    fn flush(&mut self) {}
}

#[test]
fn test_log_file() {
    std::fs::remove_file("/tmp/tmlog_test_log_file.log").ok();
    let mut log_file = LogFile::new("/tmp/tmlog_test_log_file.log").unwrap();
    log_file.regular("Hello, world!");
    log_file.regular("");
    log_file.regular("rust is awesome !");
    log_file.flush();
    assert_eq!(
        std::fs::read_to_string("/tmp/tmlog_test_log_file.log").unwrap(),
        "Hello, world!\n\nrust is awesome !\n"
    );
}

#[test]
fn test_log_file_appends() {
    let path = "/tmp/tmlog_test_log_file_appends.log";
    std::fs::write(path, "first\n").unwrap();
    let mut log_file = LogFile::new(path).unwrap();
    log_file.regular("second");
    log_file.flush();
    assert_eq!(std::fs::read_to_string(path).unwrap(), "first\nsecond\n");
}

#[test]
fn test_log_file_error() {
    let err = LogFile::new("/nonexistent-tmlog-dir/app.log").err().unwrap();
    assert!(matches!(err, Error::LogFile { .. }));
    assert!(err.to_string().contains("/nonexistent-tmlog-dir/app.log"));
}

#[test]
fn test_log_console() {
    let mut stderr = LogConsole::default();
    assert_eq!(stderr.stream(), ConsoleStream::Stderr);
    stderr.regular("to stderr");
    stderr.flush();
    let mut stdout = LogConsole::new(ConsoleStream::Stdout);
    stdout.regular("to stdout");
    stdout.flush();
}

#[test]
fn test_log_buffer_shares_lines() {
    let buffer = LogBuffer::new();
    let mut writer: Box<dyn LogWriter + Send> = Box::new(buffer.clone());
    writer.regular("hello");
    writer.regular("boom");
    assert_eq!(buffer.lines(), vec!["hello", "boom"]);
    buffer.clear();
    assert!(buffer.lines().is_empty());
}
