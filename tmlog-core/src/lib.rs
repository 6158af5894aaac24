//! # tmlog-core
//! Core utilities for tmlog - line formats, sinks and background writer threads.

mod config;
mod error;
mod format;
mod log_writer;
mod utils;

pub use config::{TMLOG_CONFIG, TMLogConfig};
pub use error::{Error, Result};
pub use format::{LogFormat, LogMessage, parse_level};
pub use log_writer::{ConsoleStream, LogBuffer, LogConsole, LogFile, LogWriter};
pub use utils::{LogCommand, LogSender, LoggerGuard, spawn_log_thread};
