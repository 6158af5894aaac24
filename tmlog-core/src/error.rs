use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building a logger. Logging itself never fails.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown log format {0:?}, expected \"plain\", \"text\" or \"json\"")]
    UnknownFormat(String),
    #[error("unknown log level {0:?}, expected one of off, error, warn, info, debug, trace")]
    UnknownLevel(String),
    #[error("unable to open log file {}: {source}", path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
