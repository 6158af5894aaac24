use std::{borrow::Cow, fmt::Write, str::FromStr};

use chrono::{DateTime, SecondsFormat, Utc};
use colored::Colorize;
use log::{Level, LevelFilter};
use serde_json::{Map, Value};

use crate::error::Error;

/// Output layout of a log line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// `[time LEVEL] message key=value ...`
    #[default]
    Plain,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "plain" | "text" => Ok(Self::Plain),
            "json" => Ok(Self::Json),
            _ => Err(Error::UnknownFormat(s.into())),
        }
    }
}

/// Parses a level name such as `"debug"` into a filter, ignoring case.
pub fn parse_level(level: &str) -> Result<LevelFilter, Error> {
    level
        .parse::<LevelFilter>()
        .map_err(|_| Error::UnknownLevel(level.into()))
}

#[derive(Debug, Clone)]
pub struct LogMessage {
    pub time: DateTime<Utc>,
    pub level: Level,
    pub message: String,
    pub fields: Vec<(String, String)>,
}

impl LogMessage {
    /// Creates a message stamped with the current time.
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            time: Utc::now(),
            level,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_fields(self, fields: &[(String, String)]) -> Self {
        Self {
            fields: fields.to_vec(),
            ..self
        }
    }
}

impl LogFormat {
    /// Renders `msg` as a single line, without the trailing newline.
    pub fn render(self, msg: &LogMessage, colored: bool) -> String {
        match self {
            LogFormat::Plain => render_plain(msg, colored),
            LogFormat::Json => render_json(msg),
        }
    }
}

fn level_tag(level: Level, colored: bool) -> String {
    let tag = match level {
        Level::Error => "ERROR",
        Level::Warn => "WARN",
        Level::Info => "INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    };
    if !colored {
        return tag.to_string();
    }
    let tag = match level {
        Level::Error => tag.red(),
        Level::Warn => tag.yellow(),
        Level::Info => tag.green(),
        Level::Debug => tag.blue(),
        Level::Trace => tag.purple(),
    };
    tag.to_string()
}

fn quote_value(value: &str) -> Cow<'_, str> {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || c == '=' || c == '"');
    if needs_quotes {
        Cow::Owned(format!("{value:?}"))
    } else {
        Cow::Borrowed(value)
    }
}

fn render_plain(msg: &LogMessage, colored: bool) -> String {
    let time = msg.time.to_rfc3339_opts(SecondsFormat::Millis, true);
    let level = level_tag(msg.level, colored);
    let mut line = format!("[{time} {level}] {}", msg.message);
    for (key, value) in &msg.fields {
        write!(line, " {key}={}", quote_value(value)).ok();
    }
    line
}

fn render_json(msg: &LogMessage) -> String {
    let mut object = Map::new();
    for (key, value) in &msg.fields {
        object.insert(key.clone(), Value::String(value.clone()));
    }
    object.insert(
        "level".into(),
        Value::String(msg.level.as_str().to_ascii_lowercase()),
    );
    object.insert(
        "time".into(),
        Value::String(msg.time.to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    object.insert("message".into(), Value::String(msg.message.clone()));
    Value::Object(object).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed(level: Level, message: &str) -> LogMessage {
        LogMessage {
            time: Utc.with_ymd_and_hms(2022, 6, 1, 10, 30, 0).unwrap(),
            level,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("plain".parse::<LogFormat>().unwrap(), LogFormat::Plain);
        assert_eq!("TEXT".parse::<LogFormat>().unwrap(), LogFormat::Plain);
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!(matches!(
            "xml".parse::<LogFormat>(),
            Err(Error::UnknownFormat(f)) if f == "xml"
        ));
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug").unwrap(), LevelFilter::Debug);
        assert_eq!(parse_level("Error").unwrap(), LevelFilter::Error);
        assert_eq!(parse_level("off").unwrap(), LevelFilter::Off);
        assert!(matches!(parse_level("loud"), Err(Error::UnknownLevel(_))));
    }

    #[test]
    fn test_plain_line() {
        let line = LogFormat::Plain.render(&fixed(Level::Info, "hello"), false);
        assert_eq!(line, "[2022-06-01T10:30:00.000Z INFO] hello");
        let line = LogFormat::Plain.render(&fixed(Level::Error, "boom"), false);
        assert_eq!(line, "[2022-06-01T10:30:00.000Z ERROR] boom");
    }

    #[test]
    fn test_plain_empty_message() {
        let line = LogFormat::Plain.render(&fixed(Level::Debug, ""), false);
        assert_eq!(line, "[2022-06-01T10:30:00.000Z DEBUG] ");
    }

    #[test]
    fn test_plain_fields_are_quoted_when_needed() {
        let msg = fixed(Level::Info, "peer added").with_fields(&[
            ("module".into(), "p2p".into()),
            ("addr".into(), "1.2.3.4 :26656".into()),
            ("empty".into(), String::new()),
        ]);
        let line = LogFormat::Plain.render(&msg, false);
        assert_eq!(
            line,
            "[2022-06-01T10:30:00.000Z INFO] peer added module=p2p addr=\"1.2.3.4 :26656\" empty=\"\""
        );
    }

    #[test]
    fn test_plain_without_color_has_no_escapes() {
        let line = LogFormat::Plain.render(&fixed(Level::Error, "boom"), false);
        assert!(!line.contains('\x1B'));
    }

    #[test]
    fn test_json_line() {
        let msg = fixed(Level::Error, "boom \"quoted\"").with_fields(&[
            ("module".into(), "consensus".into()),
            ("level".into(), "shadowed".into()),
        ]);
        let line = LogFormat::Json.render(&msg, true);
        let value: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["level"], "error");
        assert_eq!(value["time"], "2022-06-01T10:30:00.000Z");
        assert_eq!(value["message"], "boom \"quoted\"");
        assert_eq!(value["module"], "consensus");
        assert!(!line.contains('\n'));
    }
}
