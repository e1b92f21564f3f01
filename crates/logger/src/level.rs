//! Levels and the named streams

use std::fmt;

use tracing::warn;

/// Severity gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Debug,
    Info,
    Error,
}

impl LogLevel {
    /// Parse the configured level; unknown values fall back to `Info`
    pub fn from_config(value: &str) -> Self {
        match value {
            "debug" => LogLevel::Debug,
            "info" => LogLevel::Info,
            "error" => LogLevel::Error,
            other => {
                warn!(log_level = other, "Unknown log level, using info");
                LogLevel::Info
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the four log outputs, each with its own file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    Debug,
    Access,
    Info,
    Error,
}

impl Stream {
    pub const ALL: [Stream; 4] = [Stream::Debug, Stream::Access, Stream::Info, Stream::Error];

    pub fn name(&self) -> &'static str {
        match self {
            Stream::Debug => "debug",
            Stream::Access => "access",
            Stream::Info => "info",
            Stream::Error => "error",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.log", self.name())
    }

    /// Level the stream's records are written at
    ///
    /// Only the error stream writes above `info`.
    pub fn level(&self) -> LogLevel {
        match self {
            Stream::Error => LogLevel::Error,
            Stream::Debug | Stream::Access | Stream::Info => LogLevel::Info,
        }
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
