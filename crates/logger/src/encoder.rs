//! JsonEncoder - one JSON object per line
//!
//! Key order: `level`, `ts`, `caller`, `msg`, service fields, `stacktrace`.

use std::panic::Location;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::level::LogLevel;

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

/// Fields stamped on every record of the error stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceFields {
    pub service_name: String,
    pub log_path: String,
}

#[derive(Serialize)]
struct Entry<'a> {
    level: &'a str,
    ts: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    caller: Option<String>,
    msg: &'a str,
    #[serde(rename = "serviceName", skip_serializing_if = "Option::is_none")]
    service_name: Option<&'a str>,
    #[serde(rename = "logPath", skip_serializing_if = "Option::is_none")]
    log_path: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stacktrace: Option<&'a str>,
}

/// Per-record context beyond the message itself
#[derive(Debug, Default, Clone, Copy)]
pub struct Context<'a> {
    pub caller: Option<&'a Location<'a>>,
    pub stacktrace: Option<&'a str>,
}

#[derive(Debug, Clone, Default)]
pub struct JsonEncoder {
    fields: Option<ServiceFields>,
}

impl JsonEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encoder that adds `serviceName` and `logPath` to every record
    pub fn with_fields(fields: ServiceFields) -> Self {
        Self {
            fields: Some(fields),
        }
    }

    pub fn encode(
        &self,
        level: LogLevel,
        msg: &str,
        ctx: Context<'_>,
    ) -> Result<Vec<u8>, serde_json::Error> {
        self.encode_at(Local::now(), level, msg, ctx)
    }

    fn encode_at(
        &self,
        now: DateTime<Local>,
        level: LogLevel,
        msg: &str,
        ctx: Context<'_>,
    ) -> Result<Vec<u8>, serde_json::Error> {
        let entry = Entry {
            level: level.as_str(),
            ts: now.format(TIME_FORMAT).to_string(),
            caller: ctx
                .caller
                .map(|location| format!("{}:{}", location.file(), location.line())),
            msg,
            service_name: self.fields.as_ref().map(|f| f.service_name.as_str()),
            log_path: self.fields.as_ref().map(|f| f.log_path.as_str()),
            stacktrace: ctx.stacktrace,
        };

        let mut buf = Vec::with_capacity(128 + msg.len());
        serde_json::to_writer(&mut buf, &entry)?;
        buf.push(b'\n');
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::Value;

    #[test]
    fn test_plain_record_shape() {
        let now = Local.with_ymd_and_hms(2024, 3, 1, 12, 30, 45).unwrap();
        let line = JsonEncoder::new()
            .encode_at(now, LogLevel::Info, "user login ok", Context::default())
            .unwrap();

        assert_eq!(line.last(), Some(&b'\n'));
        let text = String::from_utf8(line).unwrap();
        assert!(text.starts_with(r#"{"level":"info","ts":"2024-03-01T12:30:45.000"#), "{text}");

        let value: Value = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(value["msg"], "user login ok");
        assert!(value.get("caller").is_none());
        assert!(value.get("serviceName").is_none());
    }

    #[test]
    fn test_error_record_carries_caller_and_fields() {
        let encoder = JsonEncoder::with_fields(ServiceFields {
            service_name: "checkout".to_string(),
            log_path: "/var/log/checkout".to_string(),
        });
        let ctx = Context {
            caller: Some(Location::caller()),
            stacktrace: Some("frame 0"),
        };
        let line = encoder.encode(LogLevel::Error, "say \"hi\"", ctx).unwrap();
        let text = String::from_utf8(line).unwrap();

        let value: Value = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(value["level"], "error");
        assert_eq!(value["msg"], "say \"hi\"");
        assert_eq!(value["serviceName"], "checkout");
        assert_eq!(value["logPath"], "/var/log/checkout");
        assert_eq!(value["stacktrace"], "frame 0");
        assert!(value["caller"].as_str().unwrap().contains(".rs:"));

        // Service fields come after msg, stacktrace last
        let msg_at = text.find("\"msg\"").unwrap();
        assert!(text.find("\"caller\"").unwrap() < msg_at);
        assert!(text.find("\"serviceName\"").unwrap() > msg_at);
        assert!(text.find("\"stacktrace\"").unwrap() > text.find("\"logPath\"").unwrap());
    }
}
