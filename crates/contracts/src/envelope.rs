//! LogEnvelope - typed view of an encoded log record

use serde::Deserialize;
use std::borrow::Cow;

/// The part of an encoded record the content filter looks at
///
/// Every other field of the record is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogEnvelope<'a> {
    /// Message tag
    #[serde(borrow)]
    pub msg: Cow<'a, str>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_msg_and_ignores_other_fields() {
        let body = br#"{"level":"error","ts":"2024-01-01T00:00:00.000Z","msg":"heartbeat","serviceName":"svc"}"#;
        let envelope: LogEnvelope = serde_json::from_slice(body).unwrap();
        assert_eq!(envelope.msg, "heartbeat");
    }

    #[test]
    fn test_escaped_msg_is_unescaped() {
        let body = br#"{"msg":"say \"hi\""}"#;
        let envelope: LogEnvelope = serde_json::from_slice(body).unwrap();
        assert_eq!(envelope.msg, "say \"hi\"");
    }

    #[test]
    fn test_missing_msg_is_an_error() {
        let body = br#"{"level":"info"}"#;
        assert!(serde_json::from_slice::<LogEnvelope>(body).is_err());
    }
}
