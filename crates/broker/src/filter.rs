//! Content filter - suppress records by their `msg` tag

use std::sync::Arc;

use contracts::LogEnvelope;
use tracing::debug;

/// Ordered list of message tags whose records are never forwarded
///
/// A record is suppressed when its `msg` equals a pattern, equals the
/// pattern wrapped in square brackets, or contains the pattern. Empty
/// patterns never match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentFilter {
    patterns: Vec<String>,
}

impl ContentFilter {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Whether an encoded record must be dropped
    ///
    /// Records that are not JSON, or carry no `msg`, are forwarded.
    pub fn suppress(&self, record: &[u8]) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        match serde_json::from_slice::<LogEnvelope>(record) {
            Ok(envelope) => self.matches_msg(&envelope.msg),
            Err(e) => {
                debug!(error = %e, "Record has no readable msg, forwarding unfiltered");
                false
            }
        }
    }

    /// Whether a message tag hits any pattern
    pub fn matches_msg(&self, msg: &str) -> bool {
        if msg.is_empty() {
            return false;
        }
        self.patterns
            .iter()
            .filter(|pattern| !pattern.is_empty())
            .any(|pattern| tag_matches(msg, pattern))
    }
}

fn tag_matches(msg: &str, pattern: &str) -> bool {
    if msg == pattern {
        return true;
    }
    let bracketed = msg
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .is_some_and(|inner| inner == pattern);
    bracketed || msg.contains(pattern)
}

/// A topic paired with the filter applied before sending to it
#[derive(Debug, Clone)]
pub struct TopicBinding {
    topic: Arc<str>,
    filter: Arc<ContentFilter>,
}

impl TopicBinding {
    pub fn new(topic: impl Into<Arc<str>>, filter: ContentFilter) -> Self {
        Self {
            topic: topic.into(),
            filter: Arc::new(filter),
        }
    }

    /// Binding that forwards everything
    pub fn unfiltered(topic: impl Into<Arc<str>>) -> Self {
        Self::new(topic, ContentFilter::default())
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn filter(&self) -> &ContentFilter {
        &self.filter
    }

    pub(crate) fn parts(&self) -> (Arc<str>, Arc<ContentFilter>) {
        (Arc::clone(&self.topic), Arc::clone(&self.filter))
    }
}
