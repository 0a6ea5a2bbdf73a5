//! Cross-tab sync signals

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{Result, SyncError};

/// Well-known shared storage key used as the signalling channel
pub const SYNC_SIGNAL_KEY: &str = "biotap-sync";

/// What changed in the originating tab
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncType {
    /// A tracked link was clicked
    #[default]
    Click,
    /// The link list was edited
    Link,
    /// Everything may have changed
    All,
}

impl SyncType {
    /// Get type as string label
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncType::Click => "click",
            SyncType::Link => "link",
            SyncType::All => "all",
        }
    }
}

/// Payload written to [`SYNC_SIGNAL_KEY`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSignal {
    #[serde(rename = "type")]
    pub kind: SyncType,
    /// Milliseconds since the unix epoch
    pub timestamp: u64,
    /// Per-sender sequence number; keeps payloads distinct within one millisecond
    #[serde(default)]
    pub seq: u64,
}

impl SyncSignal {
    /// Create a signal stamped with the current time
    pub fn new(kind: SyncType, seq: u64) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        Self {
            kind,
            timestamp,
            seq,
        }
    }

    /// Whether a subscriber should invalidate its keys for this signal
    pub fn invalidates_subscribers(&self) -> bool {
        matches!(self.kind, SyncType::Click | SyncType::All)
    }

    /// Encode to the storage value format
    pub fn to_payload(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| SyncError::Serialization(e.to_string()))
    }

    /// Parse from a storage value
    pub fn from_payload(payload: &str) -> Result<Self> {
        serde_json::from_str(payload).map_err(|e| SyncError::MalformedSignal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_format() {
        let signal = SyncSignal {
            kind: SyncType::Click,
            timestamp: 1_700_000_000_000,
            seq: 3,
        };
        assert_eq!(
            signal.to_payload().unwrap(),
            r#"{"type":"click","timestamp":1700000000000,"seq":3}"#
        );
    }

    #[test]
    fn test_parse_without_seq() {
        let signal = SyncSignal::from_payload(r#"{"type":"all","timestamp":1}"#).unwrap();
        assert_eq!(signal.kind, SyncType::All);
        assert_eq!(signal.seq, 0);
    }

    #[test]
    fn test_malformed_payload() {
        for payload in ["", "not json", r#"{"type":"bogus","timestamp":1}"#, "{}"] {
            assert!(matches!(
                SyncSignal::from_payload(payload),
                Err(SyncError::MalformedSignal(_))
            ));
        }
    }

    #[test]
    fn test_filter() {
        assert!(SyncSignal::new(SyncType::Click, 0).invalidates_subscribers());
        assert!(SyncSignal::new(SyncType::All, 0).invalidates_subscribers());
        assert!(!SyncSignal::new(SyncType::Link, 0).invalidates_subscribers());
    }

    #[test]
    fn test_type_label() {
        assert_eq!(SyncType::Link.as_str(), "link");
        assert_eq!(SyncType::default(), SyncType::Click);
    }
}
