use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::quote::Quote;

/// Coarse session label derived from local hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionTag {
    Morning,
    Afternoon,
    Closed,
}

impl SessionTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionTag::Morning => "morning",
            SessionTag::Afternoon => "afternoon",
            SessionTag::Closed => "closed",
        }
    }
}

/// On-the-wire envelope published onto the bus.
///
/// Immutable once built: [`build`] is the only constructor, and every
/// field is plain data — there is no "setter" API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalMessage {
    pub node_id: String,
    pub source: String,
    #[serde(rename = "type")]
    pub payload_type: String,
    pub payload: Vec<Quote>,
    #[serde(rename = "market")]
    pub market_tag: String,
    #[serde(rename = "session")]
    pub session_tag: SessionTag,
    pub created_at: DateTime<Utc>,
}

/// Build a [`CanonicalMessage`]. Pure: no clock reads, no IO — every
/// time-dependent value is supplied by the caller.
pub fn build(
    node_id: impl Into<String>,
    source: impl Into<String>,
    payload_type: impl Into<String>,
    payload: Vec<Quote>,
    market_tag: impl Into<String>,
    session_tag: SessionTag,
    created_at: DateTime<Utc>,
) -> CanonicalMessage {
    CanonicalMessage {
        node_id: node_id.into(),
        source: source.into(),
        payload_type: payload_type.into(),
        payload,
        market_tag: market_tag.into(),
        session_tag,
        created_at,
    }
}

impl CanonicalMessage {
    /// Stable, field-ordered JSON encoding (field order follows the
    /// struct's declaration order; serde_json preserves it because this
    /// crate does not enable the `preserve_order`-breaking alternatives).
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> serde_json::Result<CanonicalMessage> {
        serde_json::from_str(raw)
    }

    /// Bus stream name for this message's payload type: `stock:stream:<type>`.
    pub fn stream_name(&self) -> String {
        stream_name_for(&self.payload_type)
    }
}

/// Deterministic stream-name rule shared by the builder and the executor
/// `stock:stream:<payload_type>`.
pub fn stream_name_for(payload_type: &str) -> String {
    format!("stock:stream:{payload_type}")
}
