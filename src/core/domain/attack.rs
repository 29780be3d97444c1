use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single observed attack event.
///
/// Events are produced by an attack source (see
/// [`AttackSourcePort`](crate::core::ports::source::AttackSourcePort)), consumed
/// once by the ingestion service, and immutable from creation onward. The
/// `source`/`destination` pair is the identity used for aggregation; `asn` and
/// `size_bytes` are carried through to subscribers for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttackEvent {
    /// ISO 3166 country code the attack originated from.
    pub source: String,
    /// ISO 3166 country code the attack targeted.
    pub destination: String,
    /// When the event was observed (UTC).
    pub occurred_at: DateTime<Utc>,
    /// Autonomous system number the traffic was attributed to.
    pub asn: u32,
    /// Payload size of the observed traffic.
    pub size_bytes: u32,
}

/// A wire-friendly representation of an attack event.
///
/// Timestamps are rendered as RFC 3339 strings so browser clients can consume
/// them without further conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormattedAttack {
    #[serde(rename = "Source")]
    pub source: String,
    #[serde(rename = "Destination")]
    pub destination: String,
    #[serde(rename = "OccurredAt")]
    pub occurred_at: String,
    #[serde(rename = "Asn")]
    pub asn: u32,
    #[serde(rename = "SizeBytes")]
    pub size_bytes: u32,
}

impl AttackEvent {
    pub fn new(
        source: impl Into<String>,
        destination: impl Into<String>,
        occurred_at: DateTime<Utc>,
        asn: u32,
        size_bytes: u32,
    ) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            occurred_at,
            asn,
            size_bytes,
        }
    }

    /// Converts an `AttackEvent` into its formatted representation.
    pub fn to_formatted(&self) -> FormattedAttack {
        FormattedAttack {
            source: self.source.clone(),
            destination: self.destination.clone(),
            occurred_at: self.occurred_at.to_rfc3339(),
            asn: self.asn,
            size_bytes: self.size_bytes,
        }
    }
}
