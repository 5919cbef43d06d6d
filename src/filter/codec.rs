//! Versioned serialization for persisted condition sequences.
//!
//! Saved filters store their conditions as a tagged envelope,
//! `{"version": 1, "conditions": [...]}`, so that malformed or
//! future-incompatible blobs fail loudly at the boundary instead of
//! silently degrading into an empty filter. Rows written before the
//! envelope existed hold a bare condition array and are still accepted.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Condition;

/// Schema version written by [`encode`].
pub const CURRENT_VERSION: u32 = 1;

/// Errors raised when a conditions payload cannot be decoded.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The payload is neither a versioned envelope nor a legacy array.
    #[error("conditions payload is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),

    /// The payload was written by a newer schema than this build knows.
    #[error("unsupported conditions schema version {0}")]
    UnsupportedVersion(u32),
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    version: u32,
    conditions: Vec<Condition>,
}

/// Serializes a condition sequence into the current envelope format.
pub fn encode(conditions: &[Condition]) -> String {
    serde_json::to_string(&Envelope {
        version: CURRENT_VERSION,
        conditions: conditions.to_vec(),
    })
    .expect("serializing conditions never fails")
}

/// Parses a stored conditions payload.
///
/// Accepts the current envelope and the pre-versioning bare array form.
/// Anything else is an error; callers decide whether that surfaces as a
/// rejected write or a data-integrity failure on read.
pub fn decode(raw: &str) -> Result<Vec<Condition>, CodecError> {
    match serde_json::from_str::<Envelope>(raw) {
        Ok(envelope) if envelope.version == CURRENT_VERSION => Ok(envelope.conditions),
        Ok(envelope) => Err(CodecError::UnsupportedVersion(envelope.version)),
        Err(envelope_err) => serde_json::from_str::<Vec<Condition>>(raw)
            .map_err(|_| CodecError::Malformed(envelope_err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Field, Logic, Operator};

    fn sample_conditions() -> Vec<Condition> {
        vec![
            Condition {
                id: 1,
                logic: Logic::None,
                negate: false,
                field: Field::Title,
                operator: Operator::Contains,
                value: "go".to_string(),
                values: vec![],
            },
            Condition {
                id: 2,
                logic: Logic::And,
                negate: true,
                field: Field::Categories,
                operator: Operator::In,
                value: String::new(),
                values: vec!["release".to_string(), "beta".to_string()],
            },
        ]
    }

    #[test]
    fn round_trip_preserves_conditions() {
        let original = sample_conditions();
        let decoded = decode(&encode(&original)).expect("decode");
        assert_eq!(decoded, original);
    }

    #[test]
    fn encode_writes_current_version() {
        let raw = encode(&sample_conditions());
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(value["version"], CURRENT_VERSION);
    }

    #[test]
    fn decode_accepts_legacy_bare_array() {
        let raw = serde_json::to_string(&sample_conditions()).expect("json");
        let decoded = decode(&raw).expect("decode legacy");
        assert_eq!(decoded.len(), 2);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(decode("not json at all"), Err(CodecError::Malformed(_))));
        assert!(matches!(decode("{\"wrong\": true}"), Err(CodecError::Malformed(_))));
    }

    #[test]
    fn decode_rejects_future_version() {
        let raw = r#"{"version": 99, "conditions": []}"#;
        assert!(matches!(
            decode(raw),
            Err(CodecError::UnsupportedVersion(99))
        ));
    }

    #[test]
    fn decode_rejects_envelope_without_conditions() {
        assert!(matches!(
            decode(r#"{"version": 1}"#),
            Err(CodecError::Malformed(_))
        ));
    }
}
