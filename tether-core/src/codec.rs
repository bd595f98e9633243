//! Relation codec — wire shape ↔ [`Relation`].
//!
//! Wire shape (JSON or YAML):
//!
//! ```json
//! { "id": "00g1admins", "priority": 0, "profile": { "role": "admin" } }
//! ```
//!
//! - `priority` absent or `null` → [`OrderValue::Unset`]; any integer,
//!   including `0`, → [`OrderValue::Explicit`]. Numeric strings are accepted
//!   for string-typed config layers; anything else is rejected.
//! - `profile` may be a native object or a pre-serialized JSON string. A
//!   malformed profile decodes to an empty payload so that identity and
//!   ordering still reconcile.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::{Document, Payload};
use crate::error::InputError;
use crate::types::{OrderValue, Relation, TargetId};

/// Serialized form of a single relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireRelation {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Value>,
}

/// Decode a wire relation.
///
/// Only the ordering value can fail; payload problems degrade to an empty
/// payload.
pub fn decode(wire: WireRelation) -> Result<Relation, InputError> {
    let ordering = decode_ordering(&wire.id, wire.priority.as_ref())?;
    let payload = decode_payload(&wire.id, wire.profile);
    Ok(Relation {
        target_id: TargetId::from(wire.id),
        ordering,
        payload,
    })
}

/// Decode a list of wire relations, stopping at the first malformed ordering.
pub fn decode_all(wires: Vec<WireRelation>) -> Result<Vec<Relation>, InputError> {
    wires.into_iter().map(decode).collect()
}

/// Encode a relation. `Unset` omits the ordering field; the payload is always
/// emitted as an object.
pub fn encode(relation: &Relation) -> WireRelation {
    WireRelation {
        id: relation.target_id.0.clone(),
        priority: relation.ordering.explicit().map(Value::from),
        profile: Some(Value::from(relation.payload.clone())),
    }
}

fn decode_ordering(target_id: &str, raw: Option<&Value>) -> Result<OrderValue, InputError> {
    let invalid = |value: &Value| InputError::InvalidOrdering {
        target_id: target_id.to_string(),
        value: value.to_string(),
    };
    let Some(value) = raw else {
        return Ok(OrderValue::Unset);
    };
    match value {
        Value::Null => Ok(OrderValue::Unset),
        Value::Number(n) => n
            .as_i64()
            .map(OrderValue::Explicit)
            .ok_or_else(|| invalid(value)),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(OrderValue::Explicit)
            .map_err(|_| invalid(value)),
        _ => Err(invalid(value)),
    }
}

fn decode_payload(target_id: &str, raw: Option<Value>) -> Payload {
    let value = match raw {
        None | Some(Value::Null) => return Payload::new(),
        Some(Value::String(text)) if text.trim().is_empty() => return Payload::new(),
        Some(Value::String(text)) => match serde_json::from_str::<Value>(&text) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!("target '{target_id}': unparseable profile ignored: {err}");
                return Payload::new();
            }
        },
        Some(value) => value,
    };
    match Document::from(value) {
        Document::Object(fields) => Payload::from(fields),
        other => {
            tracing::warn!("target '{target_id}': profile is not an object ({other:?}); ignored");
            Payload::new()
        }
    }
}

impl TryFrom<WireRelation> for Relation {
    type Error = InputError;

    fn try_from(wire: WireRelation) -> Result<Self, Self::Error> {
        decode(wire)
    }
}

impl From<Relation> for WireRelation {
    fn from(relation: Relation) -> Self {
        encode(&relation)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wire(value: Value) -> WireRelation {
        serde_json::from_value(value).expect("wire relation")
    }

    #[test]
    fn unset_round_trips_as_unset() {
        let relation = Relation::new("a");
        let encoded = encode(&relation);
        assert!(encoded.priority.is_none());
        assert_eq!(decode(encoded).unwrap().ordering, OrderValue::Unset);
    }

    #[test]
    fn explicit_zero_round_trips_as_explicit_zero() {
        let relation = Relation::new("a").with_ordering(0);
        let encoded = encode(&relation);
        assert_eq!(encoded.priority, Some(json!(0)));
        assert_eq!(decode(encoded).unwrap().ordering, OrderValue::Explicit(0));
    }

    #[test]
    fn null_priority_is_unset() {
        let rel = decode(wire(json!({"id": "a", "priority": null}))).unwrap();
        assert_eq!(rel.ordering, OrderValue::Unset);
    }

    #[test]
    fn numeric_string_priority_is_explicit() {
        let rel = decode(wire(json!({"id": "a", "priority": "7"}))).unwrap();
        assert_eq!(rel.ordering, OrderValue::Explicit(7));
    }

    #[test]
    fn malformed_priority_is_input_error() {
        for bad in [json!(1.5), json!("high"), json!(true), json!([1])] {
            let err = decode(wire(json!({"id": "a", "priority": bad}))).unwrap_err();
            assert!(
                matches!(err, InputError::InvalidOrdering { ref target_id, .. } if target_id == "a"),
                "got: {err}"
            );
        }
    }

    #[test]
    fn string_and_native_profiles_decode_identically() {
        let native = decode(wire(json!({"id": "a", "profile": {"role": "admin"}}))).unwrap();
        let text = decode(wire(json!({"id": "a", "profile": "{ \"role\" : \"admin\" }"}))).unwrap();
        assert_eq!(native.payload, text.payload);
        assert_eq!(native.payload.get("role").and_then(Document::as_str), Some("admin"));
    }

    #[test]
    fn malformed_profile_decodes_to_empty_payload() {
        let rel = decode(wire(json!({"id": "a", "priority": 2, "profile": "{not json"}))).unwrap();
        assert!(rel.payload.is_empty());
        assert_eq!(rel.ordering, OrderValue::Explicit(2));

        let rel = decode(wire(json!({"id": "a", "profile": [1, 2]}))).unwrap();
        assert!(rel.payload.is_empty());
    }

    #[test]
    fn encode_always_emits_object_profile() {
        let encoded = encode(&Relation::new("a"));
        assert_eq!(encoded.profile, Some(json!({})));
    }

    #[test]
    fn relation_serde_goes_through_codec() {
        let rel: Relation = serde_json::from_value(json!({"id": "a", "priority": 0})).unwrap();
        assert_eq!(rel.ordering, OrderValue::Explicit(0));
        let back = serde_json::to_value(&rel).unwrap();
        assert_eq!(back, json!({"id": "a", "priority": 0, "profile": {}}));
    }
}
