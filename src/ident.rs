//! Composite identifiers used to import nested resources.
//!
//! A nested remote object such as an alert rule is addressed by its whole
//! parent chain (`<team_id>/<service_id>/<integration_id>/<alert_rule_id>`).
//! Operators supply that chain once on import; afterwards only the last
//! segment is kept as the resource handle and the parents live in ordinary
//! configuration fields.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{ProviderError, Result};

pub const SEPARATOR: char = '/';

static UUID_V4: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-fA-F0-9]{8}-[a-fA-F0-9]{4}-4[a-fA-F0-9]{3}-[89abAB][a-fA-F0-9]{3}-[a-fA-F0-9]{12}$",
    )
    .expect("UUID pattern is valid")
});

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,4}$").expect("email pattern is valid")
});

/// Join segments with `/`. Values are trusted: they come back from the API.
pub fn encode<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("/")
}

/// Human readable layout for a list of positional field names,
/// e.g. `<team_id>/<service_id>`.
pub fn expected_pattern(fields: &[&str]) -> String {
    fields
        .iter()
        .map(|f| format!("<{}>", f))
        .collect::<Vec<_>>()
        .join("/")
}

/// Split `id` into exactly `fields.len()` segments without checking their shape.
pub fn split(id: &str, fields: &[&str]) -> Result<Vec<String>> {
    let segments: Vec<&str> = id.split(SEPARATOR).collect();
    if fields.is_empty() || segments.len() != fields.len() {
        return Err(ProviderError::InvalidFormat {
            id: id.to_string(),
            expected: expected_pattern(fields),
        });
    }
    Ok(segments.into_iter().map(str::to_string).collect())
}

/// Split `id` and require every segment to be a UUID v4.
///
/// The failing position is reported by the name at the same index in `fields`.
pub fn decode(id: &str, fields: &[&str]) -> Result<Vec<String>> {
    let segments = split(id, fields)?;
    for (position, (segment, field)) in segments.iter().zip(fields).enumerate() {
        if !is_valid_uuid(segment) {
            return Err(ProviderError::InvalidUuid {
                field: field.to_string(),
                position: Some(position),
                value: segment.clone(),
            });
        }
    }
    Ok(segments)
}

pub fn is_valid_uuid(value: &str) -> bool {
    UUID_V4.is_match(value)
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL.is_match(value)
}

/// Field-level UUID check used by pre-submission validation.
pub fn require_uuid(field: &str, value: &str) -> Result<()> {
    if is_valid_uuid(value) {
        Ok(())
    } else {
        Err(ProviderError::InvalidUuid {
            field: field.to_string(),
            position: None,
            value: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: &str = "11111111-1111-4111-8111-111111111111";
    const B: &str = "22222222-2222-4222-9222-222222222222";
    const C: &str = "33333333-3333-4333-a333-333333333333";
    const D: &str = "44444444-4444-4444-b444-444444444444";
    const FIELDS: [&str; 4] = ["team_id", "service_id", "integration_id", "alert_rule_id"];

    #[test]
    fn test_encode_joins_segments() {
        assert_eq!(encode(&[A, B]), format!("{}/{}", A, B));
    }

    #[test]
    fn test_round_trip_every_arity() {
        let all = [A, B, C, D];
        for arity in 1..=4 {
            let tuple = &all[..arity];
            let decoded = decode(&encode(tuple), &FIELDS[..arity]).unwrap();
            assert_eq!(decoded, tuple);
        }
    }

    #[test]
    fn test_wrong_segment_count_is_invalid_format() {
        for parts in 0..=10 {
            if parts == 2 {
                continue;
            }
            let id = vec![A; parts].join("/");
            let err = decode(&id, &["team_id", "role_id"]).unwrap_err();
            match err {
                ProviderError::InvalidFormat { expected, .. } => {
                    assert_eq!(expected, "<team_id>/<role_id>");
                }
                other => panic!("expected InvalidFormat for {} parts, got {:?}", parts, other),
            }
        }
    }

    #[test]
    fn test_each_position_rejects_non_uuid() {
        for position in 0..FIELDS.len() {
            let mut segments = vec![A, B, C, D];
            segments[position] = "not-a-uuid";
            let err = decode(&encode(&segments), &FIELDS).unwrap_err();
            match err {
                ProviderError::InvalidUuid {
                    field,
                    position: Some(p),
                    value,
                } => {
                    assert_eq!(field, FIELDS[position]);
                    assert_eq!(p, position);
                    assert_eq!(value, "not-a-uuid");
                }
                other => panic!("unexpected error {:?}", other),
            }
        }
    }

    #[test]
    fn test_first_bad_segment_wins() {
        let err = decode("abc/def", &["team_id", "schedule_id"]).unwrap_err();
        assert!(matches!(
            err,
            ProviderError::InvalidUuid { ref field, position: Some(0), ref value }
                if field == "team_id" && value == "abc"
        ));
    }

    #[test]
    fn test_uuid_pattern() {
        assert!(is_valid_uuid(A));
        assert!(is_valid_uuid(&A.to_uppercase()));
        assert!(is_valid_uuid(&uuid::Uuid::new_v4().to_string()));
        // version nibble must be 4
        assert!(!is_valid_uuid("11111111-1111-1111-8111-111111111111"));
        // variant nibble must be 8, 9, a or b
        assert!(!is_valid_uuid("11111111-1111-4111-c111-111111111111"));
        assert!(!is_valid_uuid("11111111-1111-4111-|111-111111111111"));
        assert!(!is_valid_uuid(""));
    }

    #[test]
    fn test_split_skips_uuid_check() {
        let segments = split("jdoe/not-a-uuid", &["username", "rule_id"]).unwrap();
        assert_eq!(segments, vec!["jdoe", "not-a-uuid"]);
    }

    #[test]
    fn test_email_pattern() {
        assert!(is_valid_email("ops@example.com"));
        assert!(!is_valid_email("ops@example"));
        assert!(!is_valid_email("Ops@Example.com"));
    }
}
