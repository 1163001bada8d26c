//! Property tests for the canonical encoder.
//!
//! These pin down the ordering and filtering rules the gateway relies on
//! when it recomputes the signed string.

use std::collections::BTreeMap;

use alipay_wire::{canonicalize, RequestEnvelope};
use proptest::prelude::*;

/// Distinct field names with arbitrary (possibly empty) values.
fn field_map() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map("[a-z_]{1,12}", "[ -~]{0,16}", 0..12)
}

proptest! {
    #[test]
    fn order_independent(fields in field_map(), seed in any::<u64>()) {
        let pairs: Vec<(&str, Option<&str>)> = fields
            .iter()
            .map(|(k, v)| (k.as_str(), Some(v.as_str())))
            .collect();

        // Deterministic shuffle from the seed
        let mut shuffled = pairs.clone();
        let mut state = seed | 1;
        for i in (1..shuffled.len()).rev() {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            shuffled.swap(i, (state % (i as u64 + 1)) as usize);
        }

        prop_assert_eq!(canonicalize(shuffled), canonicalize(pairs));
    }

    #[test]
    fn names_in_byte_order_and_empties_dropped(fields in field_map()) {
        let canonical = canonicalize(fields.iter().map(|(k, v)| (k.as_str(), Some(v.as_str()))));

        let expected: Vec<&str> = fields
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, _)| k.as_str())
            .collect();

        let names: Vec<&str> = if canonical.is_empty() {
            Vec::new()
        } else {
            // Values may contain '&' or '=', so walk the known names
            let mut names = Vec::new();
            let mut rest = canonical.as_str();
            for (i, name) in expected.iter().enumerate() {
                let prefix = format!("{}=", name);
                prop_assert!(rest.starts_with(&prefix), "{} at {}", name, rest);
                names.push(*name);
                let value = fields[*name].as_str();
                rest = &rest[prefix.len() + value.len()..];
                if i + 1 < expected.len() {
                    prop_assert!(rest.starts_with('&'));
                    rest = &rest[1..];
                }
            }
            prop_assert!(rest.is_empty());
            names
        };

        prop_assert_eq!(names, expected);
    }

    #[test]
    fn envelope_matches_free_function(fields in field_map()) {
        let envelope: RequestEnvelope = fields.clone().into_iter().collect();
        let direct = canonicalize(
            fields
                .iter()
                .filter(|(k, _)| k.as_str() != "sign")
                .map(|(k, v)| (k.as_str(), Some(v.as_str()))),
        );
        prop_assert_eq!(envelope.canonical_string(), direct);
    }
}

#[test]
fn empty_value_dropped() {
    assert_eq!(canonicalize([("a", Some("")), ("b", Some("x"))]), "b=x");
}

#[test]
fn full_request_field_set() {
    let envelope: RequestEnvelope = [
        ("timestamp", "2024-01-02 03:04:05"),
        ("sign_type", "RSA2"),
        ("method", "alipay.trade.query"),
        ("version", "1.0"),
        ("charset", "utf-8"),
        ("biz_content", r#"{"a":"b"}"#),
        ("app_id", "2021000000000000"),
        ("notify_url", ""),
        ("sign", "ignored"),
    ]
    .into_iter()
    .collect();

    assert_eq!(
        envelope.canonical_string(),
        "app_id=2021000000000000&biz_content={\"a\":\"b\"}&charset=utf-8\
         &method=alipay.trade.query&sign_type=RSA2&timestamp=2024-01-02 03:04:05&version=1.0"
    );
}
