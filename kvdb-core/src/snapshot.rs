//! # Snapshot Format
//!
//! Flat text snapshot of the whole key-value map: one `key=value` record per
//! line, split at the first `=`. There is no escaping, so keys may not
//! contain `=` or line breaks and values may not contain line breaks.

use std::collections::BTreeMap;

const DELIMITER: char = '=';

pub fn is_representable_key(key: &str) -> bool {
    !key.contains(DELIMITER) && !key.contains(['\n', '\r'])
}

pub fn is_representable_value(value: &str) -> bool {
    !value.contains(['\n', '\r'])
}

/// Serialize a map into snapshot bytes.
///
/// Records are emitted in key order, so equal maps always produce
/// byte-identical snapshots.
pub fn encode(entries: &BTreeMap<String, String>) -> Vec<u8> {
    let capacity = entries.iter().map(|(k, v)| k.len() + v.len() + 2).sum();
    let mut out = String::with_capacity(capacity);
    for (key, value) in entries {
        out.push_str(key);
        out.push(DELIMITER);
        out.push_str(value);
        out.push('\n');
    }
    out.into_bytes()
}

/// Parse snapshot bytes back into a map.
///
/// Lines without a delimiter are skipped. Later records for the same key win.
pub fn decode(bytes: &[u8]) -> BTreeMap<String, String> {
    let text = String::from_utf8_lossy(bytes);
    text.lines()
        .filter_map(|line| line.split_once(DELIMITER))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_sorted_records() {
        let mut entries = BTreeMap::new();
        entries.insert("user_2".to_string(), "bob".to_string());
        entries.insert("user_1".to_string(), "alice".to_string());
        entries.insert("expr".to_string(), "a=b".to_string());

        assert_eq!(encode(&entries), b"expr=a=b\nuser_1=alice\nuser_2=bob\n");
        assert_eq!(decode(&encode(&entries)), entries);
    }

    #[test]
    fn test_decode_skips_malformed_records() {
        let entries = decode(b"a=1\nno delimiter here\n\nb=\nc=3=4");
        assert_eq!(entries.len(), 3);
        assert_eq!(entries["a"], "1");
        assert_eq!(entries["b"], "");
        assert_eq!(entries["c"], "3=4");
    }

    #[test]
    fn test_empty_snapshot() {
        assert!(encode(&BTreeMap::new()).is_empty());
        assert!(decode(b"").is_empty());
    }

    #[test]
    fn test_representable() {
        assert!(is_representable_key("user_1"));
        assert!(!is_representable_key("a=b"));
        assert!(!is_representable_key("a\r\nb"));
        assert!(is_representable_value("a=b"));
        assert!(!is_representable_value("a\nb"));
    }
}
