//! Row identifier
//!
//! 12-byte ObjectId layout: 4-byte big-endian seconds timestamp, 5 random
//! bytes, 3-byte counter. Ordering of the raw bytes equals ordering of the
//! lowercase hex form, so either can be compared for "greater than" tests.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;

use rand::Rng;
use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

static COUNTER: AtomicU32 = AtomicU32::new(0);
static PROCESS_UNIQUE: OnceLock<[u8; 5]> = OnceLock::new();

/// Unique per-document row identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId([u8; 12]);

/// Error returned when a string is not a 24-character hex identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRecordId(pub String);

impl fmt::Display for InvalidRecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a valid ObjectId", self.0)
    }
}

impl std::error::Error for InvalidRecordId {}

impl RecordId {
    /// Generates a fresh identifier. Identifiers generated by one process
    /// increase monotonically.
    pub fn generate() -> Self {
        let seconds = chrono::Utc::now().timestamp() as u32;
        let count = COUNTER.fetch_add(1, Ordering::Relaxed);
        let random = PROCESS_UNIQUE.get_or_init(|| rand::thread_rng().gen());

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(random);
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    pub fn bytes(&self) -> &[u8; 12] {
        &self.0
    }

    /// Parses exactly 24 hex characters (either case)
    pub fn parse(s: &str) -> Result<Self, InvalidRecordId> {
        // from_str_radix alone would accept a sign prefix such as "+f"
        if s.len() != 24 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(InvalidRecordId(s.to_string()));
        }

        let mut bytes = [0u8; 12];
        for (i, pair) in s.as_bytes().chunks(2).enumerate() {
            bytes[i] = (hex_value(pair[0]) << 4) | hex_value(pair[1]);
        }
        Ok(Self(bytes))
    }

    /// Returns true if `s` parses as an identifier
    pub fn is_valid(s: &str) -> bool {
        Self::parse(s).is_ok()
    }

    /// Lowercase hex form
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Extended JSON form used inside query documents: `{"$oid": hex}`
    pub fn to_document(&self) -> Value {
        json!({ "$oid": self.to_hex() })
    }

    /// Reads an identifier out of either `{"$oid": hex}` or a bare hex string
    pub fn from_document(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Self::parse(s).ok(),
            Value::Object(map) => map.get("$oid")?.as_str().and_then(|s| Self::parse(s).ok()),
            _ => None,
        }
    }
}

/// Value of one ASCII hex digit; callers check `is_ascii_hexdigit` first
fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        _ => digit - b'A' + 10,
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for RecordId {
    type Err = InvalidRecordId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("$oid", &self.to_hex())?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_document(&value)
            .ok_or_else(|| de::Error::custom(format!("invalid ObjectId: {}", value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_case() {
        let id = RecordId::parse("65A1F0C2B3D4E5F60718293A").unwrap();
        assert_eq!(id.to_hex(), "65a1f0c2b3d4e5f60718293a");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(RecordId::parse("").is_err());
        assert!(RecordId::parse("65a1f0c2b3d4e5f60718293").is_err());
        assert!(RecordId::parse("65a1f0c2b3d4e5f60718293z").is_err());
        assert!(RecordId::parse("calories:null:65a1f0c2b3").is_err());
    }

    #[test]
    fn test_parse_rejects_signed_pairs() {
        assert!(RecordId::parse("+f+f+f+f+f+f+f+f+f+f+f+f").is_err());
        assert!(RecordId::parse("-0000000000000000000000a").is_err());
        assert!(!RecordId::is_valid("65a1f0c2b3d4e5f6071829+a"));
    }

    #[test]
    fn test_generated_ids_increase() {
        let a = RecordId::generate();
        let b = RecordId::generate();
        assert_ne!(a, b);
        // Same second, counter breaks the tie unless the second rolled over
        assert!(a.bytes()[..4] <= b.bytes()[..4]);
    }

    #[test]
    fn test_hex_order_matches_byte_order() {
        let low = RecordId::parse("000000000000000000000009").unwrap();
        let high = RecordId::parse("00000000000000000000000a").unwrap();
        assert!(low < high);
        assert!(low.to_hex() < high.to_hex());
    }

    #[test]
    fn test_document_round_trip() {
        let id = RecordId::generate();
        let doc = serde_json::to_value(id).unwrap();
        assert_eq!(doc, id.to_document());
        let back: RecordId = serde_json::from_value(doc).unwrap();
        assert_eq!(back, id);
    }
}
