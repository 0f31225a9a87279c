//! Document identifiers
//!
//! 12-byte identifiers laid out as a 4-byte big-endian creation timestamp,
//! 5 process-random bytes and a 3-byte counter. Stored inside documents in
//! extended form `{"$oid": "<24 hex chars>"}`.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};

use super::errors::{StoreError, StoreResult};

/// Key used for identifiers in extended JSON form
pub const OID_KEY: &str = "$oid";

static PROCESS_BYTES: OnceLock<[u8; 5]> = OnceLock::new();
static COUNTER: AtomicU32 = AtomicU32::new(0);

/// A storage-assigned document identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    /// Generate a fresh identifier
    pub fn new() -> Self {
        let timestamp = Utc::now().timestamp() as u32;
        let process = PROCESS_BYTES.get_or_init(rand::random);
        let counter = COUNTER.fetch_add(1, Ordering::Relaxed) & 0x00FF_FFFF;

        let mut bytes = [0u8; 12];
        bytes[0..4].copy_from_slice(&timestamp.to_be_bytes());
        bytes[4..9].copy_from_slice(process);
        bytes[9..12].copy_from_slice(&counter.to_be_bytes()[1..4]);
        Self(bytes)
    }

    /// Parse a 24 character hex string
    pub fn parse_str(s: &str) -> StoreResult<Self> {
        let invalid = || {
            StoreError::InvalidId(format!(
                "'{}' is not a valid ObjectId, it must be a 12-byte input or a 24-character hex string",
                s
            ))
        };

        let decoded = hex::decode(s).map_err(|_| invalid())?;
        let bytes: [u8; 12] = decoded.try_into().map_err(|_| invalid())?;
        Ok(Self(bytes))
    }

    /// Read an identifier out of its extended JSON form
    pub fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        if obj.len() != 1 {
            return None;
        }
        obj.get(OID_KEY)
            .and_then(Value::as_str)
            .and_then(|s| Self::parse_str(s).ok())
    }

    /// Extended JSON form, as stored in documents
    pub fn to_json(&self) -> Value {
        json!({ "$oid": self.to_hex() })
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Creation time encoded in the first four bytes
    pub fn timestamp(&self) -> DateTime<Utc> {
        let secs = u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]]);
        Utc.timestamp_opt(i64::from(secs), 0)
            .single()
            .unwrap_or_default()
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        assert_ne!(a, b);
        assert_eq!(a.to_hex().len(), 24);
    }

    #[test]
    fn test_parse_hex() {
        let id = ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap();
        assert_eq!(id.to_string(), "507f1f77bcf86cd799439011");
        assert_eq!(id.timestamp().timestamp(), 0x507f1f77);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            ObjectId::parse_str("not-an-id"),
            Err(StoreError::InvalidId(_))
        ));
        // Valid hex, wrong length
        assert!(ObjectId::parse_str("507f1f77").is_err());
    }

    #[test]
    fn test_extended_json_form() {
        let id = ObjectId::new();
        let value = id.to_json();
        assert_eq!(value[OID_KEY], id.to_hex());
        assert_eq!(ObjectId::from_json(&value), Some(id));
        assert_eq!(ObjectId::from_json(&json!("plain")), None);
    }

    #[test]
    fn test_timestamp_is_recent() {
        let id = ObjectId::new();
        let age = Utc::now() - id.timestamp();
        assert!(age.num_seconds() < 60);
    }
}
