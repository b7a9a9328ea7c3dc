//! Opaque, time-ordered record identifiers.
//!
//! Every stored record is keyed by a 12-byte token: 4 bytes of big-endian
//! unix seconds, 5 process-random bytes and a 3-byte counter. Rendered as
//! 24 lower-hex characters, tokens sort lexicographically in creation
//! order, which is what the time-ordered queries rely on.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU32, Ordering};

use rand::Rng;
use time::OffsetDateTime;

use crate::error::ParseError;

/// Number of raw bytes in a [`RecordId`].
pub const ID_LEN: usize = 12;

/// Length of the hex rendering.
const HEX_LEN: usize = ID_LEN * 2;

/// Opaque identifier for one stored record.
///
/// Identifiers are generated at write time and rendered as strings at
/// every caller-visible boundary. The raw form is available through
/// [`RecordId::as_bytes`] for testing and ordering checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId([u8; ID_LEN]);

fn process_random() -> &'static [u8; 5] {
    static BYTES: OnceLock<[u8; 5]> = OnceLock::new();
    BYTES.get_or_init(|| rand::rng().random())
}

fn counter() -> &'static AtomicU32 {
    static COUNTER: OnceLock<AtomicU32> = OnceLock::new();
    COUNTER.get_or_init(|| AtomicU32::new(rand::rng().random()))
}

impl RecordId {
    /// Generate a fresh identifier stamped with the current UTC time.
    pub fn new() -> Self {
        Self::from_timestamp(OffsetDateTime::now_utc())
    }

    /// Generate an identifier stamped with an explicit timestamp.
    ///
    /// The random and counter components are still fresh; only the leading
    /// 4 bytes are taken from `ts`. Used for backfill and deterministic
    /// ordering in tests.
    pub fn from_timestamp(ts: OffsetDateTime) -> Self {
        let secs = ts.unix_timestamp().clamp(0, u32::MAX as i64) as u32;
        let count = counter().fetch_add(1, Ordering::Relaxed) & 0x00FF_FFFF;

        let mut bytes = [0u8; ID_LEN];
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(process_random());
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);
        Self(bytes)
    }

    /// Construct from raw bytes.
    pub fn from_bytes(bytes: [u8; ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw byte view.
    pub fn as_bytes(&self) -> &[u8; ID_LEN] {
        &self.0
    }

    /// The creation instant embedded in the identifier (second precision).
    pub fn timestamp(&self) -> OffsetDateTime {
        let secs = u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]]);
        // A u32 second count is always in range for OffsetDateTime.
        OffsetDateTime::from_unix_timestamp(i64::from(secs))
            .unwrap_or(OffsetDateTime::UNIX_EPOCH)
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl FromStr for RecordId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != HEX_LEN || !s.is_ascii() {
            return Err(ParseError::InvalidId(s.to_string()));
        }
        let mut bytes = [0u8; ID_LEN];
        for (i, chunk) in s.as_bytes().chunks_exact(2).enumerate() {
            let pair = std::str::from_utf8(chunk).map_err(|_| ParseError::InvalidId(s.to_string()))?;
            bytes[i] =
                u8::from_str_radix(pair, 16).map_err(|_| ParseError::InvalidId(s.to_string()))?;
        }
        Ok(Self(bytes))
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for RecordId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for RecordId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_display_roundtrip() {
        let id = RecordId::new();
        let rendered = id.to_string();
        assert_eq!(rendered.len(), 24);
        assert!(rendered.chars().all(|c| c.is_ascii_hexdigit()));

        let parsed: RecordId = rendered.parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_parse_rejects_malformed_strings() {
        assert!("".parse::<RecordId>().is_err());
        assert!("not-an-id".parse::<RecordId>().is_err());
        assert!("zzzzzzzzzzzzzzzzzzzzzzzz".parse::<RecordId>().is_err());
        // Right characters, wrong length
        assert!("0011223344".parse::<RecordId>().is_err());
        // Multi-byte characters must not panic the chunked parser
        assert!("éééééééééééééééééééééééé".parse::<RecordId>().is_err());
    }

    #[test]
    fn test_lexicographic_order_follows_time() {
        let older = RecordId::from_timestamp(datetime!(2024-01-15 10:00:00 UTC));
        let newer = RecordId::from_timestamp(datetime!(2024-06-01 10:00:00 UTC));

        assert!(older < newer);
        assert!(older.to_string() < newer.to_string());
    }

    #[test]
    fn test_embedded_timestamp() {
        let ts = datetime!(2024-03-01 12:30:45 UTC);
        let id = RecordId::from_timestamp(ts);
        assert_eq!(id.timestamp(), ts);
    }

    #[test]
    fn test_ids_are_unique_within_a_second() {
        let ts = datetime!(2024-03-01 12:30:45 UTC);
        let a = RecordId::from_timestamp(ts);
        let b = RecordId::from_timestamp(ts);
        assert_ne!(a, b);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_as_string() {
        let id = RecordId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));

        let back: RecordId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
