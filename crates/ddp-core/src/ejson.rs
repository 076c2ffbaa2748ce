//! EJSON wrapper types.
//!
//! DDP extends plain JSON with two scalar types, each encoded as a
//! single-key envelope object:
//!
//! ```text
//! {"$date": 1447770390000}        // milliseconds since the Unix epoch, UTC
//! {"$binary": "ICAgICAgIA=="}     // standard base64 of the raw bytes
//! ```
//!
//! [`DdpDate`] and [`DdpBinary`] carry the decoded values and serialize back
//! to the canonical envelope. Decoding an object that lacks the envelope key
//! yields the type's default value, so the same decode path can be used for
//! partial or ambiguous inputs.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An instant transported as an EJSON `$date` envelope.
///
/// Precision is whole milliseconds; the zone is always UTC. The default
/// value is the Unix epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct DdpDate {
    /// The decoded instant.
    pub instant: DateTime<Utc>,
}

impl DdpDate {
    /// Wraps an instant. Sub-millisecond precision is truncated on encode.
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self { instant }
    }

    /// Builds a date from a millisecond count since the Unix epoch.
    ///
    /// Returns `None` if the count is outside chrono's representable range.
    pub fn from_epoch_millis(millis: i64) -> Option<Self> {
        DateTime::from_timestamp_millis(millis).map(Self::new)
    }

    /// Returns the wire representation: milliseconds since the Unix epoch.
    pub fn epoch_millis(&self) -> i64 {
        self.instant.timestamp_millis()
    }
}

impl From<DateTime<Utc>> for DdpDate {
    fn from(instant: DateTime<Utc>) -> Self {
        Self::new(instant)
    }
}

impl Serialize for DdpDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("$date", &self.epoch_millis())?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for DdpDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DateVisitor;

        impl<'de> Visitor<'de> for DateVisitor {
            type Value = DdpDate;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an EJSON date envelope")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut millis: Option<i64> = None;
                while let Some(key) = map.next_key::<String>()? {
                    if key == "$date" {
                        millis = Some(map.next_value()?);
                    } else {
                        let _ = map.next_value::<de::IgnoredAny>()?;
                    }
                }
                match millis {
                    Some(ms) => DdpDate::from_epoch_millis(ms)
                        .ok_or_else(|| de::Error::custom(format!("$date out of range: {ms}"))),
                    None => Ok(DdpDate::default()),
                }
            }
        }

        deserializer.deserialize_map(DateVisitor)
    }
}

/// A byte blob transported as an EJSON `$binary` envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DdpBinary {
    /// The decoded bytes.
    pub bytes: Vec<u8>,
}

impl DdpBinary {
    /// Wraps raw bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }
}

impl From<Vec<u8>> for DdpBinary {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl Serialize for DdpBinary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("$binary", &STANDARD.encode(&self.bytes))?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for DdpBinary {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BinaryVisitor;

        impl<'de> Visitor<'de> for BinaryVisitor {
            type Value = DdpBinary;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an EJSON binary envelope")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut encoded: Option<String> = None;
                while let Some(key) = map.next_key::<String>()? {
                    if key == "$binary" {
                        encoded = Some(map.next_value()?);
                    } else {
                        let _ = map.next_value::<de::IgnoredAny>()?;
                    }
                }
                match encoded {
                    Some(text) => STANDARD
                        .decode(&text)
                        .map(DdpBinary::new)
                        .map_err(|e| de::Error::custom(format!("invalid $binary payload: {e}"))),
                    None => Ok(DdpBinary::default()),
                }
            }
        }

        deserializer.deserialize_map(BinaryVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn date_decodes_to_utc_instant() {
        let date: DdpDate = serde_json::from_str(r#"{"$date":1447770390000}"#).unwrap();
        let expected = Utc.with_ymd_and_hms(2015, 11, 17, 14, 26, 30).unwrap();
        assert_eq!(date.instant, expected);
    }

    #[test]
    fn date_encodes_to_identical_envelope() {
        let date = DdpDate::new(Utc.with_ymd_and_hms(2015, 11, 17, 14, 26, 30).unwrap());
        let json = serde_json::to_string(&date).unwrap();
        assert_eq!(json, r#"{"$date":1447770390000}"#);
    }

    #[test]
    fn date_roundtrips_arbitrary_instants() {
        for millis in [0i64, 1, -1, 1447770390000, -31536000000, 4102444800123] {
            let date = DdpDate::from_epoch_millis(millis).unwrap();
            let json = serde_json::to_string(&date).unwrap();
            assert_eq!(json, format!(r#"{{"$date":{millis}}}"#));
            let back: DdpDate = serde_json::from_str(&json).unwrap();
            assert_eq!(back, date);
        }
    }

    #[test]
    fn date_without_envelope_key_decodes_to_default() {
        let date: DdpDate = serde_json::from_str(r#"{"other":1}"#).unwrap();
        assert_eq!(date, DdpDate::default());
        assert_eq!(date.epoch_millis(), 0);
    }

    #[test]
    fn binary_decodes_seven_spaces() {
        let binary: DdpBinary = serde_json::from_str(r#"{"$binary":"ICAgICAgIA=="}"#).unwrap();
        assert_eq!(binary.bytes, vec![0x20; 7]);
    }

    #[test]
    fn binary_encodes_seven_spaces() {
        let binary = DdpBinary::new(vec![0x20; 7]);
        let json = serde_json::to_string(&binary).unwrap();
        assert_eq!(json, r#"{"$binary":"ICAgICAgIA=="}"#);
    }

    #[test]
    fn binary_roundtrips_arbitrary_bytes() {
        for bytes in [vec![], vec![0u8], vec![0xff, 0x00, 0x7f], (0..=255).collect::<Vec<u8>>()] {
            let binary = DdpBinary::new(bytes.clone());
            let json = serde_json::to_string(&binary).unwrap();
            let back: DdpBinary = serde_json::from_str(&json).unwrap();
            assert_eq!(back.bytes, bytes);
        }
    }

    #[test]
    fn binary_without_envelope_key_decodes_to_default() {
        let binary: DdpBinary = serde_json::from_str(r#"{"other":true}"#).unwrap();
        assert!(binary.bytes.is_empty());
    }

    #[test]
    fn binary_rejects_invalid_base64() {
        let result: Result<DdpBinary, _> = serde_json::from_str(r#"{"$binary":"!!!"}"#);
        assert!(result.is_err());
    }
}
