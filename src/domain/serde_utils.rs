//! Serde utilities for snowflake identifiers.

use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};
use std::fmt;

/// Snowflakes travel as strings on the wire but older payloads and replay
/// scripts use plain integers, so both are accepted.
pub mod snowflake {
    use super::{Deserializer, Serializer, Visitor, de, fmt};

    /// Serializes a snowflake as a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the serializer fails.
    pub fn serialize<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(value)
    }

    /// Deserializes a snowflake from a string or an integer.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is neither, or if the string is not a number.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SnowflakeVisitor;

        impl Visitor<'_> for SnowflakeVisitor {
            type Value = u64;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or integer snowflake")
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(value)
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                u64::try_from(value).map_err(|_| E::custom("negative snowflake"))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                value.parse::<u64>().map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_any(SnowflakeVisitor)
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Wrapper {
        #[serde(with = "super::snowflake")]
        id: u64,
    }

    #[test]
    fn test_accepts_string_and_integer() {
        let from_str: Wrapper = serde_json::from_str(r#"{"id":"42"}"#).unwrap();
        let from_int: Wrapper = serde_json::from_str(r#"{"id":42}"#).unwrap();
        assert_eq!(from_str, from_int);
    }

    #[test]
    fn test_serializes_as_string() {
        let json = serde_json::to_string(&Wrapper { id: 7 }).unwrap();
        assert_eq!(json, r#"{"id":"7"}"#);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(serde_json::from_str::<Wrapper>(r#"{"id":"abc"}"#).is_err());
        assert!(serde_json::from_str::<Wrapper>(r#"{"id":-1}"#).is_err());
    }
}
