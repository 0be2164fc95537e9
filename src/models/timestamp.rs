//! Serde helpers for millisecond-precision ISO-8601 timestamps.
//!
//! Stored documents always carry three fractional digits (`2025-01-01T00:00:00.000Z`).
//! chrono's default serializer drops a zero fraction, which would rewrite existing
//! stores on the first save, so records use these helpers instead.
//!
//! Output is always normalized to milliseconds. A stored value written with a
//! different precision (`...T00:00:00Z`, `...T00:00:00.123456Z`) or a non-UTC
//! offset loads fine but is rewritten as `...T00:00:00.000Z` on the next save,
//! so `save(load())` is byte-identical only for documents already in this form.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};

fn format(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse<E: serde::de::Error>(raw: &str) -> Result<DateTime<Utc>, E> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(E::custom)
}

pub mod millis {
    use super::*;

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw)
    }
}

pub mod option_millis {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.serialize_str(&format(dt)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => parse(&raw).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct Stamp {
        #[serde(with = "super::millis")]
        at: chrono::DateTime<chrono::Utc>,
    }

    fn rewrite(raw: &str) -> String {
        let stamp: Stamp = serde_json::from_str(&format!(r#"{{"at":"{}"}}"#, raw)).unwrap();
        serde_json::to_value(&stamp).unwrap()["at"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[test]
    fn millisecond_values_are_kept_verbatim() {
        assert_eq!(rewrite("2025-01-01T00:00:00.000Z"), "2025-01-01T00:00:00.000Z");
        assert_eq!(rewrite("2025-03-04T05:06:07.089Z"), "2025-03-04T05:06:07.089Z");
    }

    #[test]
    fn other_precisions_are_normalized_to_millis() {
        assert_eq!(rewrite("2025-01-01T00:00:00Z"), "2025-01-01T00:00:00.000Z");
        assert_eq!(rewrite("2025-01-01T00:00:00.123456Z"), "2025-01-01T00:00:00.123Z");
        assert_eq!(rewrite("2025-01-01T02:00:00.000+02:00"), "2025-01-01T00:00:00.000Z");
    }
}
