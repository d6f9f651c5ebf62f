// Meter reading domain model
use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Deserializer, de::Error};

/// One snapshot reported by the meter, as served by `/api/latest` and `/api/history`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Reading {
    #[serde(deserialize_with = "wall_clock")]
    pub timestamp: NaiveDateTime,
    pub voltage: f64,
    pub current1: f64,
    pub current2: f64,
    pub current3: f64,
    pub total_current: f64,
    pub power1: f64,
    pub power2: f64,
    pub total_power: f64,
    #[serde(default, deserialize_with = "flag")]
    pub relay1_state: bool,
    #[serde(default, deserialize_with = "flag")]
    pub relay2_state: bool,
}

impl Reading {
    /// Apparent power in VA. Never fetched, always derived.
    pub fn apparent_power(&self) -> f64 {
        self.voltage * self.total_current
    }

    pub fn relay_state(&self, relay: super::relay::RelayId) -> bool {
        match relay {
            super::relay::RelayId::One => self.relay1_state,
            super::relay::RelayId::Two => self.relay2_state,
        }
    }
}

/// Parse a server timestamp into local wall-clock time.
///
/// The meter server writes naive ISO-8601 (`2024-05-01T12:00:00.123456`);
/// RFC 3339 values with an offset are converted to local time.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

fn wall_clock<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| D::Error::custom(format!("invalid timestamp: {}", raw)))
}

// MySQL BOOLEAN columns come back as 0/1.
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Null(()),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(i) => i != 0,
        Flag::Null(()) => false,
    })
}
