use crate::error::{OpayError, Result};
use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Total width of an order id: 14 timestamp + 9 nanosecond + 9 salt digits.
pub const ORDER_ID_LEN: usize = 32;

const TIMESTAMP_LEN: usize = 14;
const NANOS_LEN: usize = 9;
const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";
const SECONDS_PER_HOUR: i32 = 60 * 60;

/// Named fixed-offset zone used for the timestamp part of order ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeZone {
    name: String,
    offset: FixedOffset,
}

impl TimeZone {
    pub fn utc() -> Self {
        Self {
            name: "UTC".to_string(),
            offset: Utc.fix(),
        }
    }

    /// Builds a zone `hour_offset` hours east of UTC.
    pub fn fixed(name: impl Into<String>, hour_offset: i32) -> Result<Self> {
        let name = name.into();
        let offset = hour_offset
            .checked_mul(SECONDS_PER_HOUR)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| OpayError::InvalidTimeZone {
                name: name.clone(),
                hours: hour_offset,
            })?;
        Ok(Self { name, offset })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }
}

impl Default for TimeZone {
    fn default() -> Self {
        Self::utc()
    }
}

/// Deserialisable form of [`TimeZone`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeZoneConfig {
    pub name: String,
    pub hour_offset: i32,
}

impl Default for TimeZoneConfig {
    fn default() -> Self {
        Self {
            name: "UTC".to_string(),
            hour_offset: 0,
        }
    }
}

impl TryFrom<TimeZoneConfig> for TimeZone {
    type Error = OpayError;

    fn try_from(config: TimeZoneConfig) -> Result<Self> {
        TimeZone::fixed(config.name, config.hour_offset)
    }
}

/// A 32-digit order identifier: `YYYYMMDDHHMMSS`, nanoseconds, salt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrderId {
    raw: String,
    timestamp: NaiveDateTime,
    nanos: u32,
    salt: u32,
}

impl OrderId {
    pub(crate) fn compose(at: DateTime<FixedOffset>, salt: u32) -> Self {
        // chrono encodes a leap second as nanos >= 1e9
        let nanos = at.nanosecond() % 1_000_000_000;
        let timestamp = at.naive_local();
        let raw = format!(
            "{}{:09}{:09}",
            timestamp.format(TIMESTAMP_FORMAT),
            nanos,
            salt
        );
        Self {
            raw,
            timestamp: timestamp.with_nanosecond(0).unwrap_or(timestamp),
            nanos,
            salt,
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || OpayError::InvalidOrderId(s.to_string());

        if s.len() != ORDER_ID_LEN || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let (stamp, rest) = s.split_at(TIMESTAMP_LEN);
        let (nanos, salt) = rest.split_at(NANOS_LEN);
        let timestamp =
            NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).map_err(|_| invalid())?;

        Ok(Self {
            raw: s.to_string(),
            timestamp,
            nanos: nanos.parse().map_err(|_| invalid())?,
            salt: salt.parse().map_err(|_| invalid())?,
        })
    }

    /// Wall-clock second in the zone the id was generated in.
    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn nanos(&self) -> u32 {
        self.nanos
    }

    pub fn salt(&self) -> u32 {
        self.salt
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn into_string(self) -> String {
        self.raw
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl AsRef<str> for OrderId {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

impl FromStr for OrderId {
    type Err = OpayError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for OrderId {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for OrderId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        OrderId::parse(&raw).map_err(serde::de::Error::custom)
    }
}
