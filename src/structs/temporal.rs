use crate::errors::{BoltError, Result};
use crate::value::{Structure, Value};
use crate::version::Version;

use super::node::{require_int, require_string};
use super::tags;

fn expect_tag(s: &Structure, expected: u8, name: &'static str) -> Result<()> {
    if s.tag != expected {
        return Err(BoltError::InvalidMessageFormat(format!(
            "expected {name} tag 0x{expected:02X}, got 0x{:02X}",
            s.tag
        )));
    }
    Ok(())
}

fn expect_fields(s: &Structure, expected: usize, name: &'static str) -> Result<()> {
    if s.fields.len() != expected {
        return Err(BoltError::InvalidMessageFormat(format!(
            "{name} has {} fields, expected {expected}",
            s.fields.len()
        )));
    }
    Ok(())
}

fn i32_from_wire(v: &Value, field: &'static str) -> Result<i32> {
    let wide = require_int(v, field)?;
    i32::try_from(wide)
        .map_err(|_| BoltError::DeserializationError(format!("{field} ({wide}) does not fit in i32")))
}

/// Tag 0x44. Days since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Date {
    pub days_since_epoch: i64,
}

impl Date {
    pub fn to_packstream(&self) -> Structure {
        Structure::new(tags::DATE, vec![Value::Integer(self.days_since_epoch)])
    }

    pub fn from_packstream(s: &Structure) -> Result<Self> {
        expect_tag(s, tags::DATE, "Date")?;
        expect_fields(s, 1, "Date")?;
        Ok(Date { days_since_epoch: require_int(&s.fields[0], "Date.days_since_epoch")? })
    }
}

/// Tag 0x54. Nanoseconds since midnight plus a UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Time {
    pub nanos_since_midnight: i64,
    pub tz_offset_seconds: i32,
}

impl Time {
    pub fn to_packstream(&self) -> Structure {
        Structure::new(
            tags::TIME,
            vec![
                Value::Integer(self.nanos_since_midnight),
                Value::Integer(self.tz_offset_seconds as i64),
            ],
        )
    }

    pub fn from_packstream(s: &Structure) -> Result<Self> {
        expect_tag(s, tags::TIME, "Time")?;
        expect_fields(s, 2, "Time")?;
        Ok(Time {
            nanos_since_midnight: require_int(&s.fields[0], "Time.nanos_since_midnight")?,
            tz_offset_seconds: i32_from_wire(&s.fields[1], "Time.tz_offset_seconds")?,
        })
    }
}

/// Tag 0x74. Nanoseconds since midnight, no offset (not UTC-anchored).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalTime {
    pub nanos_since_midnight: i64,
}

impl LocalTime {
    pub fn to_packstream(&self) -> Structure {
        Structure::new(tags::LOCAL_TIME, vec![Value::Integer(self.nanos_since_midnight)])
    }

    pub fn from_packstream(s: &Structure) -> Result<Self> {
        expect_tag(s, tags::LOCAL_TIME, "LocalTime")?;
        expect_fields(s, 1, "LocalTime")?;
        Ok(LocalTime { nanos_since_midnight: require_int(&s.fields[0], "LocalTime.nanos_since_midnight")? })
    }
}

/// A UTC instant with its originating offset. Always stored canonically in
/// UTC (`seconds_epoch_utc`); the wire tag chosen on encode (modern 0x49 vs
/// legacy 0x46) depends on the negotiated version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTime {
    pub seconds_epoch_utc: i64,
    pub nanoseconds_of_second: i32,
    pub tz_offset_seconds: i32,
}

impl DateTime {
    pub fn to_packstream(&self, version: Version) -> Structure {
        if version.at_least(5, 0) {
            Structure::new(
                tags::DATE_TIME,
                vec![
                    Value::Integer(self.seconds_epoch_utc),
                    Value::Integer(self.nanoseconds_of_second as i64),
                    Value::Integer(self.tz_offset_seconds as i64),
                ],
            )
        } else {
            // Legacy wire form carries local seconds: secs_local = secs_utc + offset.
            let secs_local = self.seconds_epoch_utc + self.tz_offset_seconds as i64;
            Structure::new(
                tags::DATE_TIME_LEGACY,
                vec![
                    Value::Integer(secs_local),
                    Value::Integer(self.nanoseconds_of_second as i64),
                    Value::Integer(self.tz_offset_seconds as i64),
                ],
            )
        }
    }

    /// Decoding inspects the *actual* wire tag rather than trusting the
    /// negotiated version, since a peer may legitimately send either form.
    pub fn from_packstream(s: &Structure) -> Result<Self> {
        expect_fields(s, 3, "DateTime")?;
        let field0 = require_int(&s.fields[0], "DateTime.seconds")?;
        let nanoseconds_of_second = i32_from_wire(&s.fields[1], "DateTime.nanoseconds")?;
        let tz_offset_seconds = i32_from_wire(&s.fields[2], "DateTime.tz_offset_seconds")?;
        let seconds_epoch_utc = match s.tag {
            tags::DATE_TIME => field0,
            tags::DATE_TIME_LEGACY => field0 - tz_offset_seconds as i64,
            other => {
                return Err(BoltError::InvalidMessageFormat(format!(
                    "expected DateTime tag 0x{:02X} or 0x{:02X}, got 0x{other:02X}",
                    tags::DATE_TIME,
                    tags::DATE_TIME_LEGACY
                )))
            }
        };
        Ok(DateTime { seconds_epoch_utc, nanoseconds_of_second, tz_offset_seconds })
    }
}

/// A UTC instant paired with a named timezone (e.g. `Europe/Paris`) rather
/// than a raw offset.
#[derive(Debug, Clone, PartialEq)]
pub struct DateTimeZoneId {
    pub seconds_epoch_utc: i64,
    pub nanoseconds_of_second: i32,
    pub tz_id: String,
}

impl DateTimeZoneId {
    /// Emitting the legacy tag (0x66) requires resolving `tz_id` to the
    /// offset at this instant to reconstruct local seconds, which this core
    /// does not do: encoding a pure-UTC struct to the legacy form fails
    /// with `SerializationError`.
    pub fn to_packstream(&self, version: Version) -> Result<Structure> {
        if version.at_least(5, 0) {
            Ok(Structure::new(
                tags::DATE_TIME_ZONE_ID,
                vec![
                    Value::Integer(self.seconds_epoch_utc),
                    Value::Integer(self.nanoseconds_of_second as i64),
                    Value::String(self.tz_id.clone()),
                ],
            ))
        } else {
            Err(BoltError::SerializationError(format!(
                "cannot encode DateTimeZoneId to legacy tag 0x{:02X} without resolving '{}' to a UTC offset",
                tags::DATE_TIME_ZONE_ID_LEGACY,
                self.tz_id
            )))
        }
    }

    /// Legacy decode keeps `seconds_epoch_utc := seconds_field` with no
    /// offset reconciliation, since that would require a timezone database.
    pub fn from_packstream(s: &Structure) -> Result<Self> {
        expect_fields(s, 3, "DateTimeZoneId")?;
        if s.tag != tags::DATE_TIME_ZONE_ID && s.tag != tags::DATE_TIME_ZONE_ID_LEGACY {
            return Err(BoltError::InvalidMessageFormat(format!(
                "expected DateTimeZoneId tag 0x{:02X} or 0x{:02X}, got 0x{:02X}",
                tags::DATE_TIME_ZONE_ID,
                tags::DATE_TIME_ZONE_ID_LEGACY,
                s.tag
            )));
        }
        let seconds_epoch_utc = require_int(&s.fields[0], "DateTimeZoneId.seconds")?;
        let nanoseconds_of_second = i32_from_wire(&s.fields[1], "DateTimeZoneId.nanoseconds")?;
        let tz_id = require_string(&s.fields[2], "DateTimeZoneId.tz_id")?;
        Ok(DateTimeZoneId { seconds_epoch_utc, nanoseconds_of_second, tz_id })
    }
}

/// Tag 0x64. Not UTC-anchored: `seconds_epoch_local` is a local wall-clock
/// reading with no attached offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalDateTime {
    pub seconds_epoch_local: i64,
    pub nanoseconds_of_second: i32,
}

impl LocalDateTime {
    pub fn to_packstream(&self) -> Structure {
        Structure::new(
            tags::LOCAL_DATE_TIME,
            vec![
                Value::Integer(self.seconds_epoch_local),
                Value::Integer(self.nanoseconds_of_second as i64),
            ],
        )
    }

    pub fn from_packstream(s: &Structure) -> Result<Self> {
        expect_tag(s, tags::LOCAL_DATE_TIME, "LocalDateTime")?;
        expect_fields(s, 2, "LocalDateTime")?;
        Ok(LocalDateTime {
            seconds_epoch_local: require_int(&s.fields[0], "LocalDateTime.seconds")?,
            nanoseconds_of_second: i32_from_wire(&s.fields[1], "LocalDateTime.nanoseconds")?,
        })
    }
}

/// Tag 0x45. `nanoseconds` travels as a PackStream int64 but the domain
/// field is 32-bit: out-of-range values fail decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Duration {
    pub months: i64,
    pub days: i64,
    pub seconds: i64,
    pub nanoseconds: i32,
}

impl Duration {
    pub fn to_packstream(&self) -> Structure {
        Structure::new(
            tags::DURATION,
            vec![
                Value::Integer(self.months),
                Value::Integer(self.days),
                Value::Integer(self.seconds),
                Value::Integer(self.nanoseconds as i64),
            ],
        )
    }

    pub fn from_packstream(s: &Structure) -> Result<Self> {
        expect_tag(s, tags::DURATION, "Duration")?;
        expect_fields(s, 4, "Duration")?;
        Ok(Duration {
            months: require_int(&s.fields[0], "Duration.months")?,
            days: require_int(&s.fields[1], "Duration.days")?,
            seconds: require_int(&s.fields[2], "Duration.seconds")?,
            nanoseconds: i32_from_wire(&s.fields[3], "Duration.nanoseconds")?,
        })
    }
}
