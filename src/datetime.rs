//! Module containing functionality related to BSON DateTimes.
//! For more information, see the documentation for the [`DateTime`] type.

use std::{
    convert::TryInto,
    fmt::{self, Display},
    time::{Duration, SystemTime},
};

#[cfg(feature = "chrono-0_4")]
use chrono::{LocalResult, TimeZone, Utc};
use time::{
    Date,
    Month,
    PrimitiveDateTime,
    Time,
    format_description::well_known::Rfc3339,
    macros::format_description,
};

use crate::error::{Error, Result};

/// Struct representing a BSON datetime.
/// Note: BSON datetimes have millisecond precision.
///
/// To enable conversions between this type and [`chrono::DateTime`], enable the `"chrono-0_4"`
/// feature flag in your `Cargo.toml`.
///
/// ```
/// let dt = bson_codec::DateTime::from_components(1998, 2, 12, 0, 1, 0, 23)?;
/// let expected = bson_codec::DateTime::parse_rfc3339_str("1998-02-12T00:01:00.023Z")?;
/// assert_eq!(dt, expected);
/// # Ok::<(), bson_codec::error::Error>(())
/// ```
///
/// ## Large Dates
/// The range of dates supported by `DateTime` is defined by [`DateTime::MIN`] and
/// [`DateTime::MAX`]. However, formatting and parsing RFC 3339 strings is bounded by the
/// [`time`] crate's supported date range. The `large_dates` feature can be enabled to expand
/// this range.
#[derive(Eq, PartialEq, Ord, PartialOrd, Hash, Copy, Clone)]
pub struct DateTime(i64);

impl crate::DateTime {
    /// The latest possible date that can be represented in BSON.
    pub const MAX: Self = Self::from_millis(i64::MAX);

    /// The earliest possible date that can be represented in BSON.
    pub const MIN: Self = Self::from_millis(i64::MIN);

    /// Makes a new [`DateTime`] from the number of non-leap milliseconds since
    /// January 1, 1970 0:00:00 UTC (aka "UNIX timestamp").
    pub const fn from_millis(date: i64) -> Self {
        Self(date)
    }

    /// Returns a [`DateTime`] which corresponds to the current date and time.
    pub fn now() -> DateTime {
        Self::from_system_time(SystemTime::now())
    }

    /// Builds a UTC [`DateTime`] from calendar components. `month` is 1-based.
    pub fn from_components(
        year: i32,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
        millisecond: u16,
    ) -> Result<Self> {
        let month: Month = month.try_into().map_err(Error::invalid_datetime_value)?;
        let date =
            Date::from_calendar_date(year, month, day).map_err(Error::invalid_datetime_value)?;
        let time = Time::from_hms_milli(hour, minute, second, millisecond)
            .map_err(Error::invalid_datetime_value)?;
        Ok(Self::from_time(PrimitiveDateTime::new(date, time).assume_utc()))
    }

    /// Convert the given [`chrono::DateTime`] into a [`bson_codec::DateTime`](DateTime),
    /// truncating it to millisecond precision.
    #[cfg(feature = "chrono-0_4")]
    pub fn from_chrono<T: chrono::TimeZone>(dt: chrono::DateTime<T>) -> Self {
        Self::from_millis(dt.timestamp_millis())
    }

    /// Convert this [`DateTime`] to a [`chrono::DateTime<Utc>`].
    ///
    /// Note: Not every BSON datetime can be represented as a [`chrono::DateTime`]. For such dates,
    /// [`chrono::DateTime::MIN_UTC`] or [`chrono::DateTime::MAX_UTC`] will be returned, whichever
    /// is closer.
    #[cfg(feature = "chrono-0_4")]
    pub fn to_chrono(self) -> chrono::DateTime<Utc> {
        match Utc.timestamp_millis_opt(self.0) {
            LocalResult::Single(dt) => dt,
            _ => {
                if self.0 < 0 {
                    chrono::DateTime::<Utc>::MIN_UTC
                } else {
                    chrono::DateTime::<Utc>::MAX_UTC
                }
            }
        }
    }

    pub(crate) fn from_time(dt: time::OffsetDateTime) -> Self {
        let millis = dt.unix_timestamp_nanos() / 1_000_000;
        match millis.try_into() {
            Ok(ts) => Self::from_millis(ts),
            _ => {
                if millis > 0 {
                    Self::MAX
                } else {
                    Self::MIN
                }
            }
        }
    }

    pub(crate) fn to_time_opt(self) -> Option<time::OffsetDateTime> {
        time::OffsetDateTime::UNIX_EPOCH.checked_add(time::Duration::milliseconds(self.0))
    }

    /// Convert the given [`std::time::SystemTime`] to a [`DateTime`].
    ///
    /// If the provided time is too far in the future or too far in the past to be represented
    /// by a BSON datetime, either [`DateTime::MAX`] or [`DateTime::MIN`] will be
    /// returned, whichever is closer.
    pub fn from_system_time(st: SystemTime) -> Self {
        match st.duration_since(SystemTime::UNIX_EPOCH) {
            Ok(d) => {
                if d.as_millis() <= i64::MAX as u128 {
                    Self::from_millis(d.as_millis() as i64)
                } else {
                    Self::MAX
                }
            }
            // handle SystemTime from before the Unix Epoch
            Err(e) => {
                let millis = e.duration().as_millis();
                if millis > i64::MAX as u128 {
                    Self::MIN
                } else {
                    Self::from_millis(-(millis as i64))
                }
            }
        }
    }

    /// Convert this [`DateTime`] to a [`std::time::SystemTime`].
    pub fn to_system_time(self) -> SystemTime {
        if self.0 >= 0 {
            SystemTime::UNIX_EPOCH + Duration::from_millis(self.0 as u64)
        } else {
            // i64::MIN.abs() overflows, go through i128.
            SystemTime::UNIX_EPOCH - Duration::from_millis((self.0 as i128).unsigned_abs() as u64)
        }
    }

    /// Returns the number of non-leap-milliseconds since January 1, 1970 UTC.
    pub const fn timestamp_millis(self) -> i64 {
        self.0
    }

    /// Convert this [`DateTime`] to an RFC 3339 formatted string.
    pub fn try_to_rfc3339_string(self) -> Result<String> {
        let dt = self.to_time_opt().ok_or_else(|| {
            Error::cannot_format_datetime(format!("{} is out of the supported range", self.0))
        })?;
        dt.format(&Rfc3339).map_err(Error::cannot_format_datetime)
    }

    /// Convert the given RFC 3339 formatted string to a [`DateTime`], truncating it to millisecond
    /// precision.
    pub fn parse_rfc3339_str(s: impl AsRef<str>) -> Result<Self> {
        let odt = time::OffsetDateTime::parse(s.as_ref(), &Rfc3339)
            .map_err(Error::invalid_datetime_value)?;
        Ok(Self::from_time(odt))
    }

    /// Parses the date forms the mongo shell accepts inside `ISODate(...)`: a bare
    /// `yyyy-MM-dd`, or a date and time with an optional fraction and a `Z`, `+hh:mm` or
    /// `+hhmm` offset.
    pub(crate) fn parse_iso_str(s: &str) -> Result<Self> {
        if let Ok(date) = Date::parse(s, format_description!("[year]-[month]-[day]")) {
            return Ok(Self::from_time(date.midnight().assume_utc()));
        }

        // +hhmm -> +hh:mm
        let bytes = s.as_bytes();
        let len = bytes.len();
        if len > 5
            && matches!(bytes[len - 5], b'+' | b'-')
            && bytes[len - 4..].iter().all(u8::is_ascii_digit)
            && s.contains('T')
        {
            let normalized = format!("{}:{}", &s[..len - 2], &s[len - 2..]);
            return Self::parse_rfc3339_str(normalized);
        }

        Self::parse_rfc3339_str(s)
    }

    /// Parses the `Thu Jan 01 1970 00:00:00 GMT` form produced by the shell's `Date()` function.
    pub(crate) fn parse_shell_str(s: &str) -> Result<Self> {
        let dt = PrimitiveDateTime::parse(
            s,
            format_description!(
                "[weekday repr:short] [month repr:short] [day] [year] [hour]:[minute]:[second] GMT"
            ),
        )
        .map_err(Error::invalid_datetime_value)?;
        Ok(Self::from_time(dt.assume_utc()))
    }

    /// `yyyy-MM-ddTHH:mm:ss.SSSZ`, always with milliseconds, as printed inside `ISODate(...)`.
    pub(crate) fn to_iso_millis_string(self) -> Result<String> {
        let dt = self.to_time_opt().ok_or_else(|| {
            Error::cannot_format_datetime(format!("{} is out of the supported range", self.0))
        })?;
        dt.format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
        ))
        .map_err(Error::cannot_format_datetime)
    }

    /// Formats this date the way the shell's `Date()` function does.
    pub(crate) fn to_shell_string(self) -> Result<String> {
        let dt = self.to_time_opt().ok_or_else(|| {
            Error::cannot_format_datetime(format!("{} is out of the supported range", self.0))
        })?;
        dt.format(format_description!(
            "[weekday repr:short] [month repr:short] [day] [year] [hour]:[minute]:[second] GMT"
        ))
        .map_err(Error::cannot_format_datetime)
    }
}

impl fmt::Debug for crate::DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tup = f.debug_tuple("DateTime");
        match self.to_time_opt() {
            Some(dt) => tup.field(&dt),
            _ => tup.field(&self.0),
        };
        tup.finish()
    }
}

impl Display for crate::DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_time_opt() {
            Some(dt) => Display::fmt(&dt, f),
            _ => Display::fmt(&self.0, f),
        }
    }
}

impl From<SystemTime> for crate::DateTime {
    fn from(st: SystemTime) -> Self {
        Self::from_system_time(st)
    }
}

impl From<crate::DateTime> for SystemTime {
    fn from(dt: crate::DateTime) -> Self {
        dt.to_system_time()
    }
}

#[cfg(feature = "chrono-0_4")]
impl From<crate::DateTime> for chrono::DateTime<Utc> {
    fn from(bson_dt: DateTime) -> Self {
        bson_dt.to_chrono()
    }
}

#[cfg(feature = "chrono-0_4")]
impl<T: chrono::TimeZone> From<chrono::DateTime<T>> for crate::DateTime {
    fn from(x: chrono::DateTime<T>) -> Self {
        Self::from_chrono(x)
    }
}
