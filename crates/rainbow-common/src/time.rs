//! Forecast instants.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDateTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::CommonError;

/// Synoptic step of the GFS half-degree product, in hours.
pub const SYNOPTIC_STEP_HOURS: u32 = 3;

/// Identifier for one forecast instant, formatted `YYYYMMDDHH` (UTC).
///
/// Ordering follows time, which for fixed-width slugs is also the
/// lexicographic order of their string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ForecastSlug(DateTime<Utc>);

impl ForecastSlug {
    /// Parse a `YYYYMMDDHH` string.
    pub fn parse(s: &str) -> Result<Self, CommonError> {
        if s.len() != 10 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CommonError::InvalidSlug(s.to_string()));
        }
        let ndt = NaiveDateTime::parse_from_str(&format!("{}0000", s), "%Y%m%d%H%M%S")
            .map_err(|_| CommonError::InvalidSlug(s.to_string()))?;
        Ok(Self(Utc.from_utc_datetime(&ndt)))
    }

    /// Slug for the hour containing `dt`.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self::floor(dt, 1)
    }

    /// Slug for the latest multiple of `step_hours` at or before `dt`.
    pub fn floor(dt: DateTime<Utc>, step_hours: u32) -> Self {
        let step = step_hours.max(1);
        let hour = dt.hour() - dt.hour() % step;
        let truncated = Utc
            .with_ymd_and_hms(dt.year(), dt.month(), dt.day(), hour, 0, 0)
            .single()
            .unwrap_or(dt);
        Self(truncated)
    }

    pub fn datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Whether this instant lies after `now`.
    pub fn is_future(&self, now: DateTime<Utc>) -> bool {
        self.0 > now
    }

    /// The slug `hours` later.
    pub fn advance(&self, hours: i64) -> Self {
        Self(self.0 + Duration::hours(hours))
    }
}

impl fmt::Display for ForecastSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y%m%d%H"))
    }
}

impl FromStr for ForecastSlug {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ForecastSlug {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ForecastSlug {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let slug = ForecastSlug::parse("2016092812").unwrap();
        assert_eq!(slug.to_string(), "2016092812");
        assert_eq!(slug.datetime().hour(), 12);
        assert_eq!(slug.datetime().day(), 28);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(ForecastSlug::parse("20160928").is_err());
        assert!(ForecastSlug::parse("2016092825").is_err());
        assert!(ForecastSlug::parse("20160928ab").is_err());
        assert!(ForecastSlug::parse("2016-09-28").is_err());
    }

    #[test]
    fn test_floor_to_synoptic_hour() {
        let dt = Utc.with_ymd_and_hms(2016, 9, 28, 14, 37, 5).unwrap();
        assert_eq!(
            ForecastSlug::floor(dt, SYNOPTIC_STEP_HOURS).to_string(),
            "2016092812"
        );
        assert_eq!(ForecastSlug::from_datetime(dt).to_string(), "2016092814");
    }

    #[test]
    fn test_ordering_matches_time() {
        let a = ForecastSlug::parse("2016092809").unwrap();
        let b = ForecastSlug::parse("2016092812").unwrap();
        assert!(a < b);
        assert_eq!(a.advance(3), b);
        assert!(b.is_future(a.datetime()));
        assert!(!a.is_future(b.datetime()));
    }

    #[test]
    fn test_serde_as_string() {
        let slug = ForecastSlug::parse("2016092812").unwrap();
        let json = serde_json::to_string(&slug).unwrap();
        assert_eq!(json, "\"2016092812\"");
        let back: ForecastSlug = serde_json::from_str(&json).unwrap();
        assert_eq!(back, slug);
    }
}
