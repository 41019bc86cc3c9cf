//! Clock and calendar parsing, and the off-peak schedule.

use std::fmt::{Display, Formatter};

use chrono::{NaiveDate, NaiveTime};
use itertools::Itertools;

use crate::{core::error::ParseError, prelude::*};

/// Parse a strict `HH:MM` clock time.
pub fn parse_time(text: &str) -> Result<NaiveTime, ParseError> {
    if !has_shape(text, "##:##") {
        return Err(ParseError::Time(text.to_owned()));
    }
    NaiveTime::parse_from_str(text, "%H:%M").map_err(|_| ParseError::Time(text.to_owned()))
}

/// Parse a strict `DD/MM/YYYY` date, as used in the tariff tables.
pub fn parse_date(text: &str) -> Result<NaiveDate, ParseError> {
    if !has_shape(text, "##/##/####") {
        return Err(ParseError::Date(text.to_owned()));
    }
    NaiveDate::parse_from_str(text, "%d/%m/%Y").map_err(|_| ParseError::Date(text.to_owned()))
}

/// Check the text against a fixed-width pattern, where `#` stands for an ASCII digit.
///
/// `chrono` accepts single-digit fields and padding, which the formats here do not allow.
fn has_shape(text: &str, pattern: &str) -> bool {
    text.len() == pattern.len()
        && text.bytes().zip(pattern.bytes()).all(|(byte, expected)| match expected {
            b'#' => byte.is_ascii_digit(),
            _ => byte == expected,
        })
}

/// Check whether `now` lies in `[start, end)`.
///
/// When `start` is after `end`, the interval crosses midnight.
pub fn is_within(now: NaiveTime, start: NaiveTime, end: NaiveTime) -> bool {
    if start <= end { (start <= now) && (now < end) } else { (start <= now) || (now < end) }
}

/// Clock-time interval, possibly crossing midnight.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TimeRange {
    /// Inclusive.
    pub start: NaiveTime,

    /// Exclusive.
    pub end: NaiveTime,
}

impl TimeRange {
    pub fn contains(self, now: NaiveTime) -> bool {
        is_within(now, self.start, self.end)
    }
}

impl TryFrom<&str> for TimeRange {
    type Error = ParseError;

    fn try_from(text: &str) -> Result<Self, Self::Error> {
        let (start, end) =
            text.split_once('-').ok_or_else(|| ParseError::TimeRange(text.to_owned()))?;
        Ok(Self { start: parse_time(start)?, end: parse_time(end)? })
    }
}

impl Display for TimeRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

/// Off-peak hours («heures creuses»).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct OffPeakSchedule(Vec<TimeRange>);

impl OffPeakSchedule {
    /// Parse comma-separated `HH:MM-HH:MM` ranges, skipping the malformed ones.
    pub fn parse(text: &str) -> Self {
        Self(
            text.split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .filter_map(|entry| {
                    TimeRange::try_from(entry)
                        .inspect_err(|error| debug!("skipping off-peak range: {error}"))
                        .ok()
                })
                .collect(),
        )
    }

    /// First off-peak range that contains the clock time.
    pub fn find(&self, now: NaiveTime) -> Option<TimeRange> {
        self.0.iter().copied().find(|range| range.contains(now))
    }

    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for OffPeakSchedule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.iter().join(","))
    }
}
