//! Tempo day colors and their cache.

use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter},
};

use chrono::{NaiveDate, NaiveTime};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};

use crate::{api::Fetch, prelude::*};

/// Tempo day color, as coded by the calendar API (`codeJour`).
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum TempoColor {
    #[default]
    #[serde(rename = "indéterminé")]
    Unknown,

    #[serde(rename = "bleu")]
    Blue,

    #[serde(rename = "blanc")]
    White,

    #[serde(rename = "rouge")]
    Red,
}

impl TempoColor {
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Unknown => "indéterminé",
            Self::Blue => "bleu",
            Self::White => "blanc",
            Self::Red => "rouge",
        }
    }
}

impl Display for TempoColor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<u8> for TempoColor {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Unknown),
            1 => Ok(Self::Blue),
            2 => Ok(Self::White),
            3 => Ok(Self::Red),
            _ => Err(code),
        }
    }
}

/// Color of a calendar day.
#[must_use]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TempoDay {
    pub date: NaiveDate,
    pub color: TempoColor,
}

impl TempoDay {
    pub const fn unknown(date: NaiveDate) -> Self {
        Self { date, color: TempoColor::Unknown }
    }

    /// Interpret the calendar API response, treating anything unexpected as an unknown color.
    fn from_response(date: NaiveDate, body: serde_json::Value) -> Self {
        let response = match serde_json::from_value::<DayResponse>(body) {
            Ok(response) => response,
            Err(error) => {
                warn!(%date, "invalid Tempo calendar response: {error:#}");
                return Self::unknown(date);
            }
        };
        if let Some(echoed_date) = response.date
            && echoed_date != date
        {
            warn!(%date, %echoed_date, "the Tempo calendar answered for another day");
        }
        match TempoColor::try_from(response.code) {
            Ok(color) => Self { date, color },
            Err(code) => {
                warn!(%date, code, "unexpected Tempo color code");
                Self::unknown(date)
            }
        }
    }
}

#[serde_as]
#[derive(Deserialize)]
struct DayResponse {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[serde(rename = "codeJour")]
    code: u8,

    #[serde(default, rename = "dateJour")]
    date: Option<NaiveDate>,
}

/// Times of day driving the Tempo color lookups.
#[derive(Copy, Clone, Debug)]
pub struct TempoSchedule {
    /// A Tempo day starts at this time, the previous day's color applies before.
    pub day_starts_at: NaiveTime,

    /// Tomorrow's color is published by this time.
    pub tomorrow_available_at: NaiveTime,
}

impl TempoSchedule {
    pub const DEFAULT_DAY_STARTS_AT: NaiveTime = hms(6, 0);
    pub const DEFAULT_TOMORROW_AVAILABLE_AT: NaiveTime = hms(11, 0);
}

impl Default for TempoSchedule {
    fn default() -> Self {
        Self {
            day_starts_at: Self::DEFAULT_DAY_STARTS_AT,
            tomorrow_available_at: Self::DEFAULT_TOMORROW_AVAILABLE_AT,
        }
    }
}

const fn hms(hour: u32, minute: u32) -> NaiveTime {
    match NaiveTime::from_hms_opt(hour, minute, 0) {
        Some(time) => time,
        None => panic!("invalid time"),
    }
}

/// In-memory cache of the Tempo calendar for the process lifetime.
#[derive(Default)]
pub struct TempoCache(BTreeMap<NaiveDate, TempoDay>);

impl TempoCache {
    /// Get the day color, from the cache when it is still trustworthy.
    ///
    /// A cached unknown color is only trusted until the calendar is expected to publish the
    /// answer. Transport failures produce an unknown color which is not cached.
    #[instrument(skip_all, fields(on = %on))]
    pub async fn get_day<F: Fetch + ?Sized>(
        &mut self,
        fetcher: &F,
        base_url: &Url,
        on: NaiveDate,
        now: NaiveTime,
        schedule: &TempoSchedule,
    ) -> TempoDay {
        if let Some(day) = self.0.get(&on)
            && (day.color.is_known() || now < schedule.tomorrow_available_at)
        {
            trace!(color = %day.color, "cache hit");
            return *day;
        }

        let url = format!("{}/{on}", base_url.as_str().trim_end_matches('/'));
        match fetcher.fetch_json(&url).await {
            Ok(body) => {
                let day = TempoDay::from_response(on, body);
                debug!(color = %day.color, "fetched");
                self.0.insert(on, day);
                day
            }
            Err(error) => {
                warn!("failed to fetch the Tempo color: {:#}", anyhow::Error::from(error));
                TempoDay::unknown(on)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::core::testing::FakeFetcher;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn time(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn test_from_response_ok() {
        let on = date(2024, 1, 15);
        let day = TempoDay::from_response(
            on,
            json!({
                "dateJour": "2024-01-15",
                "codeJour": 3,
                "periode": "2023-2024",
                "libCouleur": "Rouge",
            }),
        );
        assert_eq!(day, TempoDay { date: on, color: TempoColor::Red });
    }

    #[test]
    fn test_from_response_malformed() {
        let on = date(2024, 1, 15);
        assert_eq!(TempoDay::from_response(on, json!([])).color, TempoColor::Unknown);
        assert_eq!(
            TempoDay::from_response(on, json!({"dateJour": "2024-01-15"})).color,
            TempoColor::Unknown,
        );
        assert_eq!(TempoDay::from_response(on, json!({"codeJour": 7})).color, TempoColor::Unknown);
        assert_eq!(TempoDay::from_response(on, json!({"codeJour": "2"})).color, TempoColor::White);
    }

    #[tokio::test]
    async fn test_known_color_is_cached() {
        let fetcher = FakeFetcher::default().with_day("2024-01-15", 1);
        let mut cache = TempoCache::default();
        let on = date(2024, 1, 15);
        let (url, schedule) = (FakeFetcher::colors_url(), TempoSchedule::default());
        for now in [time(8, 0), time(15, 0)] {
            let day = cache.get_day(&fetcher, &url, on, now, &schedule).await;
            assert_eq!(day.color, TempoColor::Blue);
        }
        assert_eq!(fetcher.n_calls(), 1);
    }

    #[tokio::test]
    async fn test_unknown_color_is_cached_until_publication() {
        let fetcher = FakeFetcher::default().with_day("2024-01-16", 0);
        let mut cache = TempoCache::default();
        let on = date(2024, 1, 16);
        let (url, schedule) = (FakeFetcher::colors_url(), TempoSchedule::default());

        let day = cache.get_day(&fetcher, &url, on, time(9, 0), &schedule).await;
        assert_eq!(day.color, TempoColor::Unknown);
        let _ = cache.get_day(&fetcher, &url, on, time(10, 59), &schedule).await;
        assert_eq!(fetcher.n_calls(), 1);

        fetcher.set_day("2024-01-16", 2);
        let day = cache.get_day(&fetcher, &url, on, time(11, 0), &schedule).await;
        assert_eq!(day.color, TempoColor::White);
        assert_eq!(fetcher.n_calls(), 2);
    }

    #[tokio::test]
    async fn test_transport_failure_is_not_cached() {
        let fetcher = FakeFetcher::default();
        let mut cache = TempoCache::default();
        let on = date(2024, 1, 15);
        let (url, schedule) = (FakeFetcher::colors_url(), TempoSchedule::default());

        let day = cache.get_day(&fetcher, &url, on, time(8, 0), &schedule).await;
        assert_eq!(day, TempoDay::unknown(on));

        fetcher.set_day("2024-01-15", 3);
        let day = cache.get_day(&fetcher, &url, on, time(8, 1), &schedule).await;
        assert_eq!(day.color, TempoColor::Red);
        assert_eq!(fetcher.n_calls(), 2);
    }
}
