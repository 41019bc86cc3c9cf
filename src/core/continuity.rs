//! Bridging the calendar gap right after midnight.
//!
//! The calendar answers «unknown» for today until some time after midnight, although it has
//! already told us yesterday what tomorrow's color would be.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{core::tempo::TempoColor, prelude::*};

/// Tomorrow's color as seen by a previous cycle.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TempoForecast {
    #[serde(rename = "fallback_today_date")]
    pub date: NaiveDate,

    #[serde(rename = "fallback_today_color")]
    pub color: TempoColor,
}

impl TempoForecast {
    /// Remember a freshly fetched tomorrow's color, unless it is still unknown.
    pub fn observe(tomorrow: NaiveDate, color: TempoColor) -> Option<Self> {
        color.is_known().then_some(Self { date: tomorrow, color })
    }
}

/// Resolve today's color, falling back to the forecast made for today.
pub fn resolve_today(
    today: NaiveDate,
    fetched: TempoColor,
    forecast: Option<TempoForecast>,
) -> TempoColor {
    if fetched.is_known() {
        return fetched;
    }
    match forecast {
        Some(forecast) if forecast.date == today && forecast.color.is_known() => {
            debug!(color = %forecast.color, "using yesterday's forecast for today");
            forecast.color
        }
        _ => fetched,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_forecast_fills_unknown_color() {
        let today = date(2024, 1, 16);
        let forecast = TempoForecast { date: today, color: TempoColor::Red };
        assert_eq!(resolve_today(today, TempoColor::Unknown, Some(forecast)), TempoColor::Red);
    }

    #[test]
    fn test_stale_forecast_is_ignored() {
        let today = date(2024, 1, 16);
        let forecast = TempoForecast { date: date(2024, 1, 15), color: TempoColor::Red };
        assert_eq!(resolve_today(today, TempoColor::Unknown, Some(forecast)), TempoColor::Unknown);
        assert_eq!(resolve_today(today, TempoColor::Unknown, None), TempoColor::Unknown);
    }

    #[test]
    fn test_fetched_color_takes_precedence() {
        let today = date(2024, 1, 16);
        let forecast = TempoForecast { date: today, color: TempoColor::Red };
        assert_eq!(resolve_today(today, TempoColor::White, Some(forecast)), TempoColor::White);
    }

    #[test]
    fn test_observe_ignores_unknown_color() {
        let tomorrow = date(2024, 1, 17);
        assert_eq!(TempoForecast::observe(tomorrow, TempoColor::Unknown), None);
        assert_eq!(
            TempoForecast::observe(tomorrow, TempoColor::Blue),
            Some(TempoForecast { date: tomorrow, color: TempoColor::Blue }),
        );
    }
}
