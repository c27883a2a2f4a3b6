//! Display-range filtering for the summary chart.
//!
//! Relative ranges are anchored on the timestamp of the *last* bar of the
//! series, never on the wall clock, so a stale history still shows its own
//! final month, year, etc.

use chrono::{Days, Months};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display as StrumDisplay, EnumIter, EnumString};

use crate::domain::market_data::{PriceBar, PriceHistory, Timestamp, VolumeBar};

/// Display window selectable from the range buttons
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, StrumDisplay, EnumIter, EnumString, AsRefStr,
    Serialize, Deserialize,
)]
pub enum RangeToken {
    #[strum(serialize = "1D")]
    #[serde(rename = "1D")]
    OneDay,

    #[strum(serialize = "1W")]
    #[serde(rename = "1W")]
    OneWeek,

    #[strum(serialize = "1M")]
    #[serde(rename = "1M")]
    OneMonth,

    #[strum(serialize = "3M")]
    #[serde(rename = "3M")]
    ThreeMonths,

    #[strum(serialize = "6M")]
    #[serde(rename = "6M")]
    SixMonths,

    #[default]
    #[strum(serialize = "1Y")]
    #[serde(rename = "1Y")]
    OneYear,

    #[strum(serialize = "5Y")]
    #[serde(rename = "5Y")]
    FiveYears,

    #[strum(serialize = "All")]
    #[serde(rename = "All")]
    All,
}

/// Calendar distance between the anchor and the start of the window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CalendarOffset {
    DaysBack(u64),
    MonthsBack(u32),
}

impl RangeToken {
    fn offset(&self) -> Option<CalendarOffset> {
        match self {
            RangeToken::OneDay => Some(CalendarOffset::DaysBack(1)),
            RangeToken::OneWeek => Some(CalendarOffset::DaysBack(7)),
            RangeToken::OneMonth => Some(CalendarOffset::MonthsBack(1)),
            RangeToken::ThreeMonths => Some(CalendarOffset::MonthsBack(3)),
            RangeToken::SixMonths => Some(CalendarOffset::MonthsBack(6)),
            RangeToken::OneYear => Some(CalendarOffset::MonthsBack(12)),
            RangeToken::FiveYears => Some(CalendarOffset::MonthsBack(60)),
            RangeToken::All => None,
        }
    }

    /// First timestamp inside the window that ends at `anchor`.
    ///
    /// Month arithmetic clamps to the last day of the target month
    /// (Mar 31 minus one month is Feb 28/29). `None` for `All`, or when the
    /// anchor or the result falls outside the calendar.
    pub fn window_start(&self, anchor: Timestamp) -> Option<Timestamp> {
        let anchor = anchor.to_datetime()?;
        let start = match self.offset()? {
            CalendarOffset::DaysBack(days) => anchor.checked_sub_days(Days::new(days)),
            CalendarOffset::MonthsBack(months) => anchor.checked_sub_months(Months::new(months)),
        }?;
        Some(Timestamp::from_datetime(start))
    }
}

/// Bars and volumes that survive a range filter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredSeries {
    pub bars: Vec<PriceBar>,
    pub volumes: Vec<VolumeBar>,
}

impl FilteredSeries {
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

/// Keep the bars (and volumes) whose timestamp is inside `range`, in order.
///
/// Empty input yields empty output; `All` is the identity. A window that
/// retains nothing yields an empty result rather than the full series.
/// The anchor is the current last element, so re-filtering a series whose
/// tail is not its latest point moves the window.
pub fn filter_by_range(bars: &[PriceBar], volumes: &[VolumeBar], range: RangeToken) -> FilteredSeries {
    let Some(last) = bars.last() else {
        return FilteredSeries::default();
    };

    let start = match range {
        RangeToken::All => None,
        _ => range.window_start(last.time),
    };

    let Some(start) = start else {
        return FilteredSeries { bars: bars.to_vec(), volumes: volumes.to_vec() };
    };

    FilteredSeries {
        bars: bars.iter().filter(|bar| bar.time >= start).copied().collect(),
        volumes: volumes.iter().filter(|volume| volume.time >= start).cloned().collect(),
    }
}

/// Range-filter a resident history
pub fn filter_history(history: &PriceHistory, range: RangeToken) -> FilteredSeries {
    filter_by_range(history.bars(), history.volumes(), range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market_data::Volume;
    use chrono::{NaiveDate, TimeZone, Utc};
    use strum::IntoEnumIterator;

    const DAY: i64 = 86_400;

    fn ts(y: i32, m: u32, d: u32) -> Timestamp {
        Timestamp::from_datetime(Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap())
    }

    fn daily_history(first: Timestamp, days: i64) -> PriceHistory {
        PriceHistory::from_candles((0..days).map(|i| {
            let price = 100.0 + i as f64;
            (
                PriceBar::new(Timestamp::from_secs(first.value() + i * DAY), price, price + 1.0, price - 1.0, price + 0.5),
                Volume::new(1_000.0),
            )
        }))
    }

    #[test]
    fn tokens_round_trip_through_labels() {
        for token in RangeToken::iter() {
            assert_eq!(token.as_ref().parse::<RangeToken>().unwrap(), token);
        }
        assert_eq!(RangeToken::default(), RangeToken::OneYear);
    }

    #[test]
    fn one_month_of_a_daily_year_keeps_the_last_calendar_month() {
        let history = daily_history(ts(2023, 1, 1), 365);
        let filtered = filter_history(&history, RangeToken::OneMonth);

        // Dec 31 minus one month clamps to Nov 30
        assert_eq!(filtered.bars.len(), 32);
        assert_eq!(filtered.bars.first().map(|b| b.time), Some(ts(2023, 11, 30)));
        assert_eq!(filtered.bars.last().map(|b| b.time), Some(ts(2023, 12, 31)));
        assert_eq!(filtered.volumes.len(), filtered.bars.len());
    }

    #[test]
    fn week_and_day_use_day_arithmetic() {
        let history = daily_history(ts(2023, 1, 1), 365);
        assert_eq!(filter_history(&history, RangeToken::OneWeek).bars.len(), 8);
        assert_eq!(filter_history(&history, RangeToken::OneDay).bars.len(), 2);
    }

    #[test]
    fn year_offset_follows_calendar_not_365_days() {
        let anchor = ts(2024, 2, 29);
        assert_eq!(RangeToken::OneYear.window_start(anchor), Some(ts(2023, 2, 28)));
        assert_eq!(RangeToken::FiveYears.window_start(ts(2024, 6, 15)), Some(ts(2019, 6, 15)));
        assert_eq!(RangeToken::All.window_start(anchor), None);
    }

    #[test]
    fn month_offset_clamps_to_month_end() {
        assert_eq!(RangeToken::OneMonth.window_start(ts(2023, 3, 31)), Some(ts(2023, 2, 28)));
        assert_eq!(RangeToken::ThreeMonths.window_start(ts(2023, 5, 31)), Some(ts(2023, 2, 28)));
    }

    #[test]
    fn window_keeps_time_of_day() {
        let anchor = NaiveDate::from_ymd_opt(2023, 6, 10)
            .and_then(|d| d.and_hms_opt(15, 30, 0))
            .map(|dt| Timestamp::from_datetime(dt.and_utc()))
            .unwrap();
        let start = RangeToken::OneDay.window_start(anchor).unwrap();
        assert_eq!(anchor.value() - start.value(), DAY);
    }

    #[test]
    fn window_drops_bars_before_its_start() {
        // last bar is far newer than the rest; 1D keeps only the tail
        let bars = vec![
            PriceBar::new(ts(2020, 1, 1), 1.0, 1.0, 1.0, 1.0),
            PriceBar::new(ts(2020, 1, 2), 1.0, 1.0, 1.0, 1.0),
            PriceBar::new(ts(2023, 1, 1), 1.0, 1.0, 1.0, 1.0),
        ];
        let filtered = filter_by_range(&bars, &[], RangeToken::OneDay);
        assert_eq!(filtered.bars.len(), 1);
        assert!(filtered.volumes.is_empty());
    }

    #[test]
    fn anchor_is_the_last_element_even_when_it_is_not_the_latest() {
        // Sharp edge: an out-of-order tail moves the anchor back in time
        let bars = vec![
            PriceBar::new(ts(2023, 6, 1), 1.0, 1.0, 1.0, 1.0),
            PriceBar::new(ts(2023, 12, 1), 1.0, 1.0, 1.0, 1.0),
            PriceBar::new(ts(2023, 1, 15), 1.0, 1.0, 1.0, 1.0),
        ];
        let filtered = filter_by_range(&bars, &[], RangeToken::OneMonth);
        assert_eq!(filtered.bars.len(), 3);

        let reordered = vec![bars[2], bars[0], bars[1]];
        let filtered = filter_by_range(&reordered, &[], RangeToken::OneMonth);
        assert_eq!(filtered.bars, vec![bars[1]]);
    }

    #[test]
    fn refiltering_a_sorted_series_is_stable() {
        let history = daily_history(ts(2022, 1, 1), 730);
        let once = filter_history(&history, RangeToken::ThreeMonths);
        let twice = filter_by_range(&once.bars, &once.volumes, RangeToken::ThreeMonths);
        assert_eq!(once, twice);
    }

    #[test]
    fn unrepresentable_anchor_keeps_everything() {
        let bars = vec![PriceBar::new(Timestamp::from_secs(i64::MAX), 1.0, 1.0, 1.0, 1.0)];
        assert_eq!(filter_by_range(&bars, &[], RangeToken::OneMonth).bars.len(), 1);
    }
}
