//! Analysis windows and seasonal calendar arithmetic.
//!
//! Every pipeline run is anchored to a single analysis year. The change
//! classification compares the quarter just before the year against the
//! first weeks just after it, while the source fetchers cover a 12-month
//! observation span that runs from the December preceding the year through
//! the following November, split into meteorological quarters.

use chrono::{Datelike, Duration, NaiveDate};

/// An inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a range; `start` must not be after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> DateRange {
        debug_assert!(start <= end, "date range start after end");
        DateRange { start, end }
    }

    /// Number of days covered, inclusive of both endpoints.
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid calendar date")
}

/// The pre-change window: September through December of the prior year.
pub fn before_window(year: i32) -> DateRange {
    DateRange::new(date(year - 1, 9, 1), date(year - 1, 12, 31))
}

/// The post-change window: January through the start of March of the next
/// year.
pub fn after_window(year: i32) -> DateRange {
    DateRange::new(date(year + 1, 1, 1), date(year + 1, 3, 1))
}

/// The 12-month observation span: December of the prior year through
/// November of the analysis year.
pub fn observation_span(year: i32) -> DateRange {
    DateRange::new(date(year - 1, 12, 1), date(year, 11, 30))
}

/// Meteorological quarters of the observation span.
///
/// Winter is anchored to December of the year before the analysis year so
/// that the four quarters tile the observation span exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Quarter {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Quarter {
    /// All quarters in calendar order.
    pub const ALL: [Quarter; 4] = [Quarter::Winter, Quarter::Spring, Quarter::Summer, Quarter::Fall];

    /// 1-based index used as the `quarter` column value.
    pub fn index(self) -> u8 {
        match self {
            Quarter::Winter => 1,
            Quarter::Spring => 2,
            Quarter::Summer => 3,
            Quarter::Fall => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Quarter::Winter => "winter",
            Quarter::Spring => "spring",
            Quarter::Summer => "summer",
            Quarter::Fall => "fall",
        }
    }

    /// The calendar range of this quarter for the given analysis year.
    pub fn date_range(self, year: i32) -> DateRange {
        match self {
            Quarter::Winter => DateRange::new(date(year - 1, 12, 1), date(year, 3, 1)),
            Quarter::Spring => DateRange::new(date(year, 3, 2), date(year, 5, 31)),
            Quarter::Summer => DateRange::new(date(year, 6, 1), date(year, 8, 31)),
            Quarter::Fall => DateRange::new(date(year, 9, 1), date(year, 11, 30)),
        }
    }
}

impl std::fmt::Display for Quarter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Splits a span into consecutive 8-day bins anchored at `anchor`.
///
/// The anchor may precede the span; only bins that overlap the span are
/// returned, and the first and last bins are clipped to it. This mirrors the
/// compositing convention of 8-day satellite products, whose bins restart at
/// a fixed calendar anchor rather than at the span start.
pub fn eight_day_bins(span: DateRange, anchor: NaiveDate) -> Vec<DateRange> {
    const BIN_DAYS: i64 = 8;

    let mut bins = Vec::new();
    let mut start = anchor;

    // Advance to the first bin that touches the span.
    if start < span.start {
        let behind = (span.start - start).num_days();
        start += Duration::days((behind / BIN_DAYS) * BIN_DAYS);
        if start + Duration::days(BIN_DAYS - 1) < span.start {
            start += Duration::days(BIN_DAYS);
        }
    }

    while start <= span.end {
        let end = start + Duration::days(BIN_DAYS - 1);
        bins.push(DateRange::new(start.max(span.start), end.min(span.end)));
        start += Duration::days(BIN_DAYS);
    }

    bins
}

/// Day-of-era ordinal used to seed deterministic synthetic values.
pub fn day_ordinal(date: NaiveDate) -> i64 {
    date.num_days_from_ce() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_for_2018() {
        let before = before_window(2018);
        assert_eq!(before.start, date(2017, 9, 1));
        assert_eq!(before.end, date(2017, 12, 31));

        let after = after_window(2018);
        assert_eq!(after.start, date(2019, 1, 1));
        assert_eq!(after.end, date(2019, 3, 1));

        let span = observation_span(2018);
        assert_eq!(span.start, date(2017, 12, 1));
        assert_eq!(span.end, date(2018, 11, 30));
        assert_eq!(span.num_days(), 365);
    }

    #[test]
    fn test_quarters_tile_the_span() {
        let year = 2018;
        let span = observation_span(year);
        assert_eq!(Quarter::Winter.date_range(year).start, span.start);
        assert_eq!(Quarter::Fall.date_range(year).end, span.end);

        // Consecutive quarters are adjacent.
        for pair in Quarter::ALL.windows(2) {
            let gap = pair[1].date_range(year).start - pair[0].date_range(year).end;
            assert_eq!(gap.num_days(), 1);
        }
    }

    #[test]
    fn test_quarter_indices() {
        let indices: Vec<u8> = Quarter::ALL.iter().map(|q| q.index()).collect();
        assert_eq!(indices, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_eight_day_bins_anchored_at_span_start() {
        let span = observation_span(2018);
        let bins = eight_day_bins(span, span.start);
        assert_eq!(bins.first().unwrap().start, span.start);
        assert_eq!(bins.last().unwrap().end, span.end);
        // 365 days in 8-day steps.
        assert_eq!(bins.len(), 46);
        for bin in &bins[..bins.len() - 1] {
            assert_eq!(bin.num_days(), 8);
        }
    }

    #[test]
    fn test_eight_day_bins_with_earlier_anchor() {
        // Anchor at Jan 1 of the analysis year, span starting the prior
        // December: the first returned bin is clipped to the span.
        let span = observation_span(2018);
        let bins = eight_day_bins(span, date(2018, 1, 1));
        assert!(bins[0].start >= span.start);
        assert!(bins.iter().all(|bin| bin.start <= bin.end));
        assert!(bins.iter().all(|bin| bin.num_days() <= 8));
        assert_eq!(bins.last().unwrap().end, span.end);
    }
}
