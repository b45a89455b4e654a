//! Attendance aggregation and reporting engine
//!
//! Pure functions over an event snapshot producing the derived views the
//! dashboard and report tooling render: filtered/sorted listings, pages,
//! per-day and per-hour buckets, and daily summaries.
//!
//! Every operation is a total function of its inputs: no hidden state, no
//! mutation of the snapshot, and no panics for any well-typed input.
//! Out-of-range pages, empty snapshots and empty windows produce empty/zero
//! results. Callers pass the reporting time zone through the `reference`
//! timestamp, which keeps results deterministic under test.

use crate::domain::event::{AttendanceEvent, EventKind};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Timelike};
use serde::Serialize;

/// Number of most-recent events averaged for a day's confidence figure.
///
/// Matches the live view, which averages its five newest records.
pub const CONFIDENCE_WINDOW: usize = 5;

/// Sort key for event listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Timestamp,
    SubjectName,
}

impl std::str::FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "timestamp" | "time" => Ok(SortField::Timestamp),
            "name" | "subject_name" => Ok(SortField::SubjectName),
            other => Err(format!("unknown sort field: {}", other)),
        }
    }
}

/// Sort direction for event listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order: {}", other)),
        }
    }
}

/// Query parameters for [`filter_and_sort`]
#[derive(Debug, Clone)]
pub struct ListQuery {
    /// Empty string matches every event
    pub search_term: String,
    pub sort_field: SortField,
    pub sort_order: SortOrder,
}

impl Default for ListQuery {
    /// Table defaults: everything, newest first
    fn default() -> Self {
        Self {
            search_term: String::new(),
            sort_field: SortField::Timestamp,
            sort_order: SortOrder::Desc,
        }
    }
}

/// Entry/exit counts for one calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub entry_count: u32,
    pub exit_count: u32,
}

/// Event count for one hour of the reference day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HourBucket {
    /// Local hour of day, 0-23
    pub hour: u32,
    pub count: u32,
}

/// Counts and confidence figure for the reference day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub entry_count: u32,
    pub exit_count: u32,
    /// Mean over the day's [`CONFIDENCE_WINDOW`] newest events, 0.0 when
    /// the day has none
    pub average_confidence: f64,
}

/// Filter events by search term and sort them.
///
/// The term matches case-insensitively against the subject name and
/// case-sensitively (raw substring) against the subject id. Names compare
/// byte-lexicographically. Sorting is stable and `Desc` reverses the
/// comparator rather than the sorted list, so events with equal keys keep
/// their snapshot (insertion) order under both directions.
///
/// Returns a fresh list of borrows; the snapshot is never mutated.
pub fn filter_and_sort<'a>(
    events: &'a [AttendanceEvent],
    query: &ListQuery,
) -> Vec<&'a AttendanceEvent> {
    let needle = query.search_term.to_lowercase();

    let mut filtered: Vec<&AttendanceEvent> = events
        .iter()
        .filter(|event| {
            needle.is_empty()
                || event.subject_name.to_lowercase().contains(&needle)
                || event.subject_id.contains(&query.search_term)
        })
        .collect();

    filtered.sort_by(|a, b| {
        let ordering = match query.sort_field {
            SortField::Timestamp => a.timestamp_ms.cmp(&b.timestamp_ms),
            SortField::SubjectName => a.subject_name.cmp(&b.subject_name),
        };
        match query.sort_order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });

    filtered
}

/// Slice one page out of an ordered list.
///
/// `page` and `page_size` below 1 are clamped to 1. `total_pages` is
/// `ceil(len / page_size)` and therefore 0 for an empty list; callers clamp
/// a requested page into `[1, max(total_pages, 1)]` for display. A page past
/// the end yields an empty list, never an error.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> (Vec<T>, usize) {
    let page = page.max(1);
    let page_size = page_size.max(1);

    let total_pages = items.len().div_ceil(page_size);
    let start = (page - 1).saturating_mul(page_size);

    let page_items = items.iter().skip(start).take(page_size).cloned().collect();
    (page_items, total_pages)
}

/// Count entries and exits per calendar day for the `days` days ending at
/// `reference`'s date, inclusive.
///
/// Always returns exactly `days` buckets, oldest first, including all-zero
/// buckets for quiet days. An event belongs to the bucket whose calendar
/// date equals the event timestamp's date in `reference`'s time zone.
pub fn bucket_by_day<Tz: TimeZone>(
    events: &[AttendanceEvent],
    reference: &DateTime<Tz>,
    days: u32,
) -> Vec<DayBucket> {
    let end = reference.date_naive();
    let mut buckets: Vec<DayBucket> = (0..days)
        .map(|i| {
            let back = i64::from(days - 1 - i);
            DayBucket { date: end - Duration::days(back), entry_count: 0, exit_count: 0 }
        })
        .collect();

    let Some(start) = buckets.first().map(|b| b.date) else {
        return buckets;
    };

    for event in events {
        let Some(date) = local_date(event.timestamp_ms, reference) else {
            continue;
        };
        if date < start || date > end {
            continue;
        }
        let index = (date - start).num_days() as usize;
        match event.kind {
            EventKind::Entry => buckets[index].entry_count += 1,
            EventKind::Exit => buckets[index].exit_count += 1,
        }
    }

    buckets
}

/// Count events per hour of day for `reference`'s calendar date.
///
/// Hours with no events are omitted; the result is ascending by hour. A day
/// with a single 14:00 event yields one bucket, not 24.
pub fn bucket_by_hour_of_day<Tz: TimeZone>(
    events: &[AttendanceEvent],
    reference: &DateTime<Tz>,
) -> Vec<HourBucket> {
    let ref_date = reference.date_naive();
    let mut counts = [0u32; 24];

    for event in events {
        let Some(local) = local_datetime(event.timestamp_ms, reference) else {
            continue;
        };
        if local.date_naive() != ref_date {
            continue;
        }
        counts[local.hour() as usize] += 1;
    }

    counts
        .iter()
        .enumerate()
        .filter(|(_, &count)| count > 0)
        .map(|(hour, &count)| HourBucket { hour: hour as u32, count })
        .collect()
}

/// Entry/exit counts and confidence figure for `reference`'s calendar date.
///
/// The confidence figure averages the day's [`CONFIDENCE_WINDOW`] newest
/// events (last in snapshot order) and is 0.0 when the day has no events.
pub fn summarize<Tz: TimeZone>(events: &[AttendanceEvent], reference: &DateTime<Tz>) -> DaySummary {
    let ref_date = reference.date_naive();

    let day_events: Vec<&AttendanceEvent> = events
        .iter()
        .filter(|event| local_date(event.timestamp_ms, reference) == Some(ref_date))
        .collect();

    let entry_count = day_events.iter().filter(|e| e.kind == EventKind::Entry).count() as u32;
    let exit_count = day_events.iter().filter(|e| e.kind == EventKind::Exit).count() as u32;

    let window: Vec<f64> =
        day_events.iter().rev().take(CONFIDENCE_WINDOW).map(|e| e.confidence).collect();
    let average_confidence = if window.is_empty() {
        0.0
    } else {
        window.iter().sum::<f64>() / window.len() as f64
    };

    DaySummary { entry_count, exit_count, average_confidence }
}

/// Convert an event timestamp into `reference`'s time zone.
///
/// Timestamps past i64 range (far future) resolve to None and the event is
/// skipped rather than faulting.
fn local_datetime<Tz: TimeZone>(
    timestamp_ms: u64,
    reference: &DateTime<Tz>,
) -> Option<DateTime<Tz>> {
    let ts = i64::try_from(timestamp_ms).ok()?;
    reference.timezone().timestamp_millis_opt(ts).single()
}

fn local_date<Tz: TimeZone>(timestamp_ms: u64, reference: &DateTime<Tz>) -> Option<NaiveDate> {
    local_datetime(timestamp_ms, reference).map(|dt| dt.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn event(subject_id: &str, name: &str, ts: u64, kind: EventKind, conf: f64) -> AttendanceEvent {
        AttendanceEvent::new(subject_id, name, ts, kind, conf)
    }

    fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> u64 {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap().timestamp_millis() as u64
    }

    fn reference(y: i32, mo: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, 12, 0, 0).unwrap()
    }

    fn scenario_events() -> Vec<AttendanceEvent> {
        vec![
            event("s-ali", "Ali", ts(2025, 1, 6, 9, 0, 0), EventKind::Entry, 0.9),
            event("s-ali", "Ali", ts(2025, 1, 6, 17, 0, 0), EventKind::Exit, 0.85),
            event("s-sara", "Sara", ts(2025, 1, 6, 9, 5, 0), EventKind::Entry, 0.95),
        ]
    }

    #[test]
    fn test_filter_matches_name_case_insensitive() {
        let events = scenario_events();
        let query = ListQuery {
            search_term: "ali".to_string(),
            sort_field: SortField::Timestamp,
            sort_order: SortOrder::Asc,
        };

        let result = filter_and_sort(&events, &query);

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].timestamp_ms, ts(2025, 1, 6, 9, 0, 0));
        assert_eq!(result[0].kind, EventKind::Entry);
        assert_eq!(result[1].timestamp_ms, ts(2025, 1, 6, 17, 0, 0));
        assert_eq!(result[1].kind, EventKind::Exit);
    }

    #[test]
    fn test_filter_matches_subject_id_case_sensitive() {
        let events = scenario_events();

        let query =
            ListQuery { search_term: "s-sara".to_string(), ..ListQuery::default() };
        assert_eq!(filter_and_sort(&events, &query).len(), 1);

        // Subject id matching is raw substring: case differences don't match
        let query = ListQuery { search_term: "S-SARA".to_string(), ..ListQuery::default() };
        assert!(filter_and_sort(&events, &query).is_empty());
    }

    #[test]
    fn test_empty_search_matches_all() {
        let events = scenario_events();
        let result = filter_and_sort(&events, &ListQuery::default());
        assert_eq!(result.len(), events.len());
    }

    #[test]
    fn test_sort_timestamp_asc_and_desc() {
        let events = scenario_events();

        let asc = filter_and_sort(
            &events,
            &ListQuery { sort_order: SortOrder::Asc, ..ListQuery::default() },
        );
        assert!(asc.windows(2).all(|w| w[0].timestamp_ms <= w[1].timestamp_ms));

        let desc = filter_and_sort(&events, &ListQuery::default());
        assert!(desc.windows(2).all(|w| w[0].timestamp_ms >= w[1].timestamp_ms));
    }

    #[test]
    fn test_sort_by_name_is_byte_lexicographic() {
        // Byte order puts uppercase before lowercase: "Zahra" < "ali"
        let events = vec![
            event("s-1", "ali", 100, EventKind::Entry, 0.9),
            event("s-2", "Zahra", 200, EventKind::Entry, 0.9),
        ];
        let query = ListQuery {
            search_term: String::new(),
            sort_field: SortField::SubjectName,
            sort_order: SortOrder::Asc,
        };

        let result = filter_and_sort(&events, &query);

        assert_eq!(result[0].subject_name, "Zahra");
        assert_eq!(result[1].subject_name, "ali");
    }

    #[test]
    fn test_sort_stable_on_equal_keys_both_orders() {
        // Four events sharing one timestamp; ids record insertion order
        let shared = ts(2025, 1, 6, 10, 0, 0);
        let events: Vec<AttendanceEvent> = (0..4)
            .map(|i| event(&format!("s-{}", i), "Ali", shared, EventKind::Entry, 0.9))
            .collect();

        for order in [SortOrder::Asc, SortOrder::Desc] {
            let query = ListQuery {
                search_term: String::new(),
                sort_field: SortField::Timestamp,
                sort_order: order,
            };
            let result = filter_and_sort(&events, &query);
            let ids: Vec<&str> = result.iter().map(|e| e.subject_id.as_str()).collect();
            assert_eq!(ids, ["s-0", "s-1", "s-2", "s-3"], "order {:?}", order);
        }
    }

    #[test]
    fn test_filter_does_not_mutate_input() {
        let events = scenario_events();
        let before: Vec<String> = events.iter().map(|e| e.id.clone()).collect();

        let _ = filter_and_sort(
            &events,
            &ListQuery { sort_order: SortOrder::Asc, ..ListQuery::default() },
        );

        let after: Vec<String> = events.iter().map(|e| e.id.clone()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_paginate_middle_page() {
        let items: Vec<u32> = (0..25).collect();
        let (page, total_pages) = paginate(&items, 3, 10);

        assert_eq!(page, vec![20, 21, 22, 23, 24]);
        assert_eq!(total_pages, 3);
    }

    #[test]
    fn test_paginate_pages_reconstruct_list() {
        let items: Vec<u32> = (0..23).collect();
        let (_, total_pages) = paginate(&items, 1, 7);

        let mut rebuilt = Vec::new();
        for page in 1..=total_pages {
            let (chunk, _) = paginate(&items, page, 7);
            rebuilt.extend(chunk);
        }

        assert_eq!(rebuilt, items);
    }

    #[test]
    fn test_paginate_out_of_range_page_is_empty() {
        let items: Vec<u32> = (0..5).collect();
        let (page, total_pages) = paginate(&items, 99, 10);

        assert!(page.is_empty());
        assert_eq!(total_pages, 1);
    }

    #[test]
    fn test_paginate_clamps_invalid_inputs() {
        let items: Vec<u32> = (0..5).collect();

        // page 0 behaves as page 1
        let (page, _) = paginate(&items, 0, 2);
        assert_eq!(page, vec![0, 1]);

        // page_size 0 behaves as 1
        let (page, total_pages) = paginate(&items, 2, 0);
        assert_eq!(page, vec![1]);
        assert_eq!(total_pages, 5);
    }

    #[test]
    fn test_paginate_empty_list_has_zero_pages() {
        let items: Vec<u32> = Vec::new();
        let (page, total_pages) = paginate(&items, 1, 10);

        assert!(page.is_empty());
        assert_eq!(total_pages, 0);
    }

    #[test]
    fn test_bucket_by_day_always_returns_requested_days() {
        let events = vec![event("s-1", "Ali", ts(2025, 1, 6, 9, 0, 0), EventKind::Entry, 0.9)];
        let buckets = bucket_by_day(&events, &reference(2025, 1, 6), 7);

        assert_eq!(buckets.len(), 7);
        assert_eq!(buckets[0].date, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
        assert_eq!(buckets[6].date, NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
        // Quiet days stay present with zero counts
        assert!(buckets[..6].iter().all(|b| b.entry_count == 0 && b.exit_count == 0));
        assert_eq!(buckets[6].entry_count, 1);
    }

    #[test]
    fn test_bucket_by_day_counts_by_kind() {
        let events = vec![
            event("s-1", "Ali", ts(2025, 1, 5, 8, 0, 0), EventKind::Entry, 0.9),
            event("s-1", "Ali", ts(2025, 1, 5, 16, 0, 0), EventKind::Exit, 0.9),
            event("s-2", "Sara", ts(2025, 1, 6, 9, 0, 0), EventKind::Entry, 0.9),
        ];
        let buckets = bucket_by_day(&events, &reference(2025, 1, 6), 2);

        assert_eq!(buckets[0].entry_count, 1);
        assert_eq!(buckets[0].exit_count, 1);
        assert_eq!(buckets[1].entry_count, 1);
        assert_eq!(buckets[1].exit_count, 0);
    }

    #[test]
    fn test_bucket_by_day_ignores_events_outside_range() {
        let events = vec![
            event("s-1", "Ali", ts(2024, 12, 1, 9, 0, 0), EventKind::Entry, 0.9),
            event("s-1", "Ali", ts(2025, 2, 1, 9, 0, 0), EventKind::Entry, 0.9),
        ];
        let buckets = bucket_by_day(&events, &reference(2025, 1, 6), 7);

        assert!(buckets.iter().all(|b| b.entry_count == 0 && b.exit_count == 0));
    }

    #[test]
    fn test_bucket_by_day_zero_days() {
        let events = scenario_events();
        assert!(bucket_by_day(&events, &reference(2025, 1, 6), 0).is_empty());
    }

    #[test]
    fn test_bucket_by_day_respects_reference_zone() {
        // 23:30 UTC on Jan 5 is already Jan 6 at +01:00
        let tz = FixedOffset::east_opt(3600).unwrap();
        let reference = tz.with_ymd_and_hms(2025, 1, 6, 12, 0, 0).unwrap();
        let events = vec![event("s-1", "Ali", ts(2025, 1, 5, 23, 30, 0), EventKind::Entry, 0.9)];

        let buckets = bucket_by_day(&events, &reference, 2);

        assert_eq!(buckets[0].date, NaiveDate::from_ymd_opt(2025, 1, 5).unwrap());
        assert_eq!(buckets[0].entry_count, 0);
        assert_eq!(buckets[1].entry_count, 1);
    }

    #[test]
    fn test_bucket_by_hour_omits_empty_hours() {
        let events = vec![event("s-1", "Ali", ts(2025, 1, 6, 14, 15, 0), EventKind::Entry, 0.9)];
        let buckets = bucket_by_hour_of_day(&events, &reference(2025, 1, 6));

        assert_eq!(buckets, vec![HourBucket { hour: 14, count: 1 }]);
    }

    #[test]
    fn test_bucket_by_hour_ascending_and_day_scoped() {
        let events = vec![
            event("s-1", "Ali", ts(2025, 1, 6, 17, 0, 0), EventKind::Exit, 0.9),
            event("s-2", "Sara", ts(2025, 1, 6, 9, 5, 0), EventKind::Entry, 0.9),
            event("s-1", "Ali", ts(2025, 1, 6, 9, 40, 0), EventKind::Entry, 0.9),
            // Previous day, same hour: must not count
            event("s-3", "Reza", ts(2025, 1, 5, 9, 0, 0), EventKind::Entry, 0.9),
        ];
        let buckets = bucket_by_hour_of_day(&events, &reference(2025, 1, 6));

        assert_eq!(
            buckets,
            vec![HourBucket { hour: 9, count: 2 }, HourBucket { hour: 17, count: 1 }]
        );
    }

    #[test]
    fn test_summarize_counts_and_average() {
        let events = scenario_events();
        let summary = summarize(&events, &reference(2025, 1, 6));

        assert_eq!(summary.entry_count, 2);
        assert_eq!(summary.exit_count, 1);
        let expected = (0.9 + 0.85 + 0.95) / 3.0;
        assert!((summary.average_confidence - expected).abs() < 1e-9);
    }

    #[test]
    fn test_summarize_empty_is_all_zero() {
        let summary = summarize(&[], &reference(2025, 1, 6));

        assert_eq!(summary.entry_count, 0);
        assert_eq!(summary.exit_count, 0);
        assert_eq!(summary.average_confidence, 0.0);
    }

    #[test]
    fn test_summarize_windows_newest_five() {
        // Seven same-day events with confidences 0.1 .. 0.7 in insertion
        // order; the figure averages only the newest five
        let events: Vec<AttendanceEvent> = (1..=7)
            .map(|i| {
                event(
                    &format!("s-{}", i),
                    "Ali",
                    ts(2025, 1, 6, 8 + i, 0, 0),
                    EventKind::Entry,
                    f64::from(i) / 10.0,
                )
            })
            .collect();

        let summary = summarize(&events, &reference(2025, 1, 6));

        assert_eq!(summary.entry_count, 7);
        let expected = (0.3 + 0.4 + 0.5 + 0.6 + 0.7) / 5.0;
        assert!((summary.average_confidence - expected).abs() < 1e-9);
    }

    #[test]
    fn test_summarize_ignores_other_days() {
        let events = vec![
            event("s-1", "Ali", ts(2025, 1, 5, 9, 0, 0), EventKind::Entry, 0.5),
            event("s-1", "Ali", ts(2025, 1, 6, 9, 0, 0), EventKind::Entry, 0.9),
        ];
        let summary = summarize(&events, &reference(2025, 1, 6));

        assert_eq!(summary.entry_count, 1);
        assert!((summary.average_confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_sort_field_and_order_from_str() {
        assert_eq!("timestamp".parse::<SortField>().unwrap(), SortField::Timestamp);
        assert_eq!("name".parse::<SortField>().unwrap(), SortField::SubjectName);
        assert!("dwell".parse::<SortField>().is_err());
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("up".parse::<SortOrder>().is_err());
    }
}
