//! Week grid layout.
//!
//! Places events on a fixed 7-column week grid. Multi-day events get a
//! column span; everything else lands in exactly one day bucket.

use chrono::{Datelike, Duration, NaiveDate};

use crate::event::CanonicalEvent;

/// The grid span of one multi-day event: a 1-indexed start column and an
/// exclusive end column, usable directly for grid placement.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekSpan {
    pub uid: String,
    pub col_start: usize,
    pub col_end: usize,
}

/// Layout of one week: multi-day spans plus per-day uid buckets.
#[derive(Debug, Default)]
pub struct WeekLayout {
    pub spans: Vec<WeekSpan>,
    pub days: [Vec<String>; 7],
}

/// The seven day boundaries of the week containing `date`, starting Monday.
pub fn week_days(date: NaiveDate) -> [NaiveDate; 7] {
    let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
    std::array::from_fn(|i| monday + Duration::days(i as i64))
}

/// Compute grid placement for `events` within the week given by `days`.
///
/// Day comparison ignores time-of-day. An event resolved as multi-day is
/// never additionally placed in a single-day bucket; events wholly outside
/// the week are omitted.
pub fn layout_week(events: &[CanonicalEvent], days: &[NaiveDate; 7]) -> WeekLayout {
    let mut layout = WeekLayout::default();

    for event in events {
        let start_day = event.start.date_naive();
        let end_day = event.end.map(|e| e.date_naive()).unwrap_or(start_day);

        if end_day < days[0] || start_day > days[6] {
            continue;
        }

        if end_day > start_day {
            let first = days.iter().position(|d| *d >= start_day);
            let last = days.iter().rposition(|d| *d <= end_day);
            if let (Some(first), Some(last)) = (first, last) {
                layout.spans.push(WeekSpan {
                    uid: event.uid.clone(),
                    col_start: first + 1,
                    col_end: last + 2,
                });
            }
            continue;
        }

        if let Some(index) = days.iter().position(|d| *d == start_day) {
            layout.days[index].push(event.uid.clone());
        }
    }

    layout
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::OriginalSource;
    use chrono::{TimeZone, Utc, Weekday};

    fn event(uid: &str, start: (u32, u32), end: Option<(u32, u32)>) -> CanonicalEvent {
        let at = |(day, hour)| Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0).unwrap();
        CanonicalEvent {
            uid: uid.to_string(),
            summary: uid.to_string(),
            start: at(start),
            end: end.map(at),
            location: None,
            description: None,
            source: "Test".to_string(),
            original_source: OriginalSource::Manual,
            assignees: Default::default(),
            category: None,
            inbox_only: false,
            is_lesson: false,
            created_by: None,
            created_at: None,
        }
    }

    /// Monday 2025-03-17 through Sunday 2025-03-23.
    fn week() -> [NaiveDate; 7] {
        week_days(NaiveDate::from_ymd_opt(2025, 3, 19).unwrap())
    }

    #[test]
    fn test_week_days_starts_on_monday() {
        let days = week();
        assert_eq!(days[0], NaiveDate::from_ymd_opt(2025, 3, 17).unwrap());
        assert_eq!(days[6], NaiveDate::from_ymd_opt(2025, 3, 23).unwrap());
        assert_eq!(days[0].weekday(), Weekday::Mon);
    }

    #[test]
    fn test_monday_to_wednesday_spans_three_columns() {
        let events = vec![event("camp", (17, 9), Some((19, 15)))];
        let layout = layout_week(&events, &week());

        assert_eq!(
            layout.spans,
            vec![WeekSpan {
                uid: "camp".to_string(),
                col_start: 1,
                col_end: 4,
            }]
        );
        assert!(layout.days.iter().all(|d| d.is_empty()));
    }

    #[test]
    fn test_single_day_event_lands_in_one_bucket_only() {
        let events = vec![event("training", (18, 18), Some((18, 19)))];
        let layout = layout_week(&events, &week());

        assert!(layout.spans.is_empty());
        assert_eq!(layout.days[1], vec!["training".to_string()]);
        let total: usize = layout.days.iter().map(|d| d.len()).sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn test_point_event_without_end() {
        let events = vec![event("pickup", (21, 14), None)];
        let layout = layout_week(&events, &week());

        assert!(layout.spans.is_empty());
        assert_eq!(layout.days[4], vec!["pickup".to_string()]);
    }

    #[test]
    fn test_span_clamps_to_week_boundaries() {
        // Starts the Friday before, ends the Tuesday after.
        let events = vec![event("holiday", (14, 0), Some((25, 0)))];
        let layout = layout_week(&events, &week());

        assert_eq!(
            layout.spans,
            vec![WeekSpan {
                uid: "holiday".to_string(),
                col_start: 1,
                col_end: 8,
            }]
        );
    }

    #[test]
    fn test_event_outside_week_is_omitted() {
        let events = vec![
            event("before", (10, 9), Some((11, 10))),
            event("after", (30, 9), None),
        ];
        let layout = layout_week(&events, &week());

        assert!(layout.spans.is_empty());
        assert!(layout.days.iter().all(|d| d.is_empty()));
    }
}
