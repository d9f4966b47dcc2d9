//! Report aggregation over the loaded guest set: per-marketer and
//! per-manager status tallies plus a per-day trend, all with the fixed
//! five-status legend so the tables and exports always render every column.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use serde::Serialize;

use crate::models::{GuestDetails, GuestStatus};
use crate::view::{after_start, before_end};

/// One breakdown row: a marketer or a manager, counts per status in
/// [`GuestStatus::ALL`] order, and the grand total.
#[derive(Debug, Clone, Serialize)]
pub struct StatusBreakdown {
    pub key_id: i64,
    pub name: String,
    pub counts: [u32; 5],
    pub total: u32,
}

impl StatusBreakdown {
    fn new(key_id: i64, name: &str) -> Self {
        StatusBreakdown {
            key_id,
            name: name.to_owned(),
            counts: [0; 5],
            total: 0,
        }
    }

    fn bump(&mut self, status: GuestStatus) {
        self.counts[status.legend_index()] += 1;
        self.total += 1;
    }
}

/// Restrict the loaded set to a created_at window. Bounds are day-granular:
/// start-of-day for `from`, end-of-day for `to`.
pub fn window(
    guests: &[GuestDetails],
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Vec<GuestDetails> {
    guests
        .iter()
        .filter(|g| after_start(g.created_at, from) && before_end(g.created_at, to))
        .cloned()
        .collect()
}

fn breakdown<K>(guests: &[GuestDetails], key: K) -> Vec<StatusBreakdown>
where
    K: Fn(&GuestDetails) -> Option<(i64, &str)>,
{
    let mut rows: BTreeMap<i64, StatusBreakdown> = BTreeMap::new();
    for guest in guests {
        // Rows without the grouping key are skipped, not lumped together.
        let Some((id, name)) = key(guest) else {
            continue;
        };
        rows.entry(id)
            .or_insert_with(|| StatusBreakdown::new(id, name))
            .bump(guest.status);
    }
    rows.into_values().collect()
}

pub fn breakdown_by_marketer(guests: &[GuestDetails]) -> Vec<StatusBreakdown> {
    breakdown(guests, |g| {
        Some((g.marketer_id?, g.marketer_name.as_deref()?))
    })
}

pub fn breakdown_by_manager(guests: &[GuestDetails]) -> Vec<StatusBreakdown> {
    breakdown(guests, |g| {
        Some((g.house_manager_id?, g.house_manager_name.as_deref()?))
    })
}

/// Guests per calendar day of created_at, per status, days ascending.
#[derive(Debug, Clone, Serialize)]
pub struct DailyCounts {
    pub date: NaiveDate,
    pub counts: [u32; 5],
}

pub fn daily_trend(guests: &[GuestDetails]) -> Vec<DailyCounts> {
    let mut days: BTreeMap<NaiveDate, [u32; 5]> = BTreeMap::new();
    for guest in guests {
        let day = guest.created_at.date_naive();
        days.entry(day).or_default()[guest.status.legend_index()] += 1;
    }
    days.into_iter()
        .map(|(date, counts)| DailyCounts { date, counts })
        .collect()
}

/// Quick date-range choices offered next to the statistics tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePreset {
    Today,
    Yesterday,
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
}

impl DatePreset {
    pub fn range(self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        match self {
            DatePreset::Today => (today, today),
            DatePreset::Yesterday => {
                let d = today - Days::new(1);
                (d, d)
            }
            DatePreset::ThisWeek => week_of(today),
            DatePreset::LastWeek => week_of(today - Days::new(7)),
            DatePreset::ThisMonth => month_of(today),
            DatePreset::LastMonth => month_of(today - Months::new(1)),
        }
    }
}

impl FromStr for DatePreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hom-nay" => Ok(DatePreset::Today),
            "hom-qua" => Ok(DatePreset::Yesterday),
            "tuan-nay" => Ok(DatePreset::ThisWeek),
            "tuan-truoc" => Ok(DatePreset::LastWeek),
            "thang-nay" => Ok(DatePreset::ThisMonth),
            "thang-truoc" => Ok(DatePreset::LastMonth),
            other => Err(format!("unknown date preset: {other}")),
        }
    }
}

fn week_of(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let week = date.week(Weekday::Mon);
    (week.first_day(), week.last_day())
}

fn month_of(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = date.with_day(1).unwrap_or(date);
    let last = first + Months::new(1) - Days::new(1);
    (first, last)
}

/// The statistics view defaults to the current week.
pub fn default_range(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    DatePreset::ThisWeek.range(today)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn guest(
        marketer: Option<(i64, &str)>,
        manager: Option<(i64, &str)>,
        status: GuestStatus,
        day: u32,
    ) -> GuestDetails {
        GuestDetails {
            id: 0,
            marketer_id: marketer.map(|(id, _)| id),
            house_id: 1,
            guest_name: "KH".to_owned(),
            guest_phone_number: "0900".to_owned(),
            view_date: None,
            status,
            admin_note: String::new(),
            manager_note: String::new(),
            created_at: Utc.with_ymd_and_hms(2025, 6, day, 10, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2025, 6, day, 10, 0, 0).unwrap(),
            marketer_name: marketer.map(|(_, n)| n.to_owned()),
            house_address: Some("12 Le Loi".to_owned()),
            house_manager_id: manager.map(|(id, _)| id),
            house_manager_name: manager.map(|(_, n)| n.to_owned()),
        }
    }

    #[test]
    fn breakdown_counts_per_status_with_fixed_legend() {
        let rows = vec![
            guest(Some((1, "A")), Some((9, "M")), GuestStatus::New, 10),
            guest(Some((1, "A")), Some((9, "M")), GuestStatus::Closed, 10),
            guest(Some((2, "B")), Some((9, "M")), GuestStatus::Closed, 11),
            guest(None, Some((9, "M")), GuestStatus::New, 11),
        ];
        let by_marketer = breakdown_by_marketer(&rows);
        assert_eq!(by_marketer.len(), 2);
        let a = &by_marketer[0];
        assert_eq!(a.name, "A");
        assert_eq!(a.counts, [1, 1, 0, 0, 0]);
        assert_eq!(a.total, 2);

        // The unattributed row still counts toward its house's manager.
        let by_manager = breakdown_by_manager(&rows);
        assert_eq!(by_manager.len(), 1);
        assert_eq!(by_manager[0].total, 4);
        assert_eq!(by_manager[0].counts.len(), GuestStatus::ALL.len());
    }

    #[test]
    fn window_is_inclusive_day_granular() {
        let rows = vec![
            guest(Some((1, "A")), None, GuestStatus::New, 9),
            guest(Some((1, "A")), None, GuestStatus::New, 10),
            guest(Some((1, "A")), None, GuestStatus::New, 11),
        ];
        let from = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let to = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let windowed = window(&rows, Some(from), Some(to));
        assert_eq!(windowed.len(), 1);
        assert_eq!(windowed[0].created_at.date_naive(), from);
    }

    #[test]
    fn daily_trend_buckets_sorted_ascending() {
        let rows = vec![
            guest(Some((1, "A")), None, GuestStatus::Closed, 12),
            guest(Some((1, "A")), None, GuestStatus::New, 10),
            guest(Some((1, "A")), None, GuestStatus::New, 10),
        ];
        let trend = daily_trend(&rows);
        assert_eq!(trend.len(), 2);
        assert!(trend[0].date < trend[1].date);
        assert_eq!(trend[0].counts[GuestStatus::New.legend_index()], 2);
        assert_eq!(trend[1].counts[GuestStatus::Closed.legend_index()], 1);
    }

    #[test]
    fn presets_compute_expected_ranges() {
        // 2025-06-11 is a Wednesday.
        let today = NaiveDate::from_ymd_opt(2025, 6, 11).unwrap();
        assert_eq!(DatePreset::Today.range(today), (today, today));
        let (from, to) = DatePreset::ThisWeek.range(today);
        assert_eq!(from, NaiveDate::from_ymd_opt(2025, 6, 9).unwrap());
        assert_eq!(to, NaiveDate::from_ymd_opt(2025, 6, 15).unwrap());
        let (from, to) = DatePreset::LastMonth.range(today);
        assert_eq!(from, NaiveDate::from_ymd_opt(2025, 5, 1).unwrap());
        assert_eq!(to, NaiveDate::from_ymd_opt(2025, 5, 31).unwrap());
        assert_eq!(
            "tuan-nay".parse::<DatePreset>().unwrap(),
            DatePreset::ThisWeek
        );
    }
}
