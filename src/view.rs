//! In-memory filtering and sorting of the fetched lists. No store
//! round-trips happen here: the handlers fetch once, then shape the view
//! from query-string state.

use std::cmp::Ordering;
use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::{Account, GuestDetails, GuestStatus, HouseDetails};

/// Form selects submit empty strings for "no choice"; treat those as absent.
pub fn empty_to_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse::<T>().map(Some).map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SortDir {
    #[serde(rename = "asc")]
    Asc,
    #[default]
    #[serde(rename = "desc")]
    Desc,
}

impl SortDir {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDir::Asc => ordering,
            SortDir::Desc => ordering.reverse(),
        }
    }

    fn flipped(self) -> SortDir {
        match self {
            SortDir::Asc => SortDir::Desc,
            SortDir::Desc => SortDir::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GuestSortKey {
    GuestName,
    GuestPhoneNumber,
    Marketer,
    House,
    ViewDate,
    Status,
    AdminNote,
    ManagerNote,
    #[default]
    CreatedAt,
}

impl GuestSortKey {
    pub const ALL: [GuestSortKey; 9] = [
        GuestSortKey::GuestName,
        GuestSortKey::GuestPhoneNumber,
        GuestSortKey::Marketer,
        GuestSortKey::House,
        GuestSortKey::ViewDate,
        GuestSortKey::Status,
        GuestSortKey::AdminNote,
        GuestSortKey::ManagerNote,
        GuestSortKey::CreatedAt,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GuestSortKey::GuestName => "guest_name",
            GuestSortKey::GuestPhoneNumber => "guest_phone_number",
            GuestSortKey::Marketer => "marketer",
            GuestSortKey::House => "house",
            GuestSortKey::ViewDate => "view_date",
            GuestSortKey::Status => "status",
            GuestSortKey::AdminNote => "admin_note",
            GuestSortKey::ManagerNote => "manager_note",
            GuestSortKey::CreatedAt => "created_at",
        }
    }
}

/// The guest page's complete view state, round-tripped through the query
/// string so exports and sort links see exactly what the table shows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuestQuery {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub q: String,
    #[serde(default, deserialize_with = "empty_to_none", skip_serializing_if = "Option::is_none")]
    pub marketer_id: Option<i64>,
    #[serde(default, deserialize_with = "empty_to_none", skip_serializing_if = "Option::is_none")]
    pub house_id: Option<i64>,
    #[serde(default, deserialize_with = "empty_to_none", skip_serializing_if = "Option::is_none")]
    pub status: Option<GuestStatus>,
    #[serde(default, deserialize_with = "empty_to_none", skip_serializing_if = "Option::is_none")]
    pub view_date_from: Option<NaiveDate>,
    #[serde(default, deserialize_with = "empty_to_none", skip_serializing_if = "Option::is_none")]
    pub view_date_to: Option<NaiveDate>,
    #[serde(default, deserialize_with = "empty_to_none", skip_serializing_if = "Option::is_none")]
    pub from: Option<NaiveDate>,
    #[serde(default, deserialize_with = "empty_to_none", skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub sort: GuestSortKey,
    #[serde(default)]
    pub dir: SortDir,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab: Option<String>,
    /// Quick-range slug for the statistics tab, e.g. `tuan-nay`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
}

impl GuestQuery {
    pub fn has_filters(&self) -> bool {
        self.marketer_id.is_some()
            || self.house_id.is_some()
            || self.status.is_some()
            || self.view_date_from.is_some()
            || self.view_date_to.is_some()
    }

    /// Link target for a sortable column header: same column flips the
    /// direction, a new column resets to ascending.
    pub fn sort_link(&self, key: GuestSortKey) -> String {
        let mut next = self.clone();
        next.sort = key;
        next.dir = if self.sort == key {
            self.dir.flipped()
        } else {
            SortDir::Asc
        };
        match serde_urlencoded::to_string(&next) {
            Ok(qs) => format!("/quan-ly-khach?{qs}"),
            Err(err) => {
                log::warn!("Failed to encode sort link: {}", err);
                "/quan-ly-khach".to_owned()
            }
        }
    }

    pub fn query_string(&self) -> String {
        serde_urlencoded::to_string(self).unwrap_or_default()
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc()
}

fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_milli_opt(23, 59, 59, 999)
        .unwrap_or_default()
        .and_utc()
}

pub fn after_start(value: DateTime<Utc>, date: Option<NaiveDate>) -> bool {
    date.map_or(true, |d| value >= start_of_day(d))
}

pub fn before_end(value: DateTime<Utc>, date: Option<NaiveDate>) -> bool {
    date.map_or(true, |d| value <= end_of_day(d))
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn guest_matches_search(guest: &GuestDetails, needle: &str) -> bool {
    contains_ci(&guest.guest_name, needle)
        || contains_ci(&guest.guest_phone_number, needle)
        || guest
            .house_address
            .as_deref()
            .is_some_and(|a| contains_ci(a, needle))
        || guest
            .marketer_name
            .as_deref()
            .is_some_and(|m| contains_ci(m, needle))
}

fn guest_ordering(a: &GuestDetails, b: &GuestDetails, key: GuestSortKey) -> Ordering {
    let by_str = |a: &str, b: &str| a.to_lowercase().cmp(&b.to_lowercase());
    match key {
        GuestSortKey::GuestName => by_str(&a.guest_name, &b.guest_name),
        GuestSortKey::GuestPhoneNumber => by_str(&a.guest_phone_number, &b.guest_phone_number),
        // Looked-up display fields compare by the resolved string, not id.
        GuestSortKey::Marketer => by_str(
            a.marketer_name.as_deref().unwrap_or(""),
            b.marketer_name.as_deref().unwrap_or(""),
        ),
        GuestSortKey::House => by_str(
            a.house_address.as_deref().unwrap_or(""),
            b.house_address.as_deref().unwrap_or(""),
        ),
        GuestSortKey::ViewDate => a
            .view_date
            .unwrap_or(DateTime::UNIX_EPOCH)
            .cmp(&b.view_date.unwrap_or(DateTime::UNIX_EPOCH)),
        GuestSortKey::Status => by_str(a.status.label(), b.status.label()),
        GuestSortKey::AdminNote => by_str(&a.admin_note, &b.admin_note),
        GuestSortKey::ManagerNote => by_str(&a.manager_note, &b.manager_note),
        GuestSortKey::CreatedAt => a.created_at.cmp(&b.created_at),
    }
}

/// Filter then stable-sort the fetched guest list. All active filters AND
/// together; the sort is a stable total order on the comparison key, ties
/// keeping their original relative order.
pub fn apply_guest_query(guests: &[GuestDetails], query: &GuestQuery) -> Vec<GuestDetails> {
    let needle = query.q.trim().to_lowercase();
    let mut filtered = guests
        .iter()
        .filter(|g| after_start(g.created_at, query.from))
        .filter(|g| before_end(g.created_at, query.to))
        .filter(|g| needle.is_empty() || guest_matches_search(g, &needle))
        .filter(|g| query.marketer_id.is_none() || g.marketer_id == query.marketer_id)
        .filter(|g| query.house_id.is_none() || Some(g.house_id) == query.house_id)
        .filter(|g| query.status.is_none() || Some(g.status) == query.status)
        .filter(|g| {
            query.view_date_from.is_none() && query.view_date_to.is_none()
                || g.view_date.is_some_and(|d| {
                    after_start(d, query.view_date_from) && before_end(d, query.view_date_to)
                })
        })
        .cloned()
        .collect::<Vec<_>>();
    filtered.sort_by(|a, b| query.dir.apply(guest_ordering(a, b, query.sort)));
    filtered
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccountSortKey {
    #[default]
    FullName,
    PhoneNumber,
    Role,
    CreatedAt,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountQuery {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub q: String,
    #[serde(default)]
    pub sort: AccountSortKey,
    #[serde(default)]
    pub dir: SortDir,
}

pub fn apply_account_query(accounts: &[Account], query: &AccountQuery) -> Vec<Account> {
    let needle = query.q.trim().to_lowercase();
    let mut filtered = accounts
        .iter()
        .filter(|a| {
            needle.is_empty()
                || contains_ci(&a.full_name, &needle)
                || contains_ci(&a.phone_number, &needle)
                || contains_ci(a.role.label(), &needle)
        })
        .cloned()
        .collect::<Vec<_>>();
    filtered.sort_by(|a, b| {
        let ordering = match query.sort {
            AccountSortKey::FullName => a.full_name.to_lowercase().cmp(&b.full_name.to_lowercase()),
            AccountSortKey::PhoneNumber => a.phone_number.cmp(&b.phone_number),
            AccountSortKey::Role => a.role.label().cmp(b.role.label()),
            AccountSortKey::CreatedAt => a.created_at.cmp(&b.created_at),
        };
        query.dir.apply(ordering)
    });
    filtered
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HouseSortKey {
    #[default]
    Address,
    Manager,
    CreatedAt,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HouseQuery {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub q: String,
    #[serde(default)]
    pub sort: HouseSortKey,
    #[serde(default)]
    pub dir: SortDir,
}

pub fn apply_house_query(houses: &[HouseDetails], query: &HouseQuery) -> Vec<HouseDetails> {
    let needle = query.q.trim().to_lowercase();
    let mut filtered = houses
        .iter()
        .filter(|h| {
            needle.is_empty()
                || contains_ci(&h.address, &needle)
                || h.manager_name
                    .as_deref()
                    .is_some_and(|m| contains_ci(m, &needle))
        })
        .cloned()
        .collect::<Vec<_>>();
    filtered.sort_by(|a, b| {
        let ordering = match query.sort {
            HouseSortKey::Address => a.address.to_lowercase().cmp(&b.address.to_lowercase()),
            HouseSortKey::Manager => a
                .manager_name
                .as_deref()
                .unwrap_or("")
                .to_lowercase()
                .cmp(&b.manager_name.as_deref().unwrap_or("").to_lowercase()),
            HouseSortKey::CreatedAt => a.created_at.cmp(&b.created_at),
        };
        query.dir.apply(ordering)
    });
    filtered
}
