use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::access::GuestOwnership;
use crate::models::{Guest, GuestDetails, GuestStatus};

const DETAILS_SELECT: &str = "SELECT g.id, g.marketer_id, g.house_id, g.guest_name, \
     g.guest_phone_number, g.view_date, g.status, g.admin_note, g.manager_note, \
     g.created_at, g.updated_at, \
     m.full_name AS marketer_name, \
     h.address AS house_address, h.manager_id AS house_manager_id, \
     mg.full_name AS house_manager_name \
     FROM Guest g \
     LEFT JOIN Account m ON m.id = g.marketer_id \
     LEFT JOIN House h ON h.id = g.house_id \
     LEFT JOIN Account mg ON mg.id = h.manager_id";

/// Full unfiltered guest set, newest first. Also the basis of the
/// duplicate-phone check on create, which must see every row regardless of
/// the caller's visibility.
pub async fn all_with_details(pool: &SqlitePool) -> Result<Vec<GuestDetails>, sqlx::Error> {
    let query = format!("{DETAILS_SELECT} ORDER BY g.created_at DESC");
    let guests = sqlx::query_as::<_, GuestDetails>(&query)
        .fetch_all(pool)
        .await?;
    Ok(guests)
}

pub async fn by_marketer_with_details(
    pool: &SqlitePool,
    marketer_id: i64,
) -> Result<Vec<GuestDetails>, sqlx::Error> {
    let query = format!("{DETAILS_SELECT} WHERE g.marketer_id = $1 ORDER BY g.created_at DESC");
    let guests = sqlx::query_as::<_, GuestDetails>(&query)
        .bind(marketer_id)
        .fetch_all(pool)
        .await?;
    Ok(guests)
}

/// Guests attached to any of the given houses. The placeholder list is
/// built dynamically, same pattern as the incremental UPDATE below.
pub async fn by_houses_with_details(
    pool: &SqlitePool,
    house_ids: &[i64],
) -> Result<Vec<GuestDetails>, sqlx::Error> {
    if house_ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = (1..=house_ids.len())
        .map(|i| format!("${i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let query = format!(
        "{DETAILS_SELECT} WHERE g.house_id IN ({placeholders}) ORDER BY g.created_at DESC"
    );
    let mut q = sqlx::query_as::<_, GuestDetails>(&query);
    for id in house_ids {
        q = q.bind(id);
    }
    let guests = q.fetch_all(pool).await?;
    Ok(guests)
}

pub async fn by_id(pool: &SqlitePool, id: i64) -> Result<Option<Guest>, sqlx::Error> {
    let guest = sqlx::query_as::<_, Guest>("SELECT * FROM Guest WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(guest)
}

/// Ownership keys of a guest row, resolved through its house.
pub async fn ownership(pool: &SqlitePool, id: i64) -> Result<Option<GuestOwnership>, sqlx::Error> {
    let ownership = sqlx::query_as::<_, GuestOwnership>(
        "SELECT g.marketer_id, h.manager_id AS house_manager_id \
         FROM Guest g LEFT JOIN House h ON h.id = g.house_id WHERE g.id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(ownership)
}

#[derive(Debug, Clone)]
pub struct NewGuest {
    pub marketer_id: Option<i64>,
    pub house_id: i64,
    pub guest_name: String,
    pub guest_phone_number: String,
    pub view_date: Option<DateTime<Utc>>,
    pub status: GuestStatus,
    pub admin_note: String,
    pub manager_note: String,
}

pub async fn insert(pool: &SqlitePool, new: &NewGuest) -> Result<Guest, sqlx::Error> {
    let now = Utc::now();
    let guest = sqlx::query_as::<_, Guest>(
        "INSERT INTO Guest (marketer_id, house_id, guest_name, guest_phone_number, \
         view_date, status, admin_note, manager_note, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING *",
    )
    .bind(new.marketer_id)
    .bind(new.house_id)
    .bind(&new.guest_name)
    .bind(&new.guest_phone_number)
    .bind(new.view_date)
    .bind(new.status)
    .bind(&new.admin_note)
    .bind(&new.manager_note)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;
    log::info!("Guest created: id={}", guest.id);
    Ok(guest)
}

/// Partial update. Outer `None` leaves a column untouched; the nested
/// options carry explicit NULL assignments for marketer_id and view_date.
#[derive(Debug, Clone, Default)]
pub struct GuestPatch {
    pub marketer_id: Option<Option<i64>>,
    pub house_id: Option<i64>,
    pub guest_name: Option<String>,
    pub guest_phone_number: Option<String>,
    pub view_date: Option<Option<DateTime<Utc>>>,
    pub status: Option<GuestStatus>,
    pub admin_note: Option<String>,
    pub manager_note: Option<String>,
}

pub async fn update(pool: &SqlitePool, id: i64, patch: &GuestPatch) -> Result<Guest, sqlx::Error> {
    // Build the statement and bind parameters in order.
    let mut param_index = 2;
    let mut query = String::from("UPDATE Guest SET updated_at = $1");
    let updated_at = Utc::now();

    let mut push = |column: &str| {
        query.push_str(&format!(", {column} = ${param_index}"));
        param_index += 1;
    };
    if patch.marketer_id.is_some() {
        push("marketer_id");
    }
    if patch.house_id.is_some() {
        push("house_id");
    }
    if patch.guest_name.is_some() {
        push("guest_name");
    }
    if patch.guest_phone_number.is_some() {
        push("guest_phone_number");
    }
    if patch.view_date.is_some() {
        push("view_date");
    }
    if patch.status.is_some() {
        push("status");
    }
    if patch.admin_note.is_some() {
        push("admin_note");
    }
    if patch.manager_note.is_some() {
        push("manager_note");
    }
    query.push_str(&format!(" WHERE id = ${param_index} RETURNING *"));

    let mut q = sqlx::query_as::<_, Guest>(&query);
    q = q.bind(updated_at);
    if let Some(marketer_id) = &patch.marketer_id {
        q = q.bind(marketer_id);
    }
    if let Some(house_id) = &patch.house_id {
        q = q.bind(house_id);
    }
    if let Some(guest_name) = &patch.guest_name {
        q = q.bind(guest_name);
    }
    if let Some(phone) = &patch.guest_phone_number {
        q = q.bind(phone);
    }
    if let Some(view_date) = &patch.view_date {
        q = q.bind(view_date);
    }
    if let Some(status) = &patch.status {
        q = q.bind(status);
    }
    if let Some(admin_note) = &patch.admin_note {
        q = q.bind(admin_note);
    }
    if let Some(manager_note) = &patch.manager_note {
        q = q.bind(manager_note);
    }
    q = q.bind(id);

    let guest = q.fetch_one(pool).await?;
    log::info!("Guest updated: id={}", guest.id);
    Ok(guest)
}

pub async fn delete(pool: &SqlitePool, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM Guest WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    log::info!("Guest with id {} deleted", id);
    Ok(())
}
