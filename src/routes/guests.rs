use std::collections::BTreeMap;

use actix_session::Session;
use actix_web::{get, post, web, HttpResponse, Responder};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use super::{page_context, redirect, render};
use crate::errors::AppError;
use crate::models::{GuestStatus, Role};
use crate::notify::{self, GuestChange};
use crate::services::{account, guest, house};
use crate::session::{push_flash, CurrentAccount};
use crate::stats::{self, DatePreset};
use crate::view::{apply_guest_query, empty_to_none, GuestQuery, GuestSortKey};
use crate::AppState;

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

fn status_options() -> Vec<serde_json::Value> {
    GuestStatus::ALL
        .iter()
        .map(|s| serde_json::json!({ "label": s.label(), "color": s.color() }))
        .collect()
}

/// Dropdown data for the filters and the guest form. Managers only get
/// their own houses to pick from.
async fn form_lookups(
    state: &AppState,
    caller: &crate::models::Account,
) -> (BTreeMap<i64, String>, BTreeMap<i64, String>) {
    let marketers = account::marketers_name_map(&state.db_pool)
        .await
        .data
        .unwrap_or_default();
    let manager_filter = (caller.role == Role::Manager).then_some(caller.id);
    let houses = house::house_address_map(&state.db_pool, manager_filter)
        .await
        .data
        .unwrap_or_default();
    (marketers, houses)
}

#[get("/quan-ly-khach")]
pub async fn guest_page_handler(
    state: web::Data<AppState>,
    session: Session,
    CurrentAccount(caller): CurrentAccount,
    web::Query(query): web::Query<GuestQuery>,
) -> Result<impl Responder, AppError> {
    if query.tab.as_deref() == Some("thong-ke") {
        return statistics_page(&state, &session, &caller, &query).await;
    }

    let fetched = guest::get_guests_with_details(&state.db_pool, &caller).await;
    let guests = match fetched.data {
        Some(guests) => apply_guest_query(&guests, &query),
        None => {
            push_flash(&session, false, "Lỗi", &fetched.message);
            Vec::new()
        }
    };
    let (marketers, houses) = form_lookups(&state, &caller).await;
    let sort_links = GuestSortKey::ALL
        .iter()
        .map(|k| (k.as_str(), query.sort_link(*k)))
        .collect::<BTreeMap<_, _>>();

    let mut context = page_context(&session, Some(&caller));
    context.insert("title", "Quản lý khách");
    context.insert("guests", &guests);
    context.insert("query", &query);
    context.insert("query_string", &query.query_string());
    context.insert("has_filters", &query.has_filters());
    context.insert("sort_links", &sort_links);
    context.insert("marketers", &marketers);
    context.insert("houses", &houses);
    context.insert("statuses", &status_options());
    render("guests.html", &context)
}

/// The statistics tab of the guest page: per-marketer and per-manager
/// status tallies plus the daily trend, over the caller's visible guests
/// inside the chosen created-at window.
async fn statistics_page(
    state: &AppState,
    session: &Session,
    caller: &crate::models::Account,
    query: &GuestQuery,
) -> Result<HttpResponse, AppError> {
    let today = Utc::now().date_naive();
    let preset = query
        .preset
        .as_deref()
        .and_then(|s| s.parse::<DatePreset>().ok());
    let (from, to) = match (query.from, query.to) {
        (Some(from), Some(to)) => (from, to),
        _ => preset.map_or_else(|| stats::default_range(today), |p| p.range(today)),
    };

    let fetched = guest::get_guests_with_details(&state.db_pool, caller).await;
    let rows = match fetched.data {
        Some(rows) => stats::window(&rows, Some(from), Some(to)),
        None => {
            push_flash(session, false, "Lỗi", &fetched.message);
            Vec::new()
        }
    };
    // Marketers see their own table, managers theirs, admins both.
    let marketer_stats =
        (caller.role != Role::Manager).then(|| stats::breakdown_by_marketer(&rows));
    let manager_stats =
        (caller.role != Role::Marketing).then(|| stats::breakdown_by_manager(&rows));
    let trend = stats::daily_trend(&rows);

    let mut context = page_context(session, Some(caller));
    context.insert("title", "Thống kê khách hàng");
    context.insert("from", &from);
    context.insert("to", &to);
    context.insert("preset", &query.preset);
    context.insert("marketer_stats", &marketer_stats);
    context.insert("manager_stats", &manager_stats);
    context.insert("trend", &trend);
    context.insert("statuses", &status_options());
    render("stats.html", &context)
}

#[derive(Debug, Deserialize)]
pub struct GuestForm {
    #[serde(default, deserialize_with = "empty_to_none")]
    marketer_id: Option<i64>,
    #[serde(default, deserialize_with = "empty_to_none")]
    house_id: Option<i64>,
    guest_name: String,
    guest_phone_number: String,
    #[serde(default)]
    view_date: Option<String>,
    #[serde(default, deserialize_with = "empty_to_none")]
    status: Option<GuestStatus>,
    #[serde(default)]
    admin_note: String,
    #[serde(default)]
    manager_note: String,
}

impl GuestForm {
    fn into_input(self) -> guest::GuestInput {
        guest::GuestInput {
            marketer_id: self.marketer_id,
            house_id: self.house_id,
            guest_name: self.guest_name,
            guest_phone_number: self.guest_phone_number,
            view_date: parse_view_date(self.view_date.as_deref()),
            status: self.status.unwrap_or_default(),
            admin_note: self.admin_note,
            manager_note: self.manager_note,
        }
    }
}

/// `datetime-local` inputs submit `%Y-%m-%dT%H:%M`, without seconds.
fn parse_view_date(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let s = raw.map(str::trim).filter(|s| !s.is_empty())?;
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .map(|naive| naive.and_utc())
}

#[post("/quan-ly-khach/them")]
pub async fn guest_create_handler(
    web::Form(form): web::Form<GuestForm>,
    state: web::Data<AppState>,
    session: Session,
    CurrentAccount(caller): CurrentAccount,
) -> Result<impl Responder, AppError> {
    let result = guest::create_guest(&state.db_pool, &caller, &form.into_input()).await;
    if result.data.is_some() {
        push_flash(&session, true, "Thành công", &result.message);
        notify::publish(&state.guest_feed, GuestChange::Created);
    } else {
        push_flash(&session, false, "Lỗi", &result.message);
    }
    Ok(redirect("/quan-ly-khach"))
}

#[post("/quan-ly-khach/{id}/sua")]
pub async fn guest_update_handler(
    path: web::Path<i64>,
    web::Form(form): web::Form<GuestForm>,
    state: web::Data<AppState>,
    session: Session,
    CurrentAccount(caller): CurrentAccount,
) -> Result<impl Responder, AppError> {
    let guest_id = path.into_inner();
    let result = guest::update_guest(&state.db_pool, &caller, guest_id, &form.into_input()).await;
    if result.data.is_some() {
        push_flash(&session, true, "Thành công", &result.message);
        notify::publish(&state.guest_feed, GuestChange::Updated);
    } else {
        push_flash(&session, false, "Lỗi", &result.message);
    }
    Ok(redirect("/quan-ly-khach"))
}

#[post("/quan-ly-khach/{id}/xoa")]
pub async fn guest_delete_handler(
    path: web::Path<i64>,
    state: web::Data<AppState>,
    session: Session,
    CurrentAccount(caller): CurrentAccount,
) -> Result<impl Responder, AppError> {
    let guest_id = path.into_inner();
    let result = guest::delete_guest(&state.db_pool, &caller, guest_id).await;
    if result.success {
        push_flash(&session, true, "Thành công", &result.message);
        notify::publish(&state.guest_feed, GuestChange::Deleted);
    } else {
        push_flash(&session, false, "Lỗi", &result.message);
    }
    Ok(redirect("/quan-ly-khach"))
}

fn attachment(filename: &str, bytes: Vec<u8>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(XLSX_MIME)
        .append_header((
            "Content-Disposition",
            format!("attachment; filename=\"{filename}\""),
        ))
        .body(bytes)
}

/// Export exactly what the table shows: the same role filtering and the
/// same query-string filters and sort.
#[get("/quan-ly-khach/xuat-excel")]
pub async fn guest_export_handler(
    state: web::Data<AppState>,
    CurrentAccount(caller): CurrentAccount,
    web::Query(query): web::Query<GuestQuery>,
) -> Result<impl Responder, AppError> {
    let fetched = guest::get_guests_with_details(&state.db_pool, &caller).await;
    let guests = apply_guest_query(&fetched.data.unwrap_or_default(), &query);
    let bytes = crate::export::guest_list_workbook(&guests)?;
    log::info!("Account {} exported {} guests", caller.id, guests.len());
    Ok(attachment(
        &crate::export::guest_list_filename(Utc::now()),
        bytes,
    ))
}

#[get("/quan-ly-khach/xuat-thong-ke")]
pub async fn stats_export_handler(
    state: web::Data<AppState>,
    CurrentAccount(caller): CurrentAccount,
    web::Query(query): web::Query<GuestQuery>,
) -> Result<impl Responder, AppError> {
    let today = Utc::now().date_naive();
    let (from, to) = match (query.from, query.to) {
        (Some(from), Some(to)) => (from, to),
        _ => stats::default_range(today),
    };
    let marketer_stats = if caller.role != Role::Manager {
        guest::stats_by_marketer(&state.db_pool, &caller, from, to)
            .await
            .data
    } else {
        None
    };
    let manager_stats = if caller.role != Role::Marketing {
        guest::stats_by_manager(&state.db_pool, &caller, from, to)
            .await
            .data
    } else {
        None
    };
    let bytes =
        crate::export::stats_workbook(marketer_stats.as_deref(), manager_stats.as_deref())?;
    Ok(attachment(&crate::export::stats_filename(from, to), bytes))
}
