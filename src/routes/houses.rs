use actix_session::Session;
use actix_web::{get, post, web, Responder};
use serde::Deserialize;

use super::{page_context, redirect, render, require_admin};
use crate::errors::AppError;
use crate::services::{account, house};
use crate::session::{push_flash, CurrentAccount};
use crate::view::{apply_house_query, empty_to_none, HouseQuery};
use crate::AppState;

#[get("/quan-ly-nha")]
pub async fn house_page_handler(
    state: web::Data<AppState>,
    session: Session,
    CurrentAccount(caller): CurrentAccount,
    web::Query(query): web::Query<HouseQuery>,
) -> Result<impl Responder, AppError> {
    if let Some(bounce) = require_admin(&session, &caller) {
        return Ok(bounce);
    }
    let fetched = house::get_all_houses(&state.db_pool).await;
    let houses = match fetched.data {
        Some(houses) => apply_house_query(&houses, &query),
        None => {
            push_flash(&session, false, "Lỗi", &fetched.message);
            Vec::new()
        }
    };
    let managers = account::managers_name_map(&state.db_pool)
        .await
        .data
        .unwrap_or_default();
    let mut context = page_context(&session, Some(&caller));
    context.insert("title", "Quản lý nhà");
    context.insert("houses", &houses);
    context.insert("query", &query);
    context.insert("managers", &managers);
    render("houses.html", &context)
}

#[derive(Deserialize)]
pub struct HouseForm {
    #[serde(default, deserialize_with = "empty_to_none")]
    manager_id: Option<i64>,
    address: String,
}

#[post("/quan-ly-nha/them")]
pub async fn house_create_handler(
    web::Form(form): web::Form<HouseForm>,
    state: web::Data<AppState>,
    session: Session,
    CurrentAccount(caller): CurrentAccount,
) -> Result<impl Responder, AppError> {
    if let Some(bounce) = require_admin(&session, &caller) {
        return Ok(bounce);
    }
    let address = form.address.trim();
    let Some(manager_id) = form.manager_id else {
        push_flash(&session, false, "Lỗi", "Vui lòng điền đầy đủ thông tin");
        return Ok(redirect("/quan-ly-nha"));
    };
    if address.is_empty() {
        push_flash(&session, false, "Lỗi", "Vui lòng điền đầy đủ thông tin");
        return Ok(redirect("/quan-ly-nha"));
    }
    let result = house::create_house(&state.db_pool, manager_id, address).await;
    push_flash(
        &session,
        result.data.is_some(),
        if result.data.is_some() { "Thành công" } else { "Lỗi" },
        &result.message,
    );
    Ok(redirect("/quan-ly-nha"))
}

#[post("/quan-ly-nha/{id}/sua")]
pub async fn house_update_handler(
    path: web::Path<i64>,
    web::Form(form): web::Form<HouseForm>,
    state: web::Data<AppState>,
    session: Session,
    CurrentAccount(caller): CurrentAccount,
) -> Result<impl Responder, AppError> {
    if let Some(bounce) = require_admin(&session, &caller) {
        return Ok(bounce);
    }
    let Some(manager_id) = form.manager_id else {
        push_flash(&session, false, "Lỗi", "Vui lòng điền đầy đủ thông tin");
        return Ok(redirect("/quan-ly-nha"));
    };
    let result =
        house::update_house(&state.db_pool, path.into_inner(), manager_id, form.address.trim())
            .await;
    push_flash(
        &session,
        result.data.is_some(),
        if result.data.is_some() { "Thành công" } else { "Lỗi" },
        &result.message,
    );
    Ok(redirect("/quan-ly-nha"))
}

#[post("/quan-ly-nha/{id}/xoa")]
pub async fn house_delete_handler(
    path: web::Path<i64>,
    state: web::Data<AppState>,
    session: Session,
    CurrentAccount(caller): CurrentAccount,
) -> Result<impl Responder, AppError> {
    if let Some(bounce) = require_admin(&session, &caller) {
        return Ok(bounce);
    }
    let result = house::delete_house(&state.db_pool, path.into_inner()).await;
    push_flash(
        &session,
        result.success,
        if result.success { "Thành công" } else { "Lỗi" },
        &result.message,
    );
    Ok(redirect("/quan-ly-nha"))
}
