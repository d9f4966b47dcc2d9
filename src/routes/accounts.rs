use actix_session::Session;
use actix_web::{get, post, web, Responder};
use serde::Deserialize;

use super::{page_context, redirect, render, require_admin};
use crate::errors::AppError;
use crate::models::Role;
use crate::services::account;
use crate::session::{push_flash, CurrentAccount};
use crate::view::{apply_account_query, AccountQuery};
use crate::AppState;

#[get("/quan-ly-tai-khoan")]
pub async fn account_page_handler(
    state: web::Data<AppState>,
    session: Session,
    CurrentAccount(caller): CurrentAccount,
    web::Query(query): web::Query<AccountQuery>,
) -> Result<impl Responder, AppError> {
    if let Some(bounce) = require_admin(&session, &caller) {
        return Ok(bounce);
    }
    let fetched = account::get_all_accounts(&state.db_pool).await;
    let accounts = match fetched.data {
        Some(accounts) => apply_account_query(&accounts, &query),
        None => {
            push_flash(&session, false, "Lỗi", &fetched.message);
            Vec::new()
        }
    };
    let mut context = page_context(&session, Some(&caller));
    context.insert("title", "Quản lý tài khoản");
    context.insert("accounts", &accounts);
    context.insert("query", &query);
    context.insert("roles", &Role::ALL.map(|r| r.label()));
    render("accounts.html", &context)
}

#[derive(Deserialize)]
pub struct AccountForm {
    full_name: String,
    phone_number: String,
    role: Role,
}

#[post("/quan-ly-tai-khoan/them")]
pub async fn account_create_handler(
    web::Form(form): web::Form<AccountForm>,
    state: web::Data<AppState>,
    session: Session,
    CurrentAccount(caller): CurrentAccount,
) -> Result<impl Responder, AppError> {
    if let Some(bounce) = require_admin(&session, &caller) {
        return Ok(bounce);
    }
    let result = account::create_account(
        &state.db_pool,
        form.full_name.trim(),
        form.phone_number.trim(),
        form.role,
    )
    .await;
    push_flash(
        &session,
        result.data.is_some(),
        if result.data.is_some() { "Thành công" } else { "Lỗi" },
        &result.message,
    );
    Ok(redirect("/quan-ly-tai-khoan"))
}

#[post("/quan-ly-tai-khoan/{id}/sua")]
pub async fn account_update_handler(
    path: web::Path<i64>,
    web::Form(form): web::Form<AccountForm>,
    state: web::Data<AppState>,
    session: Session,
    CurrentAccount(caller): CurrentAccount,
) -> Result<impl Responder, AppError> {
    if let Some(bounce) = require_admin(&session, &caller) {
        return Ok(bounce);
    }
    let result = account::update_account(
        &state.db_pool,
        path.into_inner(),
        form.full_name.trim(),
        form.phone_number.trim(),
        form.role,
    )
    .await;
    push_flash(
        &session,
        result.data.is_some(),
        if result.data.is_some() { "Thành công" } else { "Lỗi" },
        &result.message,
    );
    Ok(redirect("/quan-ly-tai-khoan"))
}

#[post("/quan-ly-tai-khoan/{id}/xoa")]
pub async fn account_delete_handler(
    path: web::Path<i64>,
    state: web::Data<AppState>,
    session: Session,
    CurrentAccount(caller): CurrentAccount,
) -> Result<impl Responder, AppError> {
    if let Some(bounce) = require_admin(&session, &caller) {
        return Ok(bounce);
    }
    let result = account::delete_account(&state.db_pool, path.into_inner()).await;
    push_flash(
        &session,
        result.success,
        if result.success { "Thành công" } else { "Lỗi" },
        &result.message,
    );
    Ok(redirect("/quan-ly-tai-khoan"))
}
