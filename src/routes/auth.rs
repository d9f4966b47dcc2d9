use actix_session::Session;
use actix_web::{get, post, web, Responder};
use serde::Deserialize;

use super::{page_context, redirect, render};
use crate::errors::AppError;
use crate::models::Role;
use crate::services::account;
use crate::session::{clear_session, current_account, push_flash, store_account};
use crate::AppState;

#[get("/dang-nhap")]
pub async fn login_page_handler(session: Session) -> Result<impl Responder, AppError> {
    if current_account(&session).is_some() {
        return Ok(redirect("/quan-ly-khach"));
    }
    let mut context = page_context(&session, None);
    context.insert("title", "Đăng nhập");
    context.insert("roles", &Role::ALL.map(|r| r.label()));
    render("login.html", &context)
}

#[derive(Deserialize)]
pub struct LoginForm {
    phone_number: String,
}

/// Login is a phone-number lookup; there is no password. Any match signs
/// the whole account into the cookie session.
#[post("/dang-nhap")]
pub async fn login_form_handler(
    web::Form(form): web::Form<LoginForm>,
    state: web::Data<AppState>,
    session: Session,
) -> Result<impl Responder, AppError> {
    let phone = form.phone_number.trim();
    if phone.is_empty() {
        push_flash(&session, false, "Lỗi", "Vui lòng điền đầy đủ thông tin");
        return Ok(redirect("/dang-nhap"));
    }
    match account::get_account_by_phone(&state.db_pool, phone).await {
        Some(found) => {
            store_account(&session, &found)?;
            log::info!("Account {} logged in", found.id);
            push_flash(
                &session,
                true,
                "Đăng nhập thành công",
                "Chào mừng bạn đã quay trở lại!",
            );
            Ok(redirect("/quan-ly-khach"))
        }
        None => {
            push_flash(
                &session,
                false,
                "Đăng nhập thất bại",
                "Số điện thoại không tồn tại trong hệ thống",
            );
            Ok(redirect("/dang-nhap"))
        }
    }
}

#[derive(Deserialize)]
pub struct SignupForm {
    full_name: String,
    phone_number: String,
    role: Role,
}

#[post("/dang-ky")]
pub async fn signup_form_handler(
    web::Form(form): web::Form<SignupForm>,
    state: web::Data<AppState>,
    session: Session,
) -> Result<impl Responder, AppError> {
    if form.full_name.trim().is_empty() || form.phone_number.trim().is_empty() {
        push_flash(&session, false, "Lỗi", "Vui lòng điền đầy đủ thông tin");
        return Ok(redirect("/dang-nhap"));
    }
    let created = account::create_account(
        &state.db_pool,
        form.full_name.trim(),
        form.phone_number.trim(),
        form.role,
    )
    .await;
    match created.data {
        Some(new_account) => {
            // A fresh signup is signed in right away.
            store_account(&session, &new_account)?;
            push_flash(&session, true, "Thành công", &created.message);
            Ok(redirect("/quan-ly-khach"))
        }
        None => {
            push_flash(&session, false, "Lỗi", &created.message);
            Ok(redirect("/dang-nhap"))
        }
    }
}

#[post("/dang-xuat")]
pub async fn logout_handler(session: Session) -> impl Responder {
    clear_session(&session);
    redirect("/dang-nhap")
}
