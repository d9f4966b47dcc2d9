pub mod accounts;
pub mod auth;
pub mod events;
pub mod guests;
pub mod houses;

use actix_files::NamedFile;
use actix_session::Session;
use actix_web::{get, HttpResponse, Responder};
use tera::Context;

use crate::errors::AppError;
use crate::models::{Account, Role};
use crate::session::{push_flash, take_flash};
use crate::TEMPLATES;

pub fn render(template: &str, context: &Context) -> Result<HttpResponse, AppError> {
    let rendered = TEMPLATES.render(template, context).map_err(|e| {
        log::error!("Failed to render template {}: {}", template, e);
        AppError::TemplateError(e)
    })?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(rendered))
}

/// Context shared by every page: the logged-in account (if any), the
/// one-shot flash, and the build version for the footer.
pub fn page_context(session: &Session, account: Option<&Account>) -> Context {
    let mut context = Context::new();
    if let Some(account) = account {
        context.insert("account", account);
        context.insert("is_admin", &(account.role == Role::Admin));
    }
    context.insert("flash", &take_flash(session));
    context.insert("version", env!("CARGO_PKG_VERSION"));
    context
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .append_header(("Location", location.to_owned()))
        .finish()
}

/// Admin-only consoles bounce everyone else back to the guest page.
pub fn require_admin(session: &Session, account: &Account) -> Option<HttpResponse> {
    if account.role == Role::Admin {
        return None;
    }
    push_flash(session, false, "Lỗi", "Không có quyền truy cập trang này");
    Some(redirect("/quan-ly-khach"))
}

#[get("/favicon")]
pub async fn favicon_handler() -> Result<impl Responder, AppError> {
    Ok(NamedFile::open("static/favicon.ico")?)
}

#[get("/")]
pub async fn index_handler() -> impl Responder {
    redirect("/quan-ly-khach")
}
