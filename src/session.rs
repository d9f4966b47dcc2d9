use std::future::{ready, Ready};

use actix_session::{Session, SessionExt};
use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::AppError;
use crate::models::Account;

/// Name of the durable session record holding the serialized current
/// account. Written wholesale on login, removed wholesale on logout.
const ACCOUNT_KEY: &str = "account";
const FLASH_KEY: &str = "flash";

/// The currently logged-in account, restored from the cookie session.
/// Handlers that need the current user take this extractor explicitly
/// instead of reaching for process-wide state.
#[derive(Debug, Clone)]
pub struct CurrentAccount(pub Account);

#[derive(Debug, Error)]
#[error("Chưa đăng nhập")]
pub struct LoginRequired;

impl ResponseError for LoginRequired {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::SeeOther()
            .append_header(("Location", "/dang-nhap"))
            .finish()
    }
}

impl FromRequest for CurrentAccount {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let session = req.get_session();
        match session.get::<Account>(ACCOUNT_KEY) {
            Ok(Some(account)) => ready(Ok(CurrentAccount(account))),
            Ok(None) => ready(Err(LoginRequired.into())),
            Err(err) => {
                log::warn!("Failed to read account from session: {}", err);
                ready(Err(LoginRequired.into()))
            }
        }
    }
}

pub fn store_account(session: &Session, account: &Account) -> Result<(), AppError> {
    session
        .insert(ACCOUNT_KEY, account)
        .map_err(|e| AppError::SessionError(e.to_string()))
}

pub fn current_account(session: &Session) -> Option<Account> {
    session.get::<Account>(ACCOUNT_KEY).ok().flatten()
}

/// Logout clears the whole session, account record included.
pub fn clear_session(session: &Session) {
    session.purge();
}

/// One-shot notification rendered by the next page load, mirroring the
/// original UI's transient toasts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flash {
    pub ok: bool,
    pub title: String,
    pub message: String,
}

pub fn push_flash(session: &Session, ok: bool, title: &str, message: &str) {
    let flash = Flash {
        ok,
        title: title.to_owned(),
        message: message.to_owned(),
    };
    if let Err(err) = session.insert(FLASH_KEY, flash) {
        log::warn!("Failed to store flash message: {}", err);
    }
}

pub fn take_flash(session: &Session) -> Option<Flash> {
    let flash = session.get::<Flash>(FLASH_KEY).ok().flatten();
    if flash.is_some() {
        session.remove(FLASH_KEY);
    }
    flash
}
