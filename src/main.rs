#[macro_use]
extern crate lazy_static;

use std::{env, str::FromStr};

use actix_files::{Files, NamedFile};
use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::{
    cookie::Key,
    http::{Method, StatusCode},
    middleware,
    web::{self, Data},
    App, Either, HttpResponse, HttpServer, Responder,
};
use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode},
    SqlitePool,
};
use tera::Tera;

mod access;
mod db;
mod errors;
mod export;
mod models;
mod notify;
mod routes;
mod services;
mod session;
mod stats;
mod view;

use notify::GuestFeed;

#[derive(Debug, Clone)]
pub struct AppState {
    db_pool: SqlitePool,
    guest_feed: GuestFeed,
}

lazy_static! {
    pub static ref TEMPLATES: Tera = {
        let mut tera = match Tera::new("templates/**/*") {
            Ok(t) => t,
            Err(e) => {
                log::error!("Parsing error(s): {}", e);
                ::std::process::exit(1);
            }
        };
        tera.autoescape_on(vec![".html", ".sql"]);
        tera
    };
}

fn get_session_key() -> Key {
    let key_str = env::var("SESSION_KEY").unwrap_or_else(|_| {
        log::error!("FATAL: SESSION_KEY environment variable not set");
        std::process::exit(1);
    });
    Key::from(key_str.as_bytes())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let database_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://bekind_str.db".to_owned());

    let opts = SqliteConnectOptions::from_str(&database_url)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .read_only(false)
        .busy_timeout(std::time::Duration::from_secs(5));

    let db_pool = SqlitePool::connect_with(opts)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    sqlx::migrate!()
        .run(&db_pool)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    info!("Database migrated successfully");

    let guest_feed = notify::guest_feed();

    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_owned());
    info!("Starting HTTP server on http://{}/", bind_addr);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Compress::default())
            .wrap(SessionMiddleware::new(
                CookieSessionStore::default(),
                get_session_key(),
            ))
            .wrap(middleware::Logger::default())
            .service(Files::new("/static", "static").show_files_listing())
            .service(routes::favicon_handler)
            .service(routes::index_handler)
            .service(routes::auth::login_page_handler)
            .service(routes::auth::login_form_handler)
            .service(routes::auth::signup_form_handler)
            .service(routes::auth::logout_handler)
            .service(routes::guests::guest_page_handler)
            .service(routes::guests::guest_create_handler)
            .service(routes::guests::guest_update_handler)
            .service(routes::guests::guest_delete_handler)
            .service(routes::guests::guest_export_handler)
            .service(routes::guests::stats_export_handler)
            .service(routes::accounts::account_page_handler)
            .service(routes::accounts::account_create_handler)
            .service(routes::accounts::account_update_handler)
            .service(routes::accounts::account_delete_handler)
            .service(routes::houses::house_page_handler)
            .service(routes::houses::house_create_handler)
            .service(routes::houses::house_update_handler)
            .service(routes::houses::house_delete_handler)
            .service(routes::events::guest_events_handler)
            .app_data(Data::new(AppState {
                db_pool: db_pool.clone(),
                guest_feed: guest_feed.clone(),
            }))
            .default_service(web::to(default_handler))
    })
    .bind(bind_addr)?
    .run()
    .await
}

async fn default_handler(req_method: Method) -> Result<impl Responder, std::io::Error> {
    match req_method {
        Method::GET => {
            let file = NamedFile::open("static/404.html")?
                .customize()
                .with_status(StatusCode::NOT_FOUND);
            Ok(Either::Left(file))
        }
        _ => Ok(Either::Right(HttpResponse::MethodNotAllowed().finish())),
    }
}
