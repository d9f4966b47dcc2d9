use std::convert::Infallible;

use actix_web::{get, web, HttpResponse, Responder};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::session::CurrentAccount;
use crate::AppState;

/// Server-sent guest change feed. The guest page listens here and reloads
/// on any event; the payload names the change kind but carries no row data.
#[get("/su-kien/khach")]
pub async fn guest_events_handler(
    state: web::Data<AppState>,
    caller: Option<CurrentAccount>,
) -> impl Responder {
    if caller.is_none() {
        return HttpResponse::Unauthorized().finish();
    }
    let stream = BroadcastStream::new(state.guest_feed.subscribe()).filter_map(|event| {
        match event {
            Ok(change) => Some(Ok::<_, Infallible>(web::Bytes::from(format!(
                "event: khach\ndata: {}\n\n",
                change.as_str()
            )))),
            // A lagged subscriber just skips ahead; the next event still
            // triggers the reload.
            Err(BroadcastStreamRecvError::Lagged(_)) => None,
        }
    });
    HttpResponse::Ok()
        .content_type("text/event-stream")
        .append_header(("Cache-Control", "no-cache"))
        .streaming(stream)
}
