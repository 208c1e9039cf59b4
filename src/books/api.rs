//! HTTP handlers for the catalogue.
//!
//! | Method | Path | Success | Failure |
//! |---|---|---|---|
//! | GET | `/book/{id}` | 200 `{message: book}` | 404 `{message: null, error: ""}` |
//! | POST | `/book/` | 200 `{message: book}` | 400 `{error}` |
//! | PUT | `/book/{id}` | 200 `{message: book}` | 400 `{error}` |
//! | DELETE | `/book/{id}` | 200 `{message: null}` | 400 `{error}` |
//! | GET | `/books/` | 200, bare JSON array | — |

use serde::de::Error as _;

use super::{Book, SharedStore, StoreError};
use crate::envelope::{error_response, Envelope};
use crate::method::Method;
use crate::middleware::Chain;
use crate::request::Request;
use crate::response::{IntoResponse, Json, Response};
use crate::router::Router;
use crate::status::Status;

/// Everything a catalogue request can fail with. All of them are the
/// client's to fix, so all of them are `400`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Decode(#[from] serde_json::Error),

    #[error("book id must not be empty")]
    MissingId,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error_response(Status::BadRequest, self.to_string())
    }
}

/// Mounts the catalogue on `router`, every handler wrapped in `layers`. The
/// handlers read and write the store the router was built with.
pub fn routes(router: Router<SharedStore>, layers: impl Fn() -> Chain) -> Router<SharedStore> {
    router
        .on(Method::Get,    "/book/",  layers().around(get_book))
        .on(Method::Post,   "/book/",  layers().around(add_book))
        .on(Method::Put,    "/book/",  layers().around(update_book))
        .on(Method::Delete, "/book/",  layers().around(delete_book))
        .on(Method::Get,    "/books/", layers().around(list_books))
}

/// Decodes the first JSON value in `body` as a [`Book`]. Anything after that
/// value is left unread; an empty body fails with `EOF`.
fn decode(body: &[u8]) -> Result<Book, serde_json::Error> {
    serde_json::Deserializer::from_slice(body)
        .into_iter::<Book>()
        .next()
        .unwrap_or_else(|| Err(serde_json::Error::custom("EOF")))
}

async fn get_book(store: SharedStore, req: Request) -> Response {
    let store = store.read().await;
    match store.find_by_id(req.tail()) {
        Some(book) => Envelope::message(book).respond(Status::Ok),
        None => Envelope::<Book>::empty().respond(Status::NotFound),
    }
}

async fn add_book(store: SharedStore, req: Request) -> Result<Response, ApiError> {
    let book = decode(req.body())?;
    if book.id.is_empty() {
        return Err(ApiError::MissingId);
    }

    store.write().await.insert(book.clone())?;
    Ok(Envelope::message(book).respond(Status::Ok))
}

async fn update_book(store: SharedStore, req: Request) -> Result<Response, ApiError> {
    let mut book = decode(req.body())?;
    book.id = req.tail().to_owned();

    store.write().await.update(book.clone())?;
    Ok(Envelope::message(book).respond(Status::Ok))
}

async fn delete_book(store: SharedStore, req: Request) -> Result<Response, ApiError> {
    store.write().await.delete(req.tail())?;
    Ok(Envelope::<Book>::empty().respond(Status::Ok))
}

async fn list_books(store: SharedStore, _req: Request) -> Response {
    let store = store.read().await;
    Json(store.list()).into_response()
}
