//! # folio
//!
//! A small book catalogue served over HTTP/JSON, plus a greeting endpoint.
//!
//! | Method | Path | Success | Failure |
//! |---|---|---|---|
//! | GET | `/hello/{name}` | 200 `{message}` | — |
//! | GET | `/book/{id}` | 200 `{message: book}` | 404 `{error: ""}` |
//! | POST | `/book/` | 200 `{message: book}` | 400 `{error}` |
//! | PUT | `/book/{id}` | 200 `{message: book}` | 400 `{error}` |
//! | DELETE | `/book/{id}` | 200 `{message: null}` | 400 `{error}` |
//! | GET | `/books/` | 200, bare JSON array | — |
//!
//! Books live in memory only. The store is owned by the application and
//! handed to the handlers when the router is built:
//!
//! ```rust,no_run
//! use folio::books::BookStore;
//! use folio::{app, Config, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), folio::Error> {
//!     let store = BookStore::new().shared();
//!     Server::new(Config::from_env()?).serve(app(&store)).await
//! }
//! ```

mod app;
mod config;
mod envelope;
mod error;
mod handler;
mod hello;
mod method;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod books;
pub mod middleware;

pub use app::app;
pub use config::Config;
pub use envelope::Envelope;
pub use error::Error;
pub use handler::Handler;
pub use hello::hello;
pub use method::Method;
pub use request::Request;
pub use response::{IntoResponse, Json, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
pub use status::Status;
