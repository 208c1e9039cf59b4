//! The full routing table.

use std::sync::Arc;

use crate::books::{self, SharedStore};
use crate::hello::hello;
use crate::method::Method;
use crate::middleware::{Chain, Logger};
use crate::router::Router;

/// Builds the service: `/hello/`, `/book/` and `/books/`, each handler
/// logged through [`Logger`]. `store` is the only state the handlers share.
pub fn app(store: &SharedStore) -> Router<SharedStore> {
    let layers = || Chain::new().with(Logger);

    let router = Router::with_state(Arc::clone(store))
        .on(Method::Get, "/hello/", layers().around(hello));
    books::api::routes(router, layers)
}
