//! Request interceptors composed explicitly around a handler.
//!
//! A [`Chain`] is an ordered list of [`Middleware`]. On the way in, each
//! layer's [`before`](Middleware::before) runs in registration order and may
//! answer the request itself, in which case the handler and every later layer
//! are skipped. On the way out, [`after`](Middleware::after) runs in reverse
//! order over the response.
//!
//! ```rust
//! use folio::middleware::{BasicAuth, Chain, Logger};
//! use folio::{Method, Request, Response, Router};
//!
//! async fn secret(_req: Request) -> Response { Response::text("ok") }
//!
//! let app = Router::new().on(
//!     Method::Get,
//!     "/secret/",
//!     Chain::new().with(Logger).with(BasicAuth::default()).around(secret),
//! );
//! ```

mod basic_auth;
mod logger;

pub use basic_auth::BasicAuth;
pub use logger::Logger;

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;

use crate::handler::{BoxFuture, BoxedHandler, Handler};
use crate::method::Method;
use crate::request::Request;
use crate::response::Response;

/// What a layer can still see about a request once the handler owns it.
#[derive(Clone, Debug)]
pub struct RequestHead {
    pub method: Method,
    pub path: String,
    pub started: Instant,
}

impl RequestHead {
    fn of(req: &Request) -> Self {
        Self { method: req.method(), path: req.path().to_owned(), started: Instant::now() }
    }
}

/// A single interceptor.
pub trait Middleware: Send + Sync + 'static {
    /// Inspect or amend the request. Returning `Some` answers it immediately.
    fn before(&self, req: &mut Request) -> Option<Response>;

    /// Inspect or amend the response on its way out.
    fn after(&self, _head: &RequestHead, _res: &mut Response) {}
}

type Layers = Arc<[Arc<dyn Middleware>]>;

/// Ordered middleware list; [`around`](Chain::around) turns it into a handler.
#[derive(Default)]
pub struct Chain {
    layers: Vec<Arc<dyn Middleware>>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a layer. Layers run in the order they are added.
    pub fn with(mut self, layer: impl Middleware) -> Self {
        self.layers.push(Arc::new(layer));
        self
    }

    /// Wraps `handler` in this chain. The result registers on a router exactly
    /// like `handler` would, stateful or not.
    pub fn around<H, M>(self, handler: H) -> Layered<H, M> {
        Layered { layers: self.layers.into(), handler, _shape: PhantomData }
    }
}

/// A handler wrapped in a [`Chain`].
pub struct Layered<H, M> {
    layers: Layers,
    handler: H,
    _shape: PhantomData<fn() -> M>,
}

/// Marker for a [`Layered`] handler whose inner handler has shape `M`.
#[doc(hidden)]
pub struct Wrapped<M>(PhantomData<fn() -> M>);

impl<S, H, M> Handler<S, Wrapped<M>> for Layered<H, M>
where
    H: Handler<S, M>,
    M: 'static,
{
    fn into_boxed_handler(self, state: S) -> BoxedHandler {
        let inner = self.handler.into_boxed_handler(state);
        let layers = self.layers;

        Arc::new(move |req: Request| -> BoxFuture {
            Box::pin(run(Arc::clone(&layers), Arc::clone(&inner), req))
        })
    }
}

async fn run(layers: Layers, inner: BoxedHandler, mut req: Request) -> Response {
    let head = RequestHead::of(&req);

    for (i, layer) in layers.iter().enumerate() {
        if let Some(mut res) = layer.before(&mut req) {
            // Layers that already saw the request still see the answer.
            for outer in layers[..i].iter().rev() {
                outer.after(&head, &mut res);
            }
            return res;
        }
    }

    let mut res = inner(req).await;
    for layer in layers.iter().rev() {
        layer.after(&head, &mut res);
    }
    res
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::status::Status;

    struct Record {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        stop: bool,
    }

    impl Middleware for Record {
        fn before(&self, _req: &mut Request) -> Option<Response> {
            self.log.lock().unwrap().push(format!("before {}", self.name));
            self.stop.then(|| Response::builder().status(Status::Unauthorized).text("stop"))
        }

        fn after(&self, _head: &RequestHead, _res: &mut Response) {
            self.log.lock().unwrap().push(format!("after {}", self.name));
        }
    }

    fn layer(name: &'static str, log: &Arc<Mutex<Vec<String>>>, stop: bool) -> Record {
        Record { name, log: Arc::clone(log), stop }
    }

    fn request() -> Request {
        Request::new(Method::Get, "/x/", Vec::new(), Vec::new(), None)
    }

    #[tokio::test]
    async fn layers_wrap_handler_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let handler_log = Arc::clone(&log);
        let handler = Chain::new()
            .with(layer("a", &log, false))
            .with(layer("b", &log, false))
            .around(move |_req: Request| {
                let log = Arc::clone(&handler_log);
                async move {
                    log.lock().unwrap().push("handler".to_owned());
                    Response::text("done")
                }
            })
            .into_boxed_handler(());

        let res = handler(request()).await;

        assert_eq!(res.body(), b"done");
        assert_eq!(
            *log.lock().unwrap(),
            ["before a", "before b", "handler", "after b", "after a"]
        );
    }

    #[tokio::test]
    async fn before_can_short_circuit() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let handler = Chain::new()
            .with(layer("a", &log, false))
            .with(layer("b", &log, true))
            .with(layer("c", &log, false))
            .around(|_req: Request| async { Response::text("unreachable") })
            .into_boxed_handler(());

        let res = handler(request()).await;

        assert_eq!(res.status(), Status::Unauthorized);
        assert_eq!(*log.lock().unwrap(), ["before a", "before b", "after a"]);
    }

    #[tokio::test]
    async fn empty_chain_is_transparent() {
        let handler = Chain::new()
            .around(|req: Request| async move { Response::text(req.path().to_owned()) })
            .into_boxed_handler(());
        assert_eq!(handler(request()).await.body(), b"/x/");
    }

    #[tokio::test]
    async fn wraps_stateful_handlers() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let handler = Chain::new()
            .with(layer("a", &log, false))
            .around(|name: &'static str, _req: Request| async move { Response::text(name) })
            .into_boxed_handler("state");

        assert_eq!(handler(request()).await.body(), b"state");
        assert_eq!(*log.lock().unwrap(), ["before a", "after a"]);
    }
}
