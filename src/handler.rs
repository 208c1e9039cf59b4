//! Route handlers and the state they are built with.
//!
//! A route handler is an async function in one of two shapes:
//!
//! ```text
//! async fn hello(req: Request) -> impl IntoResponse              // Plain
//! async fn get_book(store: S, req: Request) -> impl IntoResponse // WithState
//! ```
//!
//! `S` is the state a [`Router`](crate::Router) was built with
//! ([`Router::with_state`](crate::Router::with_state)). When a handler is
//! registered the router hands it a clone of that state, and the pair is
//! erased into a single [`BoxedHandler`] closure:
//!
//! ```text
//! router.on(Method::Get, "/book/", get_book)
//!        ↓ Handler<SharedStore, WithState>::into_boxed_handler(store.clone())
//! Arc<dyn Fn(Request) -> BoxFuture>        ← stored in the method's route tree
//!        ↓ per request
//! get_book(store.clone(), req)             ← one Arc clone, one vtable call
//! ```
//!
//! State is therefore bound once at startup. Nothing looks it up per request.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// A heap-allocated, type-erased future that resolves to a [`Response`].
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// A handler with its state already bound, shared by every connection task.
///
/// `#[doc(hidden)] pub` because it appears in the signature of the public
/// [`Handler`] trait.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn Fn(Request) -> BoxFuture + Send + Sync + 'static>;

/// Marker for handlers that take only the request.
#[doc(hidden)]
pub enum Plain {}

/// Marker for handlers that take the router state before the request.
#[doc(hidden)]
pub enum WithState {}

/// Anything a [`Router<S>`](crate::Router) can register.
///
/// `M` only tells the two blanket impls apart and is always inferred:
///
/// | Shape | `M` |
/// |---|---|
/// | `Fn(Request) -> Fut` | [`Plain`] |
/// | `Fn(S, Request) -> Fut` | [`WithState`] |
/// | [`Chain::around`](crate::middleware::Chain::around) over either | `Wrapped<_>` |
///
/// where `Fut: Future<Output = impl IntoResponse>`.
pub trait Handler<S, M>: Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self, state: S) -> BoxedHandler;
}

impl<S, F, Fut, R> Handler<S, Plain> for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self, _state: S) -> BoxedHandler {
        Arc::new(move |req: Request| -> BoxFuture {
            let fut = self(req);
            Box::pin(async move { fut.await.into_response() })
        })
    }
}

impl<S, F, Fut, R> Handler<S, WithState> for F
where
    S: Clone + Send + Sync + 'static,
    F: Fn(S, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self, state: S) -> BoxedHandler {
        Arc::new(move |req: Request| -> BoxFuture {
            let fut = self(state.clone(), req);
            Box::pin(async move { fut.await.into_response() })
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::method::Method;

    fn request(path: &str) -> Request {
        Request::new(Method::Get, path, Vec::new(), Vec::new(), None)
    }

    fn boxed<S, M>(state: S, handler: impl Handler<S, M>) -> BoxedHandler {
        handler.into_boxed_handler(state)
    }

    #[tokio::test]
    async fn plain_handler_ignores_state() {
        async fn echo(req: Request) -> Response {
            Response::text(req.path().to_owned())
        }

        let handler = boxed(42_u32, echo);
        assert_eq!(handler(request("/a")).await.body(), b"/a");
    }

    #[tokio::test]
    async fn stateful_handler_sees_the_bound_state_on_every_call() {
        async fn count(hits: Arc<AtomicUsize>, _req: Request) -> Response {
            let n = hits.fetch_add(1, Ordering::SeqCst) + 1;
            Response::text(n.to_string())
        }

        let hits = Arc::new(AtomicUsize::new(0));
        let handler = boxed(Arc::clone(&hits), count);

        assert_eq!(handler(request("/")).await.body(), b"1");
        assert_eq!(handler(request("/")).await.body(), b"2");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn result_output_is_rendered() {
        async fn fails(_req: Request) -> Result<Response, Response> {
            Err(Response::text("nope"))
        }

        assert_eq!(boxed((), fails)(request("/")).await.body(), b"nope");
    }
}
