//! Prefix request router.
//!
//! One radix tree per HTTP method. A path registered with a trailing slash is
//! a *prefix mount*: `/book/` answers `/book/` itself and everything below it,
//! and the remainder of the path is handed to the handler as
//! [`Request::tail`](crate::Request::tail).
//!
//! Lookups that miss fall through in this order:
//!
//! 1. `HEAD` with no `HEAD` route is answered by the `GET` route, if any.
//! 2. The path is routed under another method → `405`.
//! 3. Only `path + "/"` is routed → `301` to that prefix, as a prefix mount
//!    requested without its slash.
//! 4. Otherwise → `404`.
//!
//! Every miss is answered with an envelope.

use std::collections::HashMap;
use std::sync::Arc;

use matchit::Router as MatchitRouter;
use percent_encoding::percent_decode_str;

use crate::envelope::{error_response, Envelope};
use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::request::{Request, TAIL};
use crate::response::Response;
use crate::status::Status;

/// Why a lookup produced no handler.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Miss {
    NotFound,
    /// The path is routed, just not for this method.
    MethodNotAllowed,
    /// The path is a prefix mount missing its trailing slash.
    Redirect(String),
}

type Found = (BoxedHandler, HashMap<String, String>);

/// The application router. Build it once at startup and pass it to
/// [`Server::serve`](crate::Server::serve).
///
/// `S` is the state stateful handlers receive; see [`crate::Handler`].
pub struct Router<S = ()> {
    state: S,
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
}

impl Router<()> {
    /// A router whose handlers need no state.
    pub fn new() -> Self {
        Self::with_state(())
    }
}

impl<S: Clone> Router<S> {
    /// A router that hands a clone of `state` to every stateful handler.
    pub fn with_state(state: S) -> Self {
        Self { state, routes: HashMap::new() }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// ```rust,no_run
    /// # use folio::{Method, Request, Response, Router};
    /// # async fn get_book(_: Request) -> Response { Response::text("") }
    /// # async fn list_books(_: Request) -> Response { Response::text("") }
    /// Router::new()
    ///     .on(Method::Get, "/book/",  get_book)     // /book/ and /book/<anything>
    ///     .on(Method::Get, "/books/", list_books);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `path` conflicts with a route already registered for
    /// `method`. Routes are fixed at startup, so this is a programming error.
    pub fn on<H, M>(mut self, method: Method, path: &str, handler: H) -> Self
    where
        H: Handler<S, M>,
    {
        let handler = handler.into_boxed_handler(self.state.clone());
        let tree = self.routes.entry(method).or_default();

        if path.ends_with('/') {
            insert(tree, format!("{path}{{*{TAIL}}}"), Arc::clone(&handler));
        }
        insert(tree, path.to_owned(), handler);
        self
    }
}

impl<S> Router<S> {
    pub(crate) fn lookup(&self, method: Method, path: &str) -> Result<Found, Miss> {
        if let Some(found) = self.find(method, path) {
            return Ok(found);
        }
        if method == Method::Head {
            if let Some(found) = self.find(Method::Get, path) {
                return Ok(found);
            }
        }

        if self.routes.iter().any(|(m, tree)| *m != method && tree.at(path).is_ok()) {
            return Err(Miss::MethodNotAllowed);
        }

        if !path.ends_with('/') {
            let slashed = format!("{path}/");
            if self.routes.values().any(|tree| tree.at(&slashed).is_ok()) {
                return Err(Miss::Redirect(slashed));
            }
        }
        Err(Miss::NotFound)
    }

    fn find(&self, method: Method, path: &str) -> Option<Found> {
        let matched = self.routes.get(&method)?.at(path).ok()?;

        let handler = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), percent_decode_str(v).decode_utf8_lossy().into_owned()))
            .collect();
        Some((handler, params))
    }

    /// Routes one request and awaits its handler.
    pub async fn dispatch(&self, mut req: Request) -> Response {
        match self.lookup(req.method(), req.path()) {
            Ok((handler, params)) => {
                req.params = params;
                handler(req).await
            }
            Err(Miss::NotFound) => error_response(Status::NotFound, "not found"),
            Err(Miss::MethodNotAllowed) => {
                error_response(Status::MethodNotAllowed, format!("method {} not allowed", req.method()))
            }
            Err(Miss::Redirect(location)) => {
                let mut res = Envelope::<()>::empty().respond(Status::MovedPermanently);
                res.headers.push(("location".to_owned(), location));
                res
            }
        }
    }
}

impl Default for Router<()> {
    fn default() -> Self { Self::new() }
}

fn insert(tree: &mut MatchitRouter<BoxedHandler>, route: String, handler: BoxedHandler) {
    if let Err(e) = tree.insert(route.clone(), handler) {
        panic!("invalid route `{route}`: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn echo_tail(req: Request) -> Response {
        Response::text(req.tail().to_owned())
    }

    async fn fixed(_req: Request) -> Response {
        Response::text("fixed")
    }

    fn router() -> Router {
        Router::new()
            .on(Method::Get, "/book/", echo_tail)
            .on(Method::Get, "/books/", fixed)
            .on(Method::Get, "/exact", fixed)
    }

    fn get(path: &str) -> Request {
        Request::new(Method::Get, path, Vec::new(), Vec::new(), None)
    }

    async fn shelf(shelf: &'static str, req: Request) -> Response {
        Response::text(format!("{shelf}:{}", req.tail()))
    }

    #[tokio::test]
    async fn prefix_matches_root_and_below() {
        let router = router();
        assert_eq!(router.dispatch(get("/book/")).await.body(), b"");
        assert_eq!(router.dispatch(get("/book/42")).await.body(), b"42");
        assert_eq!(router.dispatch(get("/book/a/b")).await.body(), b"a/b");
    }

    #[tokio::test]
    async fn sibling_prefixes_do_not_bleed() {
        let router = router();
        assert_eq!(router.dispatch(get("/books/")).await.body(), b"fixed");
        assert_eq!(router.dispatch(get("/books/anything")).await.body(), b"fixed");
    }

    #[tokio::test]
    async fn tail_is_percent_decoded() {
        let res = router().dispatch(get("/book/war%20and%20peace")).await;
        assert_eq!(res.body(), b"war and peace");
    }

    #[tokio::test]
    async fn exact_routes_do_not_match_below() {
        let router = router();
        assert_eq!(router.dispatch(get("/exact")).await.status(), Status::Ok);
        assert_eq!(router.dispatch(get("/exact/more")).await.status(), Status::NotFound);
    }

    #[tokio::test]
    async fn unknown_path_is_enveloped_404() {
        let res = router().dispatch(get("/nope")).await;
        assert_eq!(res.status(), Status::NotFound);
        assert_eq!(res.body(), br#"{"message":null,"error":"not found"}"#);
    }

    #[tokio::test]
    async fn wrong_method_is_405() {
        let req = Request::new(Method::Patch, "/book/1", Vec::new(), Vec::new(), None);
        let res = router().dispatch(req).await;
        assert_eq!(res.status(), Status::MethodNotAllowed);
        assert_eq!(res.body(), br#"{"message":null,"error":"method PATCH not allowed"}"#);
    }

    #[test]
    #[should_panic(expected = "invalid route")]
    fn conflicting_route_panics() {
        let _ = Router::new()
            .on(Method::Get, "/a/{x}", fixed)
            .on(Method::Get, "/a/{y}", fixed);
    }

    #[tokio::test]
    async fn head_falls_back_to_get() {
        let req = Request::new(Method::Head, "/book/7", Vec::new(), Vec::new(), None);
        let res = router().dispatch(req).await;
        assert_eq!(res.status(), Status::Ok);
        assert_eq!(res.body(), b"7");
    }

    #[tokio::test]
    async fn head_route_wins_over_get() {
        let router = router().on(Method::Head, "/exact", echo_tail);
        let req = Request::new(Method::Head, "/exact", Vec::new(), Vec::new(), None);
        assert_eq!(router.dispatch(req).await.body(), b"");
    }

    #[tokio::test]
    async fn prefix_without_slash_redirects() {
        let res = router().dispatch(get("/books")).await;
        assert_eq!(res.status(), Status::MovedPermanently);
        assert_eq!(res.header("location"), Some("/books/"));
        assert_eq!(res.body(), br#"{"message":null,"error":""}"#);
    }

    #[tokio::test]
    async fn redirect_applies_to_any_method() {
        let req = Request::new(Method::Post, "/book", Vec::new(), Vec::new(), None);
        let res = router().dispatch(req).await;
        assert_eq!(res.status(), Status::MovedPermanently);
        assert_eq!(res.header("location"), Some("/book/"));
    }

    #[tokio::test]
    async fn stateful_handlers_get_router_state() {
        let router = Router::with_state("fiction")
            .on(Method::Get, "/shelf/", shelf)
            .on(Method::Get, "/plain/", echo_tail);

        assert_eq!(router.dispatch(get("/shelf/dune")).await.body(), b"fiction:dune");
        assert_eq!(router.dispatch(get("/plain/x")).await.body(), b"x");
    }
}
