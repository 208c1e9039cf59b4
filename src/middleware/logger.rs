//! Request logging.
//!
//! Two `info` events per request, one from each side of the handler:
//!
//! ```text
//! INFO request  method=GET path=/book/1 peer=127.0.0.1:50412
//! INFO response method=GET path=/book/1 status=200 elapsed_us=87
//! ```
//!
//! `peer` is omitted for requests built without a socket, such as in tests.

use tracing::info;

use super::{Middleware, RequestHead};
use crate::request::Request;
use crate::response::Response;

/// Logs each request's method and peer on the way in, and its status and
/// latency on the way out.
#[derive(Clone, Copy, Debug, Default)]
pub struct Logger;

impl Middleware for Logger {
    fn before(&self, req: &mut Request) -> Option<Response> {
        match req.remote_addr() {
            Some(peer) => info!(method = %req.method(), path = req.path(), %peer, "request"),
            None => info!(method = %req.method(), path = req.path(), "request"),
        }
        None
    }

    fn after(&self, head: &RequestHead, res: &mut Response) {
        info!(
            method = %head.method,
            path = head.path,
            status = res.status().as_u16(),
            elapsed_us = head.started.elapsed().as_micros() as u64,
            "response",
        );
    }
}
