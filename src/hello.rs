//! The greeting endpoint, the one route that touches no state.
//!
//! Mounted on the `/hello/` prefix, so the name is whatever follows it, already
//! percent-decoded by the router: `GET /hello/Ann%20Lee` greets `Ann Lee`.

use crate::envelope::Envelope;
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

/// `GET /hello/{name}`: greets whoever is named in the path.
pub async fn hello(req: Request) -> Response {
    Envelope::message(format!("hello {}. Glad to see you again", req.tail())).respond(Status::Ok)
}
