//! HTTP Basic authentication against a single credential pair.

use base64::{Engine as _, engine::general_purpose::STANDARD};

use super::Middleware;
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

/// Rejects every request whose `Authorization: Basic …` header does not
/// decode to exactly the configured `user:pass` pair.
#[derive(Clone, Debug)]
pub struct BasicAuth {
    username: String,
    password: String,
    realm: String,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            realm: "folio".to_owned(),
        }
    }

    pub fn realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = realm.into();
        self
    }

    fn accepts(&self, header: &str) -> bool {
        let Some(("Basic", encoded)) = header.split_once(' ') else {
            return false;
        };
        let Ok(decoded) = STANDARD.decode(encoded.trim()) else {
            return false;
        };
        let Ok(pair) = String::from_utf8(decoded) else {
            return false;
        };
        matches!(pair.split_once(':'), Some((user, pass)) if user == self.username && pass == self.password)
    }

    fn unauthorized(&self) -> Response {
        Response::builder()
            .status(Status::Unauthorized)
            .header("www-authenticate", &format!("Basic realm=\"{}\"", self.realm))
            .text("authorization failed")
    }
}

/// The `test` / `test` pair (`Basic dGVzdDp0ZXN0`).
impl Default for BasicAuth {
    fn default() -> Self {
        Self::new("test", "test")
    }
}

impl Middleware for BasicAuth {
    fn before(&self, req: &mut Request) -> Option<Response> {
        match req.header("authorization") {
            Some(value) if self.accepts(value) => None,
            _ => Some(self.unauthorized()),
        }
    }
}
