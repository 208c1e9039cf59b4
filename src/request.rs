//! Incoming HTTP request type.

use std::collections::HashMap;
use std::net::SocketAddr;

use bytes::Bytes;

use crate::method::Method;

/// Name of the catch-all parameter a prefix mount captures.
pub(crate) const TAIL: &str = "tail";

/// An incoming HTTP request with its body fully buffered.
pub struct Request {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Bytes,
    pub(crate) params: HashMap<String, String>,
    pub(crate) remote_addr: Option<SocketAddr>,
}

impl Request {
    pub(crate) fn new(
        method: Method,
        path: impl Into<String>,
        headers: Vec<(String, String)>,
        body: impl Into<Bytes>,
        remote_addr: Option<SocketAddr>,
    ) -> Self {
        Self {
            method,
            path: path.into(),
            headers,
            body: body.into(),
            params: HashMap::new(),
            remote_addr,
        }
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn body(&self) -> &[u8] { &self.body }
    pub fn remote_addr(&self) -> Option<SocketAddr> { self.remote_addr }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns a named path parameter, percent-decoded.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// The part of the path below the prefix this request was routed by.
    ///
    /// For a mount on `/book/`, a request to `/book/42` has tail `"42"` and a
    /// request to `/book/` has tail `""`.
    pub fn tail(&self) -> &str {
        self.param(TAIL).unwrap_or("")
    }
}
