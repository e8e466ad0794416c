//! Incoming HTTP request type.

use std::collections::HashMap;

use http::request::Parts;

/// An incoming HTTP request plus the path parameters matched by the router.
///
/// Bodies are dropped at dispatch — every route in this service is a GET.
pub struct Request {
    parts: Parts,
    params: HashMap<String, String>,
}

impl Request {
    pub(crate) fn new(parts: Parts, params: HashMap<String, String>) -> Self {
        Self { parts, params }
    }

    pub fn method(&self) -> &http::Method {
        &self.parts.method
    }

    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.parts.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For the route `/archive/{archive_hash}/`, `req.param("archive_hash")`
    /// on `/archive/abc/` returns `Some("abc")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

#[cfg(test)]
impl Request {
    /// Builds a request for handler-level tests, bypassing the router.
    pub(crate) fn test(path: &str, params: &[(&str, &str)]) -> Self {
        let (parts, ()) = http::Request::builder()
            .uri(path)
            .body(())
            .expect("valid test uri")
            .into_parts();
        let params = params
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        Self::new(parts, params)
    }
}
