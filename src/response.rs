//! Outgoing HTTP response type and the [`IntoResponse`] conversion trait.
//!
//! Two body shapes exist. Pages are complete ([`http_body_util::Full`]);
//! archive downloads are fed frame-by-frame through an mpsc channel, which
//! hyper serialises as chunked transfer encoding because no content-length
//! is set. Both are erased into one [`BoxBody`] so the server's dispatch
//! path doesn't care which it got.

use bytes::Bytes;
use http::{HeaderName, HeaderValue, StatusCode};
use http_body::Frame;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// The erased body type carried by every response.
pub type Body = BoxBody<Bytes, std::io::Error>;

/// One frame of a streamed body, as sent by the pump task.
pub type BodyFrame = Result<Frame<Bytes>, std::io::Error>;

/// An outgoing HTTP response.
///
/// ```rust
/// use http::StatusCode;
/// use zipserve::Response;
///
/// Response::html("<h1>hi</h1>");
/// Response::status(StatusCode::INTERNAL_SERVER_ERROR);
/// ```
pub struct Response {
    inner: http::Response<Body>,
}

impl Response {
    /// `200 OK` — `text/html; charset=utf-8`.
    pub fn html(body: impl Into<String>) -> Self {
        Self::builder().html(body)
    }

    /// `200 OK` — `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::builder().text(body)
    }

    /// Response with the given status and no body.
    pub fn status(code: StatusCode) -> Self {
        Self::builder().status(code).empty()
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: Vec::new(), status: StatusCode::OK }
    }

    pub fn status_code(&self) -> StatusCode {
        self.inner.status()
    }

    pub(crate) fn into_inner(self) -> http::Response<Body> {
        self.inner
    }
}

/// Fluent builder for [`Response`]. Obtain via [`Response::builder()`].
///
/// Terminated by a body method, so the content-type is never forgotten.
///
/// # Panics
///
/// Header names and values are checked when the body method runs; an
/// invalid one is a bug at the registration site, not a runtime condition,
/// and panics like an invalid route would.
pub struct ResponseBuilder {
    headers: Vec<(HeaderName, HeaderValue)>,
    status: StatusCode,
}

impl ResponseBuilder {
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        let name = HeaderName::from_bytes(name.as_bytes())
            .unwrap_or_else(|e| panic!("invalid header name `{name}`: {e}"));
        let value = HeaderValue::from_str(value)
            .unwrap_or_else(|e| panic!("invalid header value for `{name}`: {e}"));
        self.headers.push((name, value));
        self
    }

    /// Terminate with an HTML body.
    pub fn html(self, body: impl Into<String>) -> Response {
        self.full("text/html; charset=utf-8", body.into().into_bytes())
    }

    /// Terminate with a plain-text body.
    pub fn text(self, body: impl Into<String>) -> Response {
        self.full("text/plain; charset=utf-8", body.into().into_bytes())
    }

    /// Terminate with no body.
    pub fn empty(self) -> Response {
        self.finish(Full::new(Bytes::new()).map_err(std::io::Error::other).boxed())
    }

    /// Terminate with a body streamed from `rx`.
    ///
    /// No content-length is set, so hyper emits the frames with chunked
    /// transfer encoding as they arrive. The body ends when the sending
    /// half of the channel is dropped.
    pub fn stream(self, rx: mpsc::Receiver<BodyFrame>) -> Response {
        self.finish(BodyExt::boxed(http_body_util::StreamBody::new(
            ReceiverStream::new(rx),
        )))
    }

    fn full(mut self, content_type: &'static str, body: Vec<u8>) -> Response {
        self.headers.insert(
            0,
            (http::header::CONTENT_TYPE, HeaderValue::from_static(content_type)),
        );
        self.finish(Full::new(Bytes::from(body)).map_err(std::io::Error::other).boxed())
    }

    fn finish(self, body: Body) -> Response {
        let mut inner = http::Response::new(body);
        *inner.status_mut() = self.status;
        for (name, value) in self.headers {
            inner.headers_mut().append(name, value);
        }
        Response { inner }
    }
}

/// Conversion into an HTTP [`Response`].
///
/// Implemented for the types a handler is allowed to return directly.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response {
        self
    }
}

impl IntoResponse for StatusCode {
    fn into_response(self) -> Response {
        Response::status(self)
    }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response {
        Response::text(self)
    }
}

impl IntoResponse for String {
    fn into_response(self) -> Response {
        Response::text(self)
    }
}
