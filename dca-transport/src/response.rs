//! Raw HTTP response

use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use reqwest::header::HeaderMap;

use crate::body::ResponseBody;
use crate::body::parse_body;
use crate::error::Error;

/// A response before envelope interpretation.
///
/// Returned by [`TransportClient::send_raw`](crate::TransportClient::send_raw)
/// for endpoints that do not answer with a status envelope, such as captcha
/// images.
///
/// # Example
///
/// ```ignore
/// let response = client.send_raw(RequestConfig::get("/captcha")).await?;
///
/// if let ResponseBody::Binary(png) = response.body() {
///     show_captcha(png);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct HttpResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: ResponseBody,
}

impl HttpResponse {
    /// Creates a response from its parts.
    pub fn new(status: StatusCode, headers: HeaderMap, body: ResponseBody) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Reads a reqwest response, decoding its body.
    ///
    /// UTF-8 bodies go through [`parse_body`]; anything else is kept as
    /// bytes.
    pub(crate) async fn read(response: reqwest::Response) -> Result<Self, Error> {
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.bytes().await?;

        let body = if bytes.is_empty() {
            ResponseBody::Empty
        } else {
            match String::from_utf8(bytes.to_vec()) {
                Ok(text) => parse_body(ResponseBody::Text(text)),
                Err(e) => ResponseBody::Binary(e.into_bytes()),
            }
        };

        Ok(Self::new(status, headers, body))
    }

    /// Returns the HTTP status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns the response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the `Content-Type` header, if present and readable.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE)?.to_str().ok()
    }

    /// Returns the decoded body.
    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    /// Consumes the response and returns the body.
    pub fn into_body(self) -> ResponseBody {
        self.body
    }

    /// Turns non-2xx responses into [`Error::Http`].
    pub(crate) fn error_for_status(self) -> Result<Self, Error> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::http(self.status.as_u16(), self.body.to_text_lossy()))
        }
    }
}
