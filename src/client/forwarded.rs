//! External origin of an inbound request, as seen by the visitor's browser.
//!
//! Behind a reverse proxy the request the application receives carries the
//! internal scheme and host; `X-Forwarded-Proto` and `X-Forwarded-Host`
//! restore the public ones.

use http::header::HOST;
use http::{HeaderMap, Request, Uri};

pub const X_FORWARDED_PROTO: &str = "x-forwarded-proto";
pub const X_FORWARDED_HOST: &str = "x-forwarded-host";

/// Request extension marking a connection that arrived over TLS.
///
/// Servers terminating TLS themselves should insert it so that service URLs
/// are built with `https` when no proxy header is present.
#[derive(Debug, Clone, Copy, Default)]
pub struct TlsConnection;

/// Public scheme and host of the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalOrigin {
    pub scheme: String,
    pub host: String,
}

/// First entry of a possibly comma-separated proxy header.
fn first_header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

impl ExternalOrigin {
    /// Resolve the origin of a request. Returns `None` when no host is known.
    pub fn from_request<B>(req: &Request<B>) -> Option<Self> {
        let tls = req.extensions().get::<TlsConnection>().is_some();
        Self::from_parts(req.uri(), req.headers(), tls)
    }

    pub fn from_parts(uri: &Uri, headers: &HeaderMap, tls: bool) -> Option<Self> {
        let scheme = first_header_value(headers, X_FORWARDED_PROTO)
            .map(str::to_ascii_lowercase)
            .or_else(|| tls.then(|| "https".to_string()))
            .or_else(|| uri.scheme_str().map(str::to_string))
            .unwrap_or_else(|| "http".to_string());

        let host = first_header_value(headers, X_FORWARDED_HOST)
            .or_else(|| headers.get(HOST).and_then(|v| v.to_str().ok()))
            .or_else(|| uri.authority().map(|a| a.as_str()))
            .filter(|h| !h.is_empty())?
            .to_string();

        Some(Self { scheme, host })
    }

    /// Absolute URL for a path rooted at `/`.
    pub fn resolve(&self, path: &str) -> String {
        format!("{}://{}{}", self.scheme, self.host, path)
    }

    /// URL the visitor was sent back to, minus the `ticket` parameter the
    /// CAS server appended. Other query segments are kept verbatim.
    pub fn service_url(&self, uri: &Uri) -> String {
        let mut service = self.resolve(uri.path());

        let kept: Vec<&str> = uri
            .query()
            .unwrap_or_default()
            .split('&')
            .filter(|segment| !segment.is_empty())
            .filter(|segment| segment.split('=').next() != Some("ticket"))
            .collect();

        if !kept.is_empty() {
            service.push('?');
            service.push_str(&kept.join("&"));
        }
        service
    }
}
