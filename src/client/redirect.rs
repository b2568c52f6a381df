//! Redirect of unauthenticated visitors to the CAS login page.

use http::header::LOCATION;
use http::{HeaderValue, Request, Response, StatusCode};
use tracing::{debug, error};
use url::Url;

use super::config::{RedirectOptions, ServiceTarget};
use super::forwarded::ExternalOrigin;
use super::status_response;
use crate::error::ConfigError;
use crate::protocol::{login_url, LoginMethod};

/// Handler answering `302 Found` towards `<server>/login`.
#[derive(Debug, Clone)]
pub struct LoginRedirector {
    server_url: Url,
    service: ServiceTarget,
    renew: bool,
    gateway: bool,
    method: Option<LoginMethod>,
}

impl LoginRedirector {
    /// Validate `options` once and build the redirector.
    pub fn new(server_url: Url, options: RedirectOptions) -> Result<Self, ConfigError> {
        options.validate()?;

        Ok(Self {
            server_url,
            service: options.service_target()?,
            renew: options.renew,
            gateway: options.gateway,
            method: options.login_method()?,
        })
    }

    /// Login URL for this request, or `None` if a relative service cannot be
    /// resolved because the request carries no host.
    pub fn login_url<B>(&self, req: &Request<B>) -> Option<Url> {
        let service = match &self.service {
            ServiceTarget::Absolute(service) => service.clone(),
            ServiceTarget::Rooted(path) => ExternalOrigin::from_request(req)?.resolve(path),
        };

        Some(login_url(
            &self.server_url,
            &service,
            self.renew,
            self.gateway,
            self.method,
        ))
    }

    /// Redirect the visitor to the CAS login page.
    pub fn handle<B>(&self, req: &Request<B>) -> Response<String> {
        let Some(url) = self.login_url(req) else {
            debug!(path = %req.uri().path(), "Cannot resolve service URL: request has no host");
            return status_response(StatusCode::BAD_REQUEST);
        };

        let location = match HeaderValue::from_str(url.as_str()) {
            Ok(location) => location,
            Err(e) => {
                error!(error = %e, "Login URL is not a valid header value");
                return status_response(StatusCode::INTERNAL_SERVER_ERROR);
            }
        };

        debug!(location = %url, "Redirecting to CAS login");

        let mut response = status_response(StatusCode::FOUND);
        response.headers_mut().insert(LOCATION, location);
        response
    }
}
