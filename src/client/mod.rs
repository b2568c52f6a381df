//! CAS client: login redirects and service ticket validation.

pub mod callback;
pub mod config;
pub mod forwarded;
pub mod redirect;
pub mod validator;

use http::{Response, StatusCode};
use std::sync::Arc;
use tracing::info;
use url::Url;

use crate::error::ConfigError;
use crate::protocol::ProtocolVersion;
use crate::transport::{ReqwestTransport, Transport};

pub use callback::{ServiceResponseCallback, TicketCallback, V1Callback};
pub use config::{ClientConfig, ClientConfigJson, RedirectOptions, ValidateOptions};
pub use forwarded::{ExternalOrigin, TlsConnection};
pub use redirect::LoginRedirector;
pub use validator::{is_service_ticket, TicketValidator, Validation};

struct ClientInner<T> {
    version: ProtocolVersion,
    server_url: Url,
    callback: TicketCallback,
    transport: T,
}

/// CAS client bound to one server and protocol version.
///
/// Immutable after construction and cheap to clone; share it freely across
/// request handlers.
pub struct CasClient<T = ReqwestTransport> {
    inner: Arc<ClientInner<T>>,
}

impl<T> Clone for CasClient<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl CasClient<ReqwestTransport> {
    /// Create a client that reaches the CAS server with `reqwest`.
    pub fn new(config: &ClientConfig, callback: TicketCallback) -> Result<Self, ConfigError> {
        let transport = ReqwestTransport::new(config.request_timeout())?;
        Self::with_transport(config, callback, transport)
    }
}

impl<T: Transport> CasClient<T> {
    /// Create a client using a custom transport.
    pub fn with_transport(
        config: &ClientConfig,
        callback: TicketCallback,
        transport: T,
    ) -> Result<Self, ConfigError> {
        let version = config.protocol_version()?;
        let server_url = config.parsed_server_url()?;

        if callback.version() != version {
            return Err(ConfigError::CallbackMismatch {
                configured: version,
                callback: callback.version(),
            });
        }

        info!(version = %version, server = %server_url, "CAS client configured");

        Ok(Self {
            inner: Arc::new(ClientInner {
                version,
                server_url,
                callback,
                transport,
            }),
        })
    }

    /// CAS protocol version used by the client.
    pub fn version(&self) -> ProtocolVersion {
        self.inner.version
    }

    /// Base URL of the CAS server.
    pub fn server_url(&self) -> &Url {
        &self.inner.server_url
    }

    pub(crate) fn callback(&self) -> &TicketCallback {
        &self.inner.callback
    }

    pub(crate) fn transport(&self) -> &T {
        &self.inner.transport
    }

    /// Build a handler redirecting visitors to the CAS login page.
    pub fn login_redirector(&self, options: RedirectOptions) -> Result<LoginRedirector, ConfigError> {
        LoginRedirector::new(self.server_url().clone(), options)
    }

    /// Build a handler validating the service tickets visitors return with.
    pub fn ticket_validator(&self, options: ValidateOptions) -> Result<TicketValidator<T>, ConfigError> {
        TicketValidator::new(self.clone(), options)
    }
}

/// Empty response with the given status.
pub fn status_response(status: StatusCode) -> Response<String> {
    let mut response = Response::new(String::new());
    *response.status_mut() = status;
    response
}
