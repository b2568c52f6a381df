//! Zentinel CAS Client
//!
//! Client side of the CAS (Central Authentication Service) single sign-on
//! protocol, versions 1.0, 2.0 and 3.0:
//!
//! - [`LoginRedirector`] sends unauthenticated visitors to `<server>/login`.
//! - [`TicketValidator`] validates the service ticket a visitor returns with
//!   and hands the decoded answer to a [`TicketCallback`].
//!
//! ```no_run
//! use http::{Response, StatusCode};
//! use zentinel_cas::{CasClient, ClientConfig, ProtocolVersion, RedirectOptions, TicketCallback, ValidateOptions};
//!
//! # async fn run(req: http::Request<()>) -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::new(ProtocolVersion::V3, "https://cas.example.org/cas");
//! let callback = TicketCallback::v3(|resp| {
//!     let status = if resp.is_success() { StatusCode::OK } else { StatusCode::FORBIDDEN };
//!     Response::builder().status(status).body(String::new()).unwrap()
//! });
//! let client = CasClient::new(&config, callback)?;
//!
//! let login = client.login_redirector(RedirectOptions { service: "/home".into(), ..Default::default() })?;
//! let validator = client.ticket_validator(ValidateOptions::default())?;
//!
//! let response = if req.uri().query().is_some_and(|q| q.contains("ticket=")) {
//!     validator.handle(&req).await
//! } else {
//!     login.handle(&req)
//! };
//! # let _ = response;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod protocol;
pub mod response;
pub mod transport;

pub use client::{
    status_response, CasClient, ClientConfig, ClientConfigJson, ExternalOrigin, LoginRedirector,
    RedirectOptions, TicketCallback, TicketValidator, TlsConnection, ValidateOptions, Validation,
};
pub use error::{ConfigError, DecodeError, TransportError, ValidationError};
pub use protocol::{LoginMethod, ProtocolVersion, ResponseFormat};
pub use response::{
    Attributes, AuthenticationFailure, AuthenticationSuccess, ExtensionAttribute, NamedAttribute,
    Proxies, ServiceResponse, TextResponse, UserAttributes,
};
pub use transport::{ReqwestTransport, Transport};
