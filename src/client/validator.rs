//! Service ticket validation.
//!
//! A returning visitor presents `?ticket=ST-...`. The validator checks the
//! ticket shape, asks the CAS server about it, decodes the answer according
//! to the protocol version and hands the outcome to the configured callback.
//! Nothing is retried: an unreachable server or an unintelligible answer ends
//! the request with 503, a malformed ticket with 400.

use http::{Request, Response, StatusCode};
use tracing::{debug, error, info, warn};
use url::Url;

use super::callback::TicketCallback;
use super::config::ValidateOptions;
use super::forwarded::ExternalOrigin;
use super::{status_response, CasClient};
use crate::error::{ConfigError, ValidationError};
use crate::protocol::{validation_url, ResponseFormat, ValidationRequest};
use crate::response::{self, ServiceResponse, TextResponse};
use crate::transport::Transport;

/// Prefix of service tickets.
pub const SERVICE_TICKET_PREFIX: &str = "ST-";

/// Minimum length of a service ticket, prefix included.
pub const MIN_TICKET_LEN: usize = 16;

/// Whether `ticket` has the shape of a service ticket.
pub fn is_service_ticket(ticket: &str) -> bool {
    ticket.len() >= MIN_TICKET_LEN && ticket.starts_with(SERVICE_TICKET_PREFIX)
}

/// Decoded answer of the CAS server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// CAS 1.0 answer.
    Text(TextResponse),
    /// CAS 2.0/3.0 answer.
    Structured(ServiceResponse),
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        match self {
            Validation::Text(text) => text.is_valid(),
            Validation::Structured(response) => response.is_success(),
        }
    }
}

/// Handler validating service tickets for one set of options.
pub struct TicketValidator<T> {
    client: CasClient<T>,
    renew: bool,
    pgt_url: Option<Url>,
    format: Option<ResponseFormat>,
}

fn query_param(uri: &http::Uri, name: &str) -> Option<String> {
    url::form_urlencoded::parse(uri.query()?.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

impl<T: Transport> TicketValidator<T> {
    pub(crate) fn new(client: CasClient<T>, options: ValidateOptions) -> Result<Self, ConfigError> {
        options.validate()?;

        Ok(Self {
            client,
            renew: options.renew,
            pgt_url: options.proxy_callback()?,
            format: options.response_format()?,
        })
    }

    /// Handle a visitor returning from the CAS server.
    ///
    /// Returns the callback's response, or an empty 400/503 response when the
    /// callback could not be reached.
    pub async fn handle<B>(&self, req: &Request<B>) -> Response<String> {
        match self.validate_request(req).await {
            Ok(validation) => self.dispatch(validation),
            Err(e) => status_response(e.status_code()),
        }
    }

    /// Extract the ticket and service URL from `req` and validate them.
    pub async fn validate_request<B>(&self, req: &Request<B>) -> Result<Validation, ValidationError> {
        let ticket = match query_param(req.uri(), "ticket") {
            Some(ticket) if is_service_ticket(&ticket) => ticket,
            ticket => {
                debug!(
                    present = ticket.is_some(),
                    path = %req.uri().path(),
                    "Rejecting request without a well-formed service ticket"
                );
                return Err(ValidationError::MalformedTicket);
            }
        };

        let origin = ExternalOrigin::from_request(req).ok_or_else(|| {
            debug!(path = %req.uri().path(), "Rejecting ticket: request has no host");
            ValidationError::UnknownOrigin
        })?;
        let service = origin.service_url(req.uri());

        self.validate_ticket(&ticket, &service).await
    }

    /// Validate `ticket` for `service` against the CAS server.
    pub async fn validate_ticket(
        &self,
        ticket: &str,
        service: &str,
    ) -> Result<Validation, ValidationError> {
        if !is_service_ticket(ticket) {
            return Err(ValidationError::MalformedTicket);
        }

        let version = self.client.version();
        let request = ValidationRequest {
            ticket,
            service,
            renew: self.renew,
            pgt_url: self.pgt_url.as_ref(),
            format: self.format,
        };
        let url = validation_url(self.client.server_url(), version, &request);

        debug!(version = %version, service = %service, "Validating service ticket");

        let body = self.client.transport().get(&url).await.map_err(|e| {
            warn!(error = %e, version = %version, "CAS server unavailable");
            ValidationError::from(e)
        })?;

        let validation = if version.is_structured() {
            response::decode(&body, self.format).map(Validation::Structured)
        } else {
            response::text::decode(&body).map(Validation::Text)
        }
        .map_err(|e| {
            warn!(error = %e, version = %version, "Failed to decode CAS server response");
            ValidationError::from(e)
        })?;

        match &validation {
            Validation::Structured(ServiceResponse::Failure(failure)) => info!(
                code = %failure.code,
                description = %failure.message,
                "CAS server rejected service ticket"
            ),
            Validation::Text(TextResponse::No) => info!("CAS server rejected service ticket"),
            Validation::Structured(ServiceResponse::Success(success)) => {
                info!(user = %success.user, "Service ticket validated")
            }
            Validation::Text(TextResponse::Yes(user)) => info!(user = %user, "Service ticket validated"),
        }

        Ok(validation)
    }

    /// Hand a decoded validation to the callback.
    pub fn dispatch(&self, validation: Validation) -> Response<String> {
        match (validation, self.client.callback()) {
            (Validation::Text(text), TicketCallback::V1(callback)) => {
                callback(text.is_valid(), text.user())
            }
            (Validation::Structured(response), TicketCallback::V2(callback))
            | (Validation::Structured(response), TicketCallback::V3(callback)) => callback(response),
            (_, callback) => {
                error!(callback = ?callback, "Validation result does not fit the configured callback");
                status_response(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}
