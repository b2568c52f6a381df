//! Error types for the CAS client.

use http::StatusCode;

/// Misconfiguration detected while building a client, redirector or validator.
///
/// These are programmer errors and are reported at setup time, never while
/// serving a request.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid CAS protocol version: {0}")]
    InvalidProtocolVersion(u8),

    #[error("invalid CAS server URL: {0}")]
    InvalidServerUrl(String),

    #[error("callback for CAS {callback} does not match configured protocol CAS {configured}")]
    CallbackMismatch {
        configured: crate::protocol::ProtocolVersion,
        callback: crate::protocol::ProtocolVersion,
    },

    #[error("invalid service value: {0:?}")]
    InvalidService(String),

    #[error("renew and gateway cannot be set at the same time")]
    RenewWithGateway,

    #[error("unsupported login method: {0}")]
    UnsupportedMethod(String),

    #[error("unsupported response format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid proxy callback URL: {0}")]
    InvalidProxyCallback(String),

    #[error("failed to build HTTP transport: {0}")]
    Transport(String),
}

/// Failure of the outbound call to the CAS server.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request to CAS server failed: {0}")]
    Request(String),

    #[error("CAS server returned status {0}")]
    Status(u16),

    #[error("failed to read CAS server response: {0}")]
    Body(String),
}

/// The CAS server answered, but the answer could not be understood.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("response is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed XML attribute: {0}")]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CAS 1.0 response does not terminate the username line")]
    MalformedText,

    #[error("unexpected response structure: {0}")]
    Schema(String),
}

impl DecodeError {
    pub(crate) fn schema(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }
}

/// Why a ticket validation ended before reaching the callback.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("missing or malformed service ticket")]
    MalformedTicket,

    #[error("cannot determine the external origin of the request")]
    UnknownOrigin,

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("CAS server response could not be decoded: {0}")]
    Decode(#[from] DecodeError),
}

impl ValidationError {
    /// HTTP status answered to the visitor for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ValidationError::MalformedTicket | ValidationError::UnknownOrigin => {
                StatusCode::BAD_REQUEST
            }
            ValidationError::Transport(_) | ValidationError::Decode(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }
}
