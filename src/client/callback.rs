//! Caller-supplied handling of a validation result.

use http::Response;
use std::fmt;
use std::sync::Arc;

use crate::protocol::ProtocolVersion;
use crate::response::ServiceResponse;

/// CAS 1.0 callback: `(is_valid, user)`. `user` is empty when invalid.
pub type V1Callback = dyn Fn(bool, &str) -> Response<String> + Send + Sync;

/// CAS 2.0/3.0 callback. The ticket is valid only for a `Success` response.
pub type ServiceResponseCallback = dyn Fn(ServiceResponse) -> Response<String> + Send + Sync;

/// Callback invoked once per decoded validation; its response finishes the
/// visitor's request. The variant must match the client's protocol version.
#[derive(Clone)]
pub enum TicketCallback {
    V1(Arc<V1Callback>),
    V2(Arc<ServiceResponseCallback>),
    V3(Arc<ServiceResponseCallback>),
}

impl TicketCallback {
    pub fn v1<F>(f: F) -> Self
    where
        F: Fn(bool, &str) -> Response<String> + Send + Sync + 'static,
    {
        TicketCallback::V1(Arc::new(f))
    }

    pub fn v2<F>(f: F) -> Self
    where
        F: Fn(ServiceResponse) -> Response<String> + Send + Sync + 'static,
    {
        TicketCallback::V2(Arc::new(f))
    }

    pub fn v3<F>(f: F) -> Self
    where
        F: Fn(ServiceResponse) -> Response<String> + Send + Sync + 'static,
    {
        TicketCallback::V3(Arc::new(f))
    }

    /// Protocol version this callback is shaped for.
    pub fn version(&self) -> ProtocolVersion {
        match self {
            TicketCallback::V1(_) => ProtocolVersion::V1,
            TicketCallback::V2(_) => ProtocolVersion::V2,
            TicketCallback::V3(_) => ProtocolVersion::V3,
        }
    }
}

impl fmt::Debug for TicketCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TicketCallback").field(&self.version()).finish()
    }
}
