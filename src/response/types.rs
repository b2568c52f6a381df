//! CAS 2.0/3.0 service response model.

use chrono::{DateTime, Utc};

/// XML namespace of CAS service responses.
pub const CAS_NAMESPACE: &str = "http://www.yale.edu/tp/cas";

/// Decoded `serviceResponse` document.
///
/// A service ticket is valid only when the response is a [`ServiceResponse::Success`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceResponse {
    Success(AuthenticationSuccess),
    Failure(AuthenticationFailure),
}

impl ServiceResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, ServiceResponse::Success(_))
    }

    pub fn success(&self) -> Option<&AuthenticationSuccess> {
        match self {
            ServiceResponse::Success(success) => Some(success),
            ServiceResponse::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&AuthenticationFailure> {
        match self {
            ServiceResponse::Success(_) => None,
            ServiceResponse::Failure(failure) => Some(failure),
        }
    }

    /// Authenticated user, if the ticket was accepted.
    pub fn user(&self) -> Option<&str> {
        self.success().map(|s| s.user.as_str())
    }
}

/// `authenticationFailure`: the CAS server rejected the ticket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthenticationFailure {
    /// Error code, e.g. `INVALID_TICKET`.
    pub code: String,
    pub message: String,
}

/// `authenticationSuccess`: the ticket was accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthenticationSuccess {
    pub user: String,
    /// Proxy-granting ticket IOU, present when a `pgtUrl` was requested.
    pub proxy_granting_ticket: Option<String>,
    pub proxies: Option<Proxies>,
    pub attributes: Option<Attributes>,
    /// Unrecognized elements, in document order.
    pub extensions: Vec<ExtensionAttribute>,
}

/// Ordered list of proxies the ticket went through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Proxies(pub Vec<String>);

impl Proxies {
    pub fn add_proxy(&mut self, proxy: impl Into<String>) {
        self.0.push(proxy.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// `attributes` block [CAS 3.0].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    pub authentication_date: Option<DateTime<Utc>>,
    pub long_term_authentication_request_token_used: bool,
    pub is_from_new_login: bool,
    pub member_of: Vec<String>,
    pub user_attributes: Option<UserAttributes>,
    /// Vendor attributes not covered by the fields above, in document order.
    pub extensions: Vec<ExtensionAttribute>,
}

impl Attributes {
    /// First value of an extension attribute.
    pub fn extension(&self, name: &str) -> Option<&str> {
        self.extensions
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.value.as_str())
    }
}

/// `userAttributes` block: named attributes, duplicates kept in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserAttributes {
    pub attributes: Vec<NamedAttribute>,
    pub extensions: Vec<ExtensionAttribute>,
}

impl UserAttributes {
    /// All values recorded under `name`.
    pub fn values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.attributes
            .iter()
            .filter(move |a| a.name == name)
            .map(|a| a.value.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamedAttribute {
    pub name: String,
    pub value: String,
}

/// Element the decoder has no typed field for, kept as name and raw value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionAttribute {
    pub name: String,
    pub value: String,
}

impl ExtensionAttribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}
