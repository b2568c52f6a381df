//! Composition of login and validation URLs.

use std::fmt;
use std::str::FromStr;
use url::Url;

use super::version::{ProtocolVersion, ResponseFormat, LOGIN_PATH};
use crate::error::ConfigError;

/// Response method requested from the CAS server after login [CAS 3.0].
///
/// Sent verbatim as the `method` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMethod {
    Get,
    Post,
    Head,
    Header,
}

impl LoginMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginMethod::Get => "GET",
            LoginMethod::Post => "POST",
            LoginMethod::Head => "HEAD",
            LoginMethod::Header => "HEADER",
        }
    }
}

impl FromStr for LoginMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(LoginMethod::Get),
            "POST" => Ok(LoginMethod::Post),
            "HEAD" => Ok(LoginMethod::Head),
            "HEADER" => Ok(LoginMethod::Header),
            _ => Err(ConfigError::UnsupportedMethod(s.to_string())),
        }
    }
}

impl fmt::Display for LoginMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of one ticket validation call.
#[derive(Debug, Clone)]
pub struct ValidationRequest<'a> {
    /// Service ticket presented by the visitor.
    pub ticket: &'a str,
    /// Service URL the ticket was issued for.
    pub service: &'a str,
    pub renew: bool,
    /// Proxy callback URL [CAS 2.0+].
    pub pgt_url: Option<&'a Url>,
    /// Requested response encoding [CAS 2.0+].
    pub format: Option<ResponseFormat>,
}

/// Append a protocol path to the server base URL, dropping any query or fragment.
fn endpoint(base: &Url, path: &str) -> Url {
    let mut url = base.clone();
    let joined = format!("{}{}", base.path().trim_end_matches('/'), path);
    url.set_path(&joined);
    url.set_query(None);
    url.set_fragment(None);
    url
}

/// Build the login redirect target.
///
/// `service` must already be absolute; `renew` and `gateway` exclusion is
/// enforced by the caller when its options are validated.
pub fn login_url(
    base: &Url,
    service: &str,
    renew: bool,
    gateway: bool,
    method: Option<LoginMethod>,
) -> Url {
    let mut url = endpoint(base, LOGIN_PATH);
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("service", service);
        if renew {
            query.append_pair("renew", "true");
        }
        if gateway {
            query.append_pair("gateway", "true");
        }
        if let Some(method) = method {
            query.append_pair("method", method.as_str());
        }
    }
    url
}

/// Build the ticket validation URL for the given protocol version.
///
/// CAS 1.0 has no `renew`, `pgtUrl` or `format` parameters; they are dropped.
pub fn validation_url(base: &Url, version: ProtocolVersion, request: &ValidationRequest<'_>) -> Url {
    let mut url = endpoint(base, version.validate_path());
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("service", request.service);
        query.append_pair("ticket", request.ticket);

        if version.is_structured() {
            if request.renew {
                query.append_pair("renew", "true");
            }
            if let Some(pgt_url) = request.pgt_url {
                query.append_pair("pgtUrl", pgt_url.as_str());
            }
            if let Some(format) = request.format {
                query.append_pair("format", format.as_str());
            }
        }
    }
    url
}
