//! CAS client configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::error::ConfigError;
use crate::protocol::{LoginMethod, ProtocolVersion, ResponseFormat};

/// CAS client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// CAS protocol version (1, 2 or 3). Required.
    #[serde(default)]
    pub version: Option<ProtocolVersion>,

    /// Base URL of the CAS server; protocol paths are appended to it.
    /// Example: "https://cas.example.org/cas"
    #[serde(default)]
    pub server_url: String,

    /// Timeout for validation requests, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    10
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            version: None,
            server_url: String::new(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ClientConfig {
    pub fn new(version: ProtocolVersion, server_url: impl Into<String>) -> Self {
        Self {
            version: Some(version),
            server_url: server_url.into(),
            ..Default::default()
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.protocol_version()?;
        self.parsed_server_url()?;
        Ok(())
    }

    pub(crate) fn protocol_version(&self) -> Result<ProtocolVersion, ConfigError> {
        self.version.ok_or(ConfigError::InvalidProtocolVersion(0))
    }

    pub(crate) fn parsed_server_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.server_url)
            .map_err(|e| ConfigError::InvalidServerUrl(format!("{}: {}", self.server_url, e)))?;

        if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
            return Err(ConfigError::InvalidServerUrl(format!(
                "{}: must be an HTTP(S) URL",
                self.server_url
            )));
        }

        Ok(url)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// JSON configuration overlay.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct ClientConfigJson {
    pub version: Option<ProtocolVersion>,
    pub server_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub login: Option<RedirectOptions>,
    #[serde(default)]
    pub validate: Option<ValidateOptions>,
}

impl ClientConfigJson {
    /// Apply JSON config to existing config.
    pub fn apply_to(&self, config: &mut ClientConfig) {
        if let Some(version) = self.version {
            config.version = Some(version);
        }
        if let Some(ref server_url) = self.server_url {
            config.server_url = server_url.clone();
        }
        if let Some(timeout) = self.request_timeout_secs {
            config.request_timeout_secs = timeout;
        }
    }
}

/// Options of the login redirect, validated once by the redirector.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RedirectOptions {
    /// Where the visitor returns after login: an absolute URL, or a path
    /// starting with `/` resolved against the request's external origin.
    pub service: String,

    /// Bypass single sign-on and force credentials. Excludes `gateway`.
    #[serde(default)]
    pub renew: bool,

    /// Never prompt for credentials. Excludes `renew`.
    #[serde(default)]
    pub gateway: bool,

    /// Response method [CAS 3.0]: GET, POST, HEAD or HEADER, sent as given.
    #[serde(default)]
    pub method: Option<String>,
}

/// Where the visitor is sent back after login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ServiceTarget {
    Absolute(String),
    Rooted(String),
}

impl RedirectOptions {
    pub(crate) fn service_target(&self) -> Result<ServiceTarget, ConfigError> {
        let service = self.service.as_str();
        if service.starts_with('/') {
            return Ok(ServiceTarget::Rooted(service.to_string()));
        }

        match Url::parse(service) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {
                Ok(ServiceTarget::Absolute(service.to_string()))
            }
            _ => Err(ConfigError::InvalidService(service.to_string())),
        }
    }

    pub(crate) fn login_method(&self) -> Result<Option<LoginMethod>, ConfigError> {
        match self.method.as_deref() {
            None | Some("") => Ok(None),
            Some(method) => method.parse().map(Some),
        }
    }

    /// Validate the options.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.service_target()?;
        if self.renew && self.gateway {
            return Err(ConfigError::RenewWithGateway);
        }
        self.login_method()?;
        Ok(())
    }
}

/// Options of ticket validation, validated once by the validator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ValidateOptions {
    /// Only accept tickets issued from primary credentials [CAS 2.0+].
    #[serde(default)]
    pub renew: bool,

    /// Proxy callback URL [CAS 2.0+].
    #[serde(default)]
    pub pgt_url: Option<String>,

    /// Response format, XML or JSON [CAS 3.0]. Defaults to XML.
    #[serde(default)]
    pub format: Option<String>,
}

impl ValidateOptions {
    pub(crate) fn response_format(&self) -> Result<Option<ResponseFormat>, ConfigError> {
        match self.format.as_deref() {
            None | Some("") => Ok(None),
            Some(format) => format.parse().map(Some),
        }
    }

    pub(crate) fn proxy_callback(&self) -> Result<Option<Url>, ConfigError> {
        match self.pgt_url.as_deref() {
            None | Some("") => Ok(None),
            Some(pgt_url) => match Url::parse(pgt_url) {
                Ok(url) if url.scheme() == "https" => Ok(Some(url)),
                _ => Err(ConfigError::InvalidProxyCallback(pgt_url.to_string())),
            },
        }
    }

    /// Validate the options.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.response_format()?;
        self.proxy_callback()?;
        Ok(())
    }
}
