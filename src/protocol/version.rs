//! Protocol versions, endpoint paths and response formats.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Credential requestor / acceptor.
pub const LOGIN_PATH: &str = "/login";

/// Service ticket validation [CAS 1.0].
pub const VALIDATE_PATH: &str = "/validate";

/// Service ticket validation [CAS 2.0].
pub const V2_SERVICE_VALIDATE_PATH: &str = "/serviceValidate";

/// Service ticket validation [CAS 3.0].
pub const V3_SERVICE_VALIDATE_PATH: &str = "/p3/serviceValidate";

/// CAS protocol version spoken by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ProtocolVersion {
    V1,
    V2,
    V3,
}

impl ProtocolVersion {
    /// Path of the ticket validation endpoint, relative to the server base URL.
    pub fn validate_path(&self) -> &'static str {
        match self {
            ProtocolVersion::V1 => VALIDATE_PATH,
            ProtocolVersion::V2 => V2_SERVICE_VALIDATE_PATH,
            ProtocolVersion::V3 => V3_SERVICE_VALIDATE_PATH,
        }
    }

    /// Whether validation responses use the structured (XML/JSON) schema.
    pub fn is_structured(&self) -> bool {
        !matches!(self, ProtocolVersion::V1)
    }
}

impl TryFrom<u8> for ProtocolVersion {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ProtocolVersion::V1),
            2 => Ok(ProtocolVersion::V2),
            3 => Ok(ProtocolVersion::V3),
            other => Err(ConfigError::InvalidProtocolVersion(other)),
        }
    }
}

impl From<ProtocolVersion> for u8 {
    fn from(version: ProtocolVersion) -> Self {
        match version {
            ProtocolVersion::V1 => 1,
            ProtocolVersion::V2 => 2,
            ProtocolVersion::V3 => 3,
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.0", u8::from(*self))
    }
}

/// Encoding of a CAS 2.0/3.0 validation response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseFormat {
    #[default]
    Xml,
    Json,
}

impl ResponseFormat {
    /// Value of the `format` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseFormat::Xml => "XML",
            ResponseFormat::Json => "JSON",
        }
    }
}

impl FromStr for ResponseFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "XML" => Ok(ResponseFormat::Xml),
            "JSON" => Ok(ResponseFormat::Json),
            _ => Err(ConfigError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
