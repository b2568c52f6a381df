//! Validation response decoding.
//!
//! CAS 1.0 answers in a two-line text format ([`text`]); CAS 2.0 and 3.0
//! answer with a `serviceResponse` document encoded as XML ([`xml`]) or JSON
//! ([`json`]). Both structured encodings decode into [`ServiceResponse`].

pub mod json;
pub mod text;
pub mod types;
pub mod xml;

use chrono::{DateTime, Utc};

use crate::error::DecodeError;
use crate::protocol::ResponseFormat;

pub use text::TextResponse;
pub use types::{
    Attributes, AuthenticationFailure, AuthenticationSuccess, ExtensionAttribute,
    NamedAttribute, Proxies, ServiceResponse, UserAttributes, CAS_NAMESPACE,
};

/// Decode a CAS 2.0/3.0 response body. An unspecified format means XML.
pub fn decode(body: &[u8], format: Option<ResponseFormat>) -> Result<ServiceResponse, DecodeError> {
    match format.unwrap_or_default() {
        ResponseFormat::Xml => xml::decode(body),
        ResponseFormat::Json => json::decode(body),
    }
}

/// Encode a response in the given format, as a CAS server would send it.
pub fn encode(response: &ServiceResponse, format: ResponseFormat) -> String {
    match format {
        ResponseFormat::Xml => xml::encode(response),
        ResponseFormat::Json => json::encode(response),
    }
}

pub(crate) fn parse_bool(field: &str, value: &str) -> Result<bool, DecodeError> {
    match value.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" | "" => Ok(false),
        other => Err(DecodeError::schema(format!(
            "invalid boolean for {field}: {other:?}"
        ))),
    }
}

/// Parse an RFC 3339 timestamp. Java servers may append a `[Zone]` suffix.
pub(crate) fn parse_date(value: &str) -> Result<Option<DateTime<Utc>>, DecodeError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    let value = match value.find('[') {
        Some(idx) if value.ends_with(']') => &value[..idx],
        _ => value,
    };
    DateTime::parse_from_rfc3339(value)
        .map(|d| Some(d.with_timezone(&Utc)))
        .map_err(|e| DecodeError::schema(format!("invalid authenticationDate {value:?}: {e}")))
}

pub(crate) fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("f", "true").unwrap());
        assert!(parse_bool("f", " 1 ").unwrap());
        assert!(!parse_bool("f", "false").unwrap());
        assert!(!parse_bool("f", "").unwrap());
        assert!(parse_bool("f", "maybe").is_err());
    }

    #[test]
    fn test_parse_date() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(parse_date("2024-03-01T12:30:00Z").unwrap(), Some(expected));
        assert_eq!(parse_date("2024-03-01T13:30:00+01:00").unwrap(), Some(expected));
        assert_eq!(
            parse_date("2024-03-01T12:30:00Z[UTC]").unwrap(),
            Some(expected)
        );
        assert_eq!(parse_date("  ").unwrap(), None);
        assert!(parse_date("yesterday").is_err());
    }

    #[test]
    fn test_date_format_roundtrip() {
        let date = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(format_date(&date), "2024-03-01T12:30:00Z");
        assert_eq!(parse_date(&format_date(&date)).unwrap(), Some(date));
    }

    #[test]
    fn test_decode_defaults_to_xml() {
        let body = br#"<cas:serviceResponse xmlns:cas="http://www.yale.edu/tp/cas">
            <cas:authenticationFailure code="INVALID_TICKET">not recognized</cas:authenticationFailure>
        </cas:serviceResponse>"#;
        assert!(decode(body, None).is_ok());
        assert!(decode(body, Some(ResponseFormat::Json)).is_err());
    }
}
