//! JSON encoding of the CAS service response (`format=JSON`).
//!
//! CAS servers commonly wrap attribute values in arrays, so scalar fields
//! inside `attributes` accept either a bare value or a one-element array.
//! Unknown keys become [`ExtensionAttribute`]s, one per array element.

use serde_json::{json, Map, Value};

use super::types::{
    Attributes, AuthenticationFailure, AuthenticationSuccess, ExtensionAttribute,
    NamedAttribute, Proxies, ServiceResponse, UserAttributes,
};
use super::{format_date, parse_bool, parse_date};
use crate::error::DecodeError;

/// Decode a JSON `serviceResponse` document.
pub fn decode(body: &[u8]) -> Result<ServiceResponse, DecodeError> {
    let document: Value = serde_json::from_slice(body)?;
    let root = document
        .get("serviceResponse")
        .and_then(Value::as_object)
        .ok_or_else(|| DecodeError::schema("missing serviceResponse object"))?;

    match (root.get("authenticationSuccess"), root.get("authenticationFailure")) {
        (Some(success), None) => Ok(ServiceResponse::Success(decode_success(success)?)),
        (None, Some(failure)) => Ok(ServiceResponse::Failure(decode_failure(failure)?)),
        (Some(_), Some(_)) => Err(DecodeError::schema(
            "both authenticationSuccess and authenticationFailure present",
        )),
        (None, None) => Err(DecodeError::schema(
            "neither authenticationSuccess nor authenticationFailure present",
        )),
    }
}

fn object<'a>(field: &str, value: &'a Value) -> Result<&'a Map<String, Value>, DecodeError> {
    value
        .as_object()
        .ok_or_else(|| DecodeError::schema(format!("{field} must be an object")))
}

/// Raw text of a value: strings as-is, everything else as JSON.
fn raw(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Unwrap a one-element array around a scalar.
fn scalar(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.first(),
        other => Some(other),
    }
}

fn strings(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(raw).collect(),
        other => vec![raw(other)],
    }
}

fn flag(field: &str, value: &Value) -> Result<bool, DecodeError> {
    match scalar(value) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => parse_bool(field, &raw(other)),
    }
}

fn push_extensions(extensions: &mut Vec<ExtensionAttribute>, name: &str, value: &Value) {
    for item in strings(value) {
        extensions.push(ExtensionAttribute::new(name, item));
    }
}

fn decode_failure(value: &Value) -> Result<AuthenticationFailure, DecodeError> {
    let failure = object("authenticationFailure", value)?;
    Ok(AuthenticationFailure {
        code: failure.get("code").map(raw).unwrap_or_default(),
        message: failure.get("description").map(raw).unwrap_or_default(),
    })
}

fn decode_success(value: &Value) -> Result<AuthenticationSuccess, DecodeError> {
    let fields = object("authenticationSuccess", value)?;
    let mut user = None;
    let mut success = AuthenticationSuccess::default();

    for (key, value) in fields {
        match key.as_str() {
            "user" => {
                let name = value
                    .as_str()
                    .ok_or_else(|| DecodeError::schema("user must be a string"))?;
                user = Some(name.to_string());
            }
            "proxyGrantingTicket" => success.proxy_granting_ticket = Some(raw(value)),
            "proxies" => success.proxies = Some(Proxies(strings(value))),
            "attributes" => success.attributes = Some(decode_attributes(value)?),
            _ => push_extensions(&mut success.extensions, key, value),
        }
    }

    success.user = user.ok_or_else(|| DecodeError::schema("authenticationSuccess without user"))?;
    Ok(success)
}

fn decode_attributes(value: &Value) -> Result<Attributes, DecodeError> {
    let fields = object("attributes", value)?;
    let mut attributes = Attributes::default();

    for (key, value) in fields {
        match key.as_str() {
            "authenticationDate" => {
                attributes.authentication_date = match scalar(value) {
                    Some(Value::String(date)) => parse_date(date)?,
                    None | Some(Value::Null) => None,
                    Some(other) => {
                        return Err(DecodeError::schema(format!(
                            "invalid authenticationDate: {other}"
                        )))
                    }
                };
            }
            "longTermAuthenticationRequestTokenUsed" => {
                attributes.long_term_authentication_request_token_used = flag(key, value)?;
            }
            "isFromNewLogin" => attributes.is_from_new_login = flag(key, value)?,
            "memberOf" => attributes.member_of.extend(strings(value)),
            "userAttributes" => {
                attributes.user_attributes = Some(decode_user_attributes(value)?);
            }
            _ => push_extensions(&mut attributes.extensions, key, value),
        }
    }

    Ok(attributes)
}

fn decode_user_attributes(value: &Value) -> Result<UserAttributes, DecodeError> {
    let fields = object("userAttributes", value)?;
    let mut user_attributes = UserAttributes::default();

    for (key, value) in fields {
        if key != "attribute" {
            push_extensions(&mut user_attributes.extensions, key, value);
            continue;
        }

        let entries = match value {
            Value::Array(items) => items.iter().collect::<Vec<_>>(),
            other => vec![other],
        };
        for entry in entries {
            let entry = object("attribute", entry)?;
            user_attributes.attributes.push(NamedAttribute {
                name: entry.get("name").map(raw).unwrap_or_default(),
                value: entry.get("value").map(raw).unwrap_or_default(),
            });
        }
    }

    Ok(user_attributes)
}

/// Add extensions to `map`, grouping repeated names into an array.
fn insert_extensions(map: &mut Map<String, Value>, extensions: &[ExtensionAttribute]) {
    for extension in extensions {
        let value = Value::String(extension.value.clone());
        match map.get_mut(&extension.name) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(extension.name.clone(), value);
            }
        }
    }
}

/// Encode a response as a CAS server would for `format=JSON`.
pub fn encode(response: &ServiceResponse) -> String {
    let body = match response {
        ServiceResponse::Failure(failure) => json!({
            "authenticationFailure": {
                "code": failure.code,
                "description": failure.message
            }
        }),
        ServiceResponse::Success(success) => json!({
            "authenticationSuccess": Value::Object(encode_success(success))
        }),
    };

    json!({ "serviceResponse": body }).to_string()
}

fn encode_success(success: &AuthenticationSuccess) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("user".into(), json!(success.user));
    if let Some(ref pgt) = success.proxy_granting_ticket {
        map.insert("proxyGrantingTicket".into(), json!(pgt));
    }
    if let Some(ref proxies) = success.proxies {
        map.insert("proxies".into(), json!(proxies.0));
    }
    if let Some(ref attributes) = success.attributes {
        map.insert("attributes".into(), Value::Object(encode_attributes(attributes)));
    }
    insert_extensions(&mut map, &success.extensions);
    map
}

fn encode_attributes(attributes: &Attributes) -> Map<String, Value> {
    let mut map = Map::new();
    if let Some(ref date) = attributes.authentication_date {
        map.insert("authenticationDate".into(), json!(format_date(date)));
    }
    map.insert(
        "longTermAuthenticationRequestTokenUsed".into(),
        json!(attributes.long_term_authentication_request_token_used),
    );
    map.insert("isFromNewLogin".into(), json!(attributes.is_from_new_login));
    if !attributes.member_of.is_empty() {
        map.insert("memberOf".into(), json!(attributes.member_of));
    }
    if let Some(ref user_attributes) = attributes.user_attributes {
        let mut inner = Map::new();
        let entries: Vec<Value> = user_attributes
            .attributes
            .iter()
            .map(|a| json!({ "name": a.name, "value": a.value }))
            .collect();
        inner.insert("attribute".into(), Value::Array(entries));
        insert_extensions(&mut inner, &user_attributes.extensions);
        map.insert("userAttributes".into(), Value::Object(inner));
    }
    insert_extensions(&mut map, &attributes.extensions);
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const SUCCESS: &str = r#"{
        "serviceResponse": {
            "authenticationSuccess": {
                "user": "alice",
                "proxyGrantingTicket": "PGTIOU-84678-8a9d",
                "proxies": ["https://proxy1.example.org/pgtUrl"],
                "attributes": {
                    "authenticationDate": ["2024-03-01T12:30:00Z"],
                    "longTermAuthenticationRequestTokenUsed": [false],
                    "isFromNewLogin": [true],
                    "memberOf": ["staff", "faculty"],
                    "firstname": ["Alice"],
                    "employeeNumber": 42
                },
                "tenant": "acme"
            }
        }
    }"#;

    #[test]
    fn test_decode_success() {
        let resp = decode(SUCCESS.as_bytes()).unwrap();
        let success = resp.success().unwrap();
        assert_eq!(success.user, "alice");
        assert_eq!(success.proxy_granting_ticket.as_deref(), Some("PGTIOU-84678-8a9d"));
        assert_eq!(success.proxies.as_ref().unwrap().len(), 1);

        let attrs = success.attributes.as_ref().unwrap();
        assert_eq!(
            attrs.authentication_date,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap())
        );
        assert!(!attrs.long_term_authentication_request_token_used);
        assert!(attrs.is_from_new_login);
        assert_eq!(attrs.member_of, vec!["staff", "faculty"]);
        assert_eq!(
            attrs.extensions,
            vec![
                ExtensionAttribute::new("firstname", "Alice"),
                ExtensionAttribute::new("employeeNumber", "42"),
            ]
        );
        assert_eq!(success.extensions, vec![ExtensionAttribute::new("tenant", "acme")]);
    }

    #[test]
    fn test_decode_failure() {
        let body = br#"{"serviceResponse":{"authenticationFailure":{"code":"INVALID_TICKET","description":"Ticket ST-1856339 not recognized"}}}"#;
        let resp = decode(body).unwrap();
        let failure = resp.failure().unwrap();
        assert_eq!(failure.code, "INVALID_TICKET");
        assert_eq!(failure.message, "Ticket ST-1856339 not recognized");
    }

    #[test]
    fn test_values_keep_surrounding_whitespace() {
        let body = br#"{"serviceResponse":{"authenticationFailure":{"code":"INVALID_TICKET","description":" padded "}}}"#;
        assert_eq!(decode(body).unwrap().failure().unwrap().message, " padded ");

        let resp = ServiceResponse::Success(AuthenticationSuccess {
            user: " alice ".to_string(),
            proxy_granting_ticket: Some("\tPGTIOU-1".to_string()),
            extensions: vec![ExtensionAttribute::new("displayName", "Alice  ")],
            ..Default::default()
        });
        assert_eq!(decode(encode(&resp).as_bytes()).unwrap(), resp);
    }

    #[test]
    fn test_scalar_attribute_values() {
        let body = br#"{"serviceResponse":{"authenticationSuccess":{
            "user":"bob",
            "attributes":{"isFromNewLogin":"true","memberOf":"staff"}}}}"#;
        let resp = decode(body).unwrap();
        let attrs = resp.success().unwrap().attributes.as_ref().unwrap();
        assert!(attrs.is_from_new_login);
        assert_eq!(attrs.member_of, vec!["staff"]);
    }

    #[test]
    fn test_user_attributes() {
        let body = br#"{"serviceResponse":{"authenticationSuccess":{
            "user":"bob",
            "attributes":{"userAttributes":{
                "attribute":[{"name":"mail","value":"a@example.org"},{"name":"mail","value":"b@example.org"}],
                "nickname":"Bobby"}}}}}"#;
        let resp = decode(body).unwrap();
        let user_attrs = resp
            .success()
            .unwrap()
            .attributes
            .as_ref()
            .unwrap()
            .user_attributes
            .as_ref()
            .unwrap();
        assert_eq!(
            user_attrs.values("mail").collect::<Vec<_>>(),
            vec!["a@example.org", "b@example.org"]
        );
        assert_eq!(user_attrs.extensions, vec![ExtensionAttribute::new("nickname", "Bobby")]);
    }

    #[test]
    fn test_schema_violations() {
        assert!(decode(br#"{"serviceResponse":{}}"#).is_err());
        assert!(decode(br#"{"other":{}}"#).is_err());
        assert!(decode(
            br#"{"serviceResponse":{"authenticationSuccess":{"user":"a"},"authenticationFailure":{"code":"X"}}}"#
        )
        .is_err());
        assert!(decode(br#"{"serviceResponse":{"authenticationSuccess":{}}}"#).is_err());
        assert!(decode(br#"{"serviceResponse":{"authenticationSuccess":{"user":7}}}"#).is_err());
    }

    #[test]
    fn test_encoding_mismatch() {
        let xml = br#"<cas:serviceResponse xmlns:cas="http://www.yale.edu/tp/cas"/>"#;
        assert!(matches!(decode(xml), Err(DecodeError::Json(_))));
        assert!(decode(b"yes\nalice\n").is_err());
    }

    #[test]
    fn test_roundtrip() {
        let resp = ServiceResponse::Success(AuthenticationSuccess {
            user: "alice".to_string(),
            proxy_granting_ticket: Some("PGTIOU-1".to_string()),
            proxies: Some(Proxies(vec!["https://p1/".into(), "https://p2/".into()])),
            attributes: Some(Attributes {
                authentication_date: Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap()),
                long_term_authentication_request_token_used: true,
                is_from_new_login: false,
                member_of: vec!["staff".into()],
                user_attributes: Some(UserAttributes {
                    attributes: vec![
                        NamedAttribute { name: "mail".into(), value: "a@x".into() },
                        NamedAttribute { name: "mail".into(), value: "b@x".into() },
                    ],
                    extensions: vec![ExtensionAttribute::new("nickname", "Al")],
                }),
                extensions: vec![
                    ExtensionAttribute::new("phone", "1"),
                    ExtensionAttribute::new("phone", "2"),
                    ExtensionAttribute::new("city", "Oslo"),
                ],
            }),
            extensions: vec![ExtensionAttribute::new("tenant", "acme")],
        });
        assert_eq!(decode(encode(&resp).as_bytes()).unwrap(), resp);

        let failure = ServiceResponse::Failure(AuthenticationFailure {
            code: "INVALID_SERVICE".into(),
            message: "service mismatch".into(),
        });
        assert_eq!(decode(encode(&failure).as_bytes()).unwrap(), failure);
    }

    #[test]
    fn test_empty_vs_absent_roundtrip() {
        let resp = ServiceResponse::Success(AuthenticationSuccess {
            user: "bob".to_string(),
            proxies: Some(Proxies::default()),
            ..Default::default()
        });
        assert_eq!(decode(encode(&resp).as_bytes()).unwrap(), resp);
    }

    mod properties {
        use super::*;
        use crate::response::types::strategies::arb_service_response;
        use proptest::prelude::*;

        /// Extensions ordered by first appearance of their name, the order
        /// JSON grouping produces.
        fn grouped(extensions: &mut Vec<ExtensionAttribute>) {
            let mut names: Vec<String> = Vec::new();
            for extension in extensions.iter() {
                if !names.contains(&extension.name) {
                    names.push(extension.name.clone());
                }
            }
            let mut ordered = Vec::with_capacity(extensions.len());
            for name in &names {
                ordered.extend(extensions.iter().filter(|e| &e.name == name).cloned());
            }
            *extensions = ordered;
        }

        fn normalized(mut resp: ServiceResponse) -> ServiceResponse {
            if let ServiceResponse::Success(ref mut success) = resp {
                grouped(&mut success.extensions);
                if let Some(ref mut attributes) = success.attributes {
                    grouped(&mut attributes.extensions);
                    if let Some(ref mut user_attributes) = attributes.user_attributes {
                        grouped(&mut user_attributes.extensions);
                    }
                }
            }
            resp
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(128))]

            #[test]
            fn prop_decode_inverts_encode(resp in arb_service_response()) {
                let encoded = encode(&resp);
                prop_assert_eq!(decode(encoded.as_bytes()).unwrap(), normalized(resp));
            }

            #[test]
            fn prop_decode_is_idempotent(resp in arb_service_response()) {
                let encoded = encode(&resp);
                let first = decode(encoded.as_bytes()).unwrap();
                let second = decode(encoded.as_bytes()).unwrap();
                prop_assert_eq!(encode(&first), encoded);
                prop_assert_eq!(first, second);
            }
        }
    }
}
