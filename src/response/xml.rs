//! XML encoding of the CAS service response.
//!
//! Elements are matched by local name, so any namespace prefix is accepted.
//! Text values are kept exactly as received. Unknown children of
//! `authenticationSuccess`, `attributes` and `userAttributes` are kept as
//! [`ExtensionAttribute`]s: their text when they are leaves, their raw inner
//! XML when they nest further elements.

use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::types::{
    Attributes, AuthenticationFailure, AuthenticationSuccess, ExtensionAttribute,
    NamedAttribute, Proxies, ServiceResponse, UserAttributes, CAS_NAMESPACE,
};
use super::{format_date, parse_bool, parse_date};
use crate::error::DecodeError;

/// Minimal element tree built from the event stream.
#[derive(Debug, Default)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    /// Unescaped character data of this element only.
    text: String,
    /// Content between the start and end tags, as written in the document.
    inner: String,
    /// Start tag as written, without the angle brackets.
    tag: String,
    children: Vec<Element>,
}

impl Element {
    fn open(start: &BytesStart<'_>) -> Result<Self, DecodeError> {
        let name = std::str::from_utf8(start.local_name().as_ref())?.to_string();
        let tag = std::str::from_utf8(start)?.to_string();

        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr?;
            let key = std::str::from_utf8(attr.key.local_name().as_ref())?.to_string();
            let value = attr.unescape_value()?.into_owned();
            attributes.push((key, value));
        }

        Ok(Self {
            name,
            attributes,
            tag,
            ..Default::default()
        })
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn into_extension(self) -> ExtensionAttribute {
        let value = if self.children.is_empty() {
            self.text
        } else {
            self.inner
        };
        ExtensionAttribute { name: self.name, value }
    }
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
    raw: &str,
) -> Result<(), DecodeError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.inner.push_str(raw);
            parent.children.push(element);
        }
        None if root.is_some() => return Err(DecodeError::schema("multiple root elements")),
        None => *root = Some(element),
    }
    Ok(())
}

fn parse_document(text: &str) -> Result<Element, DecodeError> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(Element::open(&start)?),
            Event::Empty(start) => {
                let element = Element::open(&start)?;
                let raw = format!("<{}/>", element.tag);
                attach(&mut stack, &mut root, element, &raw)?;
            }
            Event::End(end) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| DecodeError::schema("unbalanced end tag"))?;
                let raw = format!(
                    "<{}>{}</{}>",
                    element.tag,
                    element.inner,
                    std::str::from_utf8(end.name().as_ref())?
                );
                attach(&mut stack, &mut root, element, &raw)?;
            }
            Event::Text(content) => {
                let raw = std::str::from_utf8(&content)?;
                let unescaped = content.unescape()?;
                match stack.last_mut() {
                    Some(top) => {
                        top.inner.push_str(raw);
                        top.text.push_str(&unescaped);
                    }
                    None if unescaped.trim().is_empty() => {}
                    None => return Err(DecodeError::schema("text outside of root element")),
                }
            }
            Event::CData(data) => {
                if let Some(top) = stack.last_mut() {
                    let data = std::str::from_utf8(&data)?;
                    top.inner.push_str(&format!("<![CDATA[{}]]>", data));
                    top.text.push_str(data);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(DecodeError::schema("unclosed element"));
    }
    root.ok_or_else(|| DecodeError::schema("empty document"))
}

/// Decode an XML `serviceResponse` document.
pub fn decode(body: &[u8]) -> Result<ServiceResponse, DecodeError> {
    let root = parse_document(std::str::from_utf8(body)?)?;
    if root.name != "serviceResponse" {
        return Err(DecodeError::schema(format!(
            "expected serviceResponse root, found {}",
            root.name
        )));
    }

    let mut success = None;
    let mut failure = None;
    for child in root.children {
        match child.name.as_str() {
            "authenticationSuccess" if success.is_none() => success = Some(child),
            "authenticationFailure" if failure.is_none() => failure = Some(child),
            "authenticationSuccess" | "authenticationFailure" => {
                return Err(DecodeError::schema(format!("duplicate {}", child.name)));
            }
            _ => {}
        }
    }

    match (success, failure) {
        (Some(success), None) => Ok(ServiceResponse::Success(decode_success(success)?)),
        (None, Some(failure)) => Ok(ServiceResponse::Failure(decode_failure(failure))),
        (Some(_), Some(_)) => Err(DecodeError::schema(
            "both authenticationSuccess and authenticationFailure present",
        )),
        (None, None) => Err(DecodeError::schema(
            "neither authenticationSuccess nor authenticationFailure present",
        )),
    }
}

fn decode_failure(element: Element) -> AuthenticationFailure {
    AuthenticationFailure {
        code: element.attribute("code").unwrap_or_default().to_string(),
        message: element.text().to_string(),
    }
}

fn decode_success(element: Element) -> Result<AuthenticationSuccess, DecodeError> {
    let mut user = None;
    let mut success = AuthenticationSuccess::default();

    for child in element.children {
        match child.name.as_str() {
            "user" => user = Some(child.text().to_string()),
            "proxyGrantingTicket" => {
                success.proxy_granting_ticket = Some(child.text().to_string());
            }
            "proxies" => {
                let mut proxies = Proxies::default();
                for proxy in child.children.iter().filter(|p| p.name == "proxy") {
                    proxies.add_proxy(proxy.text());
                }
                success.proxies = Some(proxies);
            }
            "attributes" => success.attributes = Some(decode_attributes(child)?),
            _ => success.extensions.push(child.into_extension()),
        }
    }

    success.user = user.ok_or_else(|| DecodeError::schema("authenticationSuccess without user"))?;
    Ok(success)
}

fn decode_attributes(element: Element) -> Result<Attributes, DecodeError> {
    let mut attributes = Attributes::default();

    for child in element.children {
        match child.name.as_str() {
            "authenticationDate" => attributes.authentication_date = parse_date(child.text())?,
            "longTermAuthenticationRequestTokenUsed" => {
                attributes.long_term_authentication_request_token_used =
                    parse_bool(&child.name, child.text())?;
            }
            "isFromNewLogin" => {
                attributes.is_from_new_login = parse_bool(&child.name, child.text())?;
            }
            "memberOf" => attributes.member_of.push(child.text().to_string()),
            "userAttributes" => attributes.user_attributes = Some(decode_user_attributes(child)),
            _ => attributes.extensions.push(child.into_extension()),
        }
    }

    Ok(attributes)
}

fn decode_user_attributes(element: Element) -> UserAttributes {
    let mut user_attributes = UserAttributes::default();

    for child in element.children {
        if child.name == "attribute" {
            user_attributes.attributes.push(NamedAttribute {
                name: child.attribute("name").unwrap_or_default().to_string(),
                value: child.text().to_string(),
            });
        } else {
            user_attributes.extensions.push(child.into_extension());
        }
    }

    user_attributes
}

/// Small writer for the fixed `cas:` element vocabulary.
struct XmlWriter {
    out: String,
}

impl XmlWriter {
    fn open(&mut self, name: &str, attributes: &[(&str, &str)]) {
        self.out.push_str("<cas:");
        self.out.push_str(name);
        for (key, value) in attributes {
            self.out.push_str(&format!(" {}=\"{}\"", key, escape(*value)));
        }
        self.out.push('>');
    }

    fn close(&mut self, name: &str) {
        self.out.push_str(&format!("</cas:{}>", name));
    }

    fn leaf(&mut self, name: &str, text: &str) {
        self.open(name, &[]);
        self.out.push_str(&escape(text));
        self.close(name);
    }

    fn extensions(&mut self, extensions: &[ExtensionAttribute]) {
        for extension in extensions {
            self.leaf(&extension.name, &extension.value);
        }
    }
}

/// Encode a response as a CAS server would.
pub fn encode(response: &ServiceResponse) -> String {
    let mut w = XmlWriter { out: String::new() };
    w.open("serviceResponse", &[("xmlns:cas", CAS_NAMESPACE)]);

    match response {
        ServiceResponse::Failure(failure) => {
            w.open("authenticationFailure", &[("code", failure.code.as_str())]);
            w.out.push_str(&escape(failure.message.as_str()));
            w.close("authenticationFailure");
        }
        ServiceResponse::Success(success) => {
            w.open("authenticationSuccess", &[]);
            w.leaf("user", &success.user);
            if let Some(ref pgt) = success.proxy_granting_ticket {
                w.leaf("proxyGrantingTicket", pgt);
            }
            if let Some(ref proxies) = success.proxies {
                w.open("proxies", &[]);
                for proxy in proxies.iter() {
                    w.leaf("proxy", proxy);
                }
                w.close("proxies");
            }
            if let Some(ref attributes) = success.attributes {
                encode_attributes(&mut w, attributes);
            }
            w.extensions(&success.extensions);
            w.close("authenticationSuccess");
        }
    }

    w.close("serviceResponse");
    w.out
}

fn encode_attributes(w: &mut XmlWriter, attributes: &Attributes) {
    w.open("attributes", &[]);
    if let Some(ref date) = attributes.authentication_date {
        w.leaf("authenticationDate", &format_date(date));
    }
    w.leaf(
        "longTermAuthenticationRequestTokenUsed",
        bool_str(attributes.long_term_authentication_request_token_used),
    );
    w.leaf("isFromNewLogin", bool_str(attributes.is_from_new_login));
    for group in &attributes.member_of {
        w.leaf("memberOf", group);
    }
    if let Some(ref user_attributes) = attributes.user_attributes {
        w.open("userAttributes", &[]);
        for attr in &user_attributes.attributes {
            w.open("attribute", &[("name", attr.name.as_str())]);
            w.out.push_str(&escape(attr.value.as_str()));
            w.close("attribute");
        }
        w.extensions(&user_attributes.extensions);
        w.close("userAttributes");
    }
    w.extensions(&attributes.extensions);
    w.close("attributes");
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
