//! CAS 1.0 plain-text validation response.
//!
//! A valid ticket yields `yes\n<user>\n`, anything else means the ticket was
//! rejected. The format has no escaping, so a username containing a newline
//! cannot be represented.

use crate::error::DecodeError;

const YES: &[u8] = b"yes\n";

/// Outcome of a CAS 1.0 validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextResponse {
    Yes(String),
    No,
}

impl TextResponse {
    pub fn is_valid(&self) -> bool {
        matches!(self, TextResponse::Yes(_))
    }

    pub fn user(&self) -> &str {
        match self {
            TextResponse::Yes(user) => user,
            TextResponse::No => "",
        }
    }
}

/// Decode a CAS 1.0 response body.
pub fn decode(body: &[u8]) -> Result<TextResponse, DecodeError> {
    let Some(rest) = body.strip_prefix(YES) else {
        return Ok(TextResponse::No);
    };

    // A conformant server always terminates a non-empty username line
    match rest.iter().position(|&b| b == b'\n') {
        Some(end) if end > 0 => {
            let user = std::str::from_utf8(&rest[..end])?;
            Ok(TextResponse::Yes(user.to_string()))
        }
        _ => Err(DecodeError::MalformedText),
    }
}
