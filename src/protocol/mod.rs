//! CAS protocol vocabulary: versions, endpoint paths and URL composition.

pub mod uri;
pub mod version;

pub use uri::{login_url, validation_url, LoginMethod, ValidationRequest};
pub use version::{
    ProtocolVersion, ResponseFormat, LOGIN_PATH, V2_SERVICE_VALIDATE_PATH,
    V3_SERVICE_VALIDATE_PATH, VALIDATE_PATH,
};
