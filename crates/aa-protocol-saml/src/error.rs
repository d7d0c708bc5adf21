//! SAML error types.
//!
//! Provides the error type for attribute query processing, and its mapping onto
//! the coarse failure classes surfaced at the HTTP boundary.

use thiserror::Error;

/// Result type for SAML operations.
pub type SamlResult<T> = Result<T, SamlError>;

/// Failure classes visible to callers of the attribute authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or wrong-typed message, missing/empty issuer.
    BadRequest,
    /// Unknown entity in metadata.
    NotFound,
    /// Key material missing/unreadable or algorithm unsupported.
    SigningFailure,
    /// Delivery to the destination failed.
    TransportFailure,
}

/// SAML protocol errors.
#[derive(Debug, Error)]
pub enum SamlError {
    /// Invalid SAML request format or content.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A protocol message other than `AttributeQuery` was received.
    #[error("invalid message received to AttributeQuery endpoint: {0}")]
    UnexpectedMessage(String),

    /// XML parsing error.
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    /// Missing required element or attribute.
    #[error("missing required element: {0}")]
    MissingElement(String),

    /// Base64 decoding error.
    #[error("base64 decode error: {0}")]
    Base64Decode(String),

    /// Deflate decompression error.
    #[error("deflate error: {0}")]
    Deflate(String),

    /// Encoded or inflated message exceeds the accepted size.
    #[error("message too large: {0}")]
    MessageTooLarge(String),

    /// Unknown entity in metadata.
    #[error("unknown entity: {0}")]
    UnknownEntity(String),

    /// XML signature creation failed.
    #[error("signature creation failed: {0}")]
    SignatureCreation(String),

    /// Delivery of the response failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SamlError {
    /// Classifies this error into the boundary taxonomy.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRequest(_)
            | Self::UnexpectedMessage(_)
            | Self::XmlParse(_)
            | Self::MissingElement(_)
            | Self::Base64Decode(_)
            | Self::Deflate(_)
            | Self::MessageTooLarge(_) => ErrorKind::BadRequest,
            Self::UnknownEntity(_) => ErrorKind::NotFound,
            Self::SignatureCreation(_) | Self::Internal(_) => ErrorKind::SigningFailure,
            Self::Transport(_) => ErrorKind::TransportFailure,
        }
    }

    /// Returns the HTTP status code for this error.
    ///
    /// Unknown entities are reported as 400 like any other validation failure.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self.kind() {
            ErrorKind::BadRequest | ErrorKind::NotFound => 400,
            ErrorKind::SigningFailure => 500,
            ErrorKind::TransportFailure => 502,
        }
    }

    /// Returns the SAML top-level status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> &'static str {
        match self.kind() {
            ErrorKind::BadRequest | ErrorKind::NotFound => {
                "urn:oasis:names:tc:SAML:2.0:status:Requester"
            }
            ErrorKind::SigningFailure | ErrorKind::TransportFailure => {
                "urn:oasis:names:tc:SAML:2.0:status:Responder"
            }
        }
    }

    /// Returns a reason that can be shown to the requester.
    ///
    /// Metadata misses share one message with other validation failures so the
    /// response does not reveal which entities are registered.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::NotFound => "invalid request: unable to validate AttributeQuery".to_string(),
            ErrorKind::BadRequest | ErrorKind::TransportFailure => self.to_string(),
            ErrorKind::SigningFailure => "unable to issue a signed response".to_string(),
        }
    }
}

impl From<quick_xml::Error> for SamlError {
    fn from(err: quick_xml::Error) -> Self {
        Self::XmlParse(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for SamlError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Self::XmlParse(err.to_string())
    }
}

impl From<base64::DecodeError> for SamlError {
    fn from(err: base64::DecodeError) -> Self {
        Self::Base64Decode(err.to_string())
    }
}
