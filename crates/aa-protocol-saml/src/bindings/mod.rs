//! SAML bindings implementation.
//!
//! This module implements the transports an attribute query can arrive on:
//!
//! - **HTTP-Redirect Binding** - query string, base64, optionally deflated
//! - **HTTP-POST Binding** - base64 form field; responses go out as an
//!   auto-submitting HTML form
//! - **SOAP Binding** - the message travels in a SOAP 1.1 envelope and the
//!   response is the HTTP body
//!
//! [`BindingDispatcher`] selects the codec from the endpoint a request
//! arrived on, never from the message content.

mod post;
mod redirect;
mod soap;

pub use post::*;
pub use redirect::*;
pub use soap::*;

use serde::Deserialize;
use tracing::warn;

use post::html_escape;

use crate::error::{ErrorKind, SamlError, SamlResult};
use crate::types::{SamlBinding, SignedResponse};

/// Largest accepted base64 message, in bytes.
pub const MAX_ENCODED_MESSAGE_LEN: usize = 128 * 1024;

/// Largest accepted message after inflation, in bytes.
pub const MAX_INFLATED_MESSAGE_LEN: usize = 64 * 1024;

/// Content type of front-channel responses.
pub const CONTENT_TYPE_HTML: &str = "text/html; charset=utf-8";

/// Content type of back-channel responses.
pub const CONTENT_TYPE_XML: &str = "text/xml; charset=utf-8";

/// SAML parameters of a front-channel request (query string or form body).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SamlParams {
    /// The encoded protocol message.
    #[serde(rename = "SAMLRequest")]
    pub saml_request: Option<String>,
    /// Opaque state to echo back.
    #[serde(rename = "RelayState")]
    pub relay_state: Option<String>,
    /// Detached signature (redirect binding).
    #[serde(rename = "Signature")]
    pub signature: Option<String>,
    /// Detached signature algorithm (redirect binding).
    #[serde(rename = "SigAlg")]
    pub sig_alg: Option<String>,
}

/// A request as seen by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundRequest {
    /// Parameters from the query string (HTTP-Redirect).
    Query(SamlParams),
    /// Parameters from a urlencoded form body (HTTP-POST).
    Form(SamlParams),
    /// A raw SOAP envelope.
    SoapBody(String),
}

/// A protocol message lifted off its transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    /// The protocol message XML.
    pub xml: String,
    /// The binding the message arrived on.
    pub binding: SamlBinding,
    /// RelayState, front-channel only.
    pub relay_state: Option<String>,
    /// Detached signature, redirect binding only. Not verified.
    pub signature: Option<String>,
    /// Detached signature algorithm, redirect binding only.
    pub sig_alg: Option<String>,
}

/// An HTTP response ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// HTTP status code.
    pub status: u16,
    /// Content type header value.
    pub content_type: &'static str,
    /// Response body.
    pub body: String,
}

/// Transport selection for an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingDispatcher {
    /// Browser-mediated: redirect or POST in, auto-submitting form out.
    FrontChannel,
    /// Direct: SOAP envelope in, SOAP envelope out.
    BackChannel,
}

impl BindingDispatcher {
    /// Lifts the protocol message off the transport.
    pub fn receive(&self, request: &InboundRequest) -> SamlResult<ReceivedMessage> {
        match (self, request) {
            (Self::FrontChannel, InboundRequest::Query(params)) => {
                HttpRedirectBinding::decode(params)
            }
            (Self::FrontChannel, InboundRequest::Form(params)) => HttpPostBinding::decode(params),
            (Self::BackChannel, InboundRequest::SoapBody(body)) => SoapBinding::decode(body),
            (Self::FrontChannel, InboundRequest::SoapBody(_)) => Err(SamlError::InvalidRequest(
                "SOAP message received on front-channel endpoint".to_string(),
            )),
            (Self::BackChannel, _) => Err(SamlError::InvalidRequest(
                "front-channel message received on SOAP endpoint".to_string(),
            )),
        }
    }

    /// Renders the signed response for delivery.
    pub fn send(&self, response: &SignedResponse) -> SamlResult<OutboundMessage> {
        match self {
            Self::FrontChannel => {
                let destination = &response.response.destination;
                if !(destination.starts_with("https://") || destination.starts_with("http://")) {
                    return Err(SamlError::Transport(format!(
                        "cannot deliver to non-HTTP destination '{destination}'"
                    )));
                }
                Ok(OutboundMessage {
                    status: 200,
                    content_type: CONTENT_TYPE_HTML,
                    body: HttpPostBinding::encode_response(
                        &response.xml,
                        destination,
                        response.response.relay_state.as_deref(),
                    ),
                })
            }
            Self::BackChannel => Ok(OutboundMessage {
                status: 200,
                content_type: CONTENT_TYPE_XML,
                body: SoapBinding::encode(&response.xml),
            }),
        }
    }

    /// Renders a failure for the caller. Never includes attribute data.
    #[must_use]
    pub fn error(&self, err: &SamlError) -> OutboundMessage {
        warn!(error = %err, kind = ?err.kind(), "Rejecting attribute query");
        let message = err.public_message();
        match self {
            Self::FrontChannel => OutboundMessage {
                status: err.http_status(),
                content_type: CONTENT_TYPE_HTML,
                body: error_page(&message),
            },
            Self::BackChannel => {
                let code = match err.kind() {
                    ErrorKind::BadRequest | ErrorKind::NotFound => SoapFaultCode::Client,
                    ErrorKind::SigningFailure | ErrorKind::TransportFailure => SoapFaultCode::Server,
                };
                OutboundMessage {
                    status: err.http_status(),
                    content_type: CONTENT_TYPE_XML,
                    body: SoapBinding::fault(code, &message),
                }
            }
        }
    }

    /// The binding a request arrives on.
    #[must_use]
    pub const fn binding_of(request: &InboundRequest) -> SamlBinding {
        match request {
            InboundRequest::Query(_) => SamlBinding::HttpRedirect,
            InboundRequest::Form(_) => SamlBinding::HttpPost,
            InboundRequest::SoapBody(_) => SamlBinding::Soap,
        }
    }
}

/// Minimal HTML page for front-channel errors.
fn error_page(message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>SAML Error</title>
</head>
<body>
    <h1>SAML Error</h1>
    <p>{}</p>
</body>
</html>"#,
        html_escape(message)
    )
}
