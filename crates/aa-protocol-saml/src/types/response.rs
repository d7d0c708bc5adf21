//! SAML Response types.
//!
//! A `Response` wraps the signed assertions issued for one query together
//! with a status. It is built once, signed, serialized and dropped.

use chrono::{DateTime, Utc};

use super::xml::{format_instant, xml_escape};
use super::{SignedAssertion, Status, SAMLP_NS, SAML_NS};

/// SAML Response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Unique identifier for this response.
    pub id: String,

    /// The entity ID of the issuing authority.
    pub issuer: String,

    /// Timestamp when this response was issued.
    pub issue_instant: DateTime<Utc>,

    /// The ID of the query this response answers.
    pub in_response_to: String,

    /// The endpoint the response is delivered to.
    pub destination: String,

    /// The status of the response.
    pub status: Status,

    /// Signed assertions carried by this response.
    pub assertions: Vec<SignedAssertion>,

    /// RelayState to echo on front-channel bindings.
    pub relay_state: Option<String>,
}

impl Response {
    /// Returns true if this response indicates success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Serializes the response as an unsigned `<samlp:Response>` element.
    ///
    /// Assertions are embedded using their signed serialization.
    #[must_use]
    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(2048);
        out.push_str(&format!(
            r#"<samlp:Response xmlns:samlp="{SAMLP_NS}" xmlns:saml="{SAML_NS}" ID="{}" Version="2.0" IssueInstant="{}" Destination="{}" InResponseTo="{}">"#,
            xml_escape(&self.id),
            format_instant(self.issue_instant),
            xml_escape(&self.destination),
            xml_escape(&self.in_response_to),
        ));
        out.push_str(&format!(
            "<saml:Issuer>{}</saml:Issuer>",
            xml_escape(&self.issuer)
        ));
        out.push_str("<samlp:Status>");
        out.push_str(&format!(
            r#"<samlp:StatusCode Value="{}"/>"#,
            xml_escape(&self.status.status_code)
        ));
        if let Some(ref message) = self.status.status_message {
            out.push_str(&format!(
                "<samlp:StatusMessage>{}</samlp:StatusMessage>",
                xml_escape(message)
            ));
        }
        out.push_str("</samlp:Status>");
        for assertion in &self.assertions {
            out.push_str(&assertion.xml);
        }
        out.push_str("</samlp:Response>");
        out
    }
}

/// A response together with its signed XML serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedResponse {
    /// The response content.
    pub response: Response,

    /// Serialized `<samlp:Response>` carrying an enveloped signature.
    pub xml: String,
}
