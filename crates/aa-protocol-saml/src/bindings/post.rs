//! HTTP-POST Binding implementation.
//!
//! Queries arrive as a base64 `SAMLRequest` form field. Responses leave as
//! an HTML form that posts `SAMLResponse` to the SP on page load.

use base64::Engine;

use crate::error::{SamlError, SamlResult};
use crate::types::SamlBinding;

use super::{ReceivedMessage, SamlParams, MAX_ENCODED_MESSAGE_LEN};

/// HTTP-POST binding encoder/decoder.
pub struct HttpPostBinding;

impl HttpPostBinding {
    /// Encodes a SAML response for HTTP-POST binding.
    ///
    /// Returns an HTML form that will auto-submit to the destination.
    #[must_use]
    pub fn encode_response(xml: &str, destination: &str, relay_state: Option<&str>) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(xml);

        let relay_state_input = relay_state
            .map(|rs| {
                format!(
                    r#"<input type="hidden" name="RelayState" value="{}"/>"#,
                    html_escape(rs)
                )
            })
            .unwrap_or_default();

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>SAML POST Binding</title>
</head>
<body onload="document.forms[0].submit()">
    <noscript>
        <p>JavaScript is disabled. Click the button below to continue.</p>
    </noscript>
    <form method="post" action="{}">
        <input type="hidden" name="SAMLResponse" value="{}"/>
        {}
        <noscript>
            <input type="submit" value="Continue"/>
        </noscript>
    </form>
</body>
</html>"#,
            html_escape(destination),
            encoded,
            relay_state_input
        )
    }

    /// Decodes a SAML message from HTTP-POST form data.
    pub fn decode(params: &SamlParams) -> SamlResult<ReceivedMessage> {
        let encoded = params
            .saml_request
            .as_deref()
            .ok_or_else(|| SamlError::InvalidRequest("no SAMLRequest parameter".to_string()))?;

        if encoded.len() > MAX_ENCODED_MESSAGE_LEN {
            return Err(SamlError::MessageTooLarge(format!(
                "SAMLRequest is {} bytes, limit is {MAX_ENCODED_MESSAGE_LEN}",
                encoded.len()
            )));
        }

        // Form encoders may wrap long base64 values.
        let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        let decoded = base64::engine::general_purpose::STANDARD.decode(compact)?;

        let xml = String::from_utf8(decoded)
            .map_err(|e| SamlError::InvalidRequest(format!("invalid UTF-8 in message: {e}")))?;

        Ok(ReceivedMessage {
            xml,
            binding: SamlBinding::HttpPost,
            relay_state: params.relay_state.clone(),
            signature: None,
            sig_alg: None,
        })
    }
}

/// Escapes HTML special characters.
pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
