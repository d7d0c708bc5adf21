//! SOAP Binding implementation.
//!
//! The back channel carries the protocol message as the single child of a
//! SOAP 1.1 `Body`. Replies are written directly as the HTTP response body.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{SamlError, SamlResult};
use crate::types::xml::{local_name, xml_escape};
use crate::types::{SamlBinding, SOAP_ENV_NS};

use super::{ReceivedMessage, MAX_ENCODED_MESSAGE_LEN};

/// SOAP 1.1 fault codes used by the authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoapFaultCode {
    /// The request was at fault.
    Client,
    /// The server could not process a valid request.
    Server,
}

impl SoapFaultCode {
    /// Returns the qualified fault code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "SOAP-ENV:Client",
            Self::Server => "SOAP-ENV:Server",
        }
    }
}

/// SOAP binding encoder/decoder.
pub struct SoapBinding;

impl SoapBinding {
    /// Extracts the protocol message from a SOAP envelope.
    pub fn decode(body: &str) -> SamlResult<ReceivedMessage> {
        if body.len() > MAX_ENCODED_MESSAGE_LEN {
            return Err(SamlError::MessageTooLarge(format!(
                "SOAP body is {} bytes, limit is {MAX_ENCODED_MESSAGE_LEN}",
                body.len()
            )));
        }

        let (start, end) = find_body_child(body)?;
        Ok(ReceivedMessage {
            xml: body[start..end].to_string(),
            binding: SamlBinding::Soap,
            relay_state: None,
            signature: None,
            sig_alg: None,
        })
    }

    /// Wraps a protocol message in a SOAP envelope.
    #[must_use]
    pub fn encode(xml: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><SOAP-ENV:Envelope xmlns:SOAP-ENV="{SOAP_ENV_NS}"><SOAP-ENV:Body>{xml}</SOAP-ENV:Body></SOAP-ENV:Envelope>"#
        )
    }

    /// Builds a SOAP fault envelope.
    #[must_use]
    pub fn fault(code: SoapFaultCode, message: &str) -> String {
        Self::encode(&format!(
            "<SOAP-ENV:Fault><faultcode>{}</faultcode><faultstring>{}</faultstring></SOAP-ENV:Fault>",
            code.as_str(),
            xml_escape(message)
        ))
    }
}

/// Returns the byte range of the first element inside `Envelope/Body`.
fn find_body_child(xml: &str) -> SamlResult<(usize, usize)> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut depth = 0usize;
    let mut in_body = false;
    let mut child_start: Option<usize> = None;

    loop {
        let before = reader.buffer_position() as usize;
        match reader.read_event()? {
            Event::Start(e) => {
                depth += 1;
                let name = local_name(&e);
                match depth {
                    1 => expect_element(&name, "Envelope")?,
                    2 => {
                        in_body = name == "Body";
                        if !in_body {
                            expect_element(&name, "Header")?;
                        }
                    }
                    3 if in_body && child_start.is_none() => child_start = Some(before),
                    _ => {}
                }
            }
            Event::Empty(e) => {
                let name = local_name(&e);
                match depth {
                    0 => expect_element(&name, "Envelope")?,
                    1 if name != "Body" => expect_element(&name, "Header")?,
                    2 if in_body => {
                        return Ok(trimmed(xml, before, reader.buffer_position() as usize));
                    }
                    _ => {}
                }
            }
            Event::End(_) => {
                if depth == 3 && in_body {
                    if let Some(start) = child_start {
                        return Ok(trimmed(xml, start, reader.buffer_position() as usize));
                    }
                }
                if depth == 2 {
                    in_body = false;
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Err(SamlError::MissingElement("SOAP Body content".to_string()))
}

fn expect_element(found: &str, expected: &str) -> SamlResult<()> {
    if found == expected {
        Ok(())
    } else {
        Err(SamlError::InvalidRequest(format!(
            "expected SOAP {expected}, found {found}"
        )))
    }
}

/// Narrows `[start, end)` to exclude surrounding whitespace.
fn trimmed(xml: &str, start: usize, end: usize) -> (usize, usize) {
    let slice = &xml[start..end];
    let lead = slice.len() - slice.trim_start().len();
    let trail = slice.len() - slice.trim_end().len();
    (start + lead, end - trail)
}
