//! HTTP-Redirect Binding implementation.
//!
//! Queries arrive in the `SAMLRequest` query parameter, base64 encoded and
//! normally DEFLATE compressed. Uncompressed payloads are accepted as well.

use base64::Engine;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::io::{Read, Write};
use tracing::debug;

use crate::error::{SamlError, SamlResult};
use crate::types::SamlBinding;

use super::{ReceivedMessage, SamlParams, MAX_ENCODED_MESSAGE_LEN, MAX_INFLATED_MESSAGE_LEN};

/// HTTP-Redirect binding encoder/decoder.
pub struct HttpRedirectBinding;

impl HttpRedirectBinding {
    /// Encodes a SAML request as an HTTP-Redirect URL.
    pub fn encode_request(
        xml: &str,
        destination: &str,
        relay_state: Option<&str>,
    ) -> SamlResult<String> {
        let compressed = deflate_compress(xml.as_bytes())?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(compressed);

        let separator = if destination.contains('?') { '&' } else { '?' };
        let mut url = format!(
            "{destination}{separator}SAMLRequest={}",
            urlencoding::encode(&encoded)
        );

        if let Some(rs) = relay_state {
            url.push_str(&format!("&RelayState={}", urlencoding::encode(rs)));
        }

        Ok(url)
    }

    /// Decodes a SAML message from HTTP-Redirect query parameters.
    ///
    /// The parameters are expected to be URL-decoded already.
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

        let raw = base64::engine::general_purpose::STANDARD.decode(encoded)?;

        let xml_bytes = match deflate_decompress(&raw) {
            Ok(inflated) if looks_like_xml(&inflated) => inflated,
            Err(err @ SamlError::MessageTooLarge(_)) => return Err(err),
            _ if looks_like_xml(&raw) => {
                debug!("SAMLRequest is not deflated, using raw payload");
                raw
            }
            Ok(inflated) => inflated,
            Err(err) => return Err(err),
        };

        let xml = String::from_utf8(xml_bytes)
            .map_err(|e| SamlError::InvalidRequest(format!("invalid UTF-8 in message: {e}")))?;

        Ok(ReceivedMessage {
            xml,
            binding: SamlBinding::HttpRedirect,
            relay_state: params.relay_state.clone(),
            signature: params.signature.clone(),
            sig_alg: params.sig_alg.clone(),
        })
    }
}

/// Returns true if the bytes start like an XML document.
fn looks_like_xml(data: &[u8]) -> bool {
    data.iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|&b| b == b'<')
}

/// Compresses data using DEFLATE (raw, no zlib header).
fn deflate_compress(data: &[u8]) -> SamlResult<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| SamlError::Deflate(format!("compression error: {e}")))?;
    encoder
        .finish()
        .map_err(|e| SamlError::Deflate(format!("compression finish error: {e}")))
}

/// Decompresses DEFLATE data, refusing output above the inflation limit.
fn deflate_decompress(data: &[u8]) -> SamlResult<Vec<u8>> {
    let mut decoder = DeflateDecoder::new(data).take(MAX_INFLATED_MESSAGE_LEN as u64 + 1);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| SamlError::Deflate(format!("decompression error: {e}")))?;

    if decompressed.len() > MAX_INFLATED_MESSAGE_LEN {
        return Err(SamlError::MessageTooLarge(format!(
            "inflated SAMLRequest exceeds {MAX_INFLATED_MESSAGE_LEN} bytes"
        )));
    }
    Ok(decompressed)
}
