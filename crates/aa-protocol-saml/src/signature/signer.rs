//! XML Signature creation.
//!
//! Produces enveloped RSA signatures with aws-lc-rs. Canonicalization is the
//! simplified whitespace normalization applied to the compact XML that this
//! crate writes.

use aws_lc_rs::digest;
use aws_lc_rs::rand::SystemRandom;
use aws_lc_rs::signature::{self as aws_signature, RsaKeyPair};
use base64::Engine;

use crate::error::{SamlError, SamlResult};
use crate::types::{canonicalization_algorithms, XMLDSIG_NS};

use super::{CanonicalizationAlgorithm, SignatureAlgorithm, SigningCredentials, SigningService};

/// XML document signer.
///
/// The reference digest is computed over the element with every whitespace
/// run collapsed to a single space, not over true exclusive c14n output.
/// Documents whose character data contains leading, trailing or repeated
/// whitespace are still signed, but a conforming verifier will reject the
/// digest. Attribute values with such whitespace need a real c14n
/// implementation before they can be released signed.
#[derive(Debug, Clone, Copy)]
pub struct XmlSigner {
    /// Whether to publish the certificate in `<ds:KeyInfo>`.
    include_certificate: bool,
}

impl Default for XmlSigner {
    fn default() -> Self {
        Self {
            include_certificate: true,
        }
    }
}

impl XmlSigner {
    /// Creates a signer that publishes the certificate when one is configured.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Omits `<ds:KeyInfo>` from produced signatures.
    #[must_use]
    pub const fn without_certificate(mut self) -> Self {
        self.include_certificate = false;
        self
    }
}

impl SigningService for XmlSigner {
    fn sign(
        &self,
        xml: &str,
        reference_id: &str,
        credentials: &SigningCredentials,
        canonicalization: CanonicalizationAlgorithm,
    ) -> SamlResult<String> {
        if canonicalization != CanonicalizationAlgorithm::ExclusiveC14N {
            return Err(SamlError::SignatureCreation(format!(
                "unsupported canonicalization: {}",
                canonicalization.uri()
            )));
        }

        let (element_start, insert_position) = find_element_and_insert_position(xml, reference_id)?;

        let canonical_element = canonicalize_element(xml, element_start)?;
        let digest = calculate_digest(&canonical_element, credentials.algorithm)?;
        let digest_b64 = base64::engine::general_purpose::STANDARD.encode(digest);

        let signed_info = build_signed_info(
            reference_id,
            &digest_b64,
            credentials.algorithm,
            canonicalization,
        );
        let canonical_signed_info = normalize_xml_whitespace(&signed_info);

        let signature_value = sign_data(credentials, canonical_signed_info.as_bytes())?;
        let signature_b64 = base64::engine::general_purpose::STANDARD.encode(signature_value);

        let certificate = if self.include_certificate {
            credentials.certificate_der.as_deref()
        } else {
            None
        };
        let signature_element = build_signature_element(&signed_info, &signature_b64, certificate);

        Ok(insert_signature(xml, insert_position, &signature_element))
    }
}

impl SigningCredentials {
    /// Creates credentials from a PEM private key and optional PEM certificate.
    pub fn from_pem(
        private_key_pem: &str,
        certificate_pem: Option<&str>,
        algorithm: SignatureAlgorithm,
    ) -> SamlResult<Self> {
        let private_key_der = pem_to_der(private_key_pem, "PRIVATE KEY")
            .or_else(|| pem_to_der(private_key_pem, "RSA PRIVATE KEY"))
            .ok_or_else(|| SamlError::SignatureCreation("invalid private key PEM".to_string()))?;

        let certificate_der = match certificate_pem {
            Some(pem) => Some(pem_to_der(pem, "CERTIFICATE").ok_or_else(|| {
                SamlError::SignatureCreation("invalid certificate PEM".to_string())
            })?),
            None => None,
        };

        Ok(Self {
            private_key_der,
            certificate_der,
            algorithm,
        })
    }
}

/// Extracts DER data from a PEM string with the given label.
#[must_use]
pub fn pem_to_der(pem: &str, label: &str) -> Option<Vec<u8>> {
    let begin = format!("-----BEGIN {label}-----");
    let end = format!("-----END {label}-----");

    let start = pem.find(&begin)? + begin.len();
    let end_pos = pem.find(&end)?;
    if end_pos < start {
        return None;
    }

    let b64_data: String = pem[start..end_pos]
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    base64::engine::general_purpose::STANDARD.decode(b64_data).ok()
}

/// Signs raw data with the credentials' RSA key.
fn sign_data(credentials: &SigningCredentials, data: &[u8]) -> SamlResult<Vec<u8>> {
    let padding = match credentials.algorithm {
        SignatureAlgorithm::RsaSha256 => &aws_signature::RSA_PKCS1_SHA256,
        SignatureAlgorithm::RsaSha384 => &aws_signature::RSA_PKCS1_SHA384,
        SignatureAlgorithm::RsaSha512 => &aws_signature::RSA_PKCS1_SHA512,
        SignatureAlgorithm::RsaSha1 => {
            return Err(SamlError::SignatureCreation(
                "RSA-SHA1 signing is not supported".to_string(),
            ));
        }
    };

    let key_pair = RsaKeyPair::from_der(&credentials.private_key_der)
        .or_else(|_| RsaKeyPair::from_pkcs8(&credentials.private_key_der))
        .map_err(|e| SamlError::SignatureCreation(format!("invalid RSA key: {e}")))?;

    let rng = SystemRandom::new();
    let mut signature = vec![0u8; key_pair.public_modulus_len()];
    key_pair
        .sign(padding, &rng, data, &mut signature)
        .map_err(|e| SamlError::SignatureCreation(format!("RSA signing failed: {e}")))?;

    Ok(signature)
}

/// Finds the element to sign and determines where to insert the signature.
fn find_element_and_insert_position(xml: &str, reference_id: &str) -> SamlResult<(usize, usize)> {
    let id_pattern = format!(" ID=\"{reference_id}\"");

    let id_pos = xml.find(&id_pattern).ok_or_else(|| {
        SamlError::SignatureCreation(format!("element with ID '{reference_id}' not found"))
    })?;

    let tag_start = xml[..id_pos]
        .rfind('<')
        .ok_or_else(|| SamlError::SignatureCreation("malformed XML element".to_string()))?;

    let tag_end = xml[id_pos..]
        .find('>')
        .map(|pos| id_pos + pos + 1)
        .ok_or_else(|| SamlError::SignatureCreation("malformed XML element".to_string()))?;

    // The signature goes right after the element's Issuer.
    let insert_pos = find_issuer_end(xml, tag_end).unwrap_or(tag_end);

    Ok((tag_start, insert_pos))
}

/// Finds the end of the Issuer element directly following `after`.
fn find_issuer_end(xml: &str, after: usize) -> Option<usize> {
    let rest = &xml[after..];
    for (open, close) in [
        ("<saml:Issuer", "</saml:Issuer>"),
        ("<saml2:Issuer", "</saml2:Issuer>"),
        ("<Issuer", "</Issuer>"),
    ] {
        if rest.starts_with(open) {
            return rest.find(close).map(|pos| after + pos + close.len());
        }
    }
    None
}

/// Canonicalizes the element starting at `start`.
fn canonicalize_element(xml: &str, start: usize) -> SamlResult<String> {
    let element = extract_element(xml, start)?;
    Ok(normalize_xml_whitespace(element))
}

/// Extracts the complete XML element starting at `start`.
fn extract_element(xml: &str, start: usize) -> SamlResult<&str> {
    let tag_name_end = xml[start + 1..]
        .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .map(|pos| start + 1 + pos)
        .ok_or_else(|| SamlError::SignatureCreation("malformed XML element".to_string()))?;
    let tag_name = &xml[start + 1..tag_name_end];

    let close_pattern = format!("</{tag_name}>");
    let close_pos = xml[start..].rfind(&close_pattern).ok_or_else(|| {
        SamlError::SignatureCreation(format!("unclosed XML element '{tag_name}'"))
    })?;

    Ok(&xml[start..start + close_pos + close_pattern.len()])
}

/// Normalizes XML whitespace (simplified canonicalization).
fn normalize_xml_whitespace(xml: &str) -> String {
    xml.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Calculates the digest of data using the algorithm's hash.
fn calculate_digest(data: &str, algorithm: SignatureAlgorithm) -> SamlResult<Vec<u8>> {
    let alg = match algorithm {
        SignatureAlgorithm::RsaSha256 => &digest::SHA256,
        SignatureAlgorithm::RsaSha384 => &digest::SHA384,
        SignatureAlgorithm::RsaSha512 => &digest::SHA512,
        SignatureAlgorithm::RsaSha1 => {
            return Err(SamlError::SignatureCreation(
                "SHA-1 digests are not supported".to_string(),
            ));
        }
    };
    Ok(digest::digest(alg, data.as_bytes()).as_ref().to_vec())
}

/// Builds the SignedInfo element.
fn build_signed_info(
    reference_id: &str,
    digest_b64: &str,
    algorithm: SignatureAlgorithm,
    canonicalization: CanonicalizationAlgorithm,
) -> String {
    format!(
        r##"<ds:SignedInfo xmlns:ds="{XMLDSIG_NS}"><ds:CanonicalizationMethod Algorithm="{c14n}"/><ds:SignatureMethod Algorithm="{sig}"/><ds:Reference URI="#{reference_id}"><ds:Transforms><ds:Transform Algorithm="{enveloped}"/><ds:Transform Algorithm="{c14n}"/></ds:Transforms><ds:DigestMethod Algorithm="{digest}"/><ds:DigestValue>{digest_b64}</ds:DigestValue></ds:Reference></ds:SignedInfo>"##,
        c14n = canonicalization.uri(),
        sig = algorithm.uri(),
        enveloped = canonicalization_algorithms::ENVELOPED_SIGNATURE,
        digest = algorithm.digest_uri(),
    )
}

/// Builds the complete Signature element.
fn build_signature_element(
    signed_info: &str,
    signature_value: &str,
    certificate_der: Option<&[u8]>,
) -> String {
    let mut signature = format!(
        r#"<ds:Signature xmlns:ds="{XMLDSIG_NS}">{signed_info}<ds:SignatureValue>{signature_value}</ds:SignatureValue>"#
    );

    if let Some(cert) = certificate_der {
        let cert_b64 = base64::engine::general_purpose::STANDARD.encode(cert);
        signature.push_str(&format!(
            "<ds:KeyInfo><ds:X509Data><ds:X509Certificate>{cert_b64}</ds:X509Certificate></ds:X509Data></ds:KeyInfo>"
        ));
    }

    signature.push_str("</ds:Signature>");
    signature
}

/// Inserts the signature into the XML document.
fn insert_signature(xml: &str, position: usize, signature: &str) -> String {
    format!("{}{}{}", &xml[..position], signature, &xml[position..])
}
