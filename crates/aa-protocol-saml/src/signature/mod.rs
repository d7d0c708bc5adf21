//! XML Signature support for SAML.
//!
//! Assertions and responses are signed with an enveloped XML-DSig signature.
//! Signing is a pure transform: the unsigned serialization goes in and a new
//! serialization carrying `<ds:Signature>` comes out.
//!
//! # Signing Algorithms
//!
//! - RSA-SHA256 (default)
//! - RSA-SHA384
//! - RSA-SHA512
//!
//! RSA-SHA1 is recognised in configuration but refused at signing time.

mod signer;

pub use signer::*;

use crate::error::{SamlError, SamlResult};
use crate::metadata::EntityConfig;
use crate::types::{canonicalization_algorithms, digest_algorithms, signature_algorithms};

/// Signature algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureAlgorithm {
    /// RSA with SHA-256 (recommended).
    #[default]
    RsaSha256,
    /// RSA with SHA-384.
    RsaSha384,
    /// RSA with SHA-512.
    RsaSha512,
    /// Legacy RSA with SHA-1 (not recommended).
    RsaSha1,
}

impl SignatureAlgorithm {
    /// Returns the URI for this signature algorithm.
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::RsaSha256 => signature_algorithms::RSA_SHA256,
            Self::RsaSha384 => signature_algorithms::RSA_SHA384,
            Self::RsaSha512 => signature_algorithms::RSA_SHA512,
            Self::RsaSha1 => signature_algorithms::RSA_SHA1,
        }
    }

    /// Returns the corresponding digest algorithm URI.
    #[must_use]
    pub const fn digest_uri(&self) -> &'static str {
        match self {
            Self::RsaSha256 => digest_algorithms::SHA256,
            Self::RsaSha384 => digest_algorithms::SHA384,
            Self::RsaSha512 => digest_algorithms::SHA512,
            Self::RsaSha1 => digest_algorithms::SHA1,
        }
    }

    /// Parses a signature algorithm from its URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            signature_algorithms::RSA_SHA256 => Some(Self::RsaSha256),
            signature_algorithms::RSA_SHA384 => Some(Self::RsaSha384),
            signature_algorithms::RSA_SHA512 => Some(Self::RsaSha512),
            signature_algorithms::RSA_SHA1 => Some(Self::RsaSha1),
            _ => None,
        }
    }

    /// Returns true if this algorithm uses a deprecated hash (SHA-1).
    #[must_use]
    pub const fn is_deprecated(&self) -> bool {
        matches!(self, Self::RsaSha1)
    }
}

/// Canonicalization algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CanonicalizationAlgorithm {
    /// Exclusive C14N without comments.
    #[default]
    ExclusiveC14N,
    /// Exclusive C14N with comments.
    ExclusiveC14NWithComments,
}

impl CanonicalizationAlgorithm {
    /// Returns the URI for this canonicalization algorithm.
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::ExclusiveC14N => canonicalization_algorithms::EXCLUSIVE_C14N,
            Self::ExclusiveC14NWithComments => {
                canonicalization_algorithms::EXCLUSIVE_C14N_WITH_COMMENTS
            }
        }
    }

    /// Parses a canonicalization algorithm from its URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            canonicalization_algorithms::EXCLUSIVE_C14N => Some(Self::ExclusiveC14N),
            canonicalization_algorithms::EXCLUSIVE_C14N_WITH_COMMENTS => {
                Some(Self::ExclusiveC14NWithComments)
            }
            _ => None,
        }
    }
}

/// Key material and algorithm used to sign one response.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningCredentials {
    /// RSA private key in DER format (PKCS#1 or PKCS#8).
    pub private_key_der: Vec<u8>,
    /// X.509 certificate in DER format, published in `KeyInfo`.
    pub certificate_der: Option<Vec<u8>>,
    /// The signature algorithm.
    pub algorithm: SignatureAlgorithm,
}

impl std::fmt::Debug for SigningCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningCredentials")
            .field("private_key_der", &"<redacted>")
            .field("certificate_der", &self.certificate_der.as_ref().map(Vec::len))
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

impl SigningCredentials {
    /// Selects the credentials for a response from `idp` to `sp`.
    ///
    /// The SP's metadata wins: a key or algorithm declared there overrides the
    /// IdP's own. The certificate follows the key it belongs to. Without any
    /// algorithm configured, RSA-SHA256 is used.
    pub fn resolve(idp: &EntityConfig, sp: &EntityConfig) -> SamlResult<Self> {
        let (private_key_der, certificate_der) = match (&sp.signing_key, &idp.signing_key) {
            (Some(key), _) => (key.clone(), sp.signing_cert.clone()),
            (None, Some(key)) => (key.clone(), idp.signing_cert.clone()),
            (None, None) => {
                return Err(SamlError::SignatureCreation(format!(
                    "no signing key configured for {}",
                    idp.entity_id
                )));
            }
        };

        let algorithm = sp
            .signing_algorithm
            .or(idp.signing_algorithm)
            .unwrap_or_default();

        Ok(Self {
            private_key_der,
            certificate_der,
            algorithm,
        })
    }
}

/// Signs serialized SAML elements.
pub trait SigningService: Send + Sync {
    /// Signs the element whose `ID` is `reference_id`.
    ///
    /// Returns the XML with an enveloped `<ds:Signature>` inserted into that
    /// element.
    fn sign(
        &self,
        xml: &str,
        reference_id: &str,
        credentials: &SigningCredentials,
        canonicalization: CanonicalizationAlgorithm,
    ) -> SamlResult<String>;
}
