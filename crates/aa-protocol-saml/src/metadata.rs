//! Entity metadata lookup.
//!
//! Resolves entity IDs to the configuration the authority needs: the SP's
//! attribute endpoint and the signing material for the IdP, with optional
//! per-SP signing overrides.

use std::collections::HashMap;

use crate::error::{SamlError, SamlResult};
use crate::signature::SignatureAlgorithm;

/// The role an entity plays in an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRole {
    /// The attribute authority itself.
    HostedIdp,
    /// A service provider sending queries.
    RemoteSp,
}

/// Configuration of one SAML entity.
#[derive(Clone, PartialEq, Eq)]
pub struct EntityConfig {
    /// The entity ID.
    pub entity_id: String,
    /// Endpoint responses are delivered to (the SP's attribute endpoint).
    pub endpoint: Option<String>,
    /// RSA private key in DER format.
    pub signing_key: Option<Vec<u8>>,
    /// X.509 certificate in DER format.
    pub signing_cert: Option<Vec<u8>>,
    /// Signature algorithm.
    pub signing_algorithm: Option<SignatureAlgorithm>,
}

impl std::fmt::Debug for EntityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityConfig")
            .field("entity_id", &self.entity_id)
            .field("endpoint", &self.endpoint)
            .field("signing_key", &self.signing_key.as_ref().map(|_| "<redacted>"))
            .field("signing_cert", &self.signing_cert.as_ref().map(Vec::len))
            .field("signing_algorithm", &self.signing_algorithm)
            .finish()
    }
}

impl EntityConfig {
    /// Creates an entity with only an ID.
    #[must_use]
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            endpoint: None,
            signing_key: None,
            signing_cert: None,
            signing_algorithm: None,
        }
    }

    /// Sets the endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the signing key and certificate.
    #[must_use]
    pub fn with_signing_key(mut self, key_der: Vec<u8>, cert_der: Option<Vec<u8>>) -> Self {
        self.signing_key = Some(key_der);
        self.signing_cert = cert_der;
        self
    }

    /// Sets the signature algorithm.
    #[must_use]
    pub const fn with_signing_algorithm(mut self, algorithm: SignatureAlgorithm) -> Self {
        self.signing_algorithm = Some(algorithm);
        self
    }
}

/// Source of entity configuration.
///
/// Implementations must be safe to share between concurrent requests.
pub trait MetadataProvider: Send + Sync {
    /// Returns the entity ID this deployment uses for `role`.
    fn current_entity_id(&self, role: EntityRole) -> SamlResult<String>;

    /// Returns the configuration of `entity_id` in `role`.
    ///
    /// Fails with [`SamlError::UnknownEntity`] if the entity is not known.
    fn entity_config(&self, entity_id: &str, role: EntityRole) -> SamlResult<EntityConfig>;
}

/// Metadata held in memory, fixed at construction.
#[derive(Debug, Clone)]
pub struct InMemoryMetadataProvider {
    idp: EntityConfig,
    service_providers: HashMap<String, EntityConfig>,
}

impl InMemoryMetadataProvider {
    /// Creates a provider hosting `idp`.
    #[must_use]
    pub fn new(idp: EntityConfig) -> Self {
        Self {
            idp,
            service_providers: HashMap::new(),
        }
    }

    /// Registers a service provider.
    #[must_use]
    pub fn with_service_provider(mut self, sp: EntityConfig) -> Self {
        self.service_providers.insert(sp.entity_id.clone(), sp);
        self
    }

    /// Returns the number of registered service providers.
    #[must_use]
    pub fn service_provider_count(&self) -> usize {
        self.service_providers.len()
    }
}

impl MetadataProvider for InMemoryMetadataProvider {
    fn current_entity_id(&self, role: EntityRole) -> SamlResult<String> {
        match role {
            EntityRole::HostedIdp => Ok(self.idp.entity_id.clone()),
            EntityRole::RemoteSp => Err(SamlError::UnknownEntity(
                "no current entity for remote SP role".to_string(),
            )),
        }
    }

    fn entity_config(&self, entity_id: &str, role: EntityRole) -> SamlResult<EntityConfig> {
        let found = match role {
            EntityRole::HostedIdp => (self.idp.entity_id == entity_id).then(|| self.idp.clone()),
            EntityRole::RemoteSp => self.service_providers.get(entity_id).cloned(),
        };
        found.ok_or_else(|| SamlError::UnknownEntity(entity_id.to_string()))
    }
}
