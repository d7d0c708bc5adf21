//! Server configuration.
//!
//! Process settings come from environment variables (and `.env`). The
//! authority itself, meaning its identity, service providers, attribute
//! catalog and release policy, is described by a TOML file.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use aa_protocol_saml::catalog::{CatalogEntry, StaticAttributeCatalog};
use aa_protocol_saml::filter::ReleasePolicy;
use aa_protocol_saml::metadata::{EntityConfig, InMemoryMetadataProvider};
use aa_protocol_saml::signature::{pem_to_der, SignatureAlgorithm};
use aa_protocol_saml::AttributeNameFormat;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server host to bind to.
    pub host: String,

    /// Server port.
    pub port: u16,

    /// Path of the authority TOML file.
    pub config_file: PathBuf,

    /// Log filter.
    pub log_level: String,
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let host = std::env::var("AA_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = match std::env::var("AA_PORT") {
            Ok(p) => p
                .parse()
                .with_context(|| format!("AA_PORT is not a valid port: {p}"))?,
            Err(_) => 8080,
        };

        let config_file = std::env::var("AA_CONFIG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("attribute-authority.toml"));

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            host,
            port,
            config_file,
            log_level,
        })
    }

    /// Creates a configuration for testing.
    #[must_use]
    pub fn for_testing(config_file: impl Into<PathBuf>) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0, // Random port
            config_file: config_file.into(),
            log_level: "debug".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            config_file: PathBuf::from("attribute-authority.toml"),
            log_level: "info".to_string(),
        }
    }
}

/// The authority description read from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorityConfig {
    /// The hosted identity provider.
    pub idp: IdpConfig,

    /// Service providers allowed to query.
    #[serde(default)]
    pub service_providers: Vec<ServiceProviderConfig>,

    /// The attribute catalog.
    #[serde(default)]
    pub attributes: Vec<AttributeConfig>,

    /// Release policy.
    #[serde(default)]
    pub policy: PolicyConfig,
}

/// The hosted identity provider.
#[derive(Debug, Clone, Deserialize)]
pub struct IdpConfig {
    /// Entity ID.
    pub entity_id: String,
    /// PEM private key path.
    pub signing_key: PathBuf,
    /// PEM certificate path.
    pub signing_cert: Option<PathBuf>,
    /// Signature algorithm URI.
    pub signature_algorithm: Option<String>,
}

/// A remote service provider.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceProviderConfig {
    /// Entity ID.
    pub entity_id: String,
    /// Where responses to this SP are delivered.
    pub endpoint: String,
    /// PEM private key path overriding the IdP key for this SP.
    pub signing_key: Option<PathBuf>,
    /// PEM certificate path, used with `signing_key`.
    pub signing_cert: Option<PathBuf>,
    /// Signature algorithm URI overriding the IdP algorithm for this SP.
    pub signature_algorithm: Option<String>,
}

/// Attribute name format as written in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameFormatConfig {
    /// `unspecified`
    #[default]
    Unspecified,
    /// `uri`
    Uri,
    /// `basic`
    Basic,
}

impl From<NameFormatConfig> for AttributeNameFormat {
    fn from(format: NameFormatConfig) -> Self {
        match format {
            NameFormatConfig::Unspecified => Self::Unspecified,
            NameFormatConfig::Uri => Self::Uri,
            NameFormatConfig::Basic => Self::Basic,
        }
    }
}

/// A catalog attribute.
#[derive(Debug, Clone, Deserialize)]
pub struct AttributeConfig {
    /// Attribute name.
    pub name: String,
    /// Attribute name format.
    #[serde(default)]
    pub name_format: NameFormatConfig,
    /// Attribute values.
    #[serde(default)]
    pub values: Vec<String>,
}

/// Release policy settings.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    /// Release the whole catalog when a query names no attributes.
    #[serde(default = "default_release_all")]
    pub release_all_when_unrequested: bool,
    /// Assertion lifetime in seconds.
    #[serde(default = "default_assertion_validity")]
    pub assertion_validity_seconds: i64,
}

fn default_release_all() -> bool {
    true
}

fn default_assertion_validity() -> i64 {
    300
}

/// Longest accepted assertion lifetime, in seconds.
pub const MAX_ASSERTION_VALIDITY_SECS: i64 = 24 * 60 * 60;

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            release_all_when_unrequested: default_release_all(),
            assertion_validity_seconds: default_assertion_validity(),
        }
    }
}

impl PolicyConfig {
    /// The filter policy for queries naming no attributes.
    #[must_use]
    pub const fn release_policy(&self) -> ReleasePolicy {
        if self.release_all_when_unrequested {
            ReleasePolicy::ReleaseAll
        } else {
            ReleasePolicy::ReleaseNone
        }
    }

    /// The assertion lifetime.
    pub fn assertion_validity(&self) -> anyhow::Result<chrono::Duration> {
        chrono::Duration::try_seconds(self.assertion_validity_seconds).ok_or_else(|| {
            anyhow::anyhow!(
                "assertion_validity_seconds out of range: {}",
                self.assertion_validity_seconds
            )
        })
    }
}

impl AuthorityConfig {
    /// Reads and parses the authority file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Parses and validates an authority description.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.idp.entity_id.is_empty() {
            anyhow::bail!("idp.entity_id must not be empty");
        }
        let validity = self.policy.assertion_validity_seconds;
        if !(1..=MAX_ASSERTION_VALIDITY_SECS).contains(&validity) {
            anyhow::bail!(
                "policy.assertion_validity_seconds must be between 1 and {MAX_ASSERTION_VALIDITY_SECS}, got {validity}"
            );
        }
        for sp in &self.service_providers {
            if sp.entity_id.is_empty() {
                anyhow::bail!("service provider entity_id must not be empty");
            }
            if sp.signing_cert.is_some() && sp.signing_key.is_none() {
                anyhow::bail!(
                    "service provider {} has signing_cert without signing_key",
                    sp.entity_id
                );
            }
        }
        Ok(())
    }

    /// Builds the metadata provider, loading key material.
    ///
    /// Relative key paths are resolved against `base_dir`.
    pub fn metadata(&self, base_dir: &Path) -> anyhow::Result<InMemoryMetadataProvider> {
        let key = load_private_key(&base_dir.join(&self.idp.signing_key))?;
        let cert = self
            .idp
            .signing_cert
            .as_ref()
            .map(|p| load_certificate(&base_dir.join(p)))
            .transpose()?;
        let mut idp = EntityConfig::new(&self.idp.entity_id).with_signing_key(key, cert);
        if let Some(ref uri) = self.idp.signature_algorithm {
            idp = idp.with_signing_algorithm(parse_algorithm(uri)?);
        }

        let mut provider = InMemoryMetadataProvider::new(idp);
        for sp in &self.service_providers {
            let mut entity = EntityConfig::new(&sp.entity_id).with_endpoint(&sp.endpoint);
            if let Some(ref key_path) = sp.signing_key {
                let key = load_private_key(&base_dir.join(key_path))?;
                let cert = sp
                    .signing_cert
                    .as_ref()
                    .map(|p| load_certificate(&base_dir.join(p)))
                    .transpose()?;
                entity = entity.with_signing_key(key, cert);
            }
            if let Some(ref uri) = sp.signature_algorithm {
                entity = entity.with_signing_algorithm(parse_algorithm(uri)?);
            }
            provider = provider.with_service_provider(entity);
        }
        Ok(provider)
    }

    /// Builds the attribute catalog.
    pub fn catalog(&self) -> anyhow::Result<StaticAttributeCatalog> {
        let entries = self
            .attributes
            .iter()
            .map(|a| CatalogEntry::new(&a.name, a.name_format.into(), &a.values))
            .collect();
        Ok(StaticAttributeCatalog::new(entries)?)
    }
}

fn parse_algorithm(uri: &str) -> anyhow::Result<SignatureAlgorithm> {
    match SignatureAlgorithm::from_uri(uri) {
        Some(algorithm) if algorithm.is_deprecated() => {
            anyhow::bail!("deprecated signature algorithm not allowed: {uri}")
        }
        Some(algorithm) => Ok(algorithm),
        None => anyhow::bail!("unsupported signature algorithm: {uri}"),
    }
}

/// Loads a PEM private key (PKCS#8 or PKCS#1) as DER.
pub fn load_private_key(path: &Path) -> anyhow::Result<Vec<u8>> {
    let pem = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read signing key {}", path.display()))?;
    pem_to_der(&pem, "PRIVATE KEY")
        .or_else(|| pem_to_der(&pem, "RSA PRIVATE KEY"))
        .ok_or_else(|| anyhow::anyhow!("no PEM private key in {}", path.display()))
}

/// Loads a PEM certificate as DER.
pub fn load_certificate(path: &Path) -> anyhow::Result<Vec<u8>> {
    let pem = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read certificate {}", path.display()))?;
    pem_to_der(&pem, "CERTIFICATE")
        .ok_or_else(|| anyhow::anyhow!("no PEM certificate in {}", path.display()))
}
