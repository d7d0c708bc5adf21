//! Server integration tests.
//!
//! Builds the server from a configuration file on disk and serves its router
//! on an ephemeral port.

use std::path::Path;

use base64::Engine;
use reqwest::Client;
use tokio::net::TcpListener;

use aa_server::{Server, ServerConfig};

const KEY_PEM: &str = include_str!("../../aa-protocol-saml/tests/fixtures/idp-key.pem");
const CERT_PEM: &str = include_str!("../../aa-protocol-saml/tests/fixtures/idp-cert.pem");

const AUTHORITY: &str = r#"
[idp]
entity_id = "https://idp.example/"
signing_key = "keys/idp-key.pem"
signing_cert = "keys/idp-cert.pem"

[[service_providers]]
entity_id = "https://sp.example/"
endpoint = "https://sp.example/attributes"

[[attributes]]
name = "mail"
name_format = "basic"
values = ["user@example.org"]

[policy]
release_all_when_unrequested = false
"#;

/// Test environment serving the full application router.
struct TestEnv {
    _dir: tempfile::TempDir,
    base_url: String,
    client: Client,
}

impl TestEnv {
    async fn new() -> anyhow::Result<Self> {
        let dir = tempfile::tempdir()?;
        write_authority(dir.path())?;

        let config = ServerConfig::for_testing(dir.path().join("attribute-authority.toml"));
        let server = Server::new(config)?;
        let app = server.test_router();

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            _dir: dir,
            base_url: format!("http://{addr}"),
            client: Client::new(),
        })
    }
}

fn write_authority(dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir.join("keys"))?;
    std::fs::write(dir.join("keys/idp-key.pem"), KEY_PEM)?;
    std::fs::write(dir.join("keys/idp-cert.pem"), CERT_PEM)?;
    std::fs::write(dir.join("attribute-authority.toml"), AUTHORITY)?;
    Ok(())
}

fn query(attributes: &str) -> String {
    format!(
        r#"<samlp:AttributeQuery xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="_srv-1"><saml:Issuer>https://sp.example/</saml:Issuer><saml:Subject><saml:NameID>user-1</saml:NameID></saml:Subject>{attributes}</samlp:AttributeQuery>"#
    )
}

fn soap(body: &str) -> String {
    format!(
        r#"<S:Envelope xmlns:S="http://schemas.xmlsoap.org/soap/envelope/"><S:Body>{body}</S:Body></S:Envelope>"#
    )
}

#[tokio::test]
async fn health_endpoints_respond() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let response = env.client.get(format!("{}/health", env.base_url)).send().await?;
    assert!(response.status().is_success());
    assert!(response.text().await?.contains("healthy"));

    let response = env
        .client
        .get(format!("{}/health/live", env.base_url))
        .send()
        .await?;
    assert!(response.status().is_success());
    Ok(())
}

#[tokio::test]
async fn configured_policy_withholds_unrequested_attributes() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let response = env
        .client
        .post(format!("{}/saml2/idp/attributeserver/soap", env.base_url))
        .body(soap(&query("")))
        .send()
        .await?;

    assert_eq!(response.status().as_u16(), 200);
    let body = response.text().await?;
    assert!(body.contains("<saml:Assertion "));
    assert!(!body.contains("user@example.org"));
    Ok(())
}

#[tokio::test]
async fn configured_catalog_is_served() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let requested = r#"<saml:Attribute Name="mail" NameFormat="urn:oasis:names:tc:SAML:2.0:attrname-format:basic"/>"#;
    let encoded = base64::engine::general_purpose::STANDARD.encode(query(requested));
    let response = env
        .client
        .post(format!("{}/saml2/idp/attributeserver", env.base_url))
        .form(&[("SAMLRequest", encoded.as_str())])
        .send()
        .await?;

    assert_eq!(response.status().as_u16(), 200);
    let html = response.text().await?;
    let marker = r#"name="SAMLResponse" value=""#;
    let start = html.find(marker).map(|p| p + marker.len()).unwrap_or_default();
    let end = html[start..].find('"').map(|p| start + p).unwrap_or(start);
    let xml = String::from_utf8(
        base64::engine::general_purpose::STANDARD.decode(&html[start..end])?,
    )?;
    assert!(xml.contains("user@example.org"));
    assert!(xml.contains(r#"Destination="https://sp.example/attributes""#));
    Ok(())
}

#[test]
fn missing_authority_file_fails_startup() {
    let config = ServerConfig::for_testing("/nonexistent/attribute-authority.toml");
    assert!(Server::new(config).is_err());
}
