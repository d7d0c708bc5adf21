//! End-to-end attribute query processing.
//!
//! Drives [`QueryProcessor`] with a fixed clock, sequential IDs, in-memory
//! metadata and a recording signer.

use std::sync::{Arc, Mutex};

use chrono::{Duration, TimeZone, Utc};

use aa_protocol_saml::bindings::{BindingDispatcher, InboundRequest, ReceivedMessage};
use aa_protocol_saml::catalog::{CatalogEntry, StaticAttributeCatalog};
use aa_protocol_saml::filter::ReleasePolicy;
use aa_protocol_saml::metadata::{EntityConfig, InMemoryMetadataProvider};
use aa_protocol_saml::processor::QueryProcessor;
use aa_protocol_saml::runtime::{FixedClock, SequentialIdGenerator};
use aa_protocol_saml::signature::{
    CanonicalizationAlgorithm, SignatureAlgorithm, SigningCredentials, SigningService,
};
use aa_protocol_saml::{AttributeNameFormat, ErrorKind, SamlBinding, SamlError, SamlResult};

const SP: &str = "https://sp.example/";
const SP_ENDPOINT: &str = "https://sp.example/attributes";
const IDP: &str = "https://idp.example/";

/// One call to the signer.
#[derive(Debug, Clone)]
struct SignCall {
    reference_id: String,
    key: Vec<u8>,
    algorithm: SignatureAlgorithm,
}

#[derive(Default)]
struct RecordingSigner {
    calls: Mutex<Vec<SignCall>>,
}

impl RecordingSigner {
    fn calls(&self) -> Vec<SignCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl SigningService for RecordingSigner {
    fn sign(
        &self,
        xml: &str,
        reference_id: &str,
        credentials: &SigningCredentials,
        canonicalization: CanonicalizationAlgorithm,
    ) -> SamlResult<String> {
        assert_eq!(canonicalization, CanonicalizationAlgorithm::ExclusiveC14N);
        self.calls.lock().unwrap().push(SignCall {
            reference_id: reference_id.to_string(),
            key: credentials.private_key_der.clone(),
            algorithm: credentials.algorithm,
        });
        Ok(xml.to_string())
    }
}

struct Harness {
    processor: QueryProcessor,
    signer: Arc<RecordingSigner>,
}

fn harness_with(metadata: InMemoryMetadataProvider, policy: ReleasePolicy) -> Harness {
    let signer = Arc::new(RecordingSigner::default());
    let processor = QueryProcessor::new(
        Arc::new(metadata),
        Arc::new(StaticAttributeCatalog::demo()),
    )
    .with_signer(signer.clone())
    .with_id_generator(Arc::new(SequentialIdGenerator::new("_id")))
    .with_clock(Arc::new(FixedClock(
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
    )))
    .with_release_policy(policy);
    Harness { processor, signer }
}

fn default_metadata() -> InMemoryMetadataProvider {
    InMemoryMetadataProvider::new(
        EntityConfig::new(IDP).with_signing_key(b"idp-key".to_vec(), Some(b"idp-cert".to_vec())),
    )
    .with_service_provider(EntityConfig::new(SP).with_endpoint(SP_ENDPOINT))
}

fn harness() -> Harness {
    harness_with(default_metadata(), ReleasePolicy::ReleaseAll)
}

fn query(id: &str, issuer: &str, attributes: &str) -> String {
    format!(
        r#"<samlp:AttributeQuery xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="{id}" Version="2.0" IssueInstant="2024-05-01T11:59:58Z">{issuer}<saml:Subject><saml:NameID Format="urn:oasis:names:tc:SAML:2.0:nameid-format:persistent">user-1</saml:NameID></saml:Subject>{attributes}</samlp:AttributeQuery>"#
    )
}

fn issuer(value: &str) -> String {
    format!("<saml:Issuer>{value}</saml:Issuer>")
}

fn soap_message(xml: String) -> ReceivedMessage {
    ReceivedMessage {
        xml,
        binding: SamlBinding::Soap,
        relay_state: None,
        signature: None,
        sig_alg: None,
    }
}

#[test]
fn round_trip_releases_whole_catalog() {
    let h = harness();
    let signed = h
        .processor
        .process(soap_message(query("_q1", &issuer(SP), "")))
        .unwrap();

    let response = &signed.response;
    assert!(response.is_success());
    assert_eq!(response.issuer, IDP);
    assert_eq!(response.destination, SP_ENDPOINT);
    assert_eq!(response.assertions.len(), 1);

    let assertion = &response.assertions[0].assertion;
    let attributes = &assertion.attribute_statement.as_ref().unwrap().attributes;
    assert_eq!(attributes.len(), 2);
    assert_eq!(attributes[0].name, "name");
    assert_eq!(attributes[0].values, ["value1", "value2", "value3"]);
    assert_eq!(attributes[1].name, "test");
    assert_eq!(attributes[1].values, ["test"]);

    assert_eq!(
        assertion.subject.subject_confirmation.method,
        "urn:oasis:names:tc:SAML:2.0:cm:bearer"
    );
    assert_eq!(assertion.subject.name_id.value, "user-1");
    assert_eq!(assertion.conditions.audience_restriction.audiences, [SP]);
}

#[test]
fn timestamps_share_one_clock_reading() {
    let h = harness();
    let signed = h
        .processor
        .process(soap_message(query("_q1", &issuer(SP), "")))
        .unwrap();
    let assertion = &signed.response.assertions[0].assertion;
    let expiry = assertion.issue_instant + Duration::seconds(300);

    assert_eq!(assertion.conditions.not_before, assertion.issue_instant);
    assert_eq!(assertion.conditions.not_on_or_after, expiry);
    assert_eq!(
        assertion.subject.subject_confirmation.data.not_on_or_after,
        expiry
    );
    assert_eq!(signed.response.issue_instant, assertion.issue_instant);
}

#[test]
fn in_response_to_is_propagated() {
    let h = harness();
    for id in ["_q1", "_0", "_   x"] {
        let signed = h
            .processor
            .process(soap_message(query(id, &issuer(SP), "")))
            .unwrap();
        let data = &signed.response.assertions[0]
            .assertion
            .subject
            .subject_confirmation
            .data;
        assert_eq!(signed.response.in_response_to, id);
        assert_eq!(data.in_response_to, id);
        assert_eq!(data.recipient, SP_ENDPOINT);
    }
}

#[test]
fn partial_value_request_is_intersected() {
    let h = harness();
    let attributes = r#"<saml:Attribute Name="name"><saml:AttributeValue>value2</saml:AttributeValue><saml:AttributeValue>vX</saml:AttributeValue></saml:Attribute>"#;
    let signed = h
        .processor
        .process(soap_message(query("_q1", &issuer(SP), attributes)))
        .unwrap();

    let statement = signed.response.assertions[0]
        .assertion
        .attribute_statement
        .as_ref()
        .unwrap();
    assert_eq!(statement.attributes.len(), 1);
    assert_eq!(statement.attributes[0].values, ["value2"]);
}

#[test]
fn padded_values_do_not_match_catalog_values() {
    let h = harness();
    let attributes = r#"<saml:Attribute Name="name"><saml:AttributeValue>  value1 </saml:AttributeValue><saml:AttributeValue>value2</saml:AttributeValue></saml:Attribute>"#;
    let signed = h
        .processor
        .process(soap_message(query("_q1", &issuer(SP), attributes)))
        .unwrap();

    let statement = signed.response.assertions[0]
        .assertion
        .attribute_statement
        .as_ref()
        .unwrap();
    assert_eq!(statement.attributes[0].values, ["value2"]);
}

#[test]
fn format_mismatch_omits_attribute() {
    let h = harness();
    let attributes = format!(
        r#"<saml:Attribute Name="name" NameFormat="{}"/>"#,
        AttributeNameFormat::URI_URI
    );
    let signed = h
        .processor
        .process(soap_message(query("_q1", &issuer(SP), &attributes)))
        .unwrap();

    let assertion = &signed.response.assertions[0].assertion;
    assert!(assertion.attribute_statement.is_none());
    assert!(signed.response.is_success());
}

#[test]
fn empty_issuer_is_rejected_before_signing() {
    let h = harness();
    let err = h
        .processor
        .process(soap_message(query("_q1", &issuer(""), "")))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);
    assert!(h.signer.calls().is_empty());
}

#[test]
fn missing_issuer_is_rejected() {
    let h = harness();
    let err = h
        .processor
        .process(soap_message(query("_q1", "", "")))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);
    assert!(err.to_string().contains("missing <saml:Issuer>"));
}

#[test]
fn unknown_sp_is_reported_like_a_bad_request() {
    let h = harness();
    let err = h
        .processor
        .process(soap_message(query("_q1", &issuer("https://other.example/"), "")))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.http_status(), 400);
    assert!(h.signer.calls().is_empty());
}

#[test]
fn assertion_then_response_are_signed_with_idp_key() {
    let h = harness();
    let signed = h
        .processor
        .process(soap_message(query("_q1", &issuer(SP), "")))
        .unwrap();

    let calls = h.signer.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].reference_id, signed.response.assertions[0].assertion.id);
    assert_eq!(calls[1].reference_id, signed.response.id);
    assert_ne!(calls[0].reference_id, calls[1].reference_id);
    assert!(calls.iter().all(|c| c.key == b"idp-key"));
    assert!(calls
        .iter()
        .all(|c| c.algorithm == SignatureAlgorithm::RsaSha256));
}

#[test]
fn sp_signing_override_wins() {
    let metadata = InMemoryMetadataProvider::new(
        EntityConfig::new(IDP).with_signing_key(b"idp-key".to_vec(), None),
    )
    .with_service_provider(
        EntityConfig::new(SP)
            .with_endpoint(SP_ENDPOINT)
            .with_signing_key(b"sp-override-key".to_vec(), None)
            .with_signing_algorithm(SignatureAlgorithm::RsaSha512),
    );
    let h = harness_with(metadata, ReleasePolicy::ReleaseAll);
    h.processor
        .process(soap_message(query("_q1", &issuer(SP), "")))
        .unwrap();

    let calls = h.signer.calls();
    assert!(calls.iter().all(|c| c.key == b"sp-override-key"));
    assert!(calls
        .iter()
        .all(|c| c.algorithm == SignatureAlgorithm::RsaSha512));
}

#[test]
fn release_none_policy_withholds_unrequested_attributes() {
    let h = harness_with(default_metadata(), ReleasePolicy::ReleaseNone);
    let signed = h
        .processor
        .process(soap_message(query("_q1", &issuer(SP), "")))
        .unwrap();
    assert!(signed.response.assertions[0]
        .assertion
        .attribute_statement
        .is_none());
}

#[test]
fn replayed_query_gets_fresh_identifiers() {
    let h = harness();
    let first = h
        .processor
        .process(soap_message(query("_q1", &issuer(SP), "")))
        .unwrap();
    let second = h
        .processor
        .process(soap_message(query("_q1", &issuer(SP), "")))
        .unwrap();
    assert_ne!(first.response.id, second.response.id);
    assert_ne!(
        first.response.assertions[0].assertion.id,
        second.response.assertions[0].assertion.id
    );
}

#[test]
fn non_attribute_query_is_unexpected() {
    let h = harness();
    let err = h
        .processor
        .process(soap_message(
            r#"<samlp:LogoutRequest xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" ID="_l"/>"#
                .to_string(),
        ))
        .unwrap_err();
    assert!(matches!(err, SamlError::UnexpectedMessage(_)));
}

#[test]
fn front_channel_echoes_relay_state() {
    use base64::Engine;
    use aa_protocol_saml::bindings::SamlParams;

    let h = harness();
    let params = SamlParams {
        saml_request: Some(
            base64::engine::general_purpose::STANDARD.encode(query("_q1", &issuer(SP), "")),
        ),
        relay_state: Some("opaque-42".to_string()),
        ..SamlParams::default()
    };
    let out = h
        .processor
        .handle(BindingDispatcher::FrontChannel, &InboundRequest::Form(params));

    assert_eq!(out.status, 200);
    assert!(out.body.contains(&format!(r#"action="{SP_ENDPOINT}""#)));
    assert!(out.body.contains(r#"name="RelayState" value="opaque-42""#));
}

#[test]
fn catalog_rejects_duplicate_entries() {
    let entries = vec![
        CatalogEntry::new("mail", AttributeNameFormat::Basic, ["a@example.org"]),
        CatalogEntry::new("mail", AttributeNameFormat::Basic, ["b@example.org"]),
    ];
    assert!(StaticAttributeCatalog::new(entries).is_err());
}
