//! Attribute query processing.
//!
//! [`QueryProcessor`] drives one query from the transport to a signed
//! response:
//!
//! ```text
//! AwaitingQuery -> Validating -> Filtering -> Building -> Signing -> Dispatching -> Done
//!                      |
//!                      +-> Failed
//! ```
//!
//! Every query runs start to finish within the calling request. The
//! processor keeps no state between queries; all collaborators are injected
//! at construction and shared read-only.

use std::fmt;
use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, info, warn};

use crate::bindings::{BindingDispatcher, InboundRequest, OutboundMessage, ReceivedMessage};
use crate::builder::{AssertionBuilder, IssueContext, ResponseBuilder};
use crate::catalog::AttributeCatalog;
use crate::error::{SamlError, SamlResult};
use crate::filter::{filter, ReleasePolicy};
use crate::metadata::{EntityRole, MetadataProvider};
use crate::runtime::{Clock, IdGenerator, RandomIdGenerator, SystemClock};
use crate::signature::{SigningCredentials, SigningService, XmlSigner};
use crate::types::{AttributeQuery, ProtocolMessage, SignedResponse};

/// Stages of query processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingState {
    /// Waiting for the binding to deliver a message.
    AwaitingQuery,
    /// Checking message type, issuer and metadata.
    Validating,
    /// Selecting attributes to release.
    Filtering,
    /// Constructing the assertion.
    Building,
    /// Signing the assertion and response.
    Signing,
    /// Rendering the response onto the transport.
    Dispatching,
    /// Response delivered.
    Done,
    /// Processing aborted; no response was produced.
    Failed,
}

impl ProcessingState {
    /// Returns the state name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingQuery => "awaiting_query",
            Self::Validating => "validating",
            Self::Filtering => "filtering",
            Self::Building => "building",
            Self::Signing => "signing",
            Self::Dispatching => "dispatching",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ProcessingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of a single query.
#[derive(Debug)]
struct Run {
    state: ProcessingState,
    query_id: Option<String>,
}

impl Run {
    const fn new() -> Self {
        Self {
            state: ProcessingState::AwaitingQuery,
            query_id: None,
        }
    }

    fn advance(&mut self, next: ProcessingState) {
        debug!(
            from = %self.state,
            to = %next,
            query_id = self.query_id.as_deref().unwrap_or("-"),
            "Attribute query state transition"
        );
        self.state = next;
    }

    fn fail(&mut self, err: &SamlError) {
        warn!(
            state = %self.state,
            query_id = self.query_id.as_deref().unwrap_or("-"),
            error = %err,
            "Attribute query failed"
        );
        self.state = ProcessingState::Failed;
    }
}

/// Answers attribute queries.
pub struct QueryProcessor {
    metadata: Arc<dyn MetadataProvider>,
    catalog: Arc<dyn AttributeCatalog>,
    signer: Arc<dyn SigningService>,
    id_generator: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    policy: ReleasePolicy,
    assertion_builder: AssertionBuilder,
}

impl QueryProcessor {
    /// Creates a processor with production defaults: [`XmlSigner`], random
    /// IDs, the system clock, full release for empty queries and a 300 second
    /// assertion lifetime.
    pub fn new(metadata: Arc<dyn MetadataProvider>, catalog: Arc<dyn AttributeCatalog>) -> Self {
        Self {
            metadata,
            catalog,
            signer: Arc::new(XmlSigner::new()),
            id_generator: Arc::new(RandomIdGenerator),
            clock: Arc::new(SystemClock),
            policy: ReleasePolicy::default(),
            assertion_builder: AssertionBuilder::default(),
        }
    }

    /// Replaces the signing service.
    #[must_use]
    pub fn with_signer(mut self, signer: Arc<dyn SigningService>) -> Self {
        self.signer = signer;
        self
    }

    /// Replaces the ID generator.
    #[must_use]
    pub fn with_id_generator(mut self, id_generator: Arc<dyn IdGenerator>) -> Self {
        self.id_generator = id_generator;
        self
    }

    /// Replaces the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sets what an empty query releases.
    #[must_use]
    pub const fn with_release_policy(mut self, policy: ReleasePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the assertion lifetime.
    #[must_use]
    pub const fn with_assertion_validity(mut self, validity: Duration) -> Self {
        self.assertion_builder = AssertionBuilder::new(validity);
        self
    }

    /// Receives, processes and renders one request on `dispatcher`'s binding.
    ///
    /// Failures are rendered for the caller by the same binding.
    pub fn handle(&self, dispatcher: BindingDispatcher, request: &InboundRequest) -> OutboundMessage {
        let mut run = Run::new();
        match self.dispatch(&mut run, dispatcher, request) {
            Ok(out) => out,
            Err(err) => {
                run.fail(&err);
                dispatcher.error(&err)
            }
        }
    }

    /// Processes a received message into a signed response.
    pub fn process(&self, message: ReceivedMessage) -> SamlResult<SignedResponse> {
        let mut run = Run::new();
        self.issue(&mut run, message).inspect_err(|err| run.fail(err))
    }

    fn dispatch(
        &self,
        run: &mut Run,
        dispatcher: BindingDispatcher,
        request: &InboundRequest,
    ) -> SamlResult<OutboundMessage> {
        let message = dispatcher.receive(request)?;
        let signed = self.issue(run, message)?;

        run.advance(ProcessingState::Dispatching);
        let out = dispatcher.send(&signed)?;
        run.advance(ProcessingState::Done);
        Ok(out)
    }

    fn issue(&self, run: &mut Run, message: ReceivedMessage) -> SamlResult<SignedResponse> {
        run.advance(ProcessingState::Validating);
        let query = match ProtocolMessage::from_xml(&message.xml)? {
            ProtocolMessage::AttributeQuery(query) => query,
            ProtocolMessage::Other(name) => return Err(SamlError::UnexpectedMessage(name)),
        };
        run.query_id = Some(query.id.clone());

        let sp_entity_id = validate_issuer(&query)?;
        let idp_entity_id = self.metadata.current_entity_id(EntityRole::HostedIdp)?;
        let idp = self
            .metadata
            .entity_config(&idp_entity_id, EntityRole::HostedIdp)?;
        let sp = self
            .metadata
            .entity_config(sp_entity_id, EntityRole::RemoteSp)?;
        let endpoint = sp.endpoint.clone().ok_or_else(|| {
            SamlError::UnknownEntity(format!("{sp_entity_id} has no attribute endpoint"))
        })?;

        run.advance(ProcessingState::Filtering);
        let results = filter(
            &query.requested_attributes,
            self.catalog.as_ref(),
            self.policy,
        );
        let attribute_count = results.len();

        run.advance(ProcessingState::Building);
        let ctx = IssueContext {
            idp_entity_id: &idp_entity_id,
            sp_entity_id,
            in_response_to: &query.id,
            endpoint: &endpoint,
            now: self.clock.now(),
        };
        let assertion =
            self.assertion_builder
                .build(&ctx, &query.subject, results, self.id_generator.as_ref());

        run.advance(ProcessingState::Signing);
        let credentials = SigningCredentials::resolve(&idp, &sp)?;
        let assertion = AssertionBuilder::sign(assertion, self.signer.as_ref(), &credentials)?;
        let response = ResponseBuilder::build(
            &ctx,
            assertion,
            message.relay_state,
            self.id_generator.as_ref(),
        );
        let signed = ResponseBuilder::sign(response, self.signer.as_ref(), &credentials)?;

        info!(
            query_id = %query.id,
            response_id = %signed.response.id,
            sp_entity_id = %sp_entity_id,
            binding = message.binding.uri(),
            attribute_count,
            "Issued attribute response"
        );
        Ok(signed)
    }
}

/// Returns the SP entity ID named by the query's issuer.
fn validate_issuer(query: &AttributeQuery) -> SamlResult<&str> {
    match query.issuer.as_deref() {
        None => Err(SamlError::InvalidRequest(
            "missing <saml:Issuer> in <samlp:AttributeQuery>".to_string(),
        )),
        Some("") => Err(SamlError::InvalidRequest(
            "empty <saml:Issuer> in <samlp:AttributeQuery>".to_string(),
        )),
        Some(issuer) => Ok(issuer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticAttributeCatalog;
    use crate::metadata::{EntityConfig, InMemoryMetadataProvider};
    use crate::runtime::{FixedClock, SequentialIdGenerator};
    use crate::signature::CanonicalizationAlgorithm;
    use crate::types::SamlBinding;
    use chrono::{TimeZone, Utc};

    struct PassthroughSigner;

    impl SigningService for PassthroughSigner {
        fn sign(
            &self,
            xml: &str,
            _reference_id: &str,
            _credentials: &SigningCredentials,
            _canonicalization: CanonicalizationAlgorithm,
        ) -> SamlResult<String> {
            Ok(xml.to_string())
        }
    }

    fn processor(idp_key: Option<Vec<u8>>) -> QueryProcessor {
        let mut idp = EntityConfig::new("https://idp.example/");
        idp.signing_key = idp_key;
        let metadata = InMemoryMetadataProvider::new(idp)
            .with_service_provider(
                EntityConfig::new("https://sp.example/").with_endpoint("https://sp.example/attr"),
            )
            .with_service_provider(EntityConfig::new("https://no-endpoint.example/"));

        QueryProcessor::new(
            Arc::new(metadata),
            Arc::new(StaticAttributeCatalog::demo()),
        )
        .with_signer(Arc::new(PassthroughSigner))
        .with_id_generator(Arc::new(SequentialIdGenerator::new("_id")))
        .with_clock(Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        )))
    }

    fn message(xml: &str) -> ReceivedMessage {
        ReceivedMessage {
            xml: xml.to_string(),
            binding: SamlBinding::Soap,
            relay_state: None,
            signature: None,
            sig_alg: None,
        }
    }

    fn query(issuer: &str) -> String {
        format!(
            r#"<samlp:AttributeQuery xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="_q1">{issuer}<saml:Subject><saml:NameID>user</saml:NameID></saml:Subject></samlp:AttributeQuery>"#
        )
    }

    fn run(processor: &QueryProcessor, xml: &str) -> (SamlResult<SignedResponse>, ProcessingState) {
        let mut run = Run::new();
        let result = processor.issue(&mut run, message(xml));
        if let Err(ref err) = result {
            run.fail(err);
        }
        (result, run.state)
    }

    #[test]
    fn successful_query_reaches_signing() {
        let processor = processor(Some(vec![1]));
        let (result, state) = run(&processor, &query("<saml:Issuer>https://sp.example/</saml:Issuer>"));
        let signed = result.unwrap();
        assert_eq!(state, ProcessingState::Signing);
        assert_eq!(signed.response.in_response_to, "_q1");
        assert_eq!(signed.response.issuer, "https://idp.example/");
    }

    #[test]
    fn issuer_failures_stop_in_validation() {
        let processor = processor(Some(vec![1]));
        for issuer in ["", "<saml:Issuer></saml:Issuer>", "<saml:Issuer>https://unknown.example/</saml:Issuer>"] {
            let (result, state) = run(&processor, &query(issuer));
            assert!(result.is_err());
            assert_eq!(state, ProcessingState::Failed);
        }
    }

    #[test]
    fn issuer_messages_distinguish_missing_from_empty() {
        let processor = processor(Some(vec![1]));
        let missing = run(&processor, &query("")).0.unwrap_err();
        let empty = run(&processor, &query("<saml:Issuer/>")).0.unwrap_err();
        assert!(missing.to_string().contains("missing <saml:Issuer>"));
        assert!(empty.to_string().contains("empty <saml:Issuer>"));
    }

    #[test]
    fn wrong_message_type_is_rejected() {
        let processor = processor(Some(vec![1]));
        let (result, _) = run(
            &processor,
            r#"<samlp:AuthnRequest xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" ID="_a"/>"#,
        );
        assert!(matches!(result, Err(SamlError::UnexpectedMessage(name)) if name == "AuthnRequest"));
    }

    #[test]
    fn sp_without_endpoint_is_rejected_as_unknown() {
        let processor = processor(Some(vec![1]));
        let (result, _) = run(
            &processor,
            &query("<saml:Issuer>https://no-endpoint.example/</saml:Issuer>"),
        );
        assert!(matches!(result, Err(SamlError::UnknownEntity(_))));
    }

    #[test]
    fn missing_key_fails_at_signing() {
        let processor = processor(None);
        let (result, _) = run(&processor, &query("<saml:Issuer>https://sp.example/</saml:Issuer>"));
        let err = result.unwrap_err();
        assert!(matches!(err, SamlError::SignatureCreation(_)));
        assert_eq!(err.http_status(), 500);
    }

    #[test]
    fn handle_renders_soap_response() {
        let processor = processor(Some(vec![1]));
        let envelope = format!(
            r#"<S:Envelope xmlns:S="http://schemas.xmlsoap.org/soap/envelope/"><S:Body>{}</S:Body></S:Envelope>"#,
            query("<saml:Issuer>https://sp.example/</saml:Issuer>")
        );
        let out = processor.handle(
            BindingDispatcher::BackChannel,
            &InboundRequest::SoapBody(envelope),
        );
        assert_eq!(out.status, 200);
        assert!(out.body.contains("<samlp:Response "));
        assert!(out.body.contains("<saml:Attribute Name=\"name\""));
    }

    #[test]
    fn state_names() {
        assert_eq!(ProcessingState::AwaitingQuery.to_string(), "awaiting_query");
        assert_eq!(ProcessingState::Failed.as_str(), "failed");
    }
}
