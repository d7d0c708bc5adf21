//! Assertion construction.

use chrono::Duration;
use tracing::debug;

use crate::error::SamlResult;
use crate::filter::FilterResult;
use crate::runtime::IdGenerator;
use crate::signature::{CanonicalizationAlgorithm, SigningCredentials, SigningService};
use crate::types::{
    Assertion, Attribute, AttributeStatement, AudienceRestriction, Conditions, NameId,
    SignedAssertion, Subject, SubjectConfirmation, SubjectConfirmationData,
};

use super::IssueContext;

/// Default assertion lifetime in seconds.
pub const DEFAULT_ASSERTION_VALIDITY_SECS: i64 = 300;

/// Builds bearer assertions carrying released attributes.
#[derive(Debug, Clone, Copy)]
pub struct AssertionBuilder {
    validity: Duration,
}

impl Default for AssertionBuilder {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_ASSERTION_VALIDITY_SECS))
    }
}

impl AssertionBuilder {
    /// Creates a builder issuing assertions valid for `validity`.
    #[must_use]
    pub const fn new(validity: Duration) -> Self {
        Self { validity }
    }

    /// Returns the assertion lifetime.
    #[must_use]
    pub const fn validity(&self) -> Duration {
        self.validity
    }

    /// Builds the unsigned assertion.
    ///
    /// `NotOnOrAfter` is computed once and shared by the conditions and the
    /// subject confirmation. An empty `results` yields no attribute statement.
    pub fn build(
        &self,
        ctx: &IssueContext<'_>,
        subject: &NameId,
        results: Vec<FilterResult>,
        id_generator: &dyn IdGenerator,
    ) -> Assertion {
        let not_on_or_after = ctx.now + self.validity;

        let attribute_statement = if results.is_empty() {
            None
        } else {
            Some(AttributeStatement {
                attributes: results.into_iter().map(Attribute::from).collect(),
            })
        };

        let assertion = Assertion {
            id: id_generator.next_id(),
            issue_instant: ctx.now,
            issuer: ctx.idp_entity_id.to_string(),
            subject: Subject {
                name_id: subject.clone(),
                subject_confirmation: SubjectConfirmation::bearer(SubjectConfirmationData {
                    not_on_or_after,
                    recipient: ctx.endpoint.to_string(),
                    in_response_to: ctx.in_response_to.to_string(),
                }),
            },
            conditions: Conditions {
                not_before: ctx.now,
                not_on_or_after,
                audience_restriction: AudienceRestriction {
                    audiences: vec![ctx.sp_entity_id.to_string()],
                },
            },
            attribute_statement,
        };

        debug!(
            assertion_id = %assertion.id,
            audience = %ctx.sp_entity_id,
            "Built assertion"
        );
        assertion
    }

    /// Signs the assertion, returning it with its signed serialization.
    pub fn sign(
        assertion: Assertion,
        signer: &dyn SigningService,
        credentials: &SigningCredentials,
    ) -> SamlResult<SignedAssertion> {
        let xml = signer.sign(
            &assertion.to_xml(),
            &assertion.id,
            credentials,
            CanonicalizationAlgorithm::ExclusiveC14N,
        )?;
        Ok(SignedAssertion { assertion, xml })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SamlError;
    use crate::runtime::SequentialIdGenerator;
    use crate::signature::SignatureAlgorithm;
    use crate::types::{AttributeNameFormat, CM_BEARER};
    use chrono::{TimeZone, Utc};

    struct MarkerSigner;

    impl SigningService for MarkerSigner {
        fn sign(
            &self,
            xml: &str,
            reference_id: &str,
            _credentials: &SigningCredentials,
            _canonicalization: CanonicalizationAlgorithm,
        ) -> SamlResult<String> {
            Ok(format!("{xml}<!--signed {reference_id}-->"))
        }
    }

    struct FailingSigner;

    impl SigningService for FailingSigner {
        fn sign(
            &self,
            _xml: &str,
            _reference_id: &str,
            _credentials: &SigningCredentials,
            _canonicalization: CanonicalizationAlgorithm,
        ) -> SamlResult<String> {
            Err(SamlError::SignatureCreation("no key".to_string()))
        }
    }

    fn credentials() -> SigningCredentials {
        SigningCredentials {
            private_key_der: vec![1],
            certificate_der: None,
            algorithm: SignatureAlgorithm::RsaSha256,
        }
    }

    fn ctx() -> IssueContext<'static> {
        IssueContext {
            idp_entity_id: "https://idp.example/",
            sp_entity_id: "https://sp.example/",
            in_response_to: "_query",
            endpoint: "https://sp.example/attributes",
            now: Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
        }
    }

    fn results() -> Vec<FilterResult> {
        vec![FilterResult {
            name: "name".to_string(),
            name_format: AttributeNameFormat::Unspecified,
            values: vec!["value1".to_string()],
        }]
    }

    #[test]
    fn timestamps_share_one_window() {
        let ctx = ctx();
        let assertion = AssertionBuilder::default().build(
            &ctx,
            &NameId::new("user"),
            results(),
            &SequentialIdGenerator::new("_a"),
        );

        let expected = ctx.now + Duration::seconds(300);
        assert_eq!(assertion.issue_instant, ctx.now);
        assert_eq!(assertion.conditions.not_before, ctx.now);
        assert_eq!(assertion.conditions.not_on_or_after, expected);
        assert_eq!(
            assertion.subject.subject_confirmation.data.not_on_or_after,
            expected
        );
    }

    #[test]
    fn audience_confirmation_and_issuer() {
        let assertion = AssertionBuilder::default().build(
            &ctx(),
            &NameId::new("user"),
            results(),
            &SequentialIdGenerator::new("_a"),
        );

        assert_eq!(assertion.id, "_a1");
        assert_eq!(assertion.issuer, "https://idp.example/");
        assert_eq!(
            assertion.conditions.audience_restriction.audiences,
            vec!["https://sp.example/"]
        );
        let confirmation = &assertion.subject.subject_confirmation;
        assert_eq!(confirmation.method, CM_BEARER);
        assert_eq!(confirmation.data.recipient, "https://sp.example/attributes");
        assert_eq!(confirmation.data.in_response_to, "_query");
        assert_eq!(assertion.subject.name_id.value, "user");
    }

    #[test]
    fn custom_validity() {
        let ctx = ctx();
        let builder = AssertionBuilder::new(Duration::seconds(60));
        let assertion =
            builder.build(&ctx, &NameId::new("u"), results(), &SequentialIdGenerator::new("_a"));
        assert_eq!(
            assertion.conditions.not_on_or_after,
            ctx.now + Duration::seconds(60)
        );
    }

    #[test]
    fn no_results_means_no_statement() {
        let assertion = AssertionBuilder::default().build(
            &ctx(),
            &NameId::new("user"),
            Vec::new(),
            &SequentialIdGenerator::new("_a"),
        );
        assert!(assertion.attribute_statement.is_none());
    }

    #[test]
    fn signing_is_a_pure_transform() {
        let assertion = AssertionBuilder::default().build(
            &ctx(),
            &NameId::new("user"),
            results(),
            &SequentialIdGenerator::new("_a"),
        );
        let unsigned = assertion.clone();
        let signed = AssertionBuilder::sign(assertion, &MarkerSigner, &credentials()).unwrap();
        assert_eq!(signed.assertion, unsigned);
        assert!(signed.xml.ends_with("<!--signed _a1-->"));

        assert!(AssertionBuilder::sign(unsigned, &FailingSigner, &credentials()).is_err());
    }
}
