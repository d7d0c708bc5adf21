//! Response construction.

use tracing::debug;

use crate::error::SamlResult;
use crate::runtime::IdGenerator;
use crate::signature::{CanonicalizationAlgorithm, SigningCredentials, SigningService};
use crate::types::{Response, SignedAssertion, SignedResponse, Status};

use super::IssueContext;

/// Wraps signed assertions into a successful `Response`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseBuilder;

impl ResponseBuilder {
    /// Builds the unsigned response carrying `assertion`.
    pub fn build(
        ctx: &IssueContext<'_>,
        assertion: SignedAssertion,
        relay_state: Option<String>,
        id_generator: &dyn IdGenerator,
    ) -> Response {
        let response = Response {
            id: id_generator.next_id(),
            issuer: ctx.idp_entity_id.to_string(),
            issue_instant: ctx.now,
            in_response_to: ctx.in_response_to.to_string(),
            destination: ctx.endpoint.to_string(),
            status: Status::success(),
            assertions: vec![assertion],
            relay_state,
        };
        debug!(response_id = %response.id, destination = %response.destination, "Built response");
        response
    }

    /// Signs the response element.
    ///
    /// The response signature is separate from the signatures of the
    /// assertions it carries.
    pub fn sign(
        response: Response,
        signer: &dyn SigningService,
        credentials: &SigningCredentials,
    ) -> SamlResult<SignedResponse> {
        let xml = signer.sign(
            &response.to_xml(),
            &response.id,
            credentials,
            CanonicalizationAlgorithm::ExclusiveC14N,
        )?;
        Ok(SignedResponse { response, xml })
    }
}
