//! Attribute authority router configuration.

use axum::{routing::get, routing::post, Router};

use super::handlers::{attribute_query_post, attribute_query_redirect, attribute_query_soap};
use super::state::AttributeAuthorityState;

/// Path of the front-channel attribute service.
pub const ATTRIBUTE_SERVICE_PATH: &str = "/saml2/idp/attributeserver";

/// Path of the SOAP attribute service.
pub const ATTRIBUTE_SERVICE_SOAP_PATH: &str = "/saml2/idp/attributeserver/soap";

/// Creates the attribute authority router.
///
/// # Endpoints
///
/// | Method   | Path                              | Binding                  |
/// |----------|-----------------------------------|--------------------------|
/// | GET      | `/saml2/idp/attributeserver`      | HTTP-Redirect            |
/// | POST     | `/saml2/idp/attributeserver`      | HTTP-POST                |
/// | POST     | `/saml2/idp/attributeserver/soap` | SOAP                     |
pub fn attribute_authority_router() -> Router<AttributeAuthorityState> {
    Router::new()
        .route(
            ATTRIBUTE_SERVICE_PATH,
            get(attribute_query_redirect).post(attribute_query_post),
        )
        .route(ATTRIBUTE_SERVICE_SOAP_PATH, post(attribute_query_soap))
}
