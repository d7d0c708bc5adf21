//! Attribute query endpoints.
//!
//! The handlers only lift the request into an [`InboundRequest`] and write
//! the [`OutboundMessage`] back; the binding is fixed by the route.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Form,
};

use crate::bindings::{BindingDispatcher, InboundRequest, OutboundMessage, SamlParams};

use super::state::AttributeAuthorityState;

/// GET handler for the attribute service (HTTP-Redirect binding).
pub async fn attribute_query_redirect(
    State(state): State<AttributeAuthorityState>,
    Query(params): Query<SamlParams>,
) -> impl IntoResponse {
    state
        .processor
        .handle(BindingDispatcher::FrontChannel, &InboundRequest::Query(params))
}

/// POST handler for the attribute service (HTTP-POST binding).
pub async fn attribute_query_post(
    State(state): State<AttributeAuthorityState>,
    Form(params): Form<SamlParams>,
) -> impl IntoResponse {
    state
        .processor
        .handle(BindingDispatcher::FrontChannel, &InboundRequest::Form(params))
}

/// POST handler for the SOAP attribute service.
pub async fn attribute_query_soap(
    State(state): State<AttributeAuthorityState>,
    body: String,
) -> impl IntoResponse {
    state
        .processor
        .handle(BindingDispatcher::BackChannel, &InboundRequest::SoapBody(body))
}

impl IntoResponse for OutboundMessage {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, [(header::CONTENT_TYPE, self.content_type)], self.body).into_response()
    }
}
