//! Attribute authority endpoint handlers.
//!
//! This module provides Axum HTTP handlers for the attribute service:
//!
//! - **Front-channel endpoint** - HTTP-Redirect (GET) and HTTP-POST queries,
//!   answered with an auto-submitting form
//! - **SOAP endpoint** - back-channel queries, answered in the HTTP body
//!
//! # Example
//!
//! ```rust,ignore
//! use aa_protocol_saml::endpoints::{attribute_authority_router, AttributeAuthorityState};
//! use axum::Router;
//!
//! let app = Router::new()
//!     .merge(attribute_authority_router())
//!     .with_state(AttributeAuthorityState::new(processor));
//! ```

mod handlers;
mod router;
mod state;

pub use handlers::*;
pub use router::*;
pub use state::*;
