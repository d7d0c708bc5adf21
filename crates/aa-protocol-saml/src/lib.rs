//! SAML 2.0 Attribute Authority.
//!
//! This crate answers SAML `AttributeQuery` requests:
//!
//! - **Binding reception** - HTTP-Redirect, HTTP-POST and SOAP transports
//! - **Validation** - issuer and service provider checks against metadata
//! - **Attribute filtering** - requested attributes intersected with the catalog
//! - **Assertion/Response issuance** - bearer-confirmed, audience-restricted,
//!   time-bounded assertions wrapped in a signed `Response`
//! - **XML signature** - enveloped XML-DSig over both assertion and response
//!
//! # Architecture
//!
//! - [`types`] - Core SAML types and XML reading/writing
//! - [`catalog`] - Attributes the authority can release
//! - [`filter`] - Requested vs. available attribute intersection
//! - [`builder`] - Assertion and response construction
//! - [`signature`] - XML signature creation and credential selection
//! - [`bindings`] - Transport bindings and the binding dispatcher
//! - [`metadata`] - Entity configuration lookup
//! - [`runtime`] - Injectable clock and identifier generation
//! - [`processor`] - The query processing pipeline
//! - [`endpoints`] - Axum HTTP handlers
//! - [`error`] - Error types
//!
//! # Example
//!
//! ```rust,ignore
//! use aa_protocol_saml::endpoints::attribute_authority_router;
//!
//! let app = attribute_authority_router().with_state(state);
//! ```
//!
//! # SAML Specifications
//!
//! - [SAML 2.0 Core](https://docs.oasis-open.org/security/saml/v2.0/saml-core-2.0-os.pdf)
//! - [SAML 2.0 Bindings](https://docs.oasis-open.org/security/saml/v2.0/saml-bindings-2.0-os.pdf)
//! - [XML Signature](https://www.w3.org/TR/xmldsig-core1/)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bindings;
pub mod builder;
pub mod catalog;
pub mod endpoints;
pub mod error;
pub mod filter;
pub mod metadata;
pub mod processor;
pub mod runtime;
pub mod signature;
pub mod types;

pub use error::{ErrorKind, SamlError, SamlResult};
pub use types::*;
