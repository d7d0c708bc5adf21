//! SAML 2.0 protocol types.
//!
//! This module contains the message types exchanged by the attribute
//! authority: the inbound `AttributeQuery`, the issued `Assertion` and the
//! `Response` that carries it.

mod assertion;
mod attribute_query;
mod constants;
mod name_id;
mod response;
mod status;
pub mod xml;

pub use assertion::*;
pub use attribute_query::*;
pub use constants::*;
pub use name_id::*;
pub use response::*;
pub use status::*;
