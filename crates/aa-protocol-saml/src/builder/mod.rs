//! Assertion and response construction.
//!
//! Both builders take every time-dependent value from one [`IssueContext`],
//! so a response and its assertion always agree on `now` and on the query
//! they answer.

mod assertion;
mod response;

pub use assertion::*;
pub use response::*;

use chrono::{DateTime, Utc};

/// Per-query inputs shared by the assertion and response builders.
#[derive(Debug, Clone, Copy)]
pub struct IssueContext<'a> {
    /// Entity ID of the issuing authority.
    pub idp_entity_id: &'a str,
    /// Entity ID of the requesting SP (the audience).
    pub sp_entity_id: &'a str,
    /// ID of the query being answered.
    pub in_response_to: &'a str,
    /// The SP endpoint the response is delivered to.
    pub endpoint: &'a str,
    /// The single clock reading for this query.
    pub now: DateTime<Utc>,
}
