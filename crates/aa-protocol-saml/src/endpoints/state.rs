//! Attribute authority endpoint state.

use std::sync::Arc;

use crate::processor::QueryProcessor;

/// State shared by the attribute authority endpoints.
#[derive(Clone)]
pub struct AttributeAuthorityState {
    /// The processor answering every query.
    pub processor: Arc<QueryProcessor>,
}

impl AttributeAuthorityState {
    /// Creates the endpoint state.
    pub fn new(processor: QueryProcessor) -> Self {
        Self {
            processor: Arc::new(processor),
        }
    }
}
