//! SAML Name ID types.
//!
//! Name identifiers name the subject of an attribute query and are echoed
//! unchanged into the issued assertion.

use serde::{Deserialize, Serialize};

use super::name_id_formats;
use super::xml::xml_escape;

/// SAML Name ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameId {
    /// The actual identifier value.
    pub value: String,

    /// The format of the name identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// The security or administrative domain that qualifies the name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_qualifier: Option<String>,

    /// The service provider's entity ID that qualifies the name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sp_name_qualifier: Option<String>,
}

impl NameId {
    /// Creates a new name ID with the given value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            format: None,
            name_qualifier: None,
            sp_name_qualifier: None,
        }
    }

    /// Creates a new persistent name ID.
    #[must_use]
    pub fn persistent(value: impl Into<String>) -> Self {
        Self::new(value).with_format(name_id_formats::PERSISTENT)
    }

    /// Creates a new transient name ID.
    #[must_use]
    pub fn transient(value: impl Into<String>) -> Self {
        Self::new(value).with_format(name_id_formats::TRANSIENT)
    }

    /// Sets the format URI for this name ID.
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Sets the name qualifier.
    #[must_use]
    pub fn with_name_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.name_qualifier = Some(qualifier.into());
        self
    }

    /// Sets the SP name qualifier.
    #[must_use]
    pub fn with_sp_name_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.sp_name_qualifier = Some(qualifier.into());
        self
    }

    /// Writes this name ID as a `<saml:NameID>` element.
    pub(crate) fn write_xml(&self, out: &mut String) {
        out.push_str("<saml:NameID");
        if let Some(ref qualifier) = self.name_qualifier {
            out.push_str(&format!(r#" NameQualifier="{}""#, xml_escape(qualifier)));
        }
        if let Some(ref qualifier) = self.sp_name_qualifier {
            out.push_str(&format!(r#" SPNameQualifier="{}""#, xml_escape(qualifier)));
        }
        if let Some(ref format) = self.format {
            out.push_str(&format!(r#" Format="{}""#, xml_escape(format)));
        }
        out.push('>');
        out.push_str(&xml_escape(&self.value));
        out.push_str("</saml:NameID>");
    }
}
