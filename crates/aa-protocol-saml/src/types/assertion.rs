//! SAML Assertion types.
//!
//! The attribute authority issues assertions carrying a single attribute
//! statement about the queried subject, bound to the requesting SP by an
//! audience restriction and a bearer subject confirmation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::xml::{format_instant, xml_escape};
use super::{AttributeNameFormat, NameId, CM_BEARER, SAML_NS, XSI_NS, XS_NS};

/// SAML Assertion.
///
/// A package of statements about a subject made by the attribute authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assertion {
    /// Unique identifier for this assertion.
    pub id: String,

    /// Timestamp when this assertion was issued.
    pub issue_instant: DateTime<Utc>,

    /// The entity ID of the authority that issued this assertion.
    pub issuer: String,

    /// The subject of this assertion.
    pub subject: Subject,

    /// Validity window and audience.
    pub conditions: Conditions,

    /// Released attributes. `None` when nothing was released.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute_statement: Option<AttributeStatement>,
}

impl Assertion {
    /// Serializes the assertion as an unsigned `<saml:Assertion>` element.
    #[must_use]
    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(1024);
        out.push_str(&format!(
            r#"<saml:Assertion xmlns:saml="{SAML_NS}" xmlns:xsi="{XSI_NS}" xmlns:xs="{XS_NS}" ID="{}" Version="2.0" IssueInstant="{}">"#,
            xml_escape(&self.id),
            format_instant(self.issue_instant),
        ));
        out.push_str(&format!(
            "<saml:Issuer>{}</saml:Issuer>",
            xml_escape(&self.issuer)
        ));
        self.subject.write_xml(&mut out);
        self.conditions.write_xml(&mut out);
        if let Some(ref statement) = self.attribute_statement {
            statement.write_xml(&mut out);
        }
        out.push_str("</saml:Assertion>");
        out
    }
}

/// Subject of an assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// The name identifier copied from the query.
    pub name_id: NameId,

    /// How the relying party may confirm the subject.
    pub subject_confirmation: SubjectConfirmation,
}

impl Subject {
    fn write_xml(&self, out: &mut String) {
        out.push_str("<saml:Subject>");
        self.name_id.write_xml(out);
        self.subject_confirmation.write_xml(out);
        out.push_str("</saml:Subject>");
    }
}

/// Subject confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectConfirmation {
    /// The confirmation method URI.
    pub method: String,

    /// Confirmation constraints.
    pub data: SubjectConfirmationData,
}

impl SubjectConfirmation {
    /// Creates a bearer confirmation.
    #[must_use]
    pub fn bearer(data: SubjectConfirmationData) -> Self {
        Self {
            method: CM_BEARER.to_string(),
            data,
        }
    }

    fn write_xml(&self, out: &mut String) {
        out.push_str(&format!(
            r#"<saml:SubjectConfirmation Method="{}">"#,
            xml_escape(&self.method)
        ));
        out.push_str(&format!(
            r#"<saml:SubjectConfirmationData NotOnOrAfter="{}" Recipient="{}" InResponseTo="{}"/>"#,
            format_instant(self.data.not_on_or_after),
            xml_escape(&self.data.recipient),
            xml_escape(&self.data.in_response_to),
        ));
        out.push_str("</saml:SubjectConfirmation>");
    }
}

/// Subject confirmation data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectConfirmationData {
    /// Time at or after which the subject can no longer be confirmed.
    pub not_on_or_after: DateTime<Utc>,

    /// The endpoint to which the assertion is delivered.
    pub recipient: String,

    /// The ID of the query this assertion answers.
    pub in_response_to: String,
}

/// Conditions for assertion validity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conditions {
    /// Time before which the assertion is not valid.
    pub not_before: DateTime<Utc>,

    /// Time at or after which the assertion is not valid.
    pub not_on_or_after: DateTime<Utc>,

    /// The audience the assertion is restricted to.
    pub audience_restriction: AudienceRestriction,
}

impl Conditions {
    fn write_xml(&self, out: &mut String) {
        out.push_str(&format!(
            r#"<saml:Conditions NotBefore="{}" NotOnOrAfter="{}">"#,
            format_instant(self.not_before),
            format_instant(self.not_on_or_after),
        ));
        out.push_str("<saml:AudienceRestriction>");
        for audience in &self.audience_restriction.audiences {
            out.push_str(&format!(
                "<saml:Audience>{}</saml:Audience>",
                xml_escape(audience)
            ));
        }
        out.push_str("</saml:AudienceRestriction></saml:Conditions>");
    }
}

/// Audience restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudienceRestriction {
    /// List of valid audiences.
    pub audiences: Vec<String>,
}

/// Attribute statement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeStatement {
    /// Released attributes, in release order.
    pub attributes: Vec<Attribute>,
}

impl AttributeStatement {
    fn write_xml(&self, out: &mut String) {
        out.push_str("<saml:AttributeStatement>");
        for attribute in &self.attributes {
            attribute.write_xml(out);
        }
        out.push_str("</saml:AttributeStatement>");
    }
}

/// SAML Attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// The attribute name.
    pub name: String,

    /// The format of the attribute name.
    pub name_format: AttributeNameFormat,

    /// The attribute values.
    pub values: Vec<String>,
}

impl Attribute {
    /// Creates a new attribute.
    #[must_use]
    pub fn new(name: impl Into<String>, name_format: AttributeNameFormat, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            name_format,
            values,
        }
    }

    fn write_xml(&self, out: &mut String) {
        out.push_str(&format!(
            r#"<saml:Attribute Name="{}" NameFormat="{}">"#,
            xml_escape(&self.name),
            xml_escape(self.name_format.uri()),
        ));
        for value in &self.values {
            out.push_str(&format!(
                r#"<saml:AttributeValue xsi:type="xs:string">{}</saml:AttributeValue>"#,
                xml_escape(value)
            ));
        }
        out.push_str("</saml:Attribute>");
    }
}

/// An assertion together with its signed XML serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedAssertion {
    /// The assertion content.
    pub assertion: Assertion,

    /// Serialized `<saml:Assertion>` carrying an enveloped signature.
    pub xml: String,
}
