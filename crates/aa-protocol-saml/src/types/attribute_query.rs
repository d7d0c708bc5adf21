//! SAML AttributeQuery types.
//!
//! An `AttributeQuery` asks the attribute authority for some or all attributes
//! of a named subject. Queries are decoded once from the wire and never
//! modified afterwards.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use crate::error::{SamlError, SamlResult};

use super::xml::{attribute_value, local_name};
use super::{AttributeNameFormat, NameId};

/// A decoded SAML `AttributeQuery`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeQuery {
    /// The request ID, echoed as `InResponseTo`.
    pub id: String,

    /// Content of `<saml:Issuer>`, `None` when the element is absent.
    pub issuer: Option<String>,

    /// The subject whose attributes are requested.
    pub subject: NameId,

    /// The `Destination` attribute, if present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,

    /// The requested attributes, in request order.
    #[serde(default)]
    pub requested_attributes: Vec<RequestedAttribute>,
}

/// An attribute named in an `AttributeQuery`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedAttribute {
    /// The attribute name.
    pub name: String,

    /// The attribute name format (`unspecified` when absent).
    #[serde(default)]
    pub name_format: AttributeNameFormat,

    /// A human-readable name for the attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,

    /// Specific values asked for; empty means "all values".
    #[serde(default)]
    pub values: Vec<String>,
}

impl RequestedAttribute {
    /// Creates a request for all values of an attribute.
    #[must_use]
    pub fn new(name: impl Into<String>, name_format: AttributeNameFormat) -> Self {
        Self {
            name: name.into(),
            name_format,
            friendly_name: None,
            values: Vec::new(),
        }
    }

    /// Restricts the request to the given values.
    #[must_use]
    pub fn with_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values = values.into_iter().map(Into::into).collect();
        self
    }
}

/// A decoded SAML protocol message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolMessage {
    /// An attribute query.
    AttributeQuery(AttributeQuery),
    /// Any other message, identified by its root element's local name.
    Other(String),
}

impl ProtocolMessage {
    /// Decodes a protocol message from XML.
    ///
    /// Only `AttributeQuery` is parsed in full; any other root element is
    /// reported by name so the caller can reject it.
    pub fn from_xml(xml: &str) -> SamlResult<Self> {
        QueryReader::new(xml).read()
    }
}

/// Where character data is currently being collected.
enum TextTarget {
    Issuer,
    NameId,
    AttributeValue,
}

/// Partially decoded query.
struct QueryDraft {
    id: String,
    destination: Option<String>,
    issuer: Option<String>,
    subject: Option<NameId>,
    attributes: Vec<RequestedAttribute>,
}

struct QueryReader<'a> {
    reader: Reader<&'a [u8]>,
    stack: Vec<String>,
    draft: Option<QueryDraft>,
    target: Option<TextTarget>,
}

impl<'a> QueryReader<'a> {
    fn new(xml: &'a str) -> Self {
        // Character data is kept verbatim; whitespace between elements is
        // dropped because no text target is open there.
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(false);
        Self {
            reader,
            stack: Vec::new(),
            draft: None,
            target: None,
        }
    }

    fn read(mut self) -> SamlResult<ProtocolMessage> {
        loop {
            match self.reader.read_event()? {
                Event::Start(e) => {
                    let name = local_name(&e);
                    if let Some(other) = self.open(&name, &e)? {
                        return Ok(ProtocolMessage::Other(other));
                    }
                    self.stack.push(name);
                }
                Event::Empty(e) => {
                    let name = local_name(&e);
                    if let Some(other) = self.open(&name, &e)? {
                        return Ok(ProtocolMessage::Other(other));
                    }
                    self.target = None;
                }
                Event::Text(t) => {
                    let text = t.unescape()?;
                    self.push_text(&text);
                }
                Event::CData(c) => {
                    let text = String::from_utf8_lossy(&c).into_owned();
                    self.push_text(&text);
                }
                Event::End(_) => {
                    self.stack.pop();
                    self.target = None;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        let draft = self
            .draft
            .ok_or_else(|| SamlError::XmlParse("document has no root element".to_string()))?;
        let subject = draft
            .subject
            .ok_or_else(|| SamlError::MissingElement("Subject/NameID".to_string()))?;

        Ok(ProtocolMessage::AttributeQuery(AttributeQuery {
            id: draft.id,
            issuer: draft.issuer,
            subject,
            destination: draft.destination,
            requested_attributes: draft.attributes,
        }))
    }

    /// Handles an opening tag. Returns the root name if the message is not a query.
    fn open(&mut self, name: &str, element: &BytesStart<'_>) -> SamlResult<Option<String>> {
        let path: Vec<&str> = self.stack.iter().map(String::as_str).collect();

        match (path.as_slice(), name) {
            ([], "AttributeQuery") => {
                let id = attribute_value(element, "ID")?
                    .ok_or_else(|| SamlError::MissingElement("AttributeQuery ID".to_string()))?;
                self.draft = Some(QueryDraft {
                    id,
                    destination: attribute_value(element, "Destination")?,
                    issuer: None,
                    subject: None,
                    attributes: Vec::new(),
                });
            }
            ([], other) => return Ok(Some(other.to_string())),
            (["AttributeQuery"], "Issuer") => {
                if let Some(draft) = self.draft.as_mut() {
                    draft.issuer = Some(String::new());
                }
                self.target = Some(TextTarget::Issuer);
            }
            (["AttributeQuery", "Subject"], "NameID") => {
                let mut name_id = NameId::new(String::new());
                name_id.format = attribute_value(element, "Format")?;
                name_id.name_qualifier = attribute_value(element, "NameQualifier")?;
                name_id.sp_name_qualifier = attribute_value(element, "SPNameQualifier")?;
                if let Some(draft) = self.draft.as_mut() {
                    draft.subject = Some(name_id);
                }
                self.target = Some(TextTarget::NameId);
            }
            (["AttributeQuery"], "Attribute") => {
                let attr_name = attribute_value(element, "Name")?
                    .ok_or_else(|| SamlError::MissingElement("Attribute Name".to_string()))?;
                let name_format = attribute_value(element, "NameFormat")?
                    .map(|uri| AttributeNameFormat::from_uri(&uri))
                    .unwrap_or_default();
                let mut requested = RequestedAttribute::new(attr_name, name_format);
                requested.friendly_name = attribute_value(element, "FriendlyName")?;
                if let Some(draft) = self.draft.as_mut() {
                    draft.attributes.push(requested);
                }
            }
            (["AttributeQuery", "Attribute"], "AttributeValue") => {
                if let Some(attr) = self.draft.as_mut().and_then(|d| d.attributes.last_mut()) {
                    attr.values.push(String::new());
                }
                self.target = Some(TextTarget::AttributeValue);
            }
            _ => {}
        }

        Ok(None)
    }

    fn push_text(&mut self, text: &str) {
        let Some(draft) = self.draft.as_mut() else {
            return;
        };
        let slot = match self.target {
            Some(TextTarget::Issuer) => draft.issuer.as_mut(),
            Some(TextTarget::NameId) => draft.subject.as_mut().map(|s| &mut s.value),
            Some(TextTarget::AttributeValue) => draft
                .attributes
                .last_mut()
                .and_then(|a| a.values.last_mut()),
            None => None,
        };
        if let Some(slot) = slot {
            slot.push_str(text);
        }
    }
}
