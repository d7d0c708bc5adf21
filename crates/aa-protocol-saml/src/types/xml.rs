//! Small helpers shared by the XML writers and readers.

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::events::BytesStart;

use crate::error::SamlResult;

/// Escapes XML special characters for use in text and attribute values.
#[must_use]
pub fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Formats a timestamp as an `xs:dateTime` in UTC (`2024-01-01T00:00:00Z`).
#[must_use]
pub fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Returns the local (unprefixed) name of an element.
pub(crate) fn local_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.local_name().as_ref()).into_owned()
}

/// Returns the unescaped value of an attribute, matched by local name.
pub(crate) fn attribute_value(element: &BytesStart<'_>, name: &str) -> SamlResult<Option<String>> {
    for attr in element.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == name.as_bytes() {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn escape_special_chars() {
        assert_eq!(xml_escape(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&apos;");
    }

    #[test]
    fn instant_format() {
        let instant = Utc.with_ymd_and_hms(2017, 9, 6, 11, 49, 27).unwrap();
        assert_eq!(format_instant(instant), "2017-09-06T11:49:27Z");
    }
}
