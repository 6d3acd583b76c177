use quick_xml::escape::escape;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::Writer;
use std::borrow::Cow;
use std::io::Cursor;

use super::dom::{Element, Node};
use super::error::RenderError;
use super::rss::RenderedDocument;

/// Serializes a rendered document to bytes in its declared encoding.
///
/// The tree is written as UTF-8 through `quick_xml::Writer`. Text and
/// attribute values have `<`, `>`, `&`, `'` and `"` escaped, and whitespace
/// that XML parsers would normalize away is written as character
/// references, so every value reads back unchanged. Non-UTF-8
/// charsets are produced by transcoding the finished document; every text
/// value was checked for representability during validation, so a failed
/// transcode indicates a broken tree rather than bad input.
///
/// # Errors
///
/// - [`RenderError::Xml`] if the writer fails
/// - [`RenderError::Encoding`] if transcoding hits an unmappable character
pub fn serialize(document: &RenderedDocument) -> Result<Vec<u8>, RenderError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new(
            "1.0",
            Some(document.encoding()),
            None,
        )))
        .map_err(xml_error)?;
    write_element(&mut writer, document.root())?;

    let utf8 = String::from_utf8(writer.into_inner().into_inner())
        .map_err(|e| RenderError::Xml(format!("writer produced invalid UTF-8: {}", e)))?;

    let charset = document.charset();
    if charset == encoding_rs::UTF_8 {
        return Ok(utf8.into_bytes());
    }

    let (bytes, _, unmappable) = charset.encode(&utf8);
    if unmappable {
        return Err(RenderError::Encoding {
            encoding: document.encoding().to_string(),
            reason: "document contains characters the charset cannot represent".to_string(),
        });
    }
    tracing::debug!(
        encoding = document.encoding(),
        bytes = bytes.len(),
        "Transcoded RSS document"
    );
    Ok(bytes.into_owned())
}

fn write_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    element: &Element,
) -> Result<(), RenderError> {
    let mut start = BytesStart::new(element.name());
    for (name, value) in element.attributes() {
        start.push_attribute(Attribute {
            key: QName(name.as_bytes()),
            value: match escape_attribute(value) {
                Cow::Borrowed(v) => Cow::Borrowed(v.as_bytes()),
                Cow::Owned(v) => Cow::Owned(v.into_bytes()),
            },
        });
    }

    if element.children().is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(xml_error);
    }

    writer.write_event(Event::Start(start)).map_err(xml_error)?;
    for child in element.children() {
        match child {
            Node::Element(child) => write_element(writer, child)?,
            Node::Text(text) => writer
                .write_event(Event::Text(BytesText::from_escaped(escape_text(text))))
                .map_err(xml_error)?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name())))
        .map_err(xml_error)
}

/// Line-end handling turns a literal CR into LF.
fn escape_text(text: &str) -> Cow<'_, str> {
    let escaped = escape(text);
    if escaped.contains('\r') {
        Cow::Owned(escaped.replace('\r', "&#xD;"))
    } else {
        escaped
    }
}

/// Attribute-value normalization also turns tabs and newlines into spaces.
fn escape_attribute(value: &str) -> Cow<'_, str> {
    let escaped = escape(value);
    if escaped.contains(|c: char| matches!(c, '\t' | '\n' | '\r')) {
        Cow::Owned(
            escaped
                .replace('\t', "&#x9;")
                .replace('\n', "&#xA;")
                .replace('\r', "&#xD;"),
        )
    } else {
        escaped
    }
}

fn xml_error(e: impl std::fmt::Display) -> RenderError {
    RenderError::Xml(e.to_string())
}
