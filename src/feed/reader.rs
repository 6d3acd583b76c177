//! Round-trip reader for rendered RSS documents.
//!
//! Parses the channel-level metadata of an RSS 2.0 document back into a
//! [`ReadChannel`]. It understands the element and namespace prefixes the
//! renderer writes (`atom:`, `dc:`); it is a verification tool, not a
//! general-purpose RSS parser.

use chrono::{DateTime, FixedOffset};
use encoding_rs::Encoding;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::defaults::DEFAULT_ENCODING;
use super::error::ReadError;

/// Channel metadata read back from a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadChannel {
    /// Encoding from the XML declaration, `UTF-8` when undeclared.
    pub encoding: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub language: Option<String>,
    pub copyright: Option<String>,
    pub generator: Option<String>,
    /// From `<pubDate>`.
    pub date_modified: Option<DateTime<FixedOffset>>,
    pub last_build_date: Option<DateTime<FixedOffset>>,
    /// `href` of `<atom:link rel="self">`.
    pub feed_link: Option<String>,
    /// `xml:base` of the root element.
    pub base_url: Option<String>,
    pub authors: Vec<ReadAuthor>,
    pub categories: Vec<ReadCategory>,
    pub hubs: Vec<String>,
    pub image: Option<ReadImage>,
}

/// RSS only carries an author's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadAuthor {
    pub name: String,
}

/// A category as RSS exposes it.
///
/// RSS has no label, so `label` is always the term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadCategory {
    pub term: String,
    pub label: String,
    pub scheme: Option<String>,
}

/// Image sub-elements, as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadImage {
    pub uri: Option<String>,
    pub link: Option<String>,
    pub title: Option<String>,
    pub height: Option<String>,
    pub width: Option<String>,
    pub description: Option<String>,
}

/// Reads the channel metadata of an RSS document.
///
/// The declared encoding is honored: the bytes are decoded with
/// `encoding_rs` before parsing.
///
/// # Errors
///
/// Returns [`ReadError`] if the declaration names an unknown charset, the
/// bytes do not decode, the XML is malformed, the document has no
/// `<rss><channel>`, or a date element is not RFC 822.
///
/// # Security
///
/// `quick-xml` (0.37) never expands `<!ENTITY>` declarations; only the five
/// predefined entities and character references are resolved.
pub fn read_rss(bytes: &[u8]) -> Result<ReadChannel, ReadError> {
    let label = declared_encoding(bytes)?;
    let encoding = match &label {
        Some(label) => Encoding::for_label(label.as_bytes())
            .ok_or_else(|| ReadError::UnknownEncoding(label.clone()))?,
        None => encoding_rs::UTF_8,
    };

    let (text, malformed) = encoding.decode_without_bom_handling(bytes);
    if malformed {
        return Err(ReadError::Malformed(encoding.name().to_string()));
    }

    let mut channel = parse_channel(&text)?;
    channel.encoding = label.unwrap_or_else(|| DEFAULT_ENCODING.to_string());
    Ok(channel)
}

/// Extracts the `encoding` pseudo-attribute of the XML declaration.
///
/// The declaration is ASCII in every charset `encoding_rs` can decode
/// without a BOM, so it can be read before the document is decoded.
fn declared_encoding(bytes: &[u8]) -> Result<Option<String>, ReadError> {
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Decl(decl)) => {
                return match decl.encoding() {
                    Some(Ok(label)) => Ok(Some(String::from_utf8_lossy(&label).into_owned())),
                    Some(Err(e)) => Err(ReadError::Xml(e.to_string())),
                    None => Ok(None),
                };
            }
            Ok(Event::Start(_)) | Ok(Event::Empty(_)) | Ok(Event::Eof) => return Ok(None),
            Err(e) => return Err(ReadError::Xml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
}

fn parse_channel(content: &str) -> Result<ReadChannel, ReadError> {
    let mut reader = Reader::from_str(content);

    let mut channel = ReadChannel::default();
    let mut path: Vec<String> = Vec::new();
    let mut text = String::new();
    let mut category_scheme: Option<String> = None;
    let mut image: Option<ReadImage> = None;
    let mut seen_channel = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = element_name(&e);
                match (path.len(), name.as_str()) {
                    (0, "rss") => channel.base_url = attribute(&e, &reader, b"xml:base")?,
                    (0, _) => return Err(ReadError::NotRss),
                    (1, "channel") => seen_channel = true,
                    (2, "category") => category_scheme = attribute(&e, &reader, b"domain")?,
                    (2, "image") => image = Some(ReadImage::default()),
                    _ => {}
                }
                path.push(name);
                text.clear();
            }
            Ok(Event::Empty(e)) => {
                let name = element_name(&e);
                match (path.len(), name.as_str()) {
                    (0, _) => return Err(ReadError::NotRss),
                    (1, "channel") => seen_channel = true,
                    (2, "atom:link") => read_atom_link(&e, &reader, &mut channel)?,
                    _ => {}
                }
            }
            Ok(Event::Text(e)) => {
                let unescaped = e.unescape().map_err(|e| ReadError::Xml(e.to_string()))?;
                text.push_str(&unescaped);
            }
            Ok(Event::CData(e)) => {
                text.push_str(&String::from_utf8_lossy(&e));
            }
            Ok(Event::End(_)) => {
                let value = std::mem::take(&mut text);
                let segments: Vec<&str> = path.iter().map(String::as_str).collect();
                match segments.as_slice() {
                    ["rss", "channel", "image"] => channel.image = image.take(),
                    ["rss", "channel", field] => {
                        assign_channel_field(&mut channel, field, value, &mut category_scheme)?
                    }
                    ["rss", "channel", "image", field] => {
                        if let Some(image) = image.as_mut() {
                            assign_image_field(image, field, value);
                        }
                    }
                    _ => {}
                }
                path.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ReadError::Xml(e.to_string())),
            _ => {}
        }
    }

    if !seen_channel {
        return Err(ReadError::NotRss);
    }
    Ok(channel)
}

fn assign_channel_field(
    channel: &mut ReadChannel,
    field: &str,
    value: String,
    category_scheme: &mut Option<String>,
) -> Result<(), ReadError> {
    match field {
        "title" => channel.title = Some(value),
        "link" => channel.link = Some(value),
        "description" => channel.description = Some(value),
        "language" => channel.language = Some(value),
        "copyright" => channel.copyright = Some(value),
        "generator" => channel.generator = Some(value),
        "pubDate" => channel.date_modified = Some(parse_date(field, &value)?),
        "lastBuildDate" => channel.last_build_date = Some(parse_date(field, &value)?),
        "dc:creator" => channel.authors.push(ReadAuthor { name: value }),
        "category" => channel.categories.push(ReadCategory {
            label: value.clone(),
            term: value,
            scheme: category_scheme.take(),
        }),
        _ => {}
    }
    Ok(())
}

fn assign_image_field(image: &mut ReadImage, field: &str, value: String) {
    match field {
        "url" => image.uri = Some(value),
        "link" => image.link = Some(value),
        "title" => image.title = Some(value),
        "height" => image.height = Some(value),
        "width" => image.width = Some(value),
        "description" => image.description = Some(value),
        _ => {}
    }
}

fn read_atom_link(
    e: &BytesStart<'_>,
    reader: &Reader<&[u8]>,
    channel: &mut ReadChannel,
) -> Result<(), ReadError> {
    let rel = attribute(e, reader, b"rel")?;
    let href = attribute(e, reader, b"href")?;
    match (rel.as_deref(), href) {
        (Some("self"), Some(href)) => channel.feed_link = Some(href),
        (Some("hub"), Some(href)) => channel.hubs.push(href),
        _ => {}
    }
    Ok(())
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn attribute(
    e: &BytesStart<'_>,
    reader: &Reader<&[u8]>,
    key: &[u8],
) -> Result<Option<String>, ReadError> {
    for attr_result in e.attributes() {
        let attr = attr_result.map_err(|e| ReadError::Xml(e.to_string()))?;
        if attr.key.as_ref() == key {
            let value = attr
                .decode_and_unescape_value(reader.decoder())
                .map_err(|e| ReadError::Xml(e.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn parse_date(element: &str, value: &str) -> Result<DateTime<FixedOffset>, ReadError> {
    DateTime::parse_from_rfc2822(value.trim()).map_err(|_| ReadError::InvalidDate {
        element: element.to_string(),
        value: value.to_string(),
    })
}
