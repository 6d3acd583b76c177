use chrono::{DateTime, Datelike, FixedOffset};
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252, WINDOWS_1254, WINDOWS_874};

use super::defaults::DEFAULT_ENCODING;
use super::descriptor::{FeedDescriptor, Image, ImageDimension};
use super::error::RenderError;
use crate::util::{find_invalid_xml_char, validate_uri, validate_url};

/// RSS 2.0: maximum value for an image height.
pub const MAX_IMAGE_HEIGHT: i64 = 400;
/// RSS 2.0: maximum value for an image width.
pub const MAX_IMAGE_WIDTH: i64 = 144;

/// RFC 822 dates carry a four-digit, non-negative year.
const RFC822_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

/// Labels `encoding_rs` resolves to windows-1252 that actually name US-ASCII.
const ASCII_LABELS: [&str; 3] = ["ansi_x3.4-1968", "ascii", "us-ascii"];

/// Mandatory channel values of a descriptor that passed validation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ValidatedChannel<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub link: &'a str,
    pub encoding_label: &'a str,
    pub encoding: &'static Encoding,
}

/// What the declared charset can hold, beyond what its `encoding_rs`
/// counterpart can encode.
///
/// WHATWG maps ISO-8859-1, ISO-8859-9 and ISO-8859-11 labels onto their
/// Windows supersets and US-ASCII onto windows-1252. The declaration keeps
/// the caller's label, so text must also fit the narrower charset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Repertoire {
    /// Everything the resolved encoding can encode.
    Full,
    /// Seven-bit characters only.
    Ascii,
    /// No bytes in 0x80..=0x9F, which the ISO-8859 parts leave to C1 controls.
    NoC1,
}

impl Repertoire {
    pub(crate) fn for_label(label: &str, encoding: &'static Encoding) -> Self {
        let label = label.trim().to_ascii_lowercase();
        if encoding == WINDOWS_1252 && ASCII_LABELS.contains(&label.as_str()) {
            return Repertoire::Ascii;
        }
        let windows_superset = [WINDOWS_1252, WINDOWS_1254, WINDOWS_874].contains(&encoding);
        let windows_label = ["windows-", "cp125", "x-cp125", "dos-"]
            .iter()
            .any(|prefix| label.starts_with(prefix));
        if windows_superset && !windows_label {
            Repertoire::NoC1
        } else {
            Repertoire::Full
        }
    }

    fn allows(self, encoded: &[u8]) -> bool {
        match self {
            Repertoire::Full => true,
            Repertoire::Ascii => encoded.is_ascii(),
            Repertoire::NoC1 => !encoded.iter().any(|b| (0x80..=0x9F).contains(b)),
        }
    }
}

/// Checks a resolved descriptor against the RSS 2.0 channel rules.
///
/// Runs in a fixed order so the first failure is deterministic: the three
/// mandatory fields, the image, every other present field, and finally the
/// character-level checks on all text that will be written. Returns the
/// mandatory values together with the charset the document will be
/// written in.
pub(crate) fn validate(feed: &FeedDescriptor) -> Result<ValidatedChannel<'_>, RenderError> {
    let title = required_text(feed.title.as_deref(), "title")?;
    let description = required_text(feed.description.as_deref(), "description")?;
    let link = required_text(feed.link.as_deref(), "link")?;
    check_url("link", link)?;

    if let Some(image) = &feed.image {
        validate_image(image)?;
    }

    let label = feed.encoding.as_deref().unwrap_or(DEFAULT_ENCODING);
    let encoding = resolve_encoding(label)?;

    optional_text(feed.language.as_deref(), "language")?;
    optional_text(feed.copyright.as_deref(), "copyright")?;
    check_date("date_modified", feed.date_modified.as_ref())?;
    check_date("last_build_date", feed.last_build_date.as_ref())?;

    if let Some(generator) = &feed.generator {
        if generator.name.is_empty() {
            return Err(RenderError::invalid("generator.name", "must not be empty"));
        }
        optional_text(generator.version.as_deref(), "generator.version")?;
        if let Some(uri) = &generator.uri {
            check_uri("generator.uri", uri)?;
        }
    }

    for (format, url) in feed.feed_links.iter() {
        check_url(&format!("feed_links.{}", format.as_str()), url)?;
    }
    if let Some(base_url) = &feed.base_url {
        check_url("base_url", base_url)?;
    }

    for (i, author) in feed.authors.iter().enumerate() {
        if author.name.is_empty() {
            return Err(RenderError::invalid(
                format!("authors[{}].name", i),
                "must not be empty",
            ));
        }
    }

    for (i, category) in feed.categories.iter().enumerate() {
        if category.term.is_empty() {
            return Err(RenderError::invalid(
                format!("categories[{}].term", i),
                "must not be empty",
            ));
        }
        if let Some(scheme) = &category.scheme {
            check_uri(&format!("categories[{}].scheme", i), scheme)?;
        }
    }

    for (i, hub) in feed.hubs.iter().enumerate() {
        check_url(&format!("hubs[{}]", i), hub)?;
    }

    let repertoire = Repertoire::for_label(label, encoding);
    for (path, text) in projected_text(feed) {
        check_text(&path, text, label, encoding, repertoire)?;
    }

    Ok(ValidatedChannel {
        title,
        description,
        link,
        encoding_label: label,
        encoding,
    })
}

fn validate_image(image: &Image) -> Result<(), RenderError> {
    let uri = required_image_text(image.uri.as_deref(), "image.uri")?;
    check_url("image.uri", uri)?;
    let link = required_image_text(image.link.as_deref(), "image.link")?;
    check_url("image.link", link)?;
    required_image_text(image.title.as_deref(), "image.title")?;

    if let Some(height) = &image.height {
        check_dimension("image.height", height, MAX_IMAGE_HEIGHT)?;
    }
    if let Some(width) = &image.width {
        check_dimension("image.width", width, MAX_IMAGE_WIDTH)?;
    }
    if let Some(description) = &image.description {
        if description.is_empty() {
            return Err(RenderError::invalid("image.description", "must not be empty"));
        }
    }

    Ok(())
}

fn required_text<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str, RenderError> {
    match value {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(RenderError::MissingRequiredField(name)),
    }
}

/// Image sub-fields are only required once the image itself is present,
/// so they report as invalid rather than missing.
fn required_image_text<'a>(value: Option<&'a str>, path: &str) -> Result<&'a str, RenderError> {
    match value {
        Some(text) if !text.is_empty() => Ok(text),
        Some(_) => Err(RenderError::invalid(path, "must not be empty")),
        None => Err(RenderError::invalid(path, "is required when an image is set")),
    }
}

fn optional_text(value: Option<&str>, path: &str) -> Result<(), RenderError> {
    match value {
        Some("") => Err(RenderError::invalid(path, "must not be empty")),
        _ => Ok(()),
    }
}

fn check_dimension(path: &str, value: &ImageDimension, max: i64) -> Result<(), RenderError> {
    match value.as_integer() {
        Some(n) if (1..=max).contains(&n) => Ok(()),
        _ => Err(RenderError::invalid(
            path,
            format!("must be an integer between 1 and {}", max),
        )),
    }
}

fn check_date(path: &str, date: Option<&DateTime<FixedOffset>>) -> Result<(), RenderError> {
    match date {
        Some(date) if !RFC822_YEARS.contains(&date.year()) => Err(RenderError::invalid(
            path,
            format!("year {} cannot be written as an RFC 822 date", date.year()),
        )),
        _ => Ok(()),
    }
}

fn check_url(path: &str, url: &str) -> Result<(), RenderError> {
    validate_url(url)
        .map(|_| ())
        .map_err(|e| RenderError::invalid(path, e.to_string()))
}

fn check_uri(path: &str, uri: &str) -> Result<(), RenderError> {
    validate_uri(uri)
        .map(|_| ())
        .map_err(|e| RenderError::invalid(path, e.to_string()))
}

/// Looks up a charset label and makes sure documents can be written in it.
///
/// UTF-16 and the replacement encoding decode fine but `encoding_rs` cannot
/// produce them, so they are rejected here rather than at serialization.
pub(crate) fn resolve_encoding(label: &str) -> Result<&'static Encoding, RenderError> {
    if label.is_empty() {
        return Err(RenderError::invalid("encoding", "must not be empty"));
    }
    let encoding = Encoding::for_label(label.as_bytes()).ok_or_else(|| {
        RenderError::invalid("encoding", format!("unknown character set '{}'", label))
    })?;
    if encoding.output_encoding() != encoding {
        return Err(RenderError::Encoding {
            encoding: label.to_string(),
            reason: "documents cannot be written in this charset".to_string(),
        });
    }
    Ok(encoding)
}

fn check_text(
    path: &str,
    text: &str,
    label: &str,
    encoding: &'static Encoding,
    repertoire: Repertoire,
) -> Result<(), RenderError> {
    if let Some((_, c)) = find_invalid_xml_char(text) {
        return Err(RenderError::invalid(
            path,
            format!("contains character U+{:04X} not allowed in XML", c as u32),
        ));
    }
    if encoding != UTF_8 {
        let (encoded, _, unmappable) = encoding.encode(text);
        if unmappable || !repertoire.allows(&encoded) {
            return Err(RenderError::Encoding {
                encoding: label.to_string(),
                reason: format!("{} contains characters the charset cannot represent", path),
            });
        }
    }
    Ok(())
}

/// Every text value the renderer writes into the document, with its path.
fn projected_text(feed: &FeedDescriptor) -> Vec<(String, &str)> {
    let generator = feed.generator.as_ref();
    let image = feed.image.as_ref();
    let scalars = [
        ("title", feed.title.as_deref()),
        ("description", feed.description.as_deref()),
        ("link", feed.link.as_deref()),
        ("language", feed.language.as_deref()),
        ("copyright", feed.copyright.as_deref()),
        ("base_url", feed.base_url.as_deref()),
        ("feed_links.rss", feed.feed_links.rss.as_deref()),
        ("generator.name", generator.map(|g| g.name.as_str())),
        ("generator.version", generator.and_then(|g| g.version.as_deref())),
        ("generator.uri", generator.and_then(|g| g.uri.as_deref())),
        ("image.uri", image.and_then(|i| i.uri.as_deref())),
        ("image.link", image.and_then(|i| i.link.as_deref())),
        ("image.title", image.and_then(|i| i.title.as_deref())),
        ("image.description", image.and_then(|i| i.description.as_deref())),
    ];

    let mut fields: Vec<(String, &str)> = scalars
        .into_iter()
        .filter_map(|(path, value)| value.map(|text| (path.to_string(), text)))
        .collect();

    for (i, category) in feed.categories.iter().enumerate() {
        fields.push((format!("categories[{}].term", i), category.term.as_str()));
        if let Some(scheme) = &category.scheme {
            fields.push((format!("categories[{}].scheme", i), scheme.as_str()));
        }
    }
    for (i, author) in feed.authors.iter().enumerate() {
        fields.push((format!("authors[{}].name", i), author.name.as_str()));
    }
    for (i, hub) in feed.hubs.iter().enumerate() {
        fields.push((format!("hubs[{}]", i), hub.as_str()));
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::descriptor::{Author, Category, Generator};

    fn valid() -> FeedDescriptor {
        FeedDescriptor {
            title: Some("This is a test feed.".to_string()),
            description: Some("This is a test description.".to_string()),
            link: Some("http://www.example.com".to_string()),
            ..Default::default()
        }
    }

    fn image() -> Image {
        Image {
            uri: Some("http://www.example.com/logo.gif".to_string()),
            link: Some("http://www.example.com".to_string()),
            title: Some("Image ALT".to_string()),
            ..Default::default()
        }
    }

    fn invalid_path<T: std::fmt::Debug>(result: Result<T, RenderError>) -> String {
        match result {
            Err(RenderError::InvalidField { path, .. }) => path,
            other => panic!("expected InvalidField, got {:?}", other),
        }
    }

    #[test]
    fn test_minimal_descriptor_is_valid() {
        let descriptor = valid();
        let channel = validate(&descriptor).unwrap();
        assert_eq!(channel.title, "This is a test feed.");
        assert_eq!(channel.link, "http://www.example.com");
        assert_eq!(channel.encoding_label, "UTF-8");
        assert_eq!(channel.encoding, UTF_8);
    }

    #[test]
    fn test_missing_fields_reported_in_order() {
        let empty = FeedDescriptor::default();
        assert_eq!(
            validate(&empty).unwrap_err(),
            RenderError::MissingRequiredField("title")
        );

        let mut feed = valid();
        feed.description = None;
        feed.link = None;
        assert_eq!(
            validate(&feed).unwrap_err(),
            RenderError::MissingRequiredField("description")
        );
    }

    #[test]
    fn test_empty_required_field_is_missing() {
        let mut feed = valid();
        feed.link = Some(String::new());
        assert_eq!(
            validate(&feed).unwrap_err(),
            RenderError::MissingRequiredField("link")
        );
    }

    #[test]
    fn test_malformed_link_is_invalid() {
        let mut feed = valid();
        feed.link = Some("www.example.com".to_string());
        assert_eq!(invalid_path(validate(&feed)), "link");
    }

    #[test]
    fn test_image_dimension_bounds() {
        for (height, ok) in [("1", true), ("400", true), ("0", false), ("401", false)] {
            let mut feed = valid();
            feed.image = Some(Image {
                height: Some(height.into()),
                ..image()
            });
            assert_eq!(validate(&feed).is_ok(), ok, "height {}", height);
        }
        for (width, ok) in [(1i64, true), (144, true), (0, false), (145, false)] {
            let mut feed = valid();
            feed.image = Some(Image {
                width: Some(width.into()),
                ..image()
            });
            assert_eq!(validate(&feed).is_ok(), ok, "width {}", width);
        }
    }

    #[test]
    fn test_image_checked_before_optional_fields() {
        let mut feed = valid();
        feed.language = Some(String::new());
        feed.image = Some(Image {
            title: None,
            ..image()
        });
        assert_eq!(invalid_path(validate(&feed)), "image.title");
    }

    #[test]
    fn test_unknown_encoding_rejected() {
        let mut feed = valid();
        feed.encoding = Some("klingon-8".to_string());
        assert_eq!(invalid_path(validate(&feed)), "encoding");
    }

    #[test]
    fn test_utf16_cannot_be_written() {
        let mut feed = valid();
        feed.encoding = Some("UTF-16".to_string());
        assert!(matches!(
            validate(&feed),
            Err(RenderError::Encoding { .. })
        ));
    }

    #[test]
    fn test_legacy_encoding_resolved() {
        let mut feed = valid();
        feed.encoding = Some("iso-8859-1".to_string());
        let channel = validate(&feed).unwrap();
        assert_eq!(channel.encoding_label, "iso-8859-1");
        assert_eq!(channel.encoding, encoding_rs::WINDOWS_1252);
    }

    #[test]
    fn test_unrepresentable_text_rejected() {
        let mut feed = valid();
        feed.encoding = Some("iso-8859-1".to_string());
        feed.copyright = Some("© 2009 世界".to_string());
        match validate(&feed) {
            Err(RenderError::Encoding { encoding, reason }) => {
                assert_eq!(encoding, "iso-8859-1");
                assert!(reason.starts_with("copyright"));
            }
            other => panic!("expected Encoding error, got {:?}", other),
        }
    }

    fn encoding_error(feed: &FeedDescriptor) -> (String, String) {
        match validate(feed) {
            Err(RenderError::Encoding { encoding, reason }) => (encoding, reason),
            other => panic!("expected Encoding error, got {:?}", other),
        }
    }

    #[test]
    fn test_us_ascii_rejects_non_ascii_text() {
        let mut feed = valid();
        feed.encoding = Some("us-ascii".to_string());
        feed.title = Some("é".to_string());
        let (encoding, reason) = encoding_error(&feed);
        assert_eq!(encoding, "us-ascii");
        assert!(reason.starts_with("title"));

        feed.title = Some("plain <ascii> & more".to_string());
        assert!(validate(&feed).is_ok());
    }

    #[test]
    fn test_latin1_rejects_windows_1252_extras() {
        for label in ["iso-8859-1", "latin1", "ISO_8859-1"] {
            let mut feed = valid();
            feed.encoding = Some(label.to_string());
            feed.description = Some("5 €".to_string());
            let (encoding, reason) = encoding_error(&feed);
            assert_eq!(encoding, label);
            assert!(reason.starts_with("description"));
        }
    }

    #[test]
    fn test_windows_1252_keeps_its_extras() {
        let mut feed = valid();
        feed.encoding = Some("windows-1252".to_string());
        feed.description = Some("5 € “quoted”".to_string());
        assert!(validate(&feed).is_ok());
    }

    #[test]
    fn test_repertoire_for_label() {
        assert_eq!(Repertoire::for_label("US-ASCII", WINDOWS_1252), Repertoire::Ascii);
        assert_eq!(Repertoire::for_label("iso-8859-1", WINDOWS_1252), Repertoire::NoC1);
        assert_eq!(Repertoire::for_label("iso-8859-9", WINDOWS_1254), Repertoire::NoC1);
        assert_eq!(Repertoire::for_label("tis-620", WINDOWS_874), Repertoire::NoC1);
        assert_eq!(Repertoire::for_label("cp1252", WINDOWS_1252), Repertoire::Full);
        assert_eq!(Repertoire::for_label("windows-874", WINDOWS_874), Repertoire::Full);
        assert_eq!(Repertoire::for_label("iso-8859-2", encoding_rs::ISO_8859_2), Repertoire::Full);
    }

    #[test]
    fn test_dates_outside_rfc822_years_rejected() {
        let mut feed = valid();
        feed.date_modified = crate::feed::descriptor::timestamp(253_402_300_800);
        assert_eq!(invalid_path(validate(&feed)), "date_modified");

        let mut feed = valid();
        feed.last_build_date = crate::feed::descriptor::timestamp(-62_167_219_201);
        assert_eq!(invalid_path(validate(&feed)), "last_build_date");

        let mut feed = valid();
        feed.date_modified = crate::feed::descriptor::timestamp(253_402_300_799);
        assert!(validate(&feed).is_ok());
    }

    #[test]
    fn test_control_characters_rejected() {
        let mut feed = valid();
        feed.title = Some("bad\u{1}title".to_string());
        assert_eq!(invalid_path(validate(&feed)), "title");
    }

    #[test]
    fn test_generator_checks() {
        let mut feed = valid();
        feed.generator = Some(Generator::new(""));
        assert_eq!(invalid_path(validate(&feed)), "generator.name");

        feed.generator = Some(Generator::new("Foo").uri("no scheme"));
        assert_eq!(invalid_path(validate(&feed)), "generator.uri");
    }

    #[test]
    fn test_sequence_paths_carry_index() {
        let mut feed = valid();
        feed.authors = vec![Author::new("Joe"), Author::new("")];
        assert_eq!(invalid_path(validate(&feed)), "authors[1].name");

        let mut feed = valid();
        feed.categories = vec![Category::new("ok"), Category::new("x").scheme("::")];
        assert_eq!(invalid_path(validate(&feed)), "categories[1].scheme");

        let mut feed = valid();
        feed.hubs = vec!["http://www.example.com/hub".to_string(), "hub2".to_string()];
        assert_eq!(invalid_path(validate(&feed)), "hubs[1]");
    }

    #[test]
    fn test_optional_urls_checked() {
        let mut feed = valid();
        feed.base_url = Some("relative/base".to_string());
        assert_eq!(invalid_path(validate(&feed)), "base_url");

        let mut feed = valid();
        feed.feed_links.rss = Some("not a url".to_string());
        assert_eq!(invalid_path(validate(&feed)), "feed_links.rss");
    }
}
