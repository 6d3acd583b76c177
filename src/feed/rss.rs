use chrono::{DateTime, FixedOffset};
use encoding_rs::Encoding;
use std::collections::BTreeMap;

use super::defaults::{self, DEFAULT_GENERATOR};
use super::descriptor::{FeedDescriptor, FeedFormat, Image, ImageDimension};
use super::dom::Element;
use super::error::RenderError;
use super::extension::{ExtensionRegistry, ATOM_NAMESPACE};
use super::serialize::serialize;
use super::validate::{validate, ValidatedChannel};

/// MIME type advertised on the channel's self link.
const RSS_MIME_TYPE: &str = "application/rss+xml";

/// A validated RSS document, ready to be serialized.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDocument {
    encoding_label: String,
    encoding: &'static Encoding,
    root: Element,
}

impl RenderedDocument {
    /// The encoding label written into the XML declaration, as the caller
    /// spelled it (e.g. `iso-8859-1`).
    pub fn encoding(&self) -> &str {
        &self.encoding_label
    }

    /// The charset the label resolved to.
    pub fn charset(&self) -> &'static Encoding {
        self.encoding
    }

    /// The `<rss>` element.
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// The `<channel>` element.
    pub fn channel(&self) -> Option<&Element> {
        self.root.child("channel")
    }

    /// Serializes the document. See [`serialize`].
    pub fn to_bytes(&self) -> Result<Vec<u8>, RenderError> {
        serialize(self)
    }
}

/// Renders one feed descriptor as an RSS 2.0 channel.
///
/// The renderer borrows the descriptor and is consumed by [`render`], so a
/// fresh renderer is built for every render.
///
/// [`render`]: RssRenderer::render
///
/// # Example
///
/// ```
/// use feedwriter::feed::{FeedDescriptor, RssRenderer};
///
/// let descriptor = FeedDescriptor {
///     title: Some("T".to_string()),
///     description: Some("D".to_string()),
///     link: Some("http://e.com".to_string()),
///     ..Default::default()
/// };
/// let document = RssRenderer::new(&descriptor).render().unwrap();
/// let xml = String::from_utf8(document.to_bytes().unwrap()).unwrap();
/// assert!(xml.contains("<title>T</title>"));
/// ```
#[derive(Debug)]
pub struct RssRenderer<'a> {
    descriptor: &'a FeedDescriptor,
    extensions: ExtensionRegistry,
}

impl<'a> RssRenderer<'a> {
    /// The format this renderer produces; selects the matching feed link.
    pub const FORMAT: FeedFormat = FeedFormat::Rss;

    /// Binds a renderer to `descriptor` with the built-in extensions.
    pub fn new(descriptor: &'a FeedDescriptor) -> Self {
        Self::with_extensions(descriptor, ExtensionRegistry::default())
    }

    pub fn with_extensions(descriptor: &'a FeedDescriptor, extensions: ExtensionRegistry) -> Self {
        Self {
            descriptor,
            extensions,
        }
    }

    /// The descriptor this renderer is bound to.
    pub fn data_container(&self) -> &'a FeedDescriptor {
        self.descriptor
    }

    /// Resolves defaults, validates, and builds the document tree.
    ///
    /// # Errors
    ///
    /// - [`RenderError::MissingRequiredField`] if `title`, `description` or
    ///   `link` is absent or empty
    /// - [`RenderError::InvalidField`] for a present field that breaks a
    ///   format rule (image sub-fields, URLs, empty optional text, ...)
    /// - [`RenderError::Encoding`] if text cannot be represented in the
    ///   requested charset
    pub fn render(self) -> Result<RenderedDocument, RenderError> {
        let feed = defaults::resolve(self.descriptor);
        let channel = validate(&feed)?;

        let root = self.build(&feed, &channel);

        tracing::debug!(
            title = channel.title,
            encoding = channel.encoding_label,
            categories = feed.categories.len(),
            extensions = self.extensions.len(),
            "Rendered RSS channel"
        );

        Ok(RenderedDocument {
            encoding_label: channel.encoding_label.to_string(),
            encoding: channel.encoding,
            root,
        })
    }

    fn build(&self, feed: &FeedDescriptor, valid: &ValidatedChannel<'_>) -> Element {
        let self_link = feed.feed_links.get(Self::FORMAT);
        for (format, url) in feed.feed_links.iter() {
            if format != Self::FORMAT {
                tracing::debug!(format = format.as_str(), url, "Ignoring feed link for another format");
            }
        }

        let mut rss = Element::new("rss").attr("version", "2.0");
        let mut namespaces = BTreeMap::new();
        if self_link.is_some() {
            namespaces.insert("atom", ATOM_NAMESPACE);
        }
        for extension in self.extensions.iter() {
            namespaces.extend(extension.namespaces().iter().copied());
        }
        for (prefix, uri) in namespaces {
            rss.set_attribute(format!("xmlns:{}", prefix), uri);
        }
        if let Some(base_url) = &feed.base_url {
            rss.set_attribute("xml:base", base_url.as_str());
        }

        let mut channel = Element::new("channel");
        channel.push_text_element("title", valid.title);
        channel.push_text_element("link", valid.link);
        channel.push_text_element("description", valid.description);
        push_optional(&mut channel, "language", feed.language.as_deref());
        push_optional(&mut channel, "copyright", feed.copyright.as_deref());
        if let Some(date) = &feed.last_build_date {
            channel.push_text_element("lastBuildDate", format_rfc822(date));
        }

        let generator = feed
            .generator
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| DEFAULT_GENERATOR.to_string());
        channel.push_text_element("generator", generator);

        if let Some(image) = &feed.image {
            channel.push(image_element(image));
        }

        for category in &feed.categories {
            let mut element = Element::with_text("category", category.term.as_str());
            if let Some(scheme) = &category.scheme {
                element.set_attribute("domain", scheme.as_str());
            }
            channel.push(element);
        }

        if let Some(href) = self_link {
            channel.push(
                Element::new("atom:link")
                    .attr("rel", "self")
                    .attr("type", RSS_MIME_TYPE)
                    .attr("href", href),
            );
        }

        for extension in self.extensions.iter() {
            extension.render_channel(feed, &mut channel);
        }

        if let Some(date) = &feed.date_modified {
            channel.push_text_element("pubDate", format_rfc822(date));
        }

        rss.push(channel);
        rss
    }
}

/// Renders and serializes `descriptor` in one step.
pub fn render_rss(descriptor: &FeedDescriptor) -> Result<Vec<u8>, RenderError> {
    RssRenderer::new(descriptor).render()?.to_bytes()
}

/// Formats a date as RFC 822 (as amended by RFC 1123), keeping its offset.
pub fn format_rfc822(date: &DateTime<FixedOffset>) -> String {
    date.to_rfc2822()
}

fn push_optional(parent: &mut Element, name: &str, value: Option<&str>) {
    if let Some(text) = value {
        parent.push_text_element(name, text);
    }
}

fn image_element(image: &Image) -> Element {
    let mut element = Element::new("image");
    push_optional(&mut element, "url", image.uri.as_deref());
    push_optional(&mut element, "title", image.title.as_deref());
    push_optional(&mut element, "link", image.link.as_deref());
    if let Some(width) = image.width.as_ref().and_then(ImageDimension::as_integer) {
        element.push_text_element("width", width.to_string());
    }
    if let Some(height) = image.height.as_ref().and_then(ImageDimension::as_integer) {
        element.push_text_element("height", height.to_string());
    }
    push_optional(&mut element, "description", image.description.as_deref());
    element
}
