//! Channel extension hooks.
//!
//! RSS 2.0 has no native element for several fields a descriptor carries.
//! Extensions project those fields through XML namespaces. The renderer
//! calls every registered extension, in registration order, after the core
//! channel elements and before `pubDate`.

use super::descriptor::FeedDescriptor;
use super::dom::Element;

pub const ATOM_NAMESPACE: &str = "http://www.w3.org/2005/Atom";
pub const DUBLIN_CORE_NAMESPACE: &str = "http://purl.org/dc/elements/1.1/";

/// A renderer plug-in that adds namespaced elements to `<channel>`.
///
/// Implementations receive the resolved, validated descriptor and must not
/// fail: anything they write has already been checked by the renderer.
pub trait ChannelExtension: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// `(prefix, uri)` pairs declared on the root element.
    fn namespaces(&self) -> &'static [(&'static str, &'static str)];

    fn render_channel(&self, feed: &FeedDescriptor, channel: &mut Element);
}

/// Ordered set of channel extensions consulted by the renderer.
pub struct ExtensionRegistry {
    extensions: Vec<Box<dyn ChannelExtension>>,
}

impl ExtensionRegistry {
    /// A registry with no extensions.
    pub fn empty() -> Self {
        Self {
            extensions: Vec::new(),
        }
    }

    pub fn register(&mut self, extension: impl ChannelExtension + 'static) {
        tracing::debug!(extension = extension.name(), "Registered channel extension");
        self.extensions.push(Box::new(extension));
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn ChannelExtension> {
        self.extensions.iter().map(|e| e.as_ref())
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

/// The built-in extensions: Dublin Core authors, then PubSubHubbub hubs.
impl Default for ExtensionRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(DublinCoreAuthors);
        registry.register(PubSubHubbub);
        registry
    }
}

impl std::fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.extensions.iter().map(|e| e.name()))
            .finish()
    }
}

/// Writes each author's name as `<dc:creator>`.
///
/// RSS 2.0 only has `managingEditor`, which must be an email address, so
/// names go through Dublin Core. Email and URI are not projected.
#[derive(Debug, Clone, Copy, Default)]
pub struct DublinCoreAuthors;

impl ChannelExtension for DublinCoreAuthors {
    fn name(&self) -> &'static str {
        "dublin-core"
    }

    fn namespaces(&self) -> &'static [(&'static str, &'static str)] {
        &[("dc", DUBLIN_CORE_NAMESPACE)]
    }

    fn render_channel(&self, feed: &FeedDescriptor, channel: &mut Element) {
        for author in &feed.authors {
            channel.push_text_element("dc:creator", author.name.as_str());
        }
    }
}

/// Writes each hub as `<atom:link rel="hub" href="..."/>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PubSubHubbub;

impl ChannelExtension for PubSubHubbub {
    fn name(&self) -> &'static str {
        "pubsubhubbub"
    }

    fn namespaces(&self) -> &'static [(&'static str, &'static str)] {
        &[("atom", ATOM_NAMESPACE)]
    }

    fn render_channel(&self, feed: &FeedDescriptor, channel: &mut Element) {
        for hub in &feed.hubs {
            channel.push(
                Element::new("atom:link")
                    .attr("rel", "hub")
                    .attr("href", hub.as_str()),
            );
        }
    }
}
