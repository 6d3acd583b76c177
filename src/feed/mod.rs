//! Feed rendering: from a format-agnostic descriptor to an RSS 2.0 document.
//!
//! # Pipeline
//!
//! 1. [`defaults::resolve`] fills in format defaults (encoding, generator,
//!    category labels)
//! 2. validation checks the channel against RSS 2.0 rules; the first
//!    violation aborts the render with a [`RenderError`]
//! 3. [`RssRenderer`] assembles a [`dom::Element`] tree, consulting the
//!    [`ExtensionRegistry`] for namespaced elements
//! 4. [`serialize`] writes the tree with `quick-xml` and transcodes it to the
//!    declared charset
//!
//! [`read_rss`] parses a rendered document back for round-trip checks.
//!
//! # Example
//!
//! ```
//! use feedwriter::feed::{read_rss, render_rss, Category, FeedDescriptor};
//!
//! let descriptor = FeedDescriptor {
//!     title: Some("T".to_string()),
//!     description: Some("D".to_string()),
//!     link: Some("http://e.com".to_string()),
//!     categories: vec![Category::new("rust")],
//!     ..Default::default()
//! };
//!
//! let bytes = render_rss(&descriptor)?;
//! let channel = read_rss(&bytes)?;
//! assert_eq!(channel.title.as_deref(), Some("T"));
//! assert_eq!(channel.categories[0].term, "rust");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod defaults;
mod descriptor;
pub mod dom;
mod error;
mod extension;
mod reader;
mod rss;
mod serialize;
mod validate;

pub use defaults::{DEFAULT_ENCODING, DEFAULT_GENERATOR};
pub use descriptor::{
    timestamp, Author, Category, FeedDescriptor, FeedFormat, FeedLinks, Generator, Image,
    ImageDimension,
};
pub use error::{ReadError, RenderError};
pub use extension::{
    ChannelExtension, DublinCoreAuthors, ExtensionRegistry, PubSubHubbub, ATOM_NAMESPACE,
    DUBLIN_CORE_NAMESPACE,
};
pub use reader::{read_rss, ReadAuthor, ReadCategory, ReadChannel, ReadImage};
pub use rss::{format_rfc822, render_rss, RenderedDocument, RssRenderer};
pub use serialize::serialize;
pub use validate::{MAX_IMAGE_HEIGHT, MAX_IMAGE_WIDTH};
