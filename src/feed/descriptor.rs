use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use std::fmt;

/// Channel-level description of a feed, independent of output format.
///
/// Optional fields are `None` when absent. `Some("")` is kept distinct from
/// `None`: an absent optional field is skipped, a present-but-empty one is
/// rejected at render time.
///
/// The struct deserializes from TOML/JSON-like sources with every key
/// optional; dates are RFC 3339 strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FeedDescriptor {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Canonical HTML location of the feed's subject.
    pub link: Option<String>,
    pub encoding: Option<String>,
    pub date_modified: Option<DateTime<FixedOffset>>,
    pub last_build_date: Option<DateTime<FixedOffset>>,
    pub generator: Option<Generator>,
    pub language: Option<String>,
    pub feed_links: FeedLinks,
    pub base_url: Option<String>,
    pub authors: Vec<Author>,
    pub copyright: Option<String>,
    pub categories: Vec<Category>,
    pub hubs: Vec<String>,
    pub image: Option<Image>,
}

/// Software that produced the feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Generator {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
}

impl Generator {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            uri: None,
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }
}

/// Formats as `name[ version][ (uri)]`, the text of an RSS `<generator>`.
impl fmt::Display for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(version) = &self.version {
            write!(f, " {}", version)?;
        }
        if let Some(uri) = &self.uri {
            write!(f, " ({})", uri)?;
        }
        Ok(())
    }
}

/// Output formats a feed can be published in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeedFormat {
    Rss,
    Atom,
}

impl FeedFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rss => "rss",
            Self::Atom => "atom",
        }
    }
}

/// Where each rendering of the feed will be available.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FeedLinks {
    pub rss: Option<String>,
    pub atom: Option<String>,
}

impl FeedLinks {
    pub fn get(&self, format: FeedFormat) -> Option<&str> {
        match format {
            FeedFormat::Rss => self.rss.as_deref(),
            FeedFormat::Atom => self.atom.as_deref(),
        }
    }

    pub fn set(&mut self, format: FeedFormat, url: impl Into<String>) {
        let slot = match format {
            FeedFormat::Rss => &mut self.rss,
            FeedFormat::Atom => &mut self.atom,
        };
        *slot = Some(url.into());
    }

    /// Iterates over the links that are set, in format order.
    pub fn iter(&self) -> impl Iterator<Item = (FeedFormat, &str)> {
        [FeedFormat::Rss, FeedFormat::Atom]
            .into_iter()
            .filter_map(move |format| self.get(format).map(|url| (format, url)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
}

impl Author {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: None,
            uri: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Category {
    pub term: String,
    /// Human-readable label; resolves to `term` when absent.
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub scheme: Option<String>,
}

impl Category {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            label: None,
            scheme: None,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }
}

/// Channel image. Every sub-field is optional at this level; the renderer
/// decides which ones are required once an image is present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Image {
    pub uri: Option<String>,
    pub link: Option<String>,
    pub title: Option<String>,
    pub height: Option<ImageDimension>,
    pub width: Option<ImageDimension>,
    pub description: Option<String>,
}

/// An image height or width as supplied by the caller.
///
/// The container accepts both numbers and text (`400` and `"400"`); parsing
/// and range checks happen at render time.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ImageDimension {
    Number(i64),
    Text(String),
}

impl ImageDimension {
    /// Parses the value as a plain decimal integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => {
                if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                s.parse().ok()
            }
        }
    }
}

impl From<i64> for ImageDimension {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<u32> for ImageDimension {
    fn from(n: u32) -> Self {
        Self::Number(i64::from(n))
    }
}

impl From<&str> for ImageDimension {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for ImageDimension {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// Builds a UTC timestamp from unix seconds.
///
/// Returns `None` if the value is outside chrono's representable range.
pub fn timestamp(secs: i64) -> Option<DateTime<FixedOffset>> {
    DateTime::from_timestamp(secs, 0).map(|dt| dt.fixed_offset())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_display_full() {
        let generator = Generator::new("FooFeedBuilder")
            .version("1.00")
            .uri("http://www.example.com");
        assert_eq!(
            generator.to_string(),
            "FooFeedBuilder 1.00 (http://www.example.com)"
        );
    }

    #[test]
    fn test_generator_display_omits_missing_segments() {
        assert_eq!(Generator::new("Foo").to_string(), "Foo");
        assert_eq!(Generator::new("Foo").version("2").to_string(), "Foo 2");
        assert_eq!(
            Generator::new("Foo").uri("http://e.com").to_string(),
            "Foo (http://e.com)"
        );
    }

    #[test]
    fn test_feed_links_get_and_set() {
        let mut links = FeedLinks::default();
        assert_eq!(links.get(FeedFormat::Rss), None);
        links.set(FeedFormat::Rss, "http://www.example.com/rss");
        assert_eq!(links.get(FeedFormat::Rss), Some("http://www.example.com/rss"));
        assert_eq!(links.get(FeedFormat::Atom), None);
        assert_eq!(links.iter().count(), 1);
    }

    #[test]
    fn test_image_dimension_parsing() {
        assert_eq!(ImageDimension::from("400").as_integer(), Some(400));
        assert_eq!(ImageDimension::from(144u32).as_integer(), Some(144));
        assert_eq!(ImageDimension::from("a").as_integer(), None);
        assert_eq!(ImageDimension::from("").as_integer(), None);
        assert_eq!(ImageDimension::from("-1").as_integer(), None);
        assert_eq!(ImageDimension::from("4.5").as_integer(), None);
        assert_eq!(ImageDimension::from(-3i64).as_integer(), Some(-3));
    }

    #[test]
    fn test_timestamp_is_utc() {
        let dt = timestamp(1234567890).unwrap();
        assert_eq!(dt.timestamp(), 1234567890);
        assert_eq!(dt.offset().local_minus_utc(), 0);
    }

    #[test]
    fn test_descriptor_deserializes_from_toml() {
        let descriptor: FeedDescriptor = toml::from_str(
            r#"
title = "T"
description = "D"
link = "http://e.com"
date_modified = "2009-02-13T23:31:30Z"

[feed_links]
rss = "http://e.com/rss"

[[categories]]
term = "cat_dog"
scheme = "http://e.com/s1"

[image]
uri = "http://e.com/logo.gif"
link = "http://e.com"
title = "Logo"
height = 400
width = "144"
"#,
        )
        .unwrap();

        assert_eq!(descriptor.title.as_deref(), Some("T"));
        assert_eq!(descriptor.date_modified.unwrap().timestamp(), 1234567890);
        assert_eq!(descriptor.feed_links.get(FeedFormat::Rss), Some("http://e.com/rss"));
        assert_eq!(descriptor.categories[0].label, None);
        let image = descriptor.image.unwrap();
        assert_eq!(image.height, Some(ImageDimension::Number(400)));
        assert_eq!(image.width, Some(ImageDimension::Text("144".to_string())));
    }
}
