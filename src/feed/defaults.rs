//! Default resolution applied before validation and DOM assembly.
//!
//! Resolution is pure and idempotent: it only fills in values that are
//! absent, so resolving an already-resolved descriptor changes nothing.

use super::descriptor::{Category, FeedDescriptor, Generator};

/// Encoding declared when the descriptor does not name one.
pub const DEFAULT_ENCODING: &str = "UTF-8";

/// Name used in the default `<generator>`.
pub const TOOLKIT_NAME: &str = env!("CARGO_PKG_NAME");
/// Version used in the default `<generator>`.
pub const TOOLKIT_VERSION: &str = env!("CARGO_PKG_VERSION");
/// Project URL used in the default `<generator>`.
pub const TOOLKIT_URI: &str = env!("CARGO_PKG_REPOSITORY");

/// Generator text written when the descriptor has no generator.
pub const DEFAULT_GENERATOR: &str = concat!(
    env!("CARGO_PKG_NAME"),
    " ",
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("CARGO_PKG_REPOSITORY"),
    ")"
);

/// The toolkit's own generator descriptor.
pub fn default_generator() -> Generator {
    Generator::new(TOOLKIT_NAME)
        .version(TOOLKIT_VERSION)
        .uri(TOOLKIT_URI)
}

/// Returns a copy of `descriptor` with format defaults filled in.
///
/// - `encoding` → [`DEFAULT_ENCODING`]
/// - `generator` → [`default_generator`]
/// - each category `label` → the category's term
///
/// `language` has no default and stays `None`.
pub fn resolve(descriptor: &FeedDescriptor) -> FeedDescriptor {
    let mut resolved = descriptor.clone();

    if resolved.encoding.is_none() {
        resolved.encoding = Some(DEFAULT_ENCODING.to_string());
    }
    if resolved.generator.is_none() {
        resolved.generator = Some(default_generator());
    }
    for category in &mut resolved.categories {
        resolve_category(category);
    }

    resolved
}

fn resolve_category(category: &mut Category) {
    if category.label.is_none() {
        category.label = Some(category.term.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn minimal() -> FeedDescriptor {
        FeedDescriptor {
            title: Some("T".to_string()),
            description: Some("D".to_string()),
            link: Some("http://e.com".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_generator_matches_constant() {
        assert_eq!(default_generator().to_string(), DEFAULT_GENERATOR);
        assert!(DEFAULT_GENERATOR.starts_with("feedwriter "));
    }

    #[test]
    fn test_resolve_fills_defaults() {
        let resolved = resolve(&minimal());
        assert_eq!(resolved.encoding.as_deref(), Some("UTF-8"));
        assert_eq!(resolved.generator, Some(default_generator()));
        assert_eq!(resolved.language, None);
    }

    #[test]
    fn test_resolve_keeps_explicit_values() {
        let mut descriptor = minimal();
        descriptor.encoding = Some("iso-8859-1".to_string());
        descriptor.generator = Some(Generator::new("FooFeedBuilder"));

        let resolved = resolve(&descriptor);
        assert_eq!(resolved.encoding.as_deref(), Some("iso-8859-1"));
        assert_eq!(resolved.generator, Some(Generator::new("FooFeedBuilder")));
    }

    #[test]
    fn test_resolve_category_label_defaults_to_term() {
        let mut descriptor = minimal();
        descriptor.categories = vec![
            Category::new("cat_dog").label("Cats & Dogs"),
            Category::new("cat_dog2"),
        ];

        let resolved = resolve(&descriptor);
        assert_eq!(resolved.categories[0].label.as_deref(), Some("Cats & Dogs"));
        assert_eq!(resolved.categories[1].label.as_deref(), Some("cat_dog2"));
        assert_eq!(resolved.categories[1].scheme, None);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let mut descriptor = minimal();
        descriptor.categories = vec![Category::new("a"), Category::new("b").label("B")];

        let once = resolve(&descriptor);
        let twice = resolve(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_resolve_does_not_touch_input() {
        let descriptor = minimal();
        let _ = resolve(&descriptor);
        assert_eq!(descriptor.encoding, None);
        assert_eq!(descriptor.generator, None);
    }
}
