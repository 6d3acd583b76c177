//! Utility functions shared by the renderer and the reader.
//!
//! - **URL validation**: syntax checks for links published in a feed
//! - **Text checks**: XML 1.0 character legality
//!
//! # Examples
//!
//! ```
//! use feedwriter::util::{find_invalid_xml_char, validate_url};
//!
//! assert!(validate_url("https://example.com/feed.xml").is_ok());
//! assert!(find_invalid_xml_char("Cats & Dogs").is_none());
//! ```

mod text;
mod url_validator;

pub use text::{find_invalid_xml_char, is_xml_char};
pub use url_validator::{validate_uri, validate_url, UrlValidationError};
