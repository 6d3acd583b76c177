//! Renders syndication-feed descriptors into RSS 2.0 documents.
//!
//! - [`feed`] - descriptor types, default resolution, validation, the RSS
//!   renderer, serializer, and a round-trip reader
//! - [`config`] - loading descriptors from TOML files
//! - [`util`] - URL and XML text checks

pub mod config;
pub mod feed;
pub mod util;
