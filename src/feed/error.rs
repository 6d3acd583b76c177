use thiserror::Error;

/// Errors that can occur while rendering a feed descriptor.
///
/// Every variant is fail-fast: no partial document is produced, and callers
/// are expected to fix the descriptor and render again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// A mandatory channel-level field is absent or empty.
    #[error("missing required field: {0}")]
    MissingRequiredField(&'static str),

    /// A present field violates a type, range, or non-emptiness rule.
    ///
    /// `path` names the field, e.g. `image.height` or `categories[1].scheme`.
    #[error("invalid field {path}: {reason}")]
    InvalidField { path: String, reason: String },

    /// Text cannot be represented in the requested charset.
    #[error("cannot encode document as {encoding}: {reason}")]
    Encoding { encoding: String, reason: String },

    /// The XML writer failed. Unreachable for a validated tree.
    #[error("failed to write XML: {0}")]
    Xml(String),
}

impl RenderError {
    pub(crate) fn invalid(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// The field path this error refers to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingRequiredField(name) => Some(*name),
            Self::InvalidField { path, .. } => Some(path.as_str()),
            Self::Encoding { .. } | Self::Xml(_) => None,
        }
    }
}

/// Errors that can occur while reading a rendered document back.
#[derive(Debug, Error)]
pub enum ReadError {
    /// XML parsing failed.
    #[error("XML parse error: {0}")]
    Xml(String),

    /// The declared encoding is not a charset `encoding_rs` knows.
    #[error("unknown document encoding: {0}")]
    UnknownEncoding(String),

    /// The bytes do not decode in the declared encoding.
    #[error("document is not valid {0}")]
    Malformed(String),

    /// The root element is not `<rss>` or there is no `<channel>`.
    #[error("not an RSS document")]
    NotRss,

    /// A date element does not hold an RFC-822 date.
    #[error("invalid date in <{element}>: {value}")]
    InvalidDate { element: String, value: String },
}
