//! Main error type for the engine.

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;

use serde_json::{Value, json};

use super::ErrorKind;

/// The primary error type for engine operations.
///
/// `Error` carries enough context to render a JSON:API error object:
/// - [`kind()`](Error::kind): categorization and HTTP status
/// - [`message()`](Error::message): human-readable detail
/// - [`pointer()`](Error::pointer): JSON pointer or query parameter that caused it
///
/// ```text
/// Error
/// ├── kind: ErrorKind          (category, HTTP status)
/// ├── message: Cow<str>        (detail)
/// ├── pointer: Option<String>  (source.pointer / source.parameter)
/// └── source: Option           (underlying cause)
/// ```
///
/// ## Example
///
/// ```rust
/// use jsonapi_graph::{Error, ErrorKind};
///
/// let err = Error::capability_unsupported("filtering is not supported for type 'tractor'")
///     .with_pointer("filter[tractor]");
/// assert_eq!(err.kind(), ErrorKind::CapabilityUnsupported);
/// assert_eq!(err.status(), 400);
/// ```
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Cow<'static, str>,
    pointer: Option<String>,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl Error {
    /// Creates a new error with the given kind and message.
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self { kind, message: message.into(), pointer: None, source: None }
    }

    /// Returns the error kind for categorization.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the HTTP status code for this error.
    #[inline]
    pub fn status(&self) -> u16 {
        self.kind.http_status_code()
    }

    /// Returns the human-readable message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the JSON pointer (body) or parameter name (query) the error refers to.
    #[inline]
    pub fn pointer(&self) -> Option<&str> {
        self.pointer.as_deref()
    }

    /// Sets the JSON pointer or query parameter this error refers to.
    #[must_use]
    pub fn with_pointer(mut self, pointer: impl Into<String>) -> Self {
        self.pointer = Some(pointer.into());
        self
    }

    /// Sets the source error for this error.
    #[must_use]
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Renders this error as a JSON:API error object.
    ///
    /// Pointers starting with `/` are reported as `source.pointer`, anything
    /// else as `source.parameter`.
    pub fn to_json(&self) -> Value {
        let mut object = json!({
            "status": self.status().to_string(),
            "title": self.kind.title(),
            "detail": self.message.as_ref(),
        });
        if let Some(pointer) = &self.pointer {
            let source = if pointer.starts_with('/') {
                json!({ "pointer": pointer })
            } else {
                json!({ "parameter": pointer })
            };
            object["source"] = source;
        }
        object
    }

    // Convenience constructors for common error types

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    /// Creates an invalid document error.
    pub fn invalid_document(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::InvalidDocument, message)
    }

    /// Creates an invalid relation type error.
    pub fn invalid_relation_type(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::InvalidRelationType, message)
    }

    /// Creates a capability unsupported error.
    pub fn capability_unsupported(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::CapabilityUnsupported, message)
    }

    /// Creates a forbidden error.
    pub fn forbidden(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    /// Creates a not found error.
    pub fn not_found(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Creates a method not allowed error.
    pub fn method_not_allowed(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::MethodNotAllowed, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;

        if let Some(ref pointer) = self.pointer {
            write!(f, " (at {})", pointer)?;
        }

        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::invalid_document(format!("malformed JSON:API document: {}", err)).with_source(err)
    }
}

impl From<crate::types::ParseError> for Error {
    fn from(err: crate::types::ParseError) -> Self {
        Error::invalid_argument(err.to_string()).with_source(err)
    }
}
