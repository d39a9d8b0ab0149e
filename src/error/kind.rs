//! Error kind enumeration for categorizing engine errors.

/// Categorization of engine errors.
///
/// Every kind maps onto exactly one HTTP status so the transport layer can
/// render failures without inspecting messages.
///
/// | ErrorKind               | Status | Typical cause                               |
/// |-------------------------|--------|---------------------------------------------|
/// | `InvalidArgument`       | 400    | Bad query parameter or attribute value      |
/// | `InvalidDocument`       | 400    | Request body is not a valid JSON:API doc    |
/// | `InvalidRelationType`   | 400    | Linkage names a type the relation forbids   |
/// | `CapabilityUnsupported` | 400    | Filter/sort/page on a type that disallows it|
/// | `Forbidden`             | 403    | Permission expression denied the access     |
/// | `NotFound`              | 404    | Unknown type, id, or relationship           |
/// | `MethodNotAllowed`      | 405    | Method not supported on the addressed path  |
/// | `Configuration`         | 500    | Schema or permission setup is invalid       |
/// | `Internal`              | 500    | Store invariant broken                      |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A query parameter, attribute value, or identifier is malformed.
    ///
    /// HTTP: 400 Bad Request
    #[error("invalid argument")]
    InvalidArgument,

    /// The request body could not be parsed as a JSON:API document, or its
    /// shape does not match the operation (e.g. type/id mismatch).
    ///
    /// HTTP: 400 Bad Request
    #[error("invalid document")]
    InvalidDocument,

    /// A relationship linkage names a type outside the relation's permitted
    /// target set.
    ///
    /// HTTP: 400 Bad Request
    #[error("invalid relation type")]
    InvalidRelationType,

    /// Filtering, sorting, or pagination was requested on a type whose
    /// capability descriptor disallows it.
    ///
    /// HTTP: 400 Bad Request
    #[error("capability unsupported")]
    CapabilityUnsupported,

    /// A permission expression evaluated to deny.
    ///
    /// HTTP: 403 Forbidden
    #[error("forbidden")]
    Forbidden,

    /// The addressed type, resource, or relationship does not exist.
    ///
    /// HTTP: 404 Not Found
    #[error("not found")]
    NotFound,

    /// The method is not supported on the addressed path.
    ///
    /// HTTP: 405 Method Not Allowed
    #[error("method not allowed")]
    MethodNotAllowed,

    /// Schema or permission configuration is invalid.
    ///
    /// Raised while building the registry; never produced by a request.
    #[error("configuration error")]
    Configuration,

    /// An internal invariant was broken.
    #[error("internal error")]
    Internal,
}

impl ErrorKind {
    /// Returns the HTTP status code for this error kind.
    #[inline]
    pub fn http_status_code(&self) -> u16 {
        match self {
            ErrorKind::InvalidArgument
            | ErrorKind::InvalidDocument
            | ErrorKind::InvalidRelationType
            | ErrorKind::CapabilityUnsupported => 400,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::MethodNotAllowed => 405,
            ErrorKind::Configuration | ErrorKind::Internal => 500,
        }
    }

    /// Returns `true` if the caller can fix the failure by changing the request.
    #[inline]
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.http_status_code())
    }

    /// Short title used in JSON:API error objects.
    pub fn title(&self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "Invalid argument",
            ErrorKind::InvalidDocument => "Invalid document",
            ErrorKind::InvalidRelationType => "Invalid relation type",
            ErrorKind::CapabilityUnsupported => "Unsupported operation",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "Not found",
            ErrorKind::MethodNotAllowed => "Method not allowed",
            ErrorKind::Configuration => "Configuration error",
            ErrorKind::Internal => "Internal error",
        }
    }
}
