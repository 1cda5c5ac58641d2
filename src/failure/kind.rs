//! The closed set of failure kinds.

use axum::http::StatusCode;

/// A failure kind. Each kind fixes an HTTP status and a stable code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Validation,
    Unauthorized,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    PayloadTooLarge,
    UnsupportedMediaType,
    InternalServerError,
    NotImplemented,
    ServiceUnavailable,
}

impl FailureKind {
    /// HTTP status sent to the client.
    pub const fn status(self) -> StatusCode {
        match self {
            FailureKind::Validation => StatusCode::BAD_REQUEST,
            FailureKind::Unauthorized => StatusCode::UNAUTHORIZED,
            FailureKind::Forbidden => StatusCode::FORBIDDEN,
            FailureKind::NotFound => StatusCode::NOT_FOUND,
            FailureKind::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            FailureKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            FailureKind::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            FailureKind::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
            FailureKind::NotImplemented => StatusCode::NOT_IMPLEMENTED,
            FailureKind::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Machine-readable code used in response bodies and metrics.
    pub const fn code(self) -> &'static str {
        match self {
            FailureKind::Validation => "ValidationError",
            FailureKind::Unauthorized => "UnauthorizedError",
            FailureKind::Forbidden => "ForbiddenError",
            FailureKind::NotFound => "NotFoundError",
            FailureKind::MethodNotAllowed => "MethodNotAllowedError",
            FailureKind::PayloadTooLarge => "PayloadTooLargeError",
            FailureKind::UnsupportedMediaType => "UnsupportedMediaTypeError",
            FailureKind::InternalServerError => "InternalServerError",
            FailureKind::NotImplemented => "NotImplementedError",
            FailureKind::ServiceUnavailable => "ServiceUnavailableError",
        }
    }

    /// Reason phrase, used as the client message for server-class kinds.
    pub fn reason(self) -> &'static str {
        self.status().canonical_reason().unwrap_or("Error")
    }

    /// `true` for 5xx kinds.
    pub fn is_server_error(self) -> bool {
        self.status().is_server_error()
    }

    /// The kind owning `status`, if any.
    pub fn from_status(status: StatusCode) -> Option<Self> {
        const ALL: [FailureKind; 10] = [
            FailureKind::Validation,
            FailureKind::Unauthorized,
            FailureKind::Forbidden,
            FailureKind::NotFound,
            FailureKind::MethodNotAllowed,
            FailureKind::PayloadTooLarge,
            FailureKind::UnsupportedMediaType,
            FailureKind::InternalServerError,
            FailureKind::NotImplemented,
            FailureKind::ServiceUnavailable,
        ];
        ALL.into_iter().find(|kind| kind.status() == status)
    }
}
