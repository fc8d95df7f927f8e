//! Error handling for the Guardian client

use std::fmt;
use thiserror::Error;

use guardian_rust_auth::AuthError;
use guardian_rust_session::SessionError;
use guardian_rust_sos::{Precondition, SosError};

/// Unified error type for the Guardian client
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP related errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// A header value that cannot be sent
    #[error("Invalid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),

    /// The backend answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// A required form field is missing
    #[error("Validation error: {0}")]
    Validation(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Sos(#[from] SosError),
}

impl Error {
    /// Create a new validation error
    pub fn validation<T: fmt::Display>(msg: T) -> Self {
        Error::Validation(msg.to_string())
    }

    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// Where the error falls in the user-facing taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Http(_) | Error::Api { .. } => ErrorKind::TransportError,
            Error::Validation(_) => ErrorKind::ValidationError,
            Error::Json(_)
            | Error::Url(_)
            | Error::Header(_)
            | Error::Config(_)
            | Error::Session(_) => {
                ErrorKind::Internal
            }
            Error::Auth(err) => match err {
                AuthError::ValidationError(_) | AuthError::IncompleteRegistration(_) => {
                    ErrorKind::ValidationError
                }
                AuthError::AuthenticationError(_) | AuthError::RegistrationError(_) => {
                    ErrorKind::AuthFailure
                }
                AuthError::NetworkError(_) => ErrorKind::TransportError,
                AuthError::SerializationError(_)
                | AuthError::UrlParseError(_)
                | AuthError::Session(_) => ErrorKind::Internal,
            },
            Error::Sos(err) => match err {
                SosError::PermissionDenied => ErrorKind::PermissionDenied,
                SosError::PreconditionMissing(_) | SosError::LocationError(_) => {
                    ErrorKind::PreconditionMissing
                }
                SosError::NetworkError(_) | SosError::GatewayError { .. } => {
                    ErrorKind::TransportError
                }
                SosError::Unauthenticated => ErrorKind::AuthFailure,
                SosError::Cancelled => ErrorKind::Cancelled,
                SosError::UrlParseError(_) | SosError::Session(_) => ErrorKind::Internal,
            },
        }
    }

    /// The blocking notice shown to the user.
    ///
    /// `None` for cancelled work, whose screen is already gone.
    pub fn notice(&self) -> Option<Notice> {
        let notice = match self {
            Error::Sos(SosError::Cancelled) => return None,
            Error::Sos(SosError::PreconditionMissing(Precondition::Location))
            | Error::Sos(SosError::LocationError(_)) => {
                Notice::new("Error", "Location not available")
            }
            Error::Sos(SosError::PreconditionMissing(Precondition::EmergencyContact)) => {
                Notice::new(
                    "Error",
                    "Emergency contact not set. Please set it in your profile.",
                )
            }
            Error::Sos(SosError::PermissionDenied) => {
                Notice::new("Permission required", "Please grant location access")
            }
            Error::Sos(SosError::Unauthenticated) => {
                Notice::new("Error", "User not found. Please log in again.")
            }
            Error::Sos(_) => Notice::new("Error", "Failed to send SMS. Please try again."),
            Error::Auth(AuthError::ValidationError(msg)) => Notice::new("Validation Error", msg),
            Error::Auth(AuthError::AuthenticationError(msg)) => {
                Notice::new("Login Failed", msg)
            }
            Error::Auth(AuthError::IncompleteRegistration(msg)) => Notice::new("Error", msg),
            Error::Auth(AuthError::RegistrationError(msg)) => {
                Notice::new("Registration Failed", msg)
            }
            Error::Validation(msg) => Notice::new("Error", msg),
            Error::Api { message, .. } => Notice::new("Error", message),
            _ => Notice::new("Error", "Something went wrong. Please try again."),
        };
        Some(notice)
    }
}

/// Failure categories surfaced to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    PermissionDenied,
    PreconditionMissing,
    TransportError,
    AuthFailure,
    ValidationError,
    Cancelled,
    Internal,
}

/// A blocking, user-facing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }

    /// Confirmation after an SOS was handed to the gateway
    pub fn sos_sent() -> Self {
        Self::new("Success", "SOS SMS sent successfully!")
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_notices() {
        let err = Error::from(SosError::PreconditionMissing(Precondition::Location));
        assert_eq!(err.kind(), ErrorKind::PreconditionMissing);
        assert_eq!(err.notice().unwrap().message, "Location not available");

        let err = Error::from(SosError::PreconditionMissing(Precondition::EmergencyContact));
        assert!(err.notice().unwrap().message.starts_with("Emergency contact not set"));
    }

    #[test]
    fn test_gateway_failure_notice() {
        let err = Error::from(SosError::GatewayError {
            status: 500,
            message: "boom".to_string(),
        });
        assert_eq!(err.kind(), ErrorKind::TransportError);
        assert_eq!(
            err.notice().unwrap(),
            Notice::new("Error", "Failed to send SMS. Please try again.")
        );
    }

    #[test]
    fn test_auth_failure_notice() {
        let err = Error::from(AuthError::AuthenticationError("Invalid credentials.".to_string()));
        assert_eq!(err.kind(), ErrorKind::AuthFailure);
        assert_eq!(err.notice().unwrap().title, "Login Failed");

        let err = Error::from(AuthError::ValidationError("Email and password are required.".to_string()));
        assert_eq!(err.kind(), ErrorKind::ValidationError);
    }

    #[test]
    fn test_registration_notices() {
        let err = Error::from(AuthError::RegistrationError("Email already exists".to_string()));
        assert_eq!(err.kind(), ErrorKind::AuthFailure);
        assert_eq!(
            err.notice().unwrap(),
            Notice::new("Registration Failed", "Email already exists")
        );

        let err = Error::from(AuthError::IncompleteRegistration(
            "Please fill in all fields and take a photo.".to_string(),
        ));
        assert_eq!(err.kind(), ErrorKind::ValidationError);
        assert_eq!(err.notice().unwrap().title, "Error");
    }

    #[test]
    fn test_location_failure_notice() {
        let err = Error::from(SosError::LocationError("timed out".to_string()));
        assert_eq!(err.kind(), ErrorKind::PreconditionMissing);
        assert_eq!(err.notice().unwrap().message, "Location not available");
    }

    #[test]
    fn test_cancelled_has_no_notice() {
        let err = Error::from(SosError::Cancelled);
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert!(err.notice().is_none());
    }

    #[test]
    fn test_permission_denied_kind() {
        assert_eq!(
            Error::from(SosError::PermissionDenied).kind(),
            ErrorKind::PermissionDenied
        );
    }
}
