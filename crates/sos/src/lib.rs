//! SOS alerts for the Guardian client
//!
//! Composes an emergency SMS from the current location fix and the cached
//! emergency contact, and hands it to an SMS gateway. The alert can be
//! fired from a dedicated control or from a rapid sequence of hardware key
//! presses.

mod alert;
mod gateway;
mod location;
mod press;
mod trigger;

use guardian_rust_session::SessionError;
use std::fmt;
use thiserror::Error;

pub use alert::{map_link, EmergencyAlert, ALERT_BANNER};
pub use gateway::{BulkSmsGateway, GatewayReceipt, ProxySmsGateway, SmsGateway, PROXY_SEND_PATH};
pub use location::{Coordinates, DeniedLocation, FixedLocation, LocationProvider, Permission};
pub use press::{
    HardwareKey, PressConfig, PressDetector, DEFAULT_PRESS_THRESHOLD, DEFAULT_PRESS_WINDOW,
};
pub use trigger::{Dispatch, SentAlert, SosTrigger, TriggerSource, DEFAULT_FIX_TIMEOUT};

/// Result type
pub type Result<T> = std::result::Result<T, SosError>;

/// Data that must be present before an alert can be sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    Location,
    EmergencyContact,
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Location => write!(f, "location fix"),
            Self::EmergencyContact => write!(f, "emergency contact"),
        }
    }
}

/// SOS errors
#[derive(Error, Debug)]
pub enum SosError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Missing {0}")]
    PreconditionMissing(Precondition),

    /// The provider failed or gave no position in time
    #[error("Location error: {0}")]
    LocationError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Gateway error ({status}): {message}")]
    GatewayError { status: u16, message: String },

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("Not signed in")]
    Unauthenticated,

    #[error("SOS request cancelled")]
    Cancelled,

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}
