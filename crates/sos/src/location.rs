//! Location provider interface

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Result, SosError};

/// A geocoordinate as reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Foreground location permission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

/// Source of the device position
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Ask for foreground location access
    async fn request_permission(&self) -> Permission;

    /// Read the current position. Only called after permission is granted.
    async fn current_position(&self) -> Result<Coordinates>;
}

/// Provider that always reports the same position
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coordinates);

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn request_permission(&self) -> Permission {
        Permission::Granted
    }

    async fn current_position(&self) -> Result<Coordinates> {
        Ok(self.0)
    }
}

/// Provider whose permission request is always refused
#[derive(Debug, Clone, Copy, Default)]
pub struct DeniedLocation;

#[async_trait]
impl LocationProvider for DeniedLocation {
    async fn request_permission(&self) -> Permission {
        Permission::Denied
    }

    async fn current_position(&self) -> Result<Coordinates> {
        Err(SosError::PermissionDenied)
    }
}
