//! Session data

use serde::{Deserialize, Serialize};

/// Cached snapshot of the signed-in user's profile.
///
/// Written once at login or registration and never refreshed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Backend identifier, used as author id for posts and reports
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub email: String,

    /// Phone number that receives SOS alerts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<String>,

    /// Profile image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_group: Option<String>,
}

impl UserProfile {
    /// The emergency contact, if set to something other than blanks
    pub fn emergency_contact(&self) -> Option<&str> {
        self.emergency_contact
            .as_deref()
            .map(str::trim)
            .filter(|contact| !contact.is_empty())
    }
}

/// Proof of authentication plus the profile captured with it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub profile: UserProfile,
}

impl Session {
    pub fn new(token: impl Into<String>, profile: UserProfile) -> Self {
        Self {
            token: token.into(),
            profile,
        }
    }
}
