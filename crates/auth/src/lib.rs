//! Guardian auth client
//!
//! Login, registration and logout against the Guardian backend. A successful
//! login stores the bearer token and the profile snapshot through the
//! [`SessionRepository`]; logout removes both.

use guardian_rust_session::{Session, SessionError, SessionRepository, UserProfile};
use log::{debug, info, warn};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Login endpoint path
pub const LOGIN_PATH: &str = "/api/auth/login";

/// Registration endpoint path
pub const REGISTER_PATH: &str = "/api/auth/register";

/// Result type
pub type Result<T> = std::result::Result<T, AuthError>;

/// Auth errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// A required form field is missing
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The backend refused the credentials
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The registration form lacks a field or the photo
    #[error("Incomplete registration: {0}")]
    IncompleteRegistration(String),

    /// The backend refused the registration
    #[error("Registration error: {0}")]
    RegistrationError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// Login request body
#[derive(Debug, Serialize)]
pub struct Credentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Body returned by the login and registration endpoints
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AuthResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub data: Option<UserProfile>,
    #[serde(default)]
    pub message: Option<String>,
}

impl AuthResponse {
    fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Photo attached to a registration
#[derive(Debug, Clone)]
pub struct ProfilePhoto {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime: String,
}

impl ProfilePhoto {
    /// A JPEG captured by the camera
    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            file_name: "profile.jpg".to_string(),
            mime: "image/jpeg".to_string(),
        }
    }
}

/// Registration form. Every field is required.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub emergency_contact: String,
    pub blood_group: String,
    pub photo: Option<ProfilePhoto>,
}

impl RegistrationForm {
    fn validate(&self) -> Result<&ProfilePhoto> {
        let fields = [
            &self.name,
            &self.email,
            &self.password,
            &self.emergency_contact,
            &self.blood_group,
        ];
        let incomplete = || {
            AuthError::IncompleteRegistration(
                "Please fill in all fields and take a photo.".to_string(),
            )
        };
        if fields.iter().any(|f| f.trim().is_empty()) {
            return Err(incomplete());
        }
        self.photo
            .as_ref()
            .filter(|photo| !photo.bytes.is_empty())
            .ok_or_else(incomplete)
    }

    fn into_multipart(self, photo: ProfilePhoto) -> Result<Form> {
        let image = Part::bytes(photo.bytes)
            .file_name(photo.file_name)
            .mime_str(&photo.mime)?;

        Ok(Form::new()
            .text("name", self.name)
            .text("email", self.email)
            .text("password", self.password)
            .text("emergencyContact", self.emergency_contact)
            .text("bloodGroup", self.blood_group)
            .part("image", image))
    }
}

/// Outcome of a registration
#[derive(Debug, Clone)]
pub struct Registration {
    /// Set when the backend issued a token along with the account
    pub session: Option<Session>,
    pub message: Option<String>,
}

/// Guardian auth client
#[derive(Debug, Clone)]
pub struct AuthClient {
    base_url: Url,
    http_client: Client,
    repository: SessionRepository,
}

impl AuthClient {
    /// Create a new auth client
    pub fn new(base_url: &str, http_client: Client, repository: SessionRepository) -> Result<Self> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            http_client,
            repository,
        })
    }

    pub fn repository(&self) -> &SessionRepository {
        &self.repository
    }

    /// `path` appended to the base URL, keeping any prefix it carries
    fn endpoint(&self, path: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{}{}", base, path))?)
    }

    /// Sign in with email and password.
    ///
    /// Both fields are checked before any request is made. Only a response
    /// with `success` set and a non-empty token creates a session.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::ValidationError(
                "Email and password are required.".to_string(),
            ));
        }

        let url = self.endpoint(LOGIN_PATH)?;
        debug!("Logging in {}", email);

        let response = self
            .http_client
            .post(url)
            .json(&Credentials { email, password })
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let body: AuthResponse = match serde_json::from_str(&text) {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                warn!("Login failed with status {}", status);
                return Err(AuthError::AuthenticationError(format!(
                    "Request failed with status {}",
                    status
                )));
            }
            Err(err) => return Err(AuthError::SerializationError(err)),
        };

        let token = body
            .token()
            .filter(|_| body.success)
            .map(str::to_string);
        let Some(token) = token else {
            return Err(AuthError::AuthenticationError(
                body.message
                    .unwrap_or_else(|| "Invalid credentials.".to_string()),
            ));
        };

        let profile = body.data.unwrap_or_else(|| UserProfile {
            email: email.to_string(),
            ..Default::default()
        });
        let session = Session::new(token, profile);
        self.repository.save(&session).await?;

        info!("Logged in as {}", session.profile.email);
        Ok(session)
    }

    /// Create an account.
    ///
    /// The form is sent as multipart with the photo in the `image` part. When
    /// the backend answers with a token the session is stored as for
    /// [`AuthClient::login`].
    pub async fn register(&self, form: RegistrationForm) -> Result<Registration> {
        let photo = form.validate()?.clone();
        let email = form.email.clone();
        let url = self.endpoint(REGISTER_PATH)?;

        let response = self
            .http_client
            .post(url)
            .multipart(form.into_multipart(photo)?)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let body: AuthResponse = serde_json::from_str(&text).unwrap_or_default();

        if !status.is_success() {
            warn!("Registration failed with status {}", status);
            return Err(AuthError::RegistrationError(
                body.message
                    .unwrap_or_else(|| "Something went wrong.".to_string()),
            ));
        }

        let session = match body.token() {
            Some(token) => {
                let profile = body.data.clone().unwrap_or_else(|| UserProfile {
                    email: email.clone(),
                    ..Default::default()
                });
                let session = Session::new(token, profile);
                self.repository.save(&session).await?;
                Some(session)
            }
            None => None,
        };

        info!("Registered {}", email);
        Ok(Registration {
            session,
            message: body.message,
        })
    }

    /// Sign out by removing the stored token and profile
    pub async fn logout(&self) -> Result<()> {
        self.repository.clear().await?;
        info!("Logged out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guardian_rust_session::MemoryStore;
    use std::sync::Arc;

    fn client() -> AuthClient {
        AuthClient::new(
            "https://api.example.com",
            Client::new(),
            SessionRepository::new(Arc::new(MemoryStore::new())),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_login_requires_both_fields() {
        let auth = client();
        assert!(matches!(
            auth.login("", "secret").await,
            Err(AuthError::ValidationError(_))
        ));
        assert!(matches!(
            auth.login("a@example.com", "").await,
            Err(AuthError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_register_requires_photo() {
        let form = RegistrationForm {
            name: "Ayesha".to_string(),
            email: "a@example.com".to_string(),
            password: "secret".to_string(),
            emergency_contact: "+8801234567".to_string(),
            blood_group: "O+".to_string(),
            photo: None,
        };
        assert!(matches!(
            client().register(form).await,
            Err(AuthError::IncompleteRegistration(_))
        ));
    }

    #[test]
    fn test_response_token_must_be_non_empty() {
        let body: AuthResponse =
            serde_json::from_str(r#"{"success":true,"token":""}"#).unwrap();
        assert_eq!(body.token(), None);
    }
}
