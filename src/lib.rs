//! Guardian Rust Client Library
//!
//! Client core for the Guardian personal-safety service: the session gate
//! deciding which screens may render, the SOS trigger sending emergency SMS
//! alerts, and thin clients for the backend's auth, community and report
//! endpoints.

pub mod community;
pub mod config;
pub mod error;
pub mod fetch;
pub mod report;

pub use guardian_rust_auth as auth;
pub use guardian_rust_session as session;
pub use guardian_rust_sos as sos;

use log::debug;
use reqwest::Client;
use std::sync::Arc;
use url::Url;

use crate::auth::{AuthClient, Registration, RegistrationForm};
use crate::community::CommunityClient;
use crate::config::{ClientOptions, SmsOptions};
use crate::error::Error;
use crate::report::ReportClient;
use crate::session::{
    FileStore, MemoryStore, Session, SessionGate, SessionRepository, SessionStore, UserProfile,
};
use crate::sos::{BulkSmsGateway, ProxySmsGateway, SmsGateway, SosTrigger};

/// The main entry point for the Guardian client
pub struct Guardian {
    /// The backend base URL
    pub url: Url,
    /// HTTP client used for requests
    pub http_client: Client,
    /// Client options
    pub options: ClientOptions,
    repository: SessionRepository,
    auth: AuthClient,
    gate: SessionGate,
}

impl Guardian {
    /// Create a new client.
    ///
    /// The session lives in `options.session_path` when set, in memory
    /// otherwise.
    ///
    /// # Example
    ///
    /// ```
    /// use guardian_rust::{Guardian, config::ClientOptions};
    ///
    /// let guardian = Guardian::new(
    ///     ClientOptions::default().with_base_url("https://api.example.com"),
    /// ).unwrap();
    /// ```
    pub fn new(options: ClientOptions) -> Result<Self, Error> {
        let store: Arc<dyn SessionStore> = match &options.session_path {
            Some(path) => Arc::new(FileStore::new(path)),
            None => Arc::new(MemoryStore::new()),
        };
        Self::with_store(options, store)
    }

    /// Create a new client on top of an existing session store
    pub fn with_store(options: ClientOptions, store: Arc<dyn SessionStore>) -> Result<Self, Error> {
        let url = Url::parse(&options.base_url)?;

        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        let repository = SessionRepository::new(store);
        let auth = AuthClient::new(url.as_str(), http_client.clone(), repository.clone())?;
        let gate = SessionGate::new(repository.clone());

        Ok(Self {
            url,
            http_client,
            options,
            repository,
            auth,
            gate,
        })
    }

    /// Get a reference to the auth client
    pub fn auth(&self) -> &AuthClient {
        &self.auth
    }

    /// Get a reference to the session gate
    pub fn gate(&self) -> &SessionGate {
        &self.gate
    }

    /// Get a reference to the session repository
    pub fn repository(&self) -> &SessionRepository {
        &self.repository
    }

    /// The cached profile of the signed-in user.
    ///
    /// `None` without a token, even when a profile snapshot is cached.
    pub async fn current_user(&self) -> Result<Option<UserProfile>, Error> {
        if !self.repository.is_authenticated().await? {
            return Ok(None);
        }
        Ok(self.repository.profile().await?)
    }

    /// Log in and mark the gate authenticated
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, Error> {
        let session = self.auth.login(email, password).await?;
        self.gate.record_sign_in();
        Ok(session)
    }

    /// Register; the gate is marked authenticated when a session was issued
    pub async fn register(&self, form: RegistrationForm) -> Result<Registration, Error> {
        let registration = self.auth.register(form).await?;
        if registration.session.is_some() {
            self.gate.record_sign_in();
        }
        Ok(registration)
    }

    /// Log out and mark the gate unauthenticated
    pub async fn logout(&self) -> Result<(), Error> {
        self.auth.logout().await?;
        self.gate.record_sign_out();
        Ok(())
    }

    /// The SMS gateway selected by the options
    pub fn sms_gateway(&self) -> Result<Arc<dyn SmsGateway>, Error> {
        let gateway: Arc<dyn SmsGateway> = match &self.options.sms {
            SmsOptions::Proxy => Arc::new(ProxySmsGateway::new(
                self.url.as_str(),
                self.http_client.clone(),
                self.repository.clone(),
            )?),
            SmsOptions::Direct {
                endpoint,
                api_token,
            } => {
                debug!("Using direct SMS gateway at {}", endpoint);
                Arc::new(BulkSmsGateway::new(
                    endpoint,
                    api_token,
                    self.http_client.clone(),
                )?)
            }
        };
        Ok(gateway)
    }

    /// A fresh SOS trigger for a home screen mount
    pub fn sos(&self) -> Result<SosTrigger, Error> {
        Ok(SosTrigger::new(
            self.repository.clone(),
            self.sms_gateway()?,
            self.options.press,
        ))
    }

    /// Get a community feed client
    pub fn community(&self) -> CommunityClient {
        CommunityClient::new(
            self.url.clone(),
            self.http_client.clone(),
            self.repository.clone(),
        )
    }

    /// Get an incident report client
    pub fn reports(&self) -> ReportClient {
        ReportClient::new(
            self.url.clone(),
            self.http_client.clone(),
            self.repository.clone(),
        )
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::config::ClientOptions;
    pub use crate::error::{Error, ErrorKind, Notice};
    pub use crate::session::{Route, RouteDecision, SessionState};
    pub use crate::sos::{Dispatch, TriggerSource};
    pub use crate::Guardian;
}
