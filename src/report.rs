//! Incident reports

use guardian_rust_session::SessionRepository;
use log::{info, warn};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use url::Url;

use crate::error::Error;
use crate::fetch::{endpoint, Fetch};

/// Image attached as evidence
#[derive(Debug, Clone)]
pub struct Evidence {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime: String,
}

impl Evidence {
    /// A JPEG picked from the gallery
    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            file_name: "evidence.jpg".to_string(),
            mime: "image/jpeg".to_string(),
        }
    }
}

/// A report of an incident (e.g. a planned child marriage)
#[derive(Debug, Clone, Default)]
pub struct IncidentReport {
    pub description: String,
    pub address: String,
    pub evidence: Option<Evidence>,
}

/// Client for the report endpoint
#[derive(Debug, Clone)]
pub struct ReportClient {
    base_url: Url,
    http_client: Client,
    repository: SessionRepository,
}

impl ReportClient {
    pub(crate) fn new(base_url: Url, http_client: Client, repository: SessionRepository) -> Self {
        Self {
            base_url,
            http_client,
            repository,
        }
    }

    /// Submit a report. Description, address and evidence are required.
    pub async fn submit(&self, report: IncidentReport) -> Result<(), Error> {
        let evidence = match report.evidence {
            Some(evidence)
                if !report.description.trim().is_empty()
                    && !report.address.trim().is_empty()
                    && !evidence.bytes.is_empty() =>
            {
                evidence
            }
            _ => {
                return Err(Error::validation(
                    "Please fill all fields and select an image.",
                ))
            }
        };

        let created_by = match self.repository.profile().await {
            Ok(profile) => profile.and_then(|p| p.id).unwrap_or_default(),
            Err(err) => {
                warn!("Failed to load user ID: {}", err);
                String::new()
            }
        };

        let part = Part::bytes(evidence.bytes)
            .file_name(evidence.file_name)
            .mime_str(&evidence.mime)?;
        let form = Form::new()
            .text("description", report.description)
            .text("address", report.address)
            .text("status", "pending")
            .text("createdBy", created_by)
            .part("evidence", part);

        let url = endpoint(&self.base_url, &["api", "rcm", "add"])?;
        Fetch::post(&self.http_client, url.as_str())
            .session_auth(&self.repository)
            .await?
            .multipart(form)
            .execute_empty()
            .await?;

        info!("Report submitted");
        Ok(())
    }
}
