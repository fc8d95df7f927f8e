//! Community feed: posts, comments and the in-memory feed state

use chrono::{DateTime, Utc};
use guardian_rust_session::SessionRepository;
use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use url::Url;

use crate::error::Error;
use crate::fetch::{endpoint, Fetch};

/// A comment on a post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub commented_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A community post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewPost<'a> {
    title: &'a str,
    content: &'a str,
    user_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewComment<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
}

/// Client-side feed state. Lives only as long as the screen.
#[derive(Debug, Default, Clone)]
pub struct FeedState {
    liked: HashSet<String>,
    expanded: Option<String>,
    drafts: HashMap<String, String>,
}

impl FeedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the like on a post. Returns whether the post is now liked.
    pub fn toggle_like(&mut self, post_id: &str) -> bool {
        if self.liked.remove(post_id) {
            false
        } else {
            self.liked.insert(post_id.to_string());
            true
        }
    }

    pub fn is_liked(&self, post_id: &str) -> bool {
        self.liked.contains(post_id)
    }

    /// Open a post's comment thread, closing any other. Toggling the open
    /// thread closes it. Returns whether the thread is now open.
    pub fn toggle_comments(&mut self, post_id: &str) -> bool {
        if self.expanded.as_deref() == Some(post_id) {
            self.expanded = None;
            false
        } else {
            self.expanded = Some(post_id.to_string());
            true
        }
    }

    pub fn expanded(&self) -> Option<&str> {
        self.expanded.as_deref()
    }

    pub fn set_draft(&mut self, post_id: &str, text: &str) {
        self.drafts.insert(post_id.to_string(), text.to_string());
    }

    pub fn draft(&self, post_id: &str) -> &str {
        self.drafts.get(post_id).map(String::as_str).unwrap_or("")
    }

    pub fn clear_draft(&mut self, post_id: &str) {
        self.drafts.remove(post_id);
    }
}

/// Client for the community endpoints
#[derive(Debug, Clone)]
pub struct CommunityClient {
    base_url: Url,
    http_client: Client,
    repository: SessionRepository,
}

impl CommunityClient {
    pub(crate) fn new(base_url: Url, http_client: Client, repository: SessionRepository) -> Self {
        Self {
            base_url,
            http_client,
            repository,
        }
    }

    /// Fetch all posts
    pub async fn list_posts(&self) -> Result<Vec<Post>, Error> {
        let url = endpoint(&self.base_url, &["api", "community", "posts"])?;
        let posts = Fetch::get(&self.http_client, url.as_str())
            .execute::<Vec<Post>>()
            .await?;
        debug!("Fetched {} posts", posts.len());
        Ok(posts)
    }

    /// Publish a post as the signed-in user
    pub async fn create_post(&self, title: &str, content: &str) -> Result<serde_json::Value, Error> {
        if title.trim().is_empty() || content.trim().is_empty() {
            return Err(Error::validation("Title and content are required."));
        }
        let user_id = self
            .user_id()
            .await
            .ok_or_else(|| Error::validation("User not found. Please log in again."))?;

        let url = endpoint(&self.base_url, &["api", "community", "create-post"])?;
        Fetch::post(&self.http_client, url.as_str())
            .session_auth(&self.repository)
            .await?
            .json(&NewPost {
                title,
                content,
                user_id: &user_id,
            })?
            .execute::<serde_json::Value>()
            .await
    }

    /// Comment on a post
    pub async fn add_comment(&self, post_id: &str, text: &str) -> Result<(), Error> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::validation("Comment cannot be empty."));
        }
        let user_id = self.user_id().await;

        let url = endpoint(&self.base_url, &["api", "comment", "post", post_id, "comment"])?;

        Fetch::post(&self.http_client, url.as_str())
            .session_auth(&self.repository)
            .await?
            .json(&NewComment {
                text,
                user_id: user_id.as_deref(),
            })?
            .execute_empty()
            .await
    }

    /// Send the draft for `post_id`, clearing it on success.
    ///
    /// Blank drafts are skipped without a request; returns whether a comment
    /// was sent.
    pub async fn submit_draft(&self, feed: &mut FeedState, post_id: &str) -> Result<bool, Error> {
        let draft = feed.draft(post_id).trim().to_string();
        if draft.is_empty() {
            return Ok(false);
        }
        self.add_comment(post_id, &draft).await?;
        feed.clear_draft(post_id);
        Ok(true)
    }

    async fn user_id(&self) -> Option<String> {
        match self.repository.profile().await {
            Ok(profile) => profile.and_then(|p| p.id),
            Err(err) => {
                warn!("Failed to load user info: {}", err);
                None
            }
        }
    }
}
