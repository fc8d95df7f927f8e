//! HTTP request helper for the Guardian backend

use guardian_rust_session::SessionRepository;
use log::warn;
use reqwest::multipart::Form;
use reqwest::{header::{HeaderMap, HeaderValue}, Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use url::Url;

use crate::error::Error;

/// `segments` appended to the path of `base`, keeping any prefix it carries
pub fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, Error> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| Error::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

enum Body {
    Json(Vec<u8>),
    Multipart(Form),
}

/// Helper for building and executing HTTP requests
pub struct FetchBuilder<'a> {
    client: &'a Client,
    url: String,
    method: Method,
    headers: HeaderMap,
    body: Option<Body>,
}

impl<'a> FetchBuilder<'a> {
    /// Create a new FetchBuilder
    pub fn new(client: &'a Client, url: &str, method: Method) -> Self {
        Self {
            client,
            url: url.to_string(),
            method,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Add a header to the request
    pub fn header(mut self, name: &'static str, value: &str) -> Result<Self, Error> {
        let value = HeaderValue::from_str(value).map_err(|err| {
            warn!("Refusing invalid value for header {}", name);
            Error::Header(err)
        })?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Add bearer token authentication to the request
    pub fn bearer_auth(self, token: &str) -> Result<Self, Error> {
        self.header("Authorization", &format!("Bearer {}", token))
    }

    /// Authenticate with the stored session token, if there is one
    pub async fn session_auth(self, repository: &SessionRepository) -> Result<Self, Error> {
        match repository.token().await? {
            Some(token) => self.bearer_auth(&token),
            None => Ok(self),
        }
    }

    /// Add a JSON body to the request
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, Error> {
        let json = serde_json::to_vec(body)?;
        self.headers
            .insert("Content-Type", HeaderValue::from_static("application/json"));
        self.body = Some(Body::Json(json));
        Ok(self)
    }

    /// Add a multipart form body to the request
    pub fn multipart(mut self, form: Form) -> Self {
        self.body = Some(Body::Multipart(form));
        self
    }

    /// Build the request
    fn build(self) -> Result<RequestBuilder, Error> {
        let url = Url::parse(&self.url)?;

        let mut req = self.client.request(self.method, url).headers(self.headers);

        req = match self.body {
            Some(Body::Json(bytes)) => req.body(bytes),
            Some(Body::Multipart(form)) => req.multipart(form),
            None => req,
        };

        Ok(req)
    }

    /// Execute the request and parse the response as JSON
    pub async fn execute<T: DeserializeOwned>(self) -> Result<T, Error> {
        let response = self.execute_raw().await?;
        let response = ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// Execute the request, failing on a non-success status, and discard the body
    pub async fn execute_empty(self) -> Result<(), Error> {
        let response = self.execute_raw().await?;
        ensure_success(response).await?;
        Ok(())
    }

    /// Execute the request and return the raw response
    pub async fn execute_raw(self) -> Result<reqwest::Response, Error> {
        let req = self.build()?;
        Ok(req.send().await?)
    }
}

/// Turn a non-success response into [`Error::Api`], preferring the
/// backend's `message` field over the raw body.
pub async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or(text);

    Err(Error::Api {
        status: status.as_u16(),
        message,
    })
}

/// Helper for creating HTTP requests
pub struct Fetch;

impl Fetch {
    /// Create a GET request
    pub fn get<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::GET)
    }

    /// Create a POST request
    pub fn post<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::POST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_keeps_base_path() {
        let base = Url::parse("https://api.example.com/v1").unwrap();
        assert_eq!(
            endpoint(&base, &["api", "rcm", "add"]).unwrap().as_str(),
            "https://api.example.com/v1/api/rcm/add"
        );

        let base = Url::parse("https://api.example.com/").unwrap();
        assert_eq!(
            endpoint(&base, &["api", "comment", "post", "a/b", "comment"])
                .unwrap()
                .as_str(),
            "https://api.example.com/api/comment/post/a%2Fb/comment"
        );
    }

    #[test]
    fn test_invalid_header_value_is_an_error() {
        let client = Client::new();
        let result = Fetch::post(&client, "https://api.example.com/").bearer_auth("abc\ndef");
        assert!(matches!(result, Err(Error::Header(_))));
    }
}
