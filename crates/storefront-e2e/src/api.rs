// reqres API client
//
// Thin typed wrapper over the two endpoints the API checks use. Responses are
// returned whatever their status so the checks can assert on it; only
// transport errors and non-JSON bodies are errors here.

use crate::config::SuiteConfig;
use crate::error::{Error, Result};
use regex::Regex;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;

/// Anchored at the start only, so trailing text after the domain is accepted.
static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@]+@[^@]+\.[^@]+").expect("email pattern compiles"));

/// Whether `email` has the basic `local@domain.tld` shape.
pub fn is_email_shaped(email: &str) -> bool {
    EMAIL_SHAPE.is_match(email)
}

/// Body of `POST /login`. A missing password is sent as an absent field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: Some(password.into()),
        }
    }

    /// Credentials with the password left out entirely
    pub fn email_only(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: None,
        }
    }
}

/// One entry of the `data` list returned by `GET /users`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Status code and decoded JSON body of a response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    /// `token` field of a successful login
    pub fn token(&self) -> Option<&str> {
        self.body.get("token").and_then(Value::as_str)
    }

    /// `error` field of a rejected request
    pub fn error(&self) -> Option<&str> {
        self.body.get("error").and_then(Value::as_str)
    }

    /// Entries of the `data` list; empty when the field is absent.
    pub fn users(&self) -> Result<Vec<User>> {
        match self.body.get("data") {
            Some(data) => Ok(serde_json::from_value(data.clone())?),
            None => Ok(Vec::new()),
        }
    }
}

/// Client for the reqres API with the suite's fixed headers.
#[derive(Debug, Clone)]
pub struct ReqresClient {
    http: reqwest::Client,
    base_url: String,
}

impl ReqresClient {
    /// Builds a client sending `x-api-key` and `Content-Type: application/json`
    /// on every request.
    pub fn new(config: &SuiteConfig) -> Result<Self> {
        let api_key = HeaderValue::from_str(&config.api_key).map_err(|e| Error::Config {
            key: "REQRES_API_KEY".to_string(),
            message: e.to_string(),
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static("x-api-key"), api_key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            http,
            base_url: config.api_base_url.as_str().trim_end_matches('/').to_string(),
        })
    }

    /// `POST /login`
    pub async fn login(&self, credentials: &Credentials) -> Result<ApiResponse> {
        let url = format!("{}/login", self.base_url);
        tracing::debug!(url = %url, email = %credentials.email, "POST login");
        let response = self.http.post(&url).json(credentials).send().await?;
        Self::decode(response).await
    }

    /// `GET /users?page=<page>`
    pub async fn list_users(&self, page: u32) -> Result<ApiResponse> {
        let url = format!("{}/users", self.base_url);
        tracing::debug!(url = %url, page, "GET users");
        let response = self
            .http
            .get(&url)
            .query(&[("page", page)])
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn decode(response: reqwest::Response) -> Result<ApiResponse> {
        let status = response.status().as_u16();
        let text = response.text().await?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text)?
        };
        tracing::debug!(status, "Response received");
        Ok(ApiResponse { status, body })
    }
}
