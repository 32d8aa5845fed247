//! HTTP client for the Chi War backend JSON API.
//!
//! Pure client code: sign-in, token handling, and the minimal CRUD surface
//! the smoke flows exercise. The API itself belongs to the application under
//! test; nothing here defines a protocol.

use anyhow::{Context, Result};
use reqwest::header::AUTHORIZATION;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::errors::HarnessError;
use crate::session::{AuthToken, Credentials};

/// Request timeout for individual API calls
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    token: Option<AuthToken>,
}

impl ApiClient {
    pub fn new(base: Url) -> Result<Self> {
        // Redirects are classified, not followed: confirmation endpoints
        // answer success with a 3xx to a login page
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base,
            token: None,
        })
    }

    pub fn token(&self) -> Option<&AuthToken> {
        self.token.as_ref()
    }

    /// Adopt a token obtained elsewhere (e.g. read out of the browser)
    pub fn set_token(&mut self, token: AuthToken) {
        self.token = Some(token);
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .with_context(|| format!("Invalid API path: {}", path))
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.header(AUTHORIZATION, token.bearer()),
            None => builder,
        }
    }

    /// Devise-style sign-in. The token arrives in the `Authorization`
    /// response header; some deployments set a `jwtToken` cookie instead, so
    /// that is the fallback.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<AuthToken> {
        info!("Signing in as {}", credentials.email);

        let response = self
            .http
            .post(self.url("/users/sign_in")?)
            .json(&json!({
                "user": {
                    "email": credentials.email,
                    "password": credentials.password,
                }
            }))
            .send()
            .await
            .context("Sign-in request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HarnessError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let header_token = response
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(AuthToken::from_header_value);

        let cookie_token = response
            .cookies()
            .find(|c| c.name() == "jwtToken")
            .and_then(|c| AuthToken::from_cookie_value(c.value()));

        let token = header_token.or(cookie_token).ok_or_else(|| {
            HarnessError::AssertionFailed(
                "sign-in succeeded but no Authorization header or jwtToken cookie was set".into(),
            )
        })?;

        debug!("Got bearer token {}", token.preview());
        self.token = Some(token.clone());
        Ok(token)
    }

    /// Also serves as a token check: 401 here means the token is no good
    pub async fn current_user(&self) -> Result<Value> {
        self.get_json("/api/v2/users/current").await
    }

    pub async fn create_campaign(&self, name: &str) -> Result<Value> {
        self.post_json("/api/v2/campaigns", json!({ "campaign": { "name": name } }))
            .await
    }

    /// List a collection ("campaigns", "fights", …). `cache_bust` appends a
    /// throwaway query param so the refresh arm of a round trip cannot be
    /// served a stale cached response.
    pub async fn list_collection(&self, collection: &str, cache_bust: bool) -> Result<Vec<Value>> {
        let path = if cache_bust {
            format!(
                "/api/v2/{}?_={}",
                collection,
                chrono::Utc::now().timestamp_millis()
            )
        } else {
            format!("/api/v2/{}", collection)
        };
        let body = self.get_json(&path).await?;
        Ok(extract_collection(body, collection))
    }

    /// Whether an entity with this exact name shows up in a collection
    pub async fn entity_listed(
        &self,
        collection: &str,
        name: &str,
        cache_bust: bool,
    ) -> Result<bool> {
        let items = self.list_collection(collection, cache_bust).await?;
        Ok(items
            .iter()
            .any(|c| c.get("name").and_then(Value::as_str) == Some(name)))
    }

    pub async fn list_campaigns(&self, cache_bust: bool) -> Result<Vec<Value>> {
        self.list_collection("campaigns", cache_bust).await
    }

    /// Whether a campaign with this exact name shows up in the list
    pub async fn campaign_listed(&self, name: &str, cache_bust: bool) -> Result<bool> {
        self.entity_listed("campaigns", name, cache_bust).await
    }

    pub async fn create_character(&self, name: &str) -> Result<Value> {
        self.post_json(
            "/api/v2/characters",
            json!({ "character": { "name": name } }),
        )
        .await
    }

    pub async fn create_fight(&self, name: &str) -> Result<Value> {
        self.post_json("/api/v2/fights", json!({ "fight": { "name": name } }))
            .await
    }

    /// Complete a signup via the emailed confirmation token
    pub async fn confirm(&self, confirmation_token: &str) -> Result<()> {
        let mut url = self.url("/users/confirmation")?;
        url.query_pairs_mut()
            .append_pair("confirmation_token", confirmation_token);

        let response = self.http.get(url).send().await?;
        let status = response.status();
        // Confirmation endpoints commonly redirect on success
        if status.is_success() || status.is_redirection() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(HarnessError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            }
            .into())
        }
    }

    async fn get_json(&self, path: &str) -> Result<Value> {
        let response = self.authed(self.http.get(self.url(path)?)).send().await?;
        Self::json_or_status_error(response).await
    }

    async fn post_json(&self, path: &str, body: Value) -> Result<Value> {
        let response = self
            .authed(self.http.post(self.url(path)?))
            .json(&body)
            .send()
            .await?;
        Self::json_or_status_error(response).await
    }

    async fn json_or_status_error(response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        if status.is_success() {
            response.json().await.context("Response was not valid JSON")
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(HarnessError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            }
            .into())
        }
    }
}

/// The API returns either a bare array or an object keyed by the collection
/// name, depending on endpoint version. Accept both.
fn extract_collection(body: Value, key: &str) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove(key) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;
