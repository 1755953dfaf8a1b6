//! Infrastructure implementation of the `BackendApi` port over HTTP.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use crate::application::ports::{BackendApi, FormPayload};
use crate::domain::error::BackendError;

/// reqwest-backed client for the agent backend.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("a0/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to create HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    async fn checked(endpoint: &str, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(BackendError::Http {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body: body.trim().to_string(),
        }
        .into())
    }

    async fn json_body(endpoint: &str, response: reqwest::Response) -> Result<Value> {
        let response = Self::checked(endpoint, response).await?;
        let text = response
            .text()
            .await
            .with_context(|| format!("failed to read response from {endpoint}"))?;
        serde_json::from_str(&text).map_err(|e| {
            BackendError::Malformed {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }
}

impl BackendApi for HttpBackend {
    async fn post_json(&self, endpoint: &str, body: &Value) -> Result<Value> {
        let response = self
            .client
            .post(self.url(endpoint))
            .json(body)
            .send()
            .await
            .with_context(|| format!("request to {endpoint} failed"))?;
        Self::json_body(endpoint, response).await
    }

    async fn get_json(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Value> {
        let response = self
            .client
            .get(self.url(endpoint))
            .query(query)
            .send()
            .await
            .with_context(|| format!("request to {endpoint} failed"))?;
        Self::json_body(endpoint, response).await
    }

    async fn post_form(&self, endpoint: &str, payload: FormPayload) -> Result<Value> {
        let mut form = Form::new();
        for (name, value) in payload.fields {
            form = form.text(name, value);
        }
        for file in payload.files {
            form = form.part(file.field, Part::bytes(file.bytes).file_name(file.file_name));
        }
        let response = self
            .client
            .post(self.url(endpoint))
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("request to {endpoint} failed"))?;
        Self::json_body(endpoint, response).await
    }

    async fn download(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(self.url(endpoint))
            .query(query)
            .send()
            .await
            .with_context(|| format!("request to {endpoint} failed"))?;
        let response = Self::checked(endpoint, response).await?;
        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("failed to read response from {endpoint}"))?;
        Ok(bytes.to_vec())
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}
