//! API client for the OCM console server

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Deserialize;

pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
    token: Option<String>,
}

/// Error body returned by the server
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    message: String,
    #[serde(default)]
    details: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            token,
        }
    }

    /// Build request with authentication header
    fn build_request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method, &url);

        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        request
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.build_request(reqwest::Method::GET, path).send().await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    pub async fn post<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .build_request(reqwest::Method::POST, path)
            .json(body)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        let response = self.build_request(reqwest::Method::DELETE, path).send().await?;
        check_status(response).await?;
        Ok(())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    anyhow::bail!("API request failed: {} - {}", status, describe_error(&text))
}

fn describe_error(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(err) => match err.details {
            Some(details) => format!("{}: {} ({})", err.error, err.message, details),
            None => format!("{}: {}", err.error, err.message),
        },
        Err(_) => body.to_string(),
    }
}

/// Percent-encode one path segment
pub fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}
