use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE},
    Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

#[derive(Error, Debug)]
pub enum HttpClientError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("Invalid header value for {0}")]
    InvalidHeader(&'static str),

    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// JSON client for the hospital REST API.
pub struct HospitalApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HospitalApiClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.hospital_api_url.trim_end_matches('/').to_string(),
            api_key: config.hospital_api_key.clone(),
        }
    }

    fn get_headers(&self) -> Result<HeaderMap, HttpClientError> {
        let mut headers = HeaderMap::new();

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if !self.api_key.is_empty() {
            headers.insert(
                "x-api-key",
                HeaderValue::from_str(&self.api_key).map_err(|_| HttpClientError::InvalidHeader("x-api-key"))?,
            );
        }

        Ok(headers)
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>)
                            -> Result<T, HttpClientError>
    where T: DeserializeOwned {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let headers = self.get_headers()?;

        let mut req = self.client.request(method, &url)
            .headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            error!("API error ({}): {}", status, text);
            return Err(HttpClientError::Status { status: status.as_u16(), body: text });
        }

        let data = serde_json::from_str::<T>(&text)?;
        Ok(data)
    }

    pub async fn get<T>(&self, path: &str) -> Result<T, HttpClientError>
    where T: DeserializeOwned {
        self.request(Method::GET, path, None).await
    }

    pub async fn post<T>(&self, path: &str, body: Value) -> Result<T, HttpClientError>
    where T: DeserializeOwned {
        self.request(Method::POST, path, Some(body)).await
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}
