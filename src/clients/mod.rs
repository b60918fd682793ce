/// External API clients module
use crate::errors::{ApiError, ApiResult};
use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// HTTP client wrapper with common configuration
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("rural-monitor/0.1")
            .build()?;
        Ok(Self { client })
    }

    pub fn get_client(&self) -> &Client {
        &self.client
    }
}

async fn json_body(resp: Response) -> ApiResult<Value> {
    if !resp.status().is_success() {
        return Err(ApiError::UpstreamStatus(resp.status().as_u16()));
    }
    Ok(resp.json().await?)
}

/// Client for the Python ML service, which also fronts the energy market ledger
#[derive(Clone)]
pub struct MlClient {
    http_client: HttpClient,
    base_url: String,
}

impl MlClient {
    pub fn new(base_url: String, timeout: Duration) -> ApiResult<Self> {
        Ok(Self {
            http_client: HttpClient::new(timeout)?,
            base_url,
        })
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> ApiResult<Value> {
        let resp = self
            .http_client
            .get_client()
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await?;
        json_body(resp).await
    }

    pub async fn predict_energy<B: Serialize>(&self, body: &B) -> ApiResult<Value> {
        self.post("/api/energy/predict", body).await
    }

    pub async fn detect_leak<B: Serialize>(&self, body: &B) -> ApiResult<Value> {
        self.post("/api/water/detect-leak", body).await
    }

    pub async fn optimize_irrigation<B: Serialize>(&self, body: &B) -> ApiResult<Value> {
        self.post("/api/agriculture/optimize-irrigation", body).await
    }

    /// Fetch energy market statistics
    pub async fn market_stats(&self) -> ApiResult<Value> {
        let resp = self
            .http_client
            .get_client()
            .get(format!("{}/api/blockchain/market-stats", self.base_url))
            .send()
            .await?;
        json_body(resp).await
    }
}
