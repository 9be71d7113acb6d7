//! HTTP client for the metrics API, plus the trait the monitor and chat
//! controller are written against.

use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::ApiError;
use crate::types::{ChatReply, ChatRequest, HistoryResponse, Prediction, Sample, SystemInfo};

/// Read and chat calls consumed by the core. Implemented over HTTP by
/// [`HttpApi`]; tests substitute scripted fakes.
pub trait DashboardApi: Send + Sync + 'static {
    /// Up to `limit` most recent samples, in whatever order the source uses.
    fn history(&self, limit: usize) -> impl Future<Output = Result<Vec<Sample>, ApiError>> + Send;

    fn prediction(&self) -> impl Future<Output = Result<Prediction, ApiError>> + Send;

    fn system_info(&self) -> impl Future<Output = Result<SystemInfo, ApiError>> + Send;

    /// Returns the analyst's answer text.
    fn ask(&self, question: &str) -> impl Future<Output = Result<String, ApiError>> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpApiConfig {
    pub base_url: Url,
    pub chat_url: Option<Url>,
    pub request_timeout: Option<Duration>,
    /// PEM bytes of an extra trust root.
    pub ca_pem: Option<Vec<u8>>,
}

#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    metrics: Url,
    predict: Url,
    system: Url,
    chat: Url,
}

impl HttpApi {
    pub fn new(cfg: &HttpApiConfig) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("ecopulse/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = cfg.request_timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(pem) = cfg.ca_pem.as_deref() {
            let cert = reqwest::Certificate::from_pem(pem)
                .map_err(|e| ApiError::Certificate(e.to_string()))?;
            builder = builder.add_root_certificate(cert);
        }
        let client = builder
            .build()
            .map_err(|e| ApiError::from_transport("client", e))?;

        let chat_base = cfg.chat_url.as_ref().unwrap_or(&cfg.base_url);
        Ok(Self {
            client,
            metrics: endpoint(&cfg.base_url, "metrics")?,
            predict: endpoint(&cfg.base_url, "predict")?,
            system: endpoint(&cfg.base_url, "system")?,
            chat: endpoint(chat_base, "chat")?,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        name: &'static str,
        req: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let resp = req
            .send()
            .await
            .map_err(|e| ApiError::from_transport(name, e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                endpoint: name,
                status: status.as_u16(),
            });
        }
        let body = resp
            .bytes()
            .await
            .map_err(|e| ApiError::from_transport(name, e))?;
        debug!(endpoint = name, bytes = body.len(), "response received");
        serde_json::from_slice(&body).map_err(|source| ApiError::Decode {
            endpoint: name,
            source,
        })
    }
}

impl DashboardApi for HttpApi {
    async fn history(&self, limit: usize) -> Result<Vec<Sample>, ApiError> {
        let req = self
            .client
            .get(self.metrics.clone())
            .query(&[("limit", limit)]);
        let resp: HistoryResponse = self.get_json("/metrics", req).await?;
        Ok(resp.data)
    }

    async fn prediction(&self) -> Result<Prediction, ApiError> {
        let req = self.client.get(self.predict.clone());
        self.get_json("/predict", req).await
    }

    async fn system_info(&self) -> Result<SystemInfo, ApiError> {
        let req = self.client.get(self.system.clone());
        self.get_json("/system", req).await
    }

    async fn ask(&self, question: &str) -> Result<String, ApiError> {
        let req = self
            .client
            .post(self.chat.clone())
            .json(&ChatRequest { question });
        let reply: ChatReply = self.get_json("/chat", req).await?;
        Ok(reply.answer)
    }
}

/// Joins `path` under `base`, keeping any prefix the base already has
/// (`http://host/api` + `chat` -> `http://host/api/chat`).
pub fn endpoint(base: &Url, path: &str) -> Result<Url, ApiError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    Ok(base.join(path)?)
}
