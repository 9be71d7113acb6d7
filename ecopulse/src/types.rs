//! Types that mirror the metrics API's JSON schema.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Opaque sample identifier. Only equality is meaningful to the liveness
/// logic; `crate::history` parses it separately for ordering and labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Timestamp(String);

impl Timestamp {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    // The API has shipped both ISO strings and epoch numbers here
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        match serde_json::Value::deserialize(d)? {
            serde_json::Value::String(s) => Ok(Timestamp(s)),
            serde_json::Value::Number(n) => Ok(Timestamp(n.to_string())),
            other => Err(serde::de::Error::custom(format!(
                "expected string or number timestamp, got {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Sample {
    pub timestamp: Timestamp,
    pub cpu: f64,
    pub memory: f64,
    pub disk: f64,
}

/// `GET /metrics?limit=N`. `data` is newest-first.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryResponse {
    pub data: Vec<Sample>,
}

/// Model name -> predicted value for one channel.
pub type ModelForecast = BTreeMap<String, f64>;

/// `GET /predict`. Every key other than `status` is a forecast channel; a
/// channel is `null` while the server is still gathering training data.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Prediction {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub channels: BTreeMap<String, Option<ModelForecast>>,
}

impl Prediction {
    pub fn channel(&self, name: &str) -> Option<&ModelForecast> {
        self.channels.get(name).and_then(Option::as_ref)
    }

    /// Mean of every model's forecast for `name`.
    pub fn consensus(&self, name: &str) -> Option<f64> {
        let models = self.channel(name)?;
        if models.is_empty() {
            return None;
        }
        Some(models.values().sum::<f64>() / models.len() as f64)
    }
}

/// `GET /system`. Sizes are in GB.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SystemInfo {
    pub hostname: String,
    pub cpu_arch: String,
    pub os: String,
    pub cpu_cores: u32,
    pub ram_total: f64,
    pub disk_used: f64,
    pub disk_total: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub question: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatReply {
    pub answer: String,
}
