//! Fear & Greed index from alternative.me

use std::time::Duration;

use chrono::{TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;

use super::FearGreedPoint;

const DEFAULT_BASE_URL: &str = "https://api.alternative.me";

#[derive(Debug, Deserialize)]
struct FngResponse {
    data: Vec<FngEntry>,
    metadata: Option<FngMetadata>,
}

#[derive(Debug, Deserialize)]
struct FngMetadata {
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FngEntry {
    value: String,
    value_classification: String,
    timestamp: String,
}

pub struct FearGreedClient {
    client: Client,
    base_url: String,
}

impl FearGreedClient {
    pub fn new() -> anyhow::Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// History of index readings, most recent first
    pub async fn fetch(&self, limit: usize) -> anyhow::Result<Vec<FearGreedPoint>> {
        let url = format!("{}/fng/?limit={limit}&format=json", self.base_url);
        let body: FngResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        if let Some(err) = body.metadata.and_then(|m| m.error) {
            anyhow::bail!("alternative.me error: {err}");
        }

        let mut points = Vec::with_capacity(body.data.len());
        for entry in body.data {
            let value: u32 = entry.value.parse()?;
            let secs: i64 = entry.timestamp.parse()?;
            let timestamp = Utc
                .timestamp_opt(secs, 0)
                .single()
                .ok_or_else(|| anyhow::anyhow!("bad timestamp {secs}"))?;
            points.push(FearGreedPoint {
                value,
                classification: entry.value_classification,
                timestamp,
            });
        }
        Ok(points)
    }
}
