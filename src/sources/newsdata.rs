//! Headline retrieval from newsdata.io

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://newsdata.io";
const PAGE_SIZE: &str = "10";

#[derive(Debug, Deserialize)]
struct NewsResponse {
    status: String,
    #[serde(default)]
    results: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    title: Option<String>,
    description: Option<String>,
}

pub struct NewsdataClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl NewsdataClient {
    pub fn new(api_key: impl Into<String>) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Title + description per article, most recent first
    pub async fn headlines(&self, query: &str) -> anyhow::Result<Vec<String>> {
        let url = format!("{}/api/1/news", self.base_url);
        let body: NewsResponse = self
            .client
            .get(&url)
            .query(&[
                ("apikey", self.api_key.as_str()),
                ("q", query),
                ("language", "en"),
                ("size", PAGE_SIZE),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        if body.status != "success" {
            anyhow::bail!("newsdata.io status: {}", body.status);
        }
        Ok(body
            .results
            .into_iter()
            .map(|a| {
                let title = a.title.unwrap_or_default();
                let description = a.description.unwrap_or_default();
                format!("{title} {description}").trim().to_string()
            })
            .filter(|text| !text.is_empty())
            .collect())
    }
}
