//! Public Reddit JSON listing (no OAuth)
//!
//! The hot listing of a subreddit is readable without credentials as
//! long as a descriptive User-Agent is sent.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use super::Post;

const DEFAULT_BASE_URL: &str = "https://www.reddit.com";

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<ListingChild>,
}

#[derive(Debug, Deserialize)]
struct ListingChild {
    data: PostData,
}

#[derive(Debug, Deserialize)]
struct PostData {
    title: String,
    #[serde(default)]
    selftext: String,
}

pub struct RedditClient {
    client: Client,
    base_url: String,
}

impl RedditClient {
    pub fn new(user_agent: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent.to_string())
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub async fn hot_posts(&self, subreddit: &str, limit: usize) -> anyhow::Result<Vec<Post>> {
        let url = format!("{}/r/{subreddit}/hot.json?limit={limit}", self.base_url);
        let listing: Listing = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(listing
            .data
            .children
            .into_iter()
            .map(|child| Post {
                title: child.data.title,
                body: child.data.selftext,
            })
            .collect())
    }
}
