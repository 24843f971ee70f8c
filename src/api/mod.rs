use async_trait::async_trait;

use crate::feed::types::Article;

pub mod config;
pub mod error;
pub mod http;
#[cfg(test)]
pub mod mock;
pub mod types;

pub use error::FeedError;
use types::{Credentials, LikeRecord, SearchResults, TokenResponse, UserProfile, UserTags};

/// Query for `GET /recommendations`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecommendationQuery {
    pub top_n: usize,
    pub trending: bool,
    pub days: u32,
    pub skip: usize,
}

impl RecommendationQuery {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("top_n", self.top_n.to_string()),
            ("trending", self.trending.to_string()),
            ("days", self.days.to_string()),
            ("skip", self.skip.to_string()),
        ]
    }
}

/// Query for `GET /articles`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchQuery {
    pub search: String,
    pub skip: usize,
    pub limit: usize,
}

impl SearchQuery {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("skip", self.skip.to_string()), ("limit", self.limit.to_string())];
        if !self.search.is_empty() {
            pairs.push(("search", self.search.clone()));
        }
        pairs
    }
}

/// The backend contract consumed by the feed engine and the CLI.
#[async_trait]
pub trait NewsApi: Send + Sync {
    async fn register(&self, credentials: &Credentials) -> Result<UserProfile, FeedError>;
    async fn login(&self, credentials: &Credentials) -> Result<TokenResponse, FeedError>;
    async fn login_with_google(&self, id_token: &str) -> Result<TokenResponse, FeedError>;
    async fn current_user(&self) -> Result<UserProfile, FeedError>;

    async fn recommendations(&self, query: &RecommendationQuery) -> Result<Vec<Article>, FeedError>;
    async fn search_articles(&self, query: &SearchQuery) -> Result<SearchResults, FeedError>;

    async fn like(&self, news_id: &str) -> Result<LikeRecord, FeedError>;
    async fn unlike(&self, news_id: &str) -> Result<(), FeedError>;
    async fn likes(&self) -> Result<Vec<LikeRecord>, FeedError>;
    async fn user_tags(&self, top_n: usize) -> Result<UserTags, FeedError>;
}
