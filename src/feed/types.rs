use serde::{Deserialize, Serialize};

/// An article as served by `/recommendations` and `/articles`.
///
/// `is_liked` never comes from the server; it is derived from the viewer's
/// like set whenever a page is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default, rename = "publishedAt")]
    pub published_at: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub like_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f32>,
    #[serde(skip_deserializing, default)]
    pub is_liked: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedMode {
    Personal,
    Trending,
    Search,
}

impl FeedMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedMode::Personal => "personal",
            FeedMode::Trending => "trending",
            FeedMode::Search => "search",
        }
    }
}

/// Everything that determines a single page fetch. Two requests are
/// equivalent iff every field matches.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct FeedRequest {
    pub mode: FeedMode,
    pub term: String,
    pub offset: usize,
    pub page_size: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FeedPage {
    pub articles: Vec<Article>,
    pub offset: usize,
    pub size: usize,
}

impl FeedPage {
    /// A short page is the only "no more data" signal.
    pub fn is_last(&self) -> bool {
        self.articles.len() < self.size
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedStatus {
    Idle,
    LoadingInitial,
    LoadingMore,
    Ready,
    Error,
    Exhausted,
}

impl FeedStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, FeedStatus::LoadingInitial | FeedStatus::LoadingMore)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EngineState {
    pub articles: Vec<Article>,
    pub offset: usize,
    pub has_more: bool,
    pub status: FeedStatus,
}

impl EngineState {
    pub fn idle() -> Self {
        Self { articles: Vec::new(), offset: 0, has_more: false, status: FeedStatus::Idle }
    }
}

// Envelope payloads for `newsfeed feed`
#[derive(Serialize)]
pub struct FeedPlan {
    pub mode: FeedMode,
    pub requests: Vec<FeedRequest>,
}

#[derive(Serialize)]
pub struct FeedListing<'a> {
    /// Absent while idle: nothing is shown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<FeedMode>,
    pub status: FeedStatus,
    pub offset: usize,
    pub has_more: bool,
    pub count: usize,
    pub articles: &'a [Article],
}

#[cfg(test)]
pub(crate) fn sample_article(id: &str, like_count: u32) -> Article {
    Article {
        id: id.to_string(),
        title: format!("Article {id}"),
        description: None,
        image: None,
        source: Some("Dev.to".into()),
        published_at: None,
        url: None,
        tags: vec!["rust".into()],
        like_count,
        similarity: None,
        is_liked: false,
    }
}
