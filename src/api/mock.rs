use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::types::{Credentials, LikeRecord, SearchResults, TagCount, TokenResponse, UserProfile, UserTags};
use super::{FeedError, NewsApi, RecommendationQuery, SearchQuery};
use crate::feed::types::Article;

#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    Register(String),
    Login(String),
    Google,
    CurrentUser,
    Recommendations(RecommendationQuery),
    Search(SearchQuery),
    Like(String),
    Unlike(String),
    Likes,
    UserTags(usize),
}

/// Scripted backend: page results are served in FIFO order to both
/// `/recommendations` and `/articles`; mutations default to success.
#[derive(Default)]
pub struct MockNewsApi {
    pages: Mutex<VecDeque<Result<Vec<Article>, FeedError>>>,
    mutations: Mutex<VecDeque<Result<(), FeedError>>>,
    likes: Mutex<Option<Result<Vec<LikeRecord>, FeedError>>>,
    user: Mutex<Option<Result<UserProfile, FeedError>>>,
    calls: Mutex<Vec<ApiCall>>,
}

impl MockNewsApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_page(&self, page: Result<Vec<Article>, FeedError>) {
        self.pages.lock().unwrap().push_back(page);
    }

    pub fn push_mutation(&self, result: Result<(), FeedError>) {
        self.mutations.lock().unwrap().push_back(result);
    }

    pub fn set_likes(&self, likes: Result<Vec<LikeRecord>, FeedError>) {
        *self.likes.lock().unwrap() = Some(likes);
    }

    pub fn set_user(&self, user: Result<UserProfile, FeedError>) {
        *self.user.lock().unwrap() = Some(user);
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: ApiCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_page(&self) -> Result<Vec<Article>, FeedError> {
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FeedError::validation("mock page queue is empty")))
    }

    fn next_mutation(&self) -> Result<(), FeedError> {
        self.mutations.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}

#[async_trait]
impl NewsApi for MockNewsApi {
    async fn register(&self, credentials: &Credentials) -> Result<UserProfile, FeedError> {
        self.record(ApiCall::Register(credentials.email.clone()));
        Ok(UserProfile {
            id: "new-user".into(),
            email: credentials.email.clone(),
            name: None,
            picture: None,
            auth_provider: None,
        })
    }

    async fn login(&self, credentials: &Credentials) -> Result<TokenResponse, FeedError> {
        self.record(ApiCall::Login(credentials.email.clone()));
        Ok(TokenResponse { access_token: "mock-token".into(), token_type: "bearer".into() })
    }

    async fn login_with_google(&self, _id_token: &str) -> Result<TokenResponse, FeedError> {
        self.record(ApiCall::Google);
        Ok(TokenResponse { access_token: "mock-google-token".into(), token_type: "bearer".into() })
    }

    async fn current_user(&self) -> Result<UserProfile, FeedError> {
        self.record(ApiCall::CurrentUser);
        self.user
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(FeedError::Auth("no mock user".into())))
    }

    async fn recommendations(&self, query: &RecommendationQuery) -> Result<Vec<Article>, FeedError> {
        self.record(ApiCall::Recommendations(query.clone()));
        self.next_page()
    }

    async fn search_articles(&self, query: &SearchQuery) -> Result<SearchResults, FeedError> {
        self.record(ApiCall::Search(query.clone()));
        let results = self.next_page()?;
        let count = results.len();
        Ok(SearchResults { results, skip: query.skip, limit: query.limit, count })
    }

    async fn like(&self, news_id: &str) -> Result<LikeRecord, FeedError> {
        self.record(ApiCall::Like(news_id.to_string()));
        self.next_mutation()?;
        Ok(LikeRecord { news_id: news_id.to_string(), liked_at: None })
    }

    async fn unlike(&self, news_id: &str) -> Result<(), FeedError> {
        self.record(ApiCall::Unlike(news_id.to_string()));
        self.next_mutation()
    }

    async fn likes(&self) -> Result<Vec<LikeRecord>, FeedError> {
        self.record(ApiCall::Likes);
        self.likes.lock().unwrap().take().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn user_tags(&self, top_n: usize) -> Result<UserTags, FeedError> {
        self.record(ApiCall::UserTags(top_n));
        Ok(UserTags { tags: vec![TagCount { tag: "rust".into(), count: 3 }] })
    }
}
