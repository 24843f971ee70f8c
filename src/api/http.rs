use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client as HttpClient, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use super::config::ClientConfig;
use super::error::{preview, FeedError};
use super::types::{
    Credentials, GoogleTokenRequest, LikeRecord, LikeRequest, SearchResults, TokenResponse,
    UnlikeResponse, UserProfile, UserTags,
};
use super::{NewsApi, RecommendationQuery, SearchQuery};
use crate::feed::types::Article;
use crate::session::SessionGate;

/// reqwest-backed implementation of [`NewsApi`].
#[derive(Clone)]
pub struct HttpNewsApi {
    http: HttpClient,
    cfg: ClientConfig,
    session: Arc<dyn SessionGate>,
}

impl HttpNewsApi {
    pub fn new(cfg: ClientConfig, session: Arc<dyn SessionGate>) -> Result<Self, FeedError> {
        let mut builder = HttpClient::builder();
        if let Some(timeout) = cfg.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(FeedError::from_reqwest)?;
        Ok(Self { http, cfg, session })
    }

    /// Requests that need a credential never leave the process without one.
    fn authed(&self, req: RequestBuilder) -> Result<RequestBuilder, FeedError> {
        let token = self
            .session
            .token()
            .ok_or_else(|| FeedError::Auth("no stored credential".into()))?;
        Ok(req.bearer_auth(token))
    }

    /// Attaches the bearer token when one is stored, otherwise sends anonymously.
    fn maybe_authed(&self, req: RequestBuilder) -> RequestBuilder {
        match self.session.token() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, FeedError> {
        let response = req.send().await.map_err(FeedError::from_reqwest)?;
        read_json(response).await
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, FeedError> {
    let status = response.status();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = response.bytes().await.map_err(FeedError::from_reqwest)?;

    if !status.is_success() {
        return Err(FeedError::from_status(status, &String::from_utf8_lossy(&bytes)));
    }

    let is_json = content_type
        .as_deref()
        .is_some_and(|ct| ct.contains("application/json"));
    if !is_json {
        return Err(FeedError::Validation {
            status: Some(status.as_u16()),
            message: format!(
                "expected JSON but got {}: {}",
                content_type.as_deref().unwrap_or("no content type"),
                preview(&String::from_utf8_lossy(&bytes))
            ),
        });
    }

    serde_json::from_slice(&bytes).map_err(|e| FeedError::validation(format!("decode error: {e}")))
}

#[async_trait]
impl NewsApi for HttpNewsApi {
    async fn register(&self, credentials: &Credentials) -> Result<UserProfile, FeedError> {
        let req = self.http.post(self.cfg.endpoint("/register")).json(credentials);
        self.send_json(req).await
    }

    async fn login(&self, credentials: &Credentials) -> Result<TokenResponse, FeedError> {
        let form = [
            ("username", credentials.email.as_str()),
            ("password", credentials.password.as_str()),
        ];
        let req = self.http.post(self.cfg.endpoint("/token")).form(&form);
        self.send_json(req).await
    }

    async fn login_with_google(&self, id_token: &str) -> Result<TokenResponse, FeedError> {
        let req = self
            .http
            .post(self.cfg.endpoint("/auth/google"))
            .json(&GoogleTokenRequest { token: id_token });
        self.send_json(req).await
    }

    async fn current_user(&self) -> Result<UserProfile, FeedError> {
        let req = self.authed(self.http.get(self.cfg.endpoint("/auth/me")))?;
        self.send_json(req).await
    }

    async fn recommendations(&self, query: &RecommendationQuery) -> Result<Vec<Article>, FeedError> {
        let req = self
            .http
            .get(self.cfg.endpoint("/recommendations"))
            .query(&query.query_pairs());
        let req = self.authed(req)?;
        self.send_json(req).await
    }

    async fn search_articles(&self, query: &SearchQuery) -> Result<SearchResults, FeedError> {
        let req = self
            .http
            .get(self.cfg.endpoint("/articles"))
            .query(&query.query_pairs());
        self.send_json(self.maybe_authed(req)).await
    }

    async fn like(&self, news_id: &str) -> Result<LikeRecord, FeedError> {
        let req = self
            .http
            .post(self.cfg.endpoint("/like"))
            .json(&LikeRequest { news_id });
        let req = self.authed(req)?;
        self.send_json(req).await
    }

    async fn unlike(&self, news_id: &str) -> Result<(), FeedError> {
        let req = self
            .http
            .delete(self.cfg.endpoint("/like"))
            .json(&LikeRequest { news_id });
        let req = self.authed(req)?;
        let _: UnlikeResponse = self.send_json(req).await?;
        Ok(())
    }

    async fn likes(&self) -> Result<Vec<LikeRecord>, FeedError> {
        let req = self.authed(self.http.get(self.cfg.endpoint("/likes")))?;
        self.send_json(req).await
    }

    async fn user_tags(&self, top_n: usize) -> Result<UserTags, FeedError> {
        let req = self
            .http
            .get(self.cfg.endpoint("/user-tags"))
            .query(&[("top_n", top_n.to_string())]);
        let req = self.authed(req)?;
        self.send_json(req).await
    }
}
