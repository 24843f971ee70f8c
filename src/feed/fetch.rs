use std::sync::Arc;

use crate::api::{FeedError, NewsApi, RecommendationQuery, SearchQuery};
use crate::telemetry;

use super::types::{Article, FeedMode, FeedPage, FeedRequest};

/// The wire call a [`FeedRequest`] turns into. The page size is always the
/// one the controller evaluates `has_more` against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PageCall {
    Recommendations(RecommendationQuery),
    Search(SearchQuery),
}

pub fn build_call(req: &FeedRequest, days: u32) -> PageCall {
    match req.mode {
        FeedMode::Search => PageCall::Search(SearchQuery {
            search: req.term.clone(),
            skip: req.offset,
            limit: req.page_size,
        }),
        FeedMode::Personal | FeedMode::Trending => PageCall::Recommendations(RecommendationQuery {
            top_n: req.page_size,
            trending: req.mode == FeedMode::Trending,
            days,
            skip: req.offset,
        }),
    }
}

/// Performs exactly one network fetch per request and validates the page.
#[derive(Clone)]
pub struct PageFetcher {
    api: Arc<dyn NewsApi>,
    days: u32,
}

impl PageFetcher {
    pub fn new(api: Arc<dyn NewsApi>, days: u32) -> Self {
        Self { api, days }
    }

    pub async fn fetch(&self, req: &FeedRequest) -> Result<FeedPage, FeedError> {
        let log = telemetry::feed();
        log.debug_kv("fetch", [
            ("mode", req.mode.as_str().to_string()),
            ("offset", req.offset.to_string()),
            ("page_size", req.page_size.to_string()),
        ]);
        let articles = match build_call(req, self.days) {
            PageCall::Recommendations(q) => self.api.recommendations(&q).await?,
            PageCall::Search(q) => self.api.search_articles(&q).await?.results,
        };
        validate(req, articles)
    }
}

fn validate(req: &FeedRequest, articles: Vec<Article>) -> Result<FeedPage, FeedError> {
    if articles.len() > req.page_size {
        return Err(FeedError::validation(format!(
            "server returned {} articles for a page of {}",
            articles.len(),
            req.page_size
        )));
    }
    if let Some(pos) = articles.iter().position(|a| a.id.trim().is_empty()) {
        return Err(FeedError::validation(format!("article at position {pos} has no id")));
    }
    Ok(FeedPage { articles, offset: req.offset, size: req.page_size })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{ApiCall, MockNewsApi};
    use crate::feed::types::sample_article;

    fn request(mode: FeedMode, term: &str, offset: usize) -> FeedRequest {
        FeedRequest { mode, term: term.into(), offset, page_size: 12 }
    }

    #[test]
    fn search_requests_use_skip_and_limit() {
        let call = build_call(&request(FeedMode::Search, "rust", 24), 7);
        assert_eq!(call, PageCall::Search(SearchQuery { search: "rust".into(), skip: 24, limit: 12 }));
    }

    #[test]
    fn feed_requests_use_skip_and_top_n() {
        let call = build_call(&request(FeedMode::Trending, "", 12), 3);
        assert_eq!(
            call,
            PageCall::Recommendations(RecommendationQuery { top_n: 12, trending: true, days: 3, skip: 12 })
        );
        let call = build_call(&request(FeedMode::Personal, "", 0), 7);
        assert!(matches!(call, PageCall::Recommendations(RecommendationQuery { trending: false, .. })));
    }

    #[tokio::test]
    async fn fetch_wraps_search_results_into_a_page() {
        let api = Arc::new(MockNewsApi::new());
        api.push_page(Ok(vec![sample_article("a", 1), sample_article("b", 2)]));
        let fetcher = PageFetcher::new(api.clone(), 7);

        let page = fetcher.fetch(&request(FeedMode::Search, "rust", 0)).await.unwrap();
        assert_eq!(page.articles.len(), 2);
        assert_eq!(page.size, 12);
        assert!(page.is_last());
        assert_eq!(
            api.calls(),
            vec![ApiCall::Search(SearchQuery { search: "rust".into(), skip: 0, limit: 12 })]
        );
    }

    #[tokio::test]
    async fn oversized_page_is_rejected() {
        let api = Arc::new(MockNewsApi::new());
        api.push_page(Ok((0..3).map(|i| sample_article(&i.to_string(), 0)).collect()));
        let fetcher = PageFetcher::new(api, 7);
        let req = FeedRequest { mode: FeedMode::Personal, term: String::new(), offset: 0, page_size: 2 };
        let err = fetcher.fetch(&req).await.unwrap_err();
        assert!(matches!(err, FeedError::Validation { .. }));
    }

    #[tokio::test]
    async fn article_without_id_is_rejected() {
        let api = Arc::new(MockNewsApi::new());
        api.push_page(Ok(vec![sample_article("", 0)]));
        let fetcher = PageFetcher::new(api, 7);
        let err = fetcher.fetch(&request(FeedMode::Personal, "", 0)).await.unwrap_err();
        assert!(matches!(err, FeedError::Validation { .. }));
    }
}
