use std::collections::HashSet;

use serde::Serialize;

use crate::api::{FeedError, NewsApi};
use crate::feed::types::Article;
use crate::session::SessionGate;
use crate::telemetry;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LikeAction {
    Like,
    Unlike,
}

/// An optimistic toggle that has been applied locally and awaits the
/// server's verdict. `count_delta` is what was actually added to the
/// displayed like-count of the list with the given `generation`; a rollback
/// undoes exactly that, and only on that list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LikeTicket {
    pub news_id: String,
    pub action: LikeAction,
    generation: u64,
    count_delta: i64,
}

/// Owns the viewer's like set and the apply/commit/rollback protocol for
/// like mutations. At most one mutation per article is outstanding; a second
/// toggle for the same id is rejected until the first settles.
#[derive(Debug, Default)]
pub struct LikeCoordinator {
    likes: HashSet<String>,
    pending: HashSet<String>,
}

impl LikeCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_liked(&self, news_id: &str) -> bool {
        self.likes.contains(news_id)
    }

    pub fn count(&self) -> usize {
        self.likes.len()
    }

    pub fn liked_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.likes.iter().cloned().collect();
        ids.sort();
        ids
    }

    /// Rebuilds the set wholesale (login, startup). Ids with a mutation in
    /// flight keep their optimistic membership.
    pub fn replace<I: IntoIterator<Item = String>>(&mut self, ids: I) {
        let mut fresh: HashSet<String> = ids.into_iter().collect();
        for id in &self.pending {
            if self.likes.contains(id) {
                fresh.insert(id.clone());
            } else {
                fresh.remove(id);
            }
        }
        self.likes = fresh;
    }

    pub fn clear(&mut self) {
        self.likes.clear();
    }

    /// Derives `is_liked` for every displayed article.
    pub fn decorate(&self, articles: &mut [Article]) {
        for a in articles.iter_mut() {
            a.is_liked = self.likes.contains(&a.id);
        }
    }

    /// Applies the optimistic half of a toggle to `articles`, the list shown
    /// under `generation`. Nothing is touched when the viewer is not
    /// authenticated or a mutation for the id is in flight.
    pub fn begin(
        &mut self,
        session: &dyn SessionGate,
        news_id: &str,
        articles: &mut [Article],
        generation: u64,
    ) -> Result<LikeTicket, FeedError> {
        if !session.is_authenticated() {
            return Err(FeedError::Auth("log in to like articles".into()));
        }
        if self.pending.contains(news_id) {
            return Err(FeedError::MutationPending(news_id.to_string()));
        }

        let action = if self.likes.contains(news_id) { LikeAction::Unlike } else { LikeAction::Like };
        match action {
            LikeAction::Like => self.likes.insert(news_id.to_string()),
            LikeAction::Unlike => self.likes.remove(news_id),
        };
        let liked = action == LikeAction::Like;
        let count_delta = adjust(articles, news_id, liked, |count| match action {
            LikeAction::Like => count.saturating_add(1),
            LikeAction::Unlike => count.saturating_sub(1),
        });
        self.pending.insert(news_id.to_string());

        telemetry::like().debug_kv("optimistic", [("news_id", news_id.to_string()), ("action", format!("{action:?}"))]);
        Ok(LikeTicket { news_id: news_id.to_string(), action, generation, count_delta })
    }

    /// Commits on success; on failure reverts membership and hands the error
    /// back. The count delta is reverted only if `articles` is still the list
    /// the optimistic update touched: a list loaded since carries the
    /// server's count, which never included it.
    pub fn settle(
        &mut self,
        ticket: &LikeTicket,
        result: Result<(), FeedError>,
        articles: &mut [Article],
        generation: u64,
    ) -> Result<(), FeedError> {
        self.pending.remove(&ticket.news_id);
        let Err(err) = result else {
            return Ok(());
        };

        let was_liked = ticket.action == LikeAction::Unlike;
        if was_liked {
            self.likes.insert(ticket.news_id.clone());
        } else {
            self.likes.remove(&ticket.news_id);
        }
        let delta = if ticket.generation == generation { ticket.count_delta } else { 0 };
        adjust(articles, &ticket.news_id, was_liked, |count| {
            let restored = i64::from(count) - delta;
            u32::try_from(restored.max(0)).unwrap_or(u32::MAX)
        });
        telemetry::like().warn_kv("rolled back", [("news_id", ticket.news_id.clone()), ("error", err.to_string())]);
        Err(err)
    }

    /// Full round trip: optimistic apply, mutation, commit or rollback.
    pub async fn toggle(
        &mut self,
        api: &dyn NewsApi,
        session: &dyn SessionGate,
        news_id: &str,
        articles: &mut [Article],
    ) -> Result<LikeAction, FeedError> {
        let ticket = self.begin(session, news_id, articles, 0)?;
        let result = send(api, &ticket).await;
        self.settle(&ticket, result, articles, 0)?;
        Ok(ticket.action)
    }
}

fn adjust<F: Fn(u32) -> u32>(articles: &mut [Article], news_id: &str, liked: bool, f: F) -> i64 {
    let Some(article) = articles.iter_mut().find(|a| a.id == news_id) else {
        return 0;
    };
    let before = article.like_count;
    article.like_count = f(before);
    article.is_liked = liked;
    i64::from(article.like_count) - i64::from(before)
}

/// Issues the network half of a toggle.
pub async fn send(api: &dyn NewsApi, ticket: &LikeTicket) -> Result<(), FeedError> {
    match ticket.action {
        LikeAction::Like => api.like(&ticket.news_id).await.map(|_| ()),
        LikeAction::Unlike => api.unlike(&ticket.news_id).await,
    }
}

/// Fetches the viewer's like set. Any failure yields an empty set rather
/// than a partial one.
pub async fn fetch_like_set(api: &dyn NewsApi, session: &dyn SessionGate) -> HashSet<String> {
    if !session.is_authenticated() {
        return HashSet::new();
    }
    match api.likes().await {
        Ok(records) => records.into_iter().map(|r| r.news_id).collect(),
        Err(err) => {
            telemetry::like().warn_kv("like set unavailable", [("error", err.to_string())]);
            HashSet::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{ApiCall, MockNewsApi};
    use crate::api::types::LikeRecord;
    use crate::feed::types::sample_article;
    use crate::session::{viewer, TokenSession};

    fn signed_in() -> TokenSession {
        let s = TokenSession::new(Some("tok".into()));
        s.confirm(viewer("u1"));
        s
    }

    #[tokio::test]
    async fn anonymous_toggle_is_blocked_before_any_request() {
        let api = MockNewsApi::new();
        let session = TokenSession::new(None);
        let mut likes = LikeCoordinator::new();
        let mut articles = vec![sample_article("a", 5)];

        let err = likes.toggle(&api, &session, "a", &mut articles).await.unwrap_err();
        assert!(matches!(err, FeedError::Auth(_)));
        assert_eq!(articles[0].like_count, 5);
        assert!(!likes.is_liked("a"));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn successful_like_keeps_optimistic_state() {
        let api = MockNewsApi::new();
        let session = signed_in();
        let mut likes = LikeCoordinator::new();
        let mut articles = vec![sample_article("a", 5)];

        let action = likes.toggle(&api, &session, "a", &mut articles).await.unwrap();
        assert_eq!(action, LikeAction::Like);
        assert_eq!(articles[0].like_count, 6);
        assert!(articles[0].is_liked);
        assert!(likes.is_liked("a"));
        assert_eq!(api.calls(), vec![ApiCall::Like("a".into())]);
    }

    #[tokio::test]
    async fn failed_unlike_restores_exact_state() {
        let api = MockNewsApi::new();
        api.push_mutation(Err(FeedError::Network("offline".into())));
        let session = signed_in();
        let mut likes = LikeCoordinator::new();
        likes.replace(["a".to_string()]);
        let mut articles = vec![sample_article("a", 9), sample_article("b", 1)];
        likes.decorate(&mut articles);
        let before = articles.clone();

        let err = likes.toggle(&api, &session, "a", &mut articles).await.unwrap_err();
        assert!(matches!(err, FeedError::Network(_)));
        assert_eq!(articles, before);
        assert!(likes.is_liked("a"));
        assert_eq!(api.calls(), vec![ApiCall::Unlike("a".into())]);
    }

    #[test]
    fn rollback_after_saturated_unlike_does_not_inflate() {
        let session = signed_in();
        let mut likes = LikeCoordinator::new();
        likes.replace(["a".to_string()]);
        let mut articles = vec![sample_article("a", 0)];

        let ticket = likes.begin(&session, "a", &mut articles, 1).unwrap();
        assert_eq!(articles[0].like_count, 0);
        let _ = likes.settle(&ticket, Err(FeedError::validation("nope")), &mut articles, 1);
        assert_eq!(articles[0].like_count, 0);
        assert!(articles[0].is_liked);
    }

    #[test]
    fn second_toggle_while_pending_is_rejected() {
        let session = signed_in();
        let mut likes = LikeCoordinator::new();
        let mut articles = vec![sample_article("a", 10)];

        let first = likes.begin(&session, "a", &mut articles, 1).unwrap();
        let second = likes.begin(&session, "a", &mut articles, 1);
        assert!(matches!(second, Err(FeedError::MutationPending(_))));
        assert_eq!(articles[0].like_count, 11);

        likes.settle(&first, Ok(()), &mut articles, 1).unwrap();
        assert_eq!(articles[0].like_count, 11);

        // once settled the id is free again and the delta never exceeds one
        let undo = likes.begin(&session, "a", &mut articles, 1).unwrap();
        assert_eq!(undo.action, LikeAction::Unlike);
        likes.settle(&undo, Ok(()), &mut articles, 1).unwrap();
        assert_eq!(articles[0].like_count, 10);
    }

    #[test]
    fn rollback_leaves_a_reloaded_list_at_the_server_count() {
        let session = signed_in();
        let mut likes = LikeCoordinator::new();
        let mut articles = vec![sample_article("a", 5)];

        let ticket = likes.begin(&session, "a", &mut articles, 1).unwrap();
        assert_eq!(articles[0].like_count, 6);

        // a refresh lands while the like is in flight
        let mut reloaded = vec![sample_article("a", 5)];
        likes.decorate(&mut reloaded);
        assert!(reloaded[0].is_liked);

        let err = likes.settle(&ticket, Err(FeedError::Network("offline".into())), &mut reloaded, 2);
        assert!(err.is_err());
        assert_eq!(reloaded[0].like_count, 5);
        assert!(!reloaded[0].is_liked);
        assert!(!likes.is_liked("a"));
    }

    #[test]
    fn late_like_set_does_not_undo_pending_toggle() {
        let session = signed_in();
        let mut likes = LikeCoordinator::new();
        let mut articles = vec![sample_article("a", 1)];

        let ticket = likes.begin(&session, "a", &mut articles, 1).unwrap();
        likes.replace(["b".to_string()]);
        assert!(likes.is_liked("a"));
        assert!(likes.is_liked("b"));

        likes.settle(&ticket, Ok(()), &mut articles, 1).unwrap();
        likes.replace(Vec::new());
        assert!(!likes.is_liked("a"));
    }

    #[tokio::test]
    async fn like_set_failure_leaves_it_empty() {
        let api = MockNewsApi::new();
        api.set_likes(Err(FeedError::Network("down".into())));
        let set = fetch_like_set(&api, &signed_in()).await;
        assert!(set.is_empty());

        api.set_likes(Ok(vec![LikeRecord { news_id: "x".into(), liked_at: None }]));
        let set = fetch_like_set(&api, &signed_in()).await;
        assert!(set.contains("x"));
    }
}
