use std::collections::HashSet;

use serde::Serialize;

use crate::api::FeedError;
use crate::telemetry;

use super::types::{Article, EngineState, FeedMode, FeedPage, FeedRequest, FeedStatus};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchKind {
    Initial,
    More,
}

/// A fetch the controller wants performed, tagged with the generation it was
/// issued under. Hand it back to [`FeedController::apply`] with the outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub kind: FetchKind,
    pub request: FeedRequest,
}

#[derive(Debug)]
pub enum Applied {
    Replaced(usize),
    Appended(usize),
    Failed(FeedError),
    /// Issued under a superseded generation; dropped without touching state.
    Stale,
}

/// Pagination state machine for one mounted feed.
///
/// The controller never performs I/O. Every trigger returns at most one
/// [`FetchTicket`]; the caller runs it and reports back through `apply`.
/// Only the ticket issued under the current generation is ever applied, so
/// the last reset wins regardless of the order responses arrive in.
pub struct FeedController {
    page_size: usize,
    authenticated: bool,
    trending: bool,
    term: String,
    generation: u64,
    state: EngineState,
    in_flight: Option<FetchTicket>,
    last_failure: Option<FetchKind>,
}

impl FeedController {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            authenticated: false,
            trending: false,
            term: String::new(),
            generation: 0,
            state: EngineState::idle(),
            in_flight: None,
            last_failure: None,
        }
    }

    /// Picks the starting feed without issuing anything; the first session
    /// flip fetches it directly.
    pub fn with_trending(mut self, trending: bool) -> Self {
        self.trending = trending;
        self
    }

    pub fn state(&self) -> &EngineState { &self.state }
    pub fn articles(&self) -> &[Article] { &self.state.articles }
    pub fn articles_mut(&mut self) -> &mut [Article] { &mut self.state.articles }
    pub fn status(&self) -> FeedStatus { self.state.status }
    pub fn has_more(&self) -> bool { self.state.has_more }
    pub fn generation(&self) -> u64 { self.generation }
    pub fn is_fetching(&self) -> bool { self.in_flight.is_some() }

    /// Which dataset is shown. A non-empty search term wins over the session;
    /// without one, an anonymous viewer gets no feed at all.
    pub fn mode(&self) -> Option<FeedMode> {
        if !self.term.is_empty() {
            Some(FeedMode::Search)
        } else if !self.authenticated {
            None
        } else if self.trending {
            Some(FeedMode::Trending)
        } else {
            Some(FeedMode::Personal)
        }
    }

    pub fn set_authenticated(&mut self, authenticated: bool) -> Option<FetchTicket> {
        if self.authenticated == authenticated {
            return None;
        }
        self.authenticated = authenticated;
        self.reset("session")
    }

    pub fn set_search_term(&mut self, term: &str) -> Option<FetchTicket> {
        let term = term.trim();
        if self.term == term {
            return None;
        }
        self.term = term.to_string();
        self.reset("search")
    }

    pub fn set_trending(&mut self, trending: bool) -> Option<FetchTicket> {
        if self.trending == trending {
            return None;
        }
        self.trending = trending;
        self.reset("trending")
    }

    pub fn refresh(&mut self) -> Option<FetchTicket> {
        self.reset("refresh")
    }

    fn reset(&mut self, cause: &str) -> Option<FetchTicket> {
        let log = telemetry::feed();
        self.generation += 1;
        self.in_flight = None;
        self.last_failure = None;

        let Some(mode) = self.mode() else {
            log.info_kv("idle", [("cause", cause.to_string()), ("generation", self.generation.to_string())]);
            self.state = EngineState::idle();
            return None;
        };

        // a new generation never inherits the previous dataset
        self.state = EngineState { articles: Vec::new(), offset: 0, has_more: true, status: FeedStatus::LoadingInitial };
        log.info_kv("reset", [
            ("cause", cause.to_string()),
            ("mode", mode.as_str().to_string()),
            ("generation", self.generation.to_string()),
        ]);
        Some(self.issue(FetchKind::Initial, mode, 0))
    }

    /// Accepted only from `Ready` (or after a failed load-more) with more
    /// data available and nothing in flight.
    pub fn load_more(&mut self) -> Option<FetchTicket> {
        if self.in_flight.is_some() || !self.state.has_more {
            return None;
        }
        let retrying = self.state.status == FeedStatus::Error && self.last_failure == Some(FetchKind::More);
        if self.state.status != FeedStatus::Ready && !retrying {
            return None;
        }
        let mode = self.mode()?;
        let offset = self.state.offset + self.page_size;
        self.state.status = FeedStatus::LoadingMore;
        telemetry::feed().debug_kv("load_more", [("offset", offset.to_string()), ("generation", self.generation.to_string())]);
        Some(self.issue(FetchKind::More, mode, offset))
    }

    /// Re-issues whatever kind of fetch failed last, from the same position.
    pub fn retry(&mut self) -> Option<FetchTicket> {
        if self.state.status != FeedStatus::Error {
            return None;
        }
        match self.last_failure {
            Some(FetchKind::More) => self.load_more(),
            _ => self.reset("retry"),
        }
    }

    fn issue(&mut self, kind: FetchKind, mode: FeedMode, offset: usize) -> FetchTicket {
        let ticket = FetchTicket {
            generation: self.generation,
            kind,
            request: FeedRequest { mode, term: self.term.clone(), offset, page_size: self.page_size },
        };
        self.in_flight = Some(ticket.clone());
        ticket
    }

    pub fn apply(&mut self, ticket: &FetchTicket, result: Result<FeedPage, FeedError>) -> Applied {
        let log = telemetry::feed();
        if ticket.generation != self.generation || self.in_flight.as_ref() != Some(ticket) {
            log.debug_kv("stale response dropped", [
                ("ticket_generation", ticket.generation.to_string()),
                ("generation", self.generation.to_string()),
            ]);
            return Applied::Stale;
        }
        self.in_flight = None;

        let page = match result {
            Ok(page) => page,
            Err(err) => {
                // offset and has_more stay put so a retry resumes from here
                log.warn_kv("fetch failed", [("kind", format!("{:?}", ticket.kind)), ("error", err.to_string())]);
                self.state.status = FeedStatus::Error;
                self.last_failure = Some(ticket.kind);
                return Applied::Failed(err);
            }
        };

        self.last_failure = None;
        let has_more = !page.is_last();
        let offset = page.offset;
        let applied = match ticket.kind {
            FetchKind::Initial => {
                let n = page.articles.len();
                self.state.articles = page.articles;
                self.state.offset = 0;
                Applied::Replaced(n)
            }
            FetchKind::More => {
                let seen: HashSet<String> = self.state.articles.iter().map(|a| a.id.clone()).collect();
                let fresh: Vec<Article> = page.articles.into_iter().filter(|a| !seen.contains(&a.id)).collect();
                let n = fresh.len();
                self.state.articles.extend(fresh);
                self.state.offset = offset;
                Applied::Appended(n)
            }
        };
        self.state.has_more = has_more;
        self.state.status = if has_more { FeedStatus::Ready } else { FeedStatus::Exhausted };
        log.debug_kv("applied", [
            ("count", self.state.articles.len().to_string()),
            ("offset", self.state.offset.to_string()),
            ("has_more", has_more.to_string()),
        ]);
        applied
    }
}
