use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::Instrument;

use crate::api::config::ClientConfig;
use crate::api::types::{Credentials, UserProfile};
use crate::api::{FeedError, NewsApi};
use crate::auth;
use crate::feed::controller::{Applied, FeedController, FetchKind, FetchTicket};
use crate::feed::fetch::PageFetcher;
use crate::feed::types::{Article, FeedMode, FeedPage, FeedStatus};
use crate::like::{coordinator, LikeCoordinator, LikeTicket};
use crate::scroll::{LoadPermit, ScrollTrigger};
use crate::search::{QueryDebouncer, SearchModeStore};
use crate::session::{SessionGate, TokenSession};
use crate::telemetry;
use crate::telemetry::ops::browse::Phase as BrowsePhase;
use crate::telemetry::ops::feed::Phase as FeedPhase;
use crate::telemetry::ops::like::Phase as LikePhase;
use crate::telemetry::ops::search::Phase as SearchPhase;

/// What the UI side can ask of a running session.
#[derive(Debug, Clone)]
pub enum Command {
    /// Raw contents of the search box after a keystroke.
    Input(String),
    /// Enter in the search box.
    Commit,
    Clear,
    SetTrending(bool),
    Refresh,
    Retry,
    /// Visibility report for the last rendered article.
    LastItemVisible(bool),
    ToggleLike(String),
    Login(Credentials),
    Logout,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Input(_) => "input",
            Command::Commit => "commit",
            Command::Clear => "clear",
            Command::SetTrending(_) => "set_trending",
            Command::Refresh => "refresh",
            Command::Retry => "retry",
            Command::LastItemVisible(_) => "last_item_visible",
            Command::ToggleLike(_) => "toggle_like",
            Command::Login(_) => "login",
            Command::Logout => "logout",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ViewSnapshot {
    pub mode: Option<FeedMode>,
    pub status: FeedStatus,
    pub term: String,
    pub draft: String,
    pub searching: bool,
    pub offset: usize,
    pub has_more: bool,
    pub viewer: Option<String>,
    pub articles: Vec<Article>,
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    View(ViewSnapshot),
    Notice(String),
}

enum Completion {
    Page { ticket: FetchTicket, result: Result<FeedPage, FeedError> },
    Like { ticket: LikeTicket, result: Result<(), FeedError> },
    LikeSet { epoch: u64, ids: HashSet<String> },
    Login(Result<UserProfile, FeedError>),
}

/// One mounted feed: owns the controller, the search box, the like set and
/// the scroll trigger, and drives them from a single task. Network work is
/// spawned and reports back as a [`Completion`]; no state is touched outside
/// the loop.
pub struct FeedSession {
    api: Arc<dyn NewsApi>,
    session: Arc<TokenSession>,
    fetcher: PageFetcher,
    controller: FeedController,
    debouncer: QueryDebouncer,
    search: SearchModeStore,
    likes: LikeCoordinator,
    trigger: ScrollTrigger<String>,
    permit: Option<(LoadPermit, u64)>,
    like_epoch: u64,
    done_tx: mpsc::UnboundedSender<Completion>,
    done_rx: Option<mpsc::UnboundedReceiver<Completion>>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl FeedSession {
    pub fn new(
        api: Arc<dyn NewsApi>,
        session: Arc<TokenSession>,
        cfg: &ClientConfig,
        trending: bool,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        let this = Self {
            fetcher: PageFetcher::new(api.clone(), cfg.trending_days),
            api,
            session,
            controller: FeedController::new(cfg.page_size).with_trending(trending),
            debouncer: QueryDebouncer::new(cfg.debounce),
            search: SearchModeStore::new(),
            likes: LikeCoordinator::new(),
            trigger: ScrollTrigger::new(),
            permit: None,
            like_epoch: 0,
            done_tx,
            done_rx: Some(done_rx),
            events,
        };
        (this, events_rx)
    }

    /// Runs until the command channel closes.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        let Some(mut done) = self.done_rx.take() else {
            return;
        };
        let mut viewer = self.session.subscribe();
        let mut term = self.search.subscribe();
        let authed = viewer.borrow_and_update().is_authenticated();
        self.on_session(authed);
        self.publish();

        loop {
            let deadline = self.debouncer.deadline();
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(cmd) => self.handle(cmd),
                    None => break,
                },
                Some(completion) = done.recv() => self.complete(completion),
                Ok(()) = term.changed() => {
                    let committed = term.borrow_and_update().clone();
                    let ticket = self.controller.set_search_term(&committed);
                    self.start(ticket);
                    self.publish();
                }
                Ok(()) = viewer.changed() => {
                    let authed = viewer.borrow_and_update().is_authenticated();
                    self.on_session(authed);
                    self.publish();
                }
                _ = quiet_period(deadline) => {
                    let _s = telemetry::search().span(&SearchPhase::Debounce).entered();
                    if let Some(committed) = self.debouncer.poll(Instant::now()) {
                        self.commit_term(committed);
                    }
                }
            }
        }
        telemetry::browse().debug("session closed");
    }

    fn handle(&mut self, cmd: Command) {
        let log = telemetry::browse();
        let _s = log.span(&BrowsePhase::Input).entered();
        log.debug_kv("command", [("cmd", cmd.name().to_string())]);
        match cmd {
            Command::Input(text) => {
                if let Some(term) = self.debouncer.input(&text, Instant::now()) {
                    self.commit_term(term);
                }
            }
            Command::Commit => {
                let term = self.debouncer.commit_now();
                self.commit_term(term);
            }
            Command::Clear => {
                self.debouncer.input("", Instant::now());
                let _s = telemetry::search().span(&SearchPhase::Commit).entered();
                self.search.clear();
            }
            Command::SetTrending(on) => {
                let ticket = self.controller.set_trending(on);
                self.start(ticket);
                self.publish();
            }
            Command::Refresh => {
                let ticket = self.controller.refresh();
                self.start(ticket);
                self.publish();
            }
            Command::Retry => {
                let ticket = self.controller.retry();
                if ticket.is_none() {
                    self.notice("Nothing to retry.");
                }
                self.start(ticket);
                self.publish();
            }
            Command::LastItemVisible(visible) => self.on_last_item(visible),
            Command::ToggleLike(news_id) => self.toggle_like(news_id),
            Command::Login(credentials) => self.spawn_login(credentials),
            Command::Logout => auth::logout(&self.session),
        }
    }

    /// The store only notifies on an actual change; the loop picks that up
    /// and resets the controller.
    fn commit_term(&mut self, term: String) {
        let _s = telemetry::search().span(&SearchPhase::Commit).entered();
        self.search.commit(&term);
    }

    fn on_session(&mut self, authed: bool) {
        self.like_epoch += 1;
        if authed {
            self.spawn_like_set();
        } else {
            self.likes.clear();
            self.likes.decorate(self.controller.articles_mut());
        }
        let ticket = self.controller.set_authenticated(authed);
        self.start(ticket);
    }

    fn on_last_item(&mut self, visible: bool) {
        let Some(key) = self.trigger.target().cloned() else {
            return;
        };
        let has_more = self.controller.has_more();
        let fetching = self.controller.is_fetching();
        let Some(permit) = self.trigger.on_visibility(&key, visible, has_more, fetching) else {
            return;
        };
        match self.controller.load_more() {
            Some(ticket) => {
                self.permit = Some((permit, self.controller.generation()));
                self.spawn_fetch(ticket);
                self.publish();
            }
            None => self.trigger.settle(permit),
        }
    }

    fn toggle_like(&mut self, news_id: String) {
        let _s = telemetry::like().span_kv(&LikePhase::Toggle, [("news_id", news_id.clone())]).entered();
        let generation = self.controller.generation();
        match self.likes.begin(self.session.as_ref(), &news_id, self.controller.articles_mut(), generation) {
            Ok(ticket) => {
                self.publish();
                let api = self.api.clone();
                let done = self.done_tx.clone();
                tokio::spawn(async move {
                    let result = coordinator::send(api.as_ref(), &ticket).await;
                    let _ = done.send(Completion::Like { ticket, result });
                });
            }
            Err(err) if err.is_user_visible() => self.notice(format!("⚠️ {err}")),
            Err(err) => telemetry::like().debug(err.to_string()),
        }
    }

    /// Hands the ticket to a fetch task. A reset invalidates any scroll
    /// permit issued under an older generation.
    fn start(&mut self, ticket: Option<FetchTicket>) {
        if let Some((permit, generation)) = self.permit {
            if generation != self.controller.generation() {
                self.trigger.settle(permit);
                self.permit = None;
            }
        }
        if self.controller.mode().is_none() {
            self.trigger.detach();
        }
        if let Some(ticket) = ticket {
            self.spawn_fetch(ticket);
        }
    }

    fn spawn_fetch(&self, ticket: FetchTicket) {
        let phase = match ticket.kind {
            FetchKind::Initial => FeedPhase::Fetch,
            FetchKind::More => FeedPhase::LoadMore,
        };
        let span = telemetry::feed().span_kv(&phase, [
            ("mode", ticket.request.mode.as_str().to_string()),
            ("offset", ticket.request.offset.to_string()),
        ]);
        let fetcher = self.fetcher.clone();
        let done = self.done_tx.clone();
        tokio::spawn(
            async move {
                let result = fetcher.fetch(&ticket.request).await;
                let _ = done.send(Completion::Page { ticket, result });
            }
            .instrument(span),
        );
    }

    fn spawn_like_set(&self) {
        let epoch = self.like_epoch;
        let api = self.api.clone();
        let session = self.session.clone();
        let done = self.done_tx.clone();
        let span = telemetry::like().span(&LikePhase::Sync);
        tokio::spawn(
            async move {
                let ids = coordinator::fetch_like_set(api.as_ref(), session.as_ref()).await;
                let _ = done.send(Completion::LikeSet { epoch, ids });
            }
            .instrument(span),
        );
    }

    fn spawn_login(&self, credentials: Credentials) {
        let api = self.api.clone();
        let session = self.session.clone();
        let done = self.done_tx.clone();
        let span = telemetry::auth().span(&crate::telemetry::ops::auth::Phase::Login);
        tokio::spawn(
            async move {
                let result = auth::login(api.as_ref(), &session, &credentials).await;
                let _ = done.send(Completion::Login(result));
            }
            .instrument(span),
        );
    }

    fn complete(&mut self, completion: Completion) {
        match completion {
            Completion::Page { ticket, result } => {
                match self.controller.apply(&ticket, result) {
                    Applied::Stale => return,
                    Applied::Failed(err) => self.notice(format!("⚠️ {err} (:retry to try again)")),
                    Applied::Replaced(_) | Applied::Appended(_) => {}
                }
                if ticket.kind == FetchKind::More {
                    if let Some((permit, _)) = self.permit.take() {
                        self.trigger.settle(permit);
                    }
                }
                self.likes.decorate(self.controller.articles_mut());
                match self.controller.articles().last() {
                    Some(last) => self.trigger.observe(last.id.clone()),
                    None => self.trigger.detach(),
                }
                self.publish();
            }
            Completion::Like { ticket, result } => {
                let log = telemetry::like();
                let _s = log.span(&LikePhase::Settle).entered();
                let ok = result.is_ok();
                let generation = self.controller.generation();
                let settled = self.likes.settle(&ticket, result, self.controller.articles_mut(), generation);
                log.settled(&ticket.news_id, &format!("{:?}", ticket.action), ok);
                if let Err(err) = settled {
                    self.notice(format!("⚠️ {err}"));
                }
                self.publish();
            }
            Completion::LikeSet { epoch, ids } => {
                if epoch != self.like_epoch || !self.session.is_authenticated() {
                    return;
                }
                self.likes.replace(ids);
                self.likes.decorate(self.controller.articles_mut());
                self.publish();
            }
            Completion::Login(Ok(viewer)) => {
                self.notice(format!("✅ Welcome back, {}", viewer.name.as_deref().unwrap_or(&viewer.email)));
            }
            Completion::Login(Err(err)) => self.notice(format!("⚠️ login failed: {err}")),
        }
    }

    fn snapshot(&self) -> ViewSnapshot {
        let state = self.controller.state();
        ViewSnapshot {
            mode: self.controller.mode(),
            status: state.status,
            term: self.search.term(),
            draft: self.debouncer.draft().to_string(),
            searching: self.search.is_searching(),
            offset: state.offset,
            has_more: state.has_more,
            viewer: self.session.viewer().map(|v| v.email),
            articles: state.articles.clone(),
        }
    }

    fn publish(&self) {
        let _ = self.events.send(SessionEvent::View(self.snapshot()));
    }

    fn notice(&self, msg: impl Into<String>) {
        let _ = self.events.send(SessionEvent::Notice(msg.into()));
    }
}

async fn quiet_period(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
