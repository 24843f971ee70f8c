use std::time::Instant;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Args;

use crate::api::FeedError;
use crate::app::App;
use crate::auth;
use crate::like::{coordinator, LikeCoordinator};
use crate::session::SessionGate;
use crate::telemetry;
use crate::telemetry::ops::feed::Phase as FeedPhase;
use crate::util::time::parse_days_window;

pub mod controller;
pub mod fetch;
pub mod types;

use controller::{Applied, FeedController, FetchTicket};
use fetch::PageFetcher;
use types::{FeedListing, FeedPlan, FeedRequest};

/// newsfeed feed: personalized, trending or search results, page by page
#[derive(Args)]
pub struct FeedCmd {
    /// Show trending articles instead of the personalized feed
    #[arg(long, default_value_t = false)]
    pub trending: bool,
    /// Search all articles instead (works without logging in)
    #[arg(long)]
    pub search: Option<String>,
    /// How many pages to load (first page plus load-more cycles)
    #[arg(long, default_value_t = 1)]
    pub pages: usize,
    #[arg(long)]
    pub page_size: Option<usize>,
    /// Trending window: "7d", "3", or a date like 2024-01-01
    #[arg(long)]
    pub days: Option<String>,
    /// Print the requests that would be issued, without network I/O
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

pub async fn run(app: &App, args: FeedCmd) -> Result<()> {
    let started = Instant::now();
    let log = telemetry::feed();
    let _g = log.root_span_kv([
        ("trending", args.trending.to_string()),
        ("search", format!("{:?}", args.search)),
        ("pages", args.pages.to_string()),
        ("dry_run", args.dry_run.to_string()),
    ]).entered();

    let page_size = args.page_size.unwrap_or(app.cfg.page_size).max(1);
    let days = match args.days.as_deref() {
        Some(raw) => match parse_days_window(raw, Utc::now()) {
            Some(d) => d,
            None => bail!("Invalid --days window: {}", raw),
        },
        None => app.cfg.trending_days,
    };

    let authenticated = if args.dry_run {
        app.session.has_credential()
    } else {
        auth::bootstrap(app.api.as_ref(), &app.session).await.is_some()
    };

    let mut controller = FeedController::new(page_size);
    let ticket = {
        let _s = log.span(&FeedPhase::Reset).entered();
        // only the ticket from the last trigger is current; earlier ones are stale
        [
            controller.set_trending(args.trending),
            controller.set_search_term(args.search.as_deref().unwrap_or("")),
            controller.set_authenticated(authenticated),
        ]
        .into_iter()
        .flatten()
        .last()
    };

    let Some(ticket) = ticket else {
        log.info("ℹ️  Nothing to show: log in (NEWSFEED_TOKEN) or pass --search.");
        let state = controller.state();
        return log.result(&FeedListing {
            mode: None,
            status: state.status,
            offset: state.offset,
            has_more: state.has_more,
            count: 0,
            articles: &state.articles,
        });
    };
    let mode = ticket.request.mode;

    if args.dry_run {
        let _s = log.span(&FeedPhase::Plan).entered();
        let plan = FeedPlan { mode, requests: planned_requests(&ticket, args.pages) };
        log.info(format!("📝 Feed plan — mode={} requests={}", mode.as_str(), plan.requests.len()));
        log.info("   Drop --dry-run to fetch.");
        return log.plan(&plan);
    }

    let mut likes = LikeCoordinator::new();
    if authenticated {
        likes.replace(coordinator::fetch_like_set(app.api.as_ref(), app.session.as_ref()).await);
    }

    let fetcher = PageFetcher::new(app.api.clone(), days);
    load_pages(&fetcher, &mut controller, ticket, args.pages)
        .await
        .with_context(|| format!("fetching first {} page", mode.as_str()))?;

    let _s = log.span(&FeedPhase::Output).entered();
    likes.decorate(controller.articles_mut());
    let state = controller.state();
    log.page_summary(mode.as_str(), state.articles.len(), state.offset, state.has_more);
    log.result_timed(
        &FeedListing {
            mode: Some(mode),
            status: controller.status(),
            offset: state.offset,
            has_more: state.has_more,
            count: state.articles.len(),
            articles: &state.articles,
        },
        started,
    )
}

/// Loads up to `pages` pages. Only a failed first page is an error; a failed
/// load-more stops early and leaves the pages loaded so far in `Error` state.
async fn load_pages(
    fetcher: &PageFetcher,
    controller: &mut FeedController,
    mut ticket: FetchTicket,
    pages: usize,
) -> Result<usize, FeedError> {
    let log = telemetry::feed();
    let mut loaded = 0usize;
    loop {
        let result = {
            let phase = if loaded == 0 { FeedPhase::Fetch } else { FeedPhase::LoadMore };
            let _s = log.span_kv(&phase, [("offset", ticket.request.offset.to_string())]).entered();
            fetcher.fetch(&ticket.request).await
        };
        if let Applied::Failed(err) = controller.apply(&ticket, result) {
            if loaded == 0 {
                return Err(err);
            }
            log.warn(format!("⚠️  Stopped after {loaded} page(s): {err}"));
            return Ok(loaded);
        }
        loaded += 1;
        if loaded >= pages {
            return Ok(loaded);
        }
        match controller.load_more() {
            Some(next) => ticket = next,
            None => return Ok(loaded),
        }
    }
}

fn planned_requests(first: &FetchTicket, pages: usize) -> Vec<FeedRequest> {
    (0..pages.max(1))
        .map(|i| FeedRequest { offset: first.request.offset + i * first.request.page_size, ..first.request.clone() })
        .collect()
}
