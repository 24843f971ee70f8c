use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::app::App;
use crate::auth;
use crate::telemetry;
use crate::telemetry::ops::like::Phase as LikePhase;

pub mod coordinator;

pub use coordinator::{LikeAction, LikeCoordinator, LikeTicket};

/// newsfeed like add/rm/ls
#[derive(Args)]
pub struct LikeCmd {
    #[command(subcommand)]
    pub cmd: LikeSub,
}

#[derive(Subcommand)]
pub enum LikeSub {
    /// Like an article
    Add { news_id: String },
    /// Remove a like
    Rm { news_id: String },
    /// List liked article ids
    Ls,
}

#[derive(Serialize)]
struct LikeResult<'a> {
    news_id: &'a str,
    action: Option<LikeAction>,
    liked: bool,
}

#[derive(Serialize)]
struct LikeList {
    count: usize,
    news_ids: Vec<String>,
}

pub async fn run(app: &App, args: LikeCmd) -> Result<()> {
    let log = telemetry::like();
    let _g = log.root_span().entered();
    if auth::bootstrap(app.api.as_ref(), &app.session).await.is_none() {
        bail!("Liking requires a logged-in viewer. Set NEWSFEED_TOKEN or pass --token.");
    }

    let mut likes = LikeCoordinator::new();
    {
        let _s = log.span(&LikePhase::Sync).entered();
        likes.replace(coordinator::fetch_like_set(app.api.as_ref(), app.session.as_ref()).await);
    }

    let (news_id, want) = match args.cmd {
        LikeSub::Ls => {
            let list = LikeList { count: likes.count(), news_ids: likes.liked_ids() };
            log.info(format!("❤️ {} liked articles", list.count));
            return log.result(&list);
        }
        LikeSub::Add { news_id } => (news_id, true),
        LikeSub::Rm { news_id } => (news_id, false),
    };

    if likes.is_liked(&news_id) == want {
        log.info(format!("↩️ {} already {}", news_id, if want { "liked" } else { "not liked" }));
        return log.result(&LikeResult { news_id: &news_id, action: None, liked: want });
    }

    let _s = log.span_kv(&LikePhase::Toggle, [("news_id", news_id.clone())]).entered();
    let outcome = likes.toggle(app.api.as_ref(), app.session.as_ref(), &news_id, &mut []).await;
    match outcome {
        Ok(action) => {
            log.settled(&news_id, &format!("{action:?}"), true);
            log.result(&LikeResult { news_id: &news_id, action: Some(action), liked: likes.is_liked(&news_id) })
        }
        Err(err) => {
            log.settled(&news_id, if want { "Like" } else { "Unlike" }, false);
            Err(err.into())
        }
    }
}
