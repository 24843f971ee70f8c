use anyhow::{bail, Result};
use clap::Args;

use crate::app::App;
use crate::auth;
use crate::telemetry;
use crate::telemetry::ops::tags::Phase as TagsPhase;

/// newsfeed tags: the viewer's most-read tags
#[derive(Args)]
pub struct TagsCmd {
    #[arg(long, default_value_t = 10)]
    pub top_n: usize,
}

pub async fn run(app: &App, args: TagsCmd) -> Result<()> {
    let log = telemetry::tags();
    let _g = log.root_span_kv([("top_n", args.top_n.to_string())]).entered();
    if auth::bootstrap(app.api.as_ref(), &app.session).await.is_none() {
        bail!("Tags are per viewer. Set NEWSFEED_TOKEN or pass --token.");
    }
    let tags = {
        let _s = log.span(&TagsPhase::Fetch).entered();
        app.api.user_tags(args.top_n).await?
    };
    log.info(format!("🏷️ {} tags", tags.tags.len()));
    log.result(&tags)
}
