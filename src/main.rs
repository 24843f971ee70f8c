use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;

mod api;
mod app;
mod auth;
mod browse;
mod feed;
mod like;
mod output;
mod scroll;
mod search;
mod session;
mod tags;
mod telemetry;
mod util;

use api::config::ClientConfig;

#[derive(Parser)]
#[command(name = "newsfeed", about = "Personalized news feed client")]
struct Cli {
    /// Backend base URL (overrides NEWSFEED_API_URL)
    #[arg(global = true, long)]
    api_url: Option<String>,
    /// Bearer token (overrides NEWSFEED_TOKEN)
    #[arg(global = true, long)]
    token: Option<String>,
    /// Emit a single JSON envelope to stdout; logs go to stderr
    #[arg(global = true, long, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Auth(auth::AuthCmd),
    Feed(feed::FeedCmd),
    Like(like::LikeCmd),
    Tags(tags::TagsCmd),
    Browse(browse::BrowseCmd),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    telemetry::config::set_json_mode(cli.json);

    // initialize logging/tracing (stderr). Respect RUST_LOG and NEWSFEED_LOG_FORMAT
    telemetry::config::init_tracing();

    let mut cfg = ClientConfig::from_env();
    if let Some(url) = cli.api_url {
        cfg.base_url = url;
    }
    if let Some(token) = cli.token {
        cfg.token = Some(token);
    }
    let app = app::App::new(cfg)?;

    match cli.command {
        Commands::Auth(args) => auth::run(&app, args).await?,
        Commands::Feed(args) => feed::run(&app, args).await?,
        Commands::Like(args) => like::run(&app, args).await?,
        Commands::Tags(args) => tags::run(&app, args).await?,
        Commands::Browse(args) => browse::run(&app, args).await?,
    }

    Ok(())
}
