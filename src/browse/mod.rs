use anyhow::Result;
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::api::types::Credentials;
use crate::app::App;
use crate::auth;
use crate::telemetry;
use crate::telemetry::ops::browse::Phase as BrowsePhase;

pub mod session;

use session::{Command, FeedSession, SessionEvent};

/// newsfeed browse: interactive feed driven from stdin
#[derive(Args)]
pub struct BrowseCmd {
    /// Start on the trending feed
    #[arg(long, default_value_t = false)]
    pub trending: bool,
}

const HELP: &str = "\
Type to search (results follow after a short pause). Commands:
  :enter             search now with the current text
  :clear             leave search
  :more              scroll to the last article
  :like <id>         toggle like
  :trending on|off   switch personalized/trending
  :refresh | :retry
  :login <email> <password> | :logout
  :help | :quit";

#[derive(Debug)]
enum Line {
    Send(Vec<Command>),
    Help,
    Quit,
    Invalid(String),
}

fn parse_line(line: &str) -> Line {
    let Some(rest) = line.strip_prefix(':') else {
        return Line::Send(vec![Command::Input(line.to_string())]);
    };
    let mut words = rest.split_whitespace();
    let Some(cmd) = words.next() else {
        return Line::Help;
    };
    let args: Vec<&str> = words.collect();
    match (cmd, args.as_slice()) {
        ("enter", []) => Line::Send(vec![Command::Commit]),
        ("clear", []) => Line::Send(vec![Command::Clear]),
        // one visibility transition: in, then out again
        ("more", []) => Line::Send(vec![Command::LastItemVisible(true), Command::LastItemVisible(false)]),
        ("like", [id]) => Line::Send(vec![Command::ToggleLike(id.to_string())]),
        ("trending", ["on"]) => Line::Send(vec![Command::SetTrending(true)]),
        ("trending", ["off"]) => Line::Send(vec![Command::SetTrending(false)]),
        ("refresh", []) => Line::Send(vec![Command::Refresh]),
        ("retry", []) => Line::Send(vec![Command::Retry]),
        ("login", [email, password]) => Line::Send(vec![Command::Login(Credentials {
            email: email.to_string(),
            password: password.to_string(),
        })]),
        ("logout", []) => Line::Send(vec![Command::Logout]),
        ("help", []) => Line::Help,
        ("quit", []) | ("q", []) => Line::Quit,
        _ => Line::Invalid(format!("Unrecognized command: {line}")),
    }
}

pub async fn run(app: &App, args: BrowseCmd) -> Result<()> {
    let log = telemetry::browse();
    let _g = log.root_span_kv([("trending", args.trending.to_string())]).entered();

    match auth::bootstrap(app.api.as_ref(), &app.session).await {
        Some(viewer) => log.info(format!("👋 Signed in as {}", viewer.email)),
        None => log.info("Browsing anonymously: type to search, or :login <email> <password>."),
    }
    log.info(HELP);

    let (feed, mut events) = FeedSession::new(app.api.clone(), app.session.clone(), &app.cfg, args.trending);
    let (commands, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(feed.run(rx));

    let _l = log.span(&BrowsePhase::Loop).entered();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_line(line.trim_end()) {
                    Line::Send(cmds) => {
                        if cmds.into_iter().any(|c| commands.send(c).is_err()) {
                            break;
                        }
                    }
                    Line::Help => log.info(HELP),
                    Line::Quit => break,
                    Line::Invalid(msg) => log.warn(msg),
                }
            }
            Some(event) = events.recv() => match event {
                SessionEvent::View(view) if view.status.is_loading() => {
                    log.info(format!("⏳ {:?}…", view.status));
                }
                SessionEvent::View(view) => log.result(&view)?,
                SessionEvent::Notice(msg) => log.info(msg),
            },
        }
    }

    drop(commands);
    task.await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sent(line: &str) -> Vec<Command> {
        match parse_line(line) {
            Line::Send(cmds) => cmds,
            other => panic!("expected commands for {line:?}, got {other:?}"),
        }
    }

    #[test]
    fn plain_text_is_search_input() {
        assert!(matches!(sent("rust async").as_slice(), [Command::Input(t)] if t == "rust async"));
        assert!(matches!(sent("").as_slice(), [Command::Input(t)] if t.is_empty()));
    }

    #[test]
    fn more_reports_one_visibility_transition() {
        assert!(matches!(
            sent(":more").as_slice(),
            [Command::LastItemVisible(true), Command::LastItemVisible(false)]
        ));
    }

    #[test]
    fn commands_with_arguments() {
        assert!(matches!(sent(":like a1").as_slice(), [Command::ToggleLike(id)] if id == "a1"));
        assert!(matches!(sent(":trending on").as_slice(), [Command::SetTrending(true)]));
        assert!(matches!(
            sent(":login me@example.com pw").as_slice(),
            [Command::Login(c)] if c.email == "me@example.com" && c.password == "pw"
        ));
    }

    #[test]
    fn quit_help_and_garbage() {
        assert!(matches!(parse_line(":quit"), Line::Quit));
        assert!(matches!(parse_line(":"), Line::Help));
        assert!(matches!(parse_line(":like"), Line::Invalid(_)));
        assert!(matches!(parse_line(":trending maybe"), Line::Invalid(_)));
    }
}
