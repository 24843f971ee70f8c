use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::api::types::{Credentials, UserProfile};
use crate::api::{FeedError, NewsApi};
use crate::app::App;
use crate::session::{SessionGate, TokenSession};
use crate::telemetry;
use crate::telemetry::ops::auth::Phase as AuthPhase;

/// newsfeed auth register/login/google/me/logout
#[derive(Args)]
pub struct AuthCmd {
    #[command(subcommand)]
    pub cmd: AuthSub,
}

#[derive(Subcommand)]
pub enum AuthSub {
    /// Create an account
    Register { email: String, password: String },
    /// Exchange email/password for a bearer token
    Login { email: String, password: String },
    /// Exchange a Google identity token for a bearer token
    Google { id_token: String },
    /// Show the viewer behind the current token
    Me,
    /// Forget the current token
    Logout,
}

#[derive(Serialize)]
struct LoginResult<'a> {
    access_token: &'a str,
    viewer: &'a UserProfile,
}

/// Confirms a stored credential against `/auth/me`. Any failure clears it.
pub async fn bootstrap(api: &dyn NewsApi, session: &TokenSession) -> Option<UserProfile> {
    if !session.has_credential() {
        return None;
    }
    let log = telemetry::auth();
    let _s = log.span(&AuthPhase::Me).entered();
    match api.current_user().await {
        Ok(viewer) => {
            session.confirm(viewer.clone());
            Some(viewer)
        }
        Err(err) => {
            log.warn_kv("stored credential rejected", [("error", err.to_string())]);
            session.clear();
            None
        }
    }
}

pub async fn login(api: &dyn NewsApi, session: &TokenSession, credentials: &Credentials) -> Result<UserProfile, FeedError> {
    let token = api.login(credentials).await?;
    establish(api, session, token.access_token).await
}

pub async fn login_with_google(api: &dyn NewsApi, session: &TokenSession, id_token: &str) -> Result<UserProfile, FeedError> {
    let token = api.login_with_google(id_token).await?;
    establish(api, session, token.access_token).await
}

async fn establish(api: &dyn NewsApi, session: &TokenSession, token: String) -> Result<UserProfile, FeedError> {
    session.store_token(token);
    match api.current_user().await {
        Ok(viewer) => {
            session.confirm(viewer.clone());
            Ok(viewer)
        }
        Err(err) => {
            session.clear();
            Err(err)
        }
    }
}

pub fn logout(session: &TokenSession) {
    session.clear();
    telemetry::auth().info("👋 Logged out");
}

pub async fn run(app: &App, args: AuthCmd) -> Result<()> {
    let log = telemetry::auth();
    let _g = log.root_span().entered();
    let api = app.api.as_ref();
    match args.cmd {
        AuthSub::Register { email, password } => {
            let _s = log.span(&AuthPhase::Register).entered();
            let viewer = api.register(&Credentials { email, password }).await?;
            log.info(format!("✅ Account created for {}; log in to continue.", viewer.email));
            log.result(&viewer)?;
        }
        AuthSub::Login { email, password } => {
            let _s = log.span(&AuthPhase::Login).entered();
            let viewer = login(api, &app.session, &Credentials { email, password }).await?;
            report_login(app, &viewer)?;
        }
        AuthSub::Google { id_token } => {
            let _s = log.span(&AuthPhase::Login).entered();
            let viewer = login_with_google(api, &app.session, &id_token).await?;
            report_login(app, &viewer)?;
        }
        AuthSub::Me => {
            let Some(viewer) = bootstrap(api, &app.session).await else {
                bail!("Not logged in. Set NEWSFEED_TOKEN or pass --token.");
            };
            log.result(&viewer)?;
        }
        AuthSub::Logout => {
            let _s = log.span(&AuthPhase::Logout).entered();
            logout(&app.session);
            log.info("   Tokens are not persisted; unset NEWSFEED_TOKEN to stay logged out.");
        }
    }
    Ok(())
}

fn report_login(app: &App, viewer: &UserProfile) -> Result<()> {
    let log = telemetry::auth();
    let token = app.session.token().unwrap_or_default();
    log.info(format!("✅ Welcome back, {}", viewer.name.as_deref().unwrap_or(&viewer.email)));
    log.result(&LoginResult { access_token: &token, viewer })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{ApiCall, MockNewsApi};
    use crate::session::viewer;

    #[tokio::test]
    async fn bootstrap_clears_rejected_token() {
        let api = MockNewsApi::new();
        api.set_user(Err(FeedError::Auth("expired".into())));
        let session = TokenSession::new(Some("old".into()));
        assert!(bootstrap(&api, &session).await.is_none());
        assert!(!session.has_credential());
    }

    #[tokio::test]
    async fn bootstrap_without_token_sends_nothing() {
        let api = MockNewsApi::new();
        let session = TokenSession::new(None);
        assert!(bootstrap(&api, &session).await.is_none());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn login_stores_token_then_confirms_viewer() {
        let api = MockNewsApi::new();
        api.set_user(Ok(viewer("u1")));
        let session = TokenSession::new(None);
        let creds = Credentials { email: "u1@example.com".into(), password: "pw".into() };

        let who = login(&api, &session, &creds).await.unwrap();
        assert_eq!(who.id, "u1");
        assert!(session.is_authenticated());
        assert_eq!(session.token().as_deref(), Some("mock-token"));
        assert_eq!(api.calls(), vec![ApiCall::Login("u1@example.com".into()), ApiCall::CurrentUser]);
    }
}
