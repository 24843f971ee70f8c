use tokio::sync::watch;

use crate::api::types::UserProfile;

/// What the engine needs to know about the viewer's credential.
pub trait SessionGate: Send + Sync {
    /// Bearer token to attach to authenticated requests.
    fn token(&self) -> Option<String>;

    /// True once the stored credential has been confirmed against `/auth/me`.
    fn is_authenticated(&self) -> bool;

    fn has_credential(&self) -> bool {
        self.token().is_some()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionState {
    pub token: Option<String>,
    pub viewer: Option<UserProfile>,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.viewer.is_some()
    }
}

/// In-memory credential holder. Observers subscribe to the watch channel and
/// see every authentication flip.
pub struct TokenSession {
    state: watch::Sender<SessionState>,
}

impl TokenSession {
    pub fn new(token: Option<String>) -> Self {
        let (state, _) = watch::channel(SessionState { token, viewer: None });
        Self { state }
    }

    pub fn store_token(&self, token: impl Into<String>) {
        let token = token.into();
        self.state.send_modify(|s| {
            s.token = Some(token);
            s.viewer = None;
        });
    }

    pub fn confirm(&self, viewer: UserProfile) {
        self.state.send_if_modified(|s| {
            if s.token.is_none() || s.viewer.as_ref() == Some(&viewer) {
                return false;
            }
            s.viewer = Some(viewer);
            true
        });
    }

    pub fn clear(&self) {
        self.state.send_if_modified(|s| {
            if s.token.is_none() && s.viewer.is_none() {
                return false;
            }
            *s = SessionState::default();
            true
        });
    }

    pub fn viewer(&self) -> Option<UserProfile> {
        self.state.borrow().viewer.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }
}

impl SessionGate for TokenSession {
    fn token(&self) -> Option<String> {
        self.state.borrow().token.clone()
    }

    fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }
}

#[cfg(test)]
pub(crate) fn viewer(id: &str) -> UserProfile {
    UserProfile {
        id: id.to_string(),
        email: format!("{id}@example.com"),
        name: None,
        picture: None,
        auth_provider: None,
    }
}
