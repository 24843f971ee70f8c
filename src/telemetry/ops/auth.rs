use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Auth;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Register, Login, Me, Logout }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Register => "register",
        Phase::Login => "login",
        Phase::Me => "me",
        Phase::Logout => "logout",
    }}
    fn span(&self) -> Span { match self {
        Phase::Register => info_span!("register"),
        Phase::Login => info_span!("login"),
        Phase::Me => info_span!("me"),
        Phase::Logout => info_span!("logout"),
    }}
}

impl OpMarker for Auth {
    const NAME: &'static str = "auth";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("auth") }
}
