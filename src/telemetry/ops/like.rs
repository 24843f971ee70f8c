use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Like;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Sync, Toggle, Settle }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self { Phase::Sync => "sync", Phase::Toggle => "toggle", Phase::Settle => "settle" } }
    fn span(&self) -> Span { match self { Phase::Sync => info_span!("sync"), Phase::Toggle => info_span!("toggle"), Phase::Settle => info_span!("settle") } }
}

impl OpMarker for Like {
    const NAME: &'static str = "like";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("like") }
}
