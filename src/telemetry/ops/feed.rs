use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Feed;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Plan, Reset, Fetch, LoadMore, Output }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Plan => "plan",
        Phase::Reset => "reset",
        Phase::Fetch => "fetch",
        Phase::LoadMore => "load_more",
        Phase::Output => "output",
    }}
    fn span(&self) -> Span { match self {
        Phase::Plan => info_span!("plan"),
        Phase::Reset => info_span!("reset"),
        Phase::Fetch => info_span!("fetch"),
        Phase::LoadMore => info_span!("load_more"),
        Phase::Output => info_span!("output"),
    }}
}

impl OpMarker for Feed {
    const NAME: &'static str = "feed";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("feed") }
}
