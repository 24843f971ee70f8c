use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Search;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Debounce, Commit }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self { Phase::Debounce => "debounce", Phase::Commit => "commit" } }
    fn span(&self) -> Span { match self { Phase::Debounce => info_span!("debounce"), Phase::Commit => info_span!("commit") } }
}

impl OpMarker for Search {
    const NAME: &'static str = "search";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("search") }
}
