/// Proof that the trigger handed out a load; settle it to re-arm.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LoadPermit {
    epoch: u64,
}

/// Watches the last rendered item and asks for the next page at most once per
/// visibility transition.
///
/// `K` identifies an observed element (an article id in practice). Reports
/// for anything other than the currently observed element are ignored, so an
/// element that stopped being last can never request a page.
#[derive(Debug)]
pub struct ScrollTrigger<K> {
    target: Option<K>,
    visible: bool,
    busy: Option<u64>,
    epoch: u64,
}

impl<K> Default for ScrollTrigger<K> {
    fn default() -> Self {
        Self { target: None, visible: false, busy: None, epoch: 0 }
    }
}

impl<K: PartialEq> ScrollTrigger<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds to a new last element, dropping the previous observation first.
    pub fn observe(&mut self, key: K) {
        if self.target.as_ref() == Some(&key) {
            return;
        }
        self.detach();
        self.target = Some(key);
    }

    pub fn detach(&mut self) {
        self.target = None;
        self.visible = false;
    }

    pub fn target(&self) -> Option<&K> {
        self.target.as_ref()
    }

    pub fn on_visibility(&mut self, key: &K, visible: bool, has_more: bool, is_fetching: bool) -> Option<LoadPermit> {
        if self.target.as_ref() != Some(key) {
            return None;
        }
        let entered = visible && !self.visible;
        self.visible = visible;
        if !entered || !has_more || is_fetching || self.busy.is_some() {
            return None;
        }
        self.epoch += 1;
        self.busy = Some(self.epoch);
        Some(LoadPermit { epoch: self.epoch })
    }

    pub fn settle(&mut self, permit: LoadPermit) {
        if self.busy == Some(permit.epoch) {
            self.busy = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_per_visibility_transition() {
        let mut trigger = ScrollTrigger::new();
        trigger.observe("a12");
        let permit = trigger.on_visibility(&"a12", true, true, false).expect("enter fires");
        trigger.settle(permit);

        // still visible: no new transition
        assert!(trigger.on_visibility(&"a12", true, true, false).is_none());
        trigger.on_visibility(&"a12", false, true, false);
        assert!(trigger.on_visibility(&"a12", true, true, false).is_some());
    }

    #[test]
    fn busy_until_settled() {
        let mut trigger = ScrollTrigger::new();
        trigger.observe(1);
        let permit = trigger.on_visibility(&1, true, true, false).unwrap();
        trigger.on_visibility(&1, false, true, false);
        assert!(trigger.on_visibility(&1, true, true, false).is_none());
        trigger.settle(permit);
        trigger.on_visibility(&1, false, true, false);
        assert!(trigger.on_visibility(&1, true, true, false).is_some());
    }

    #[test]
    fn gated_by_has_more_and_caller_fetching() {
        let mut trigger = ScrollTrigger::new();
        trigger.observe(1);
        assert!(trigger.on_visibility(&1, true, false, false).is_none());
        trigger.on_visibility(&1, false, true, false);
        assert!(trigger.on_visibility(&1, true, true, true).is_none());
        // refused reports never leave it busy
        trigger.on_visibility(&1, false, true, false);
        assert!(trigger.on_visibility(&1, true, true, false).is_some());
    }

    #[test]
    fn stale_element_never_fires() {
        let mut trigger = ScrollTrigger::new();
        trigger.observe("a12");
        trigger.observe("a24");
        assert_eq!(trigger.target(), Some(&"a24"));
        assert!(trigger.on_visibility(&"a12", true, true, false).is_none());
        assert!(trigger.on_visibility(&"a24", true, true, false).is_some());
    }
}
