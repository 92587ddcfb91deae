use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

use super::domain::{Dataset, PostingId};
use super::pager;
use super::state::{ListingError, WidgetState};
use super::view::{contact_view, derive_view, matching_count, ContactView, ViewModel};

pub const DEFAULT_TRANSITION_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetPhase {
    Idle,
    Refreshing,
}

/// Handle for one requested transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Hands out monotonically increasing tickets; only the newest one is current.
#[derive(Debug, Default)]
pub struct TransitionGate {
    sequence: AtomicU64,
}

impl TransitionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> Ticket {
        Ticket(self.sequence.fetch_add(1, Ordering::AcqRel) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.sequence.load(Ordering::Acquire) == ticket.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Rendered(ViewModel),
    /// A newer intent arrived while this one was pending; nothing was committed.
    Superseded,
}

impl Transition {
    pub fn into_view(self) -> Option<ViewModel> {
        match self {
            Transition::Rendered(view) => Some(view),
            Transition::Superseded => None,
        }
    }
}

#[derive(Debug)]
struct SessionState {
    committed: WidgetState,
    pending: WidgetState,
    phase: WidgetPhase,
}

/// Interactive listing over one dataset snapshot where the latest user intent wins.
///
/// Intents update the pending state right away so edits to different dimensions compose,
/// then wait out the transition delay. Only the newest intent commits and renders.
#[derive(Debug)]
pub struct ListingSession {
    dataset: Arc<Dataset>,
    gate: TransitionGate,
    delay: Duration,
    state: Mutex<SessionState>,
}

impl ListingSession {
    pub fn new(dataset: Arc<Dataset>, page_size: usize, delay: Duration) -> Self {
        let initial = WidgetState::new(page_size);
        Self {
            dataset,
            gate: TransitionGate::new(),
            delay,
            state: Mutex::new(SessionState {
                committed: initial.clone(),
                pending: initial,
                phase: WidgetPhase::Idle,
            }),
        }
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    pub fn phase(&self) -> WidgetPhase {
        self.lock().phase
    }

    /// Last committed state.
    pub fn state(&self) -> WidgetState {
        self.lock().committed.clone()
    }

    /// View of the last committed state.
    pub fn view(&self) -> ViewModel {
        let committed = self.state();
        derive_view(&self.dataset, &committed)
    }

    pub fn contact(&self, id: PostingId) -> Result<ContactView, ListingError> {
        contact_view(&self.dataset, id)
    }

    pub async fn select_canton(&self, canton: Option<String>) -> Transition {
        let ticket = self.stage_canton(canton);
        self.settle(ticket).await
    }

    pub async fn select_profession(&self, profession: Option<String>) -> Transition {
        let ticket = self.stage_profession(profession);
        self.settle(ticket).await
    }

    pub async fn go_to_page(&self, page: usize) -> Result<Transition, ListingError> {
        let ticket = self.stage_page(page)?;
        Ok(self.settle(ticket).await)
    }

    pub async fn next_page(&self) -> Result<Transition, ListingError> {
        let ticket = self.stage_next_page()?;
        Ok(self.settle(ticket).await)
    }

    pub async fn previous_page(&self) -> Result<Transition, ListingError> {
        let ticket = self.stage_previous_page()?;
        Ok(self.settle(ticket).await)
    }

    /// Records the intent as pending and takes its ticket.
    ///
    /// Staging happens in call order, so callers that hand the returned ticket to
    /// [`settle`](Self::settle) on another task still get "latest intent wins".
    pub fn stage_canton(&self, canton: Option<String>) -> Ticket {
        let mut state = self.lock();
        let next = state.pending.select_canton(canton);
        self.stage(&mut state, next)
    }

    pub fn stage_profession(&self, profession: Option<String>) -> Ticket {
        let mut state = self.lock();
        let next = state.pending.select_profession(profession);
        self.stage(&mut state, next)
    }

    /// Validated against the pending filter, so a page picked right after a filter change
    /// refers to the new result set.
    pub fn stage_page(&self, page: usize) -> Result<Ticket, ListingError> {
        let mut state = self.lock();
        self.stage_page_locked(&mut state, |_| page)
    }

    pub fn stage_next_page(&self) -> Result<Ticket, ListingError> {
        let mut state = self.lock();
        self.stage_page_locked(&mut state, |current| current + 1)
    }

    pub fn stage_previous_page(&self) -> Result<Ticket, ListingError> {
        let mut state = self.lock();
        self.stage_page_locked(&mut state, |current| current.saturating_sub(1))
    }

    fn stage_page_locked(
        &self,
        state: &mut SessionState,
        target: impl FnOnce(usize) -> usize,
    ) -> Result<Ticket, ListingError> {
        let count = matching_count(&self.dataset, &state.pending.filter);
        let total = pager::total_pages(count, state.pending.page.page_size);
        let page = target(state.pending.page.current);
        let next = state.pending.go_to_page(page, total)?;
        Ok(self.stage(state, next))
    }

    fn stage(&self, state: &mut SessionState, next: WidgetState) -> Ticket {
        state.pending = next;
        state.phase = WidgetPhase::Refreshing;
        self.gate.begin()
    }

    /// Waits out the transition delay, then commits if `ticket` is still the newest.
    pub async fn settle(&self, ticket: Ticket) -> Transition {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let mut state = self.lock();
        if !self.gate.is_current(ticket) {
            debug!(?ticket, "transition superseded");
            return Transition::Superseded;
        }

        let view = derive_view(&self.dataset, &state.pending);
        state.pending.page.current = view.page;
        state.committed = state.pending.clone();
        state.phase = WidgetPhase::Idle;
        debug!(
            page = view.page,
            total_items = view.total_items,
            "transition committed"
        );
        Transition::Rendered(view)
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().expect("session mutex poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_newest_ticket_is_current() {
        let gate = TransitionGate::new();
        let first = gate.begin();
        let second = gate.begin();

        assert!(second > first);
        assert!(!gate.is_current(first));
        assert!(gate.is_current(second));
    }
}
