//! Session state machine and cancellation token.

/// Lifecycle of a camera session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No stream attached
    #[default]
    Idle,
    /// Camera request in flight
    Requesting,
    /// Stream attached, scan loop scheduled
    Active,
    /// Tracks being released
    Stopping,
}

/// Identifies the session a scan tick was scheduled for.
///
/// Every `start` mints a fresh token and every `stop` invalidates it, so a
/// tick holding an old token neither scans nor reschedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionToken(u64);

#[derive(Debug, Default)]
pub(crate) struct Session {
    state: SessionState,
    generation: u64,
    loading: bool,
    starved_ticks: u32,
    starvation_reported: bool,
}

impl Session {
    pub(crate) fn state(&self) -> SessionState {
        self.state
    }

    pub(crate) fn is_loading(&self) -> bool {
        self.loading
    }

    pub(crate) fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub(crate) fn begin_request(&mut self) {
        self.state = SessionState::Requesting;
        self.loading = true;
    }

    pub(crate) fn activate(&mut self) -> SessionToken {
        self.generation += 1;
        self.state = SessionState::Active;
        self.loading = true;
        self.starved_ticks = 0;
        self.starvation_reported = false;
        SessionToken(self.generation)
    }

    pub(crate) fn begin_stop(&mut self) {
        self.generation += 1;
        self.state = SessionState::Stopping;
    }

    pub(crate) fn finish_stop(&mut self) {
        self.state = SessionState::Idle;
        self.loading = false;
    }

    pub(crate) fn is_current(&self, token: SessionToken) -> bool {
        self.state == SessionState::Active && token.0 == self.generation
    }

    /// Count a not-ready tick; true exactly once when `threshold` is reached
    pub(crate) fn note_starved(&mut self, threshold: u32) -> bool {
        self.starved_ticks = self.starved_ticks.saturating_add(1);
        if threshold == 0 || self.starvation_reported || self.starved_ticks < threshold {
            return false;
        }
        self.starvation_reported = true;
        true
    }

    pub(crate) fn starved_ticks(&self) -> u32 {
        self.starved_ticks
    }

    pub(crate) fn note_ready(&mut self) {
        self.starved_ticks = 0;
    }
}
