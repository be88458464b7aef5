//! The spectator's single source of truth: the current snapshot plus local view controls.
//!
//! Snapshots are only ever swapped wholesale; nothing here patches a `GameState`.

use std::sync::Arc;

use beast_schema::{GameState, SyncResponse};

/// Local-only controls. Never sent to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewState {
    pub paused: bool,
    /// Accepted updates since the last reset.
    pub elapsed_ticks: u64,
    pub show_results: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncApplied {
    Accepted { latched_pause: bool },
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseToggle {
    Paused,
    Resumed,
    /// The game is over; only a reset resumes polling.
    LatchedByGameOver,
}

#[derive(Debug, Clone, Default)]
pub struct ViewStore {
    snapshot: Arc<GameState>,
    view: ViewState,
    /// Set once any applied snapshot reports game over; cleared only by a reset.
    game_over_latched: bool,
}

impl ViewStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> &Arc<GameState> {
        &self.snapshot
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn should_poll(&self) -> bool {
        !self.view.paused
    }

    pub fn game_over_latched(&self) -> bool {
        self.game_over_latched
    }

    /// Apply a `/update` response. Responses without `update_occurred` leave the store untouched.
    pub fn apply_sync(&mut self, response: SyncResponse) -> SyncApplied {
        if !response.update_occurred {
            return SyncApplied::Unchanged;
        }
        let game_over = response.state.game_over;
        self.snapshot = Arc::new(response.state);
        self.view.elapsed_ticks = self.view.elapsed_ticks.saturating_add(1);
        let latched_pause = self.latch_if_over(game_over);
        SyncApplied::Accepted { latched_pause }
    }

    /// Replace the snapshot with a freshly reset game and resume polling.
    pub fn apply_reset(&mut self, state: GameState) {
        self.snapshot = Arc::new(state);
        self.view.elapsed_ticks = 0;
        self.view.paused = false;
        self.game_over_latched = false;
    }

    /// Install the start-up snapshot. Does not count as a tick.
    pub fn apply_initial(&mut self, state: GameState) -> bool {
        let game_over = state.game_over;
        self.snapshot = Arc::new(state);
        self.latch_if_over(game_over)
    }

    /// Returns true when this call newly engaged the latch.
    fn latch_if_over(&mut self, game_over: bool) -> bool {
        if !game_over {
            return false;
        }
        let newly = !self.game_over_latched;
        self.game_over_latched = true;
        self.view.paused = true;
        newly
    }

    /// The latch outlives the snapshot that set it: a late, older snapshot without
    /// `game_over` does not release it.
    pub fn toggle_pause(&mut self) -> PauseToggle {
        if self.game_over_latched {
            return PauseToggle::LatchedByGameOver;
        }
        self.view.paused = !self.view.paused;
        if self.view.paused {
            PauseToggle::Paused
        } else {
            PauseToggle::Resumed
        }
    }

    /// Flip results visibility and return the new value.
    pub fn toggle_results(&mut self) -> bool {
        self.view.show_results = !self.view.show_results;
        self.view.show_results
    }
}
