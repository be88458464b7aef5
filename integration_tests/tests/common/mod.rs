#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use beast_schema::{Coord, Engineer, GameState, GridSize, SyncResponse, TurnBudget};
use spectator_core::{GameServer, SyncConfig, SyncError};

type Scripted<T> = (Duration, Result<T, SyncError>);

/// In-process game server that answers `/update` from a script of delayed replies.
///
/// Once the script runs out every fetch answers immediately with an unchanged response.
#[derive(Default)]
pub struct ScriptedServer {
    updates: Mutex<VecDeque<Scripted<SyncResponse>>>,
    reset: Mutex<Option<GameState>>,
    initial: Mutex<Option<Scripted<GameState>>>,
    fetches: AtomicUsize,
    resets: AtomicUsize,
}

impl ScriptedServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_update(self, delay_ms: u64, response: SyncResponse) -> Self {
        self.push(delay_ms, Ok(response))
    }

    pub fn push_failure(self, delay_ms: u64) -> Self {
        self.push(
            delay_ms,
            Err(SyncError::Status {
                endpoint: "/update".to_string(),
                status: 503,
            }),
        )
    }

    fn push(self, delay_ms: u64, reply: Result<SyncResponse, SyncError>) -> Self {
        self.updates
            .lock()
            .unwrap()
            .push_back((Duration::from_millis(delay_ms), reply));
        self
    }

    pub fn with_reset(self, state: GameState) -> Self {
        *self.reset.lock().unwrap() = Some(state);
        self
    }

    pub fn with_initial(self, delay_ms: u64, state: GameState) -> Self {
        *self.initial.lock().unwrap() = Some((Duration::from_millis(delay_ms), Ok(state)));
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GameServer for ScriptedServer {
    async fn fetch_update(&self) -> Result<SyncResponse, SyncError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let next = self.updates.lock().unwrap().pop_front();
        match next {
            Some((delay, reply)) => {
                tokio::time::sleep(delay).await;
                reply
            }
            None => Ok(SyncResponse::unchanged(GameState::default())),
        }
    }

    async fn reset(&self) -> Result<GameState, SyncError> {
        self.resets.fetch_add(1, Ordering::SeqCst);
        let state = self.reset.lock().unwrap().clone();
        state.ok_or_else(|| SyncError::Status {
            endpoint: "/reset".to_string(),
            status: 500,
        })
    }

    async fn current_state(&self) -> Result<GameState, SyncError> {
        let next = self.initial.lock().unwrap().take();
        match next {
            Some((delay, reply)) => {
                tokio::time::sleep(delay).await;
                reply
            }
            None => Err(SyncError::Status {
                endpoint: "/state".to_string(),
                status: 404,
            }),
        }
    }
}

pub fn sync_config(discard_stale: bool) -> SyncConfig {
    SyncConfig {
        poll_interval_ms: 500,
        prime_on_start: false,
        discard_stale,
    }
}

/// A small in-progress match at `turn`.
pub fn match_state(turn: u32) -> GameState {
    GameState {
        beast: Some(Coord::new(2, 2)),
        beast_hidden: false,
        engineers: vec![
            Engineer::new("Bob", "🦾", Coord::new(0, 0)),
            Engineer::new("Leeroy", "🐔", Coord::new(4, 4)),
        ],
        walls: vec![Coord::new(1, 1)],
        turn_counter: turn,
        end_game_turns: TurnBudget::Turns(50),
        grid_size: GridSize::new(5, 5),
        current_turn_entity: "Beast".to_string(),
        ..GameState::default()
    }
}

pub fn finished_state(turn: u32) -> GameState {
    GameState {
        game_over: true,
        ..match_state(turn)
    }
}
