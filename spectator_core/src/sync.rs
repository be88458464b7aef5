//! Polling loop that keeps the [`ViewStore`] in step with the game server.
//!
//! A single task owns the store. It wakes on a fixed interval, on user commands and on
//! request completions. Requests are spawned rather than awaited, so a slow fetch never
//! holds back the next tick; completions are applied in the order they arrive.

use std::ops::ControlFlow;
use std::sync::Arc;

use beast_schema::{GameState, SyncResponse};
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use crate::commands::{apply_local, CommandEffect, ViewCommand};
use crate::config::SyncConfig;
use crate::server::{GameServer, SyncError};
use crate::store::{SyncApplied, ViewState, ViewStore};

/// Health of the connection to the game server, as seen by the polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkStatus {
    #[default]
    Connecting,
    Online,
    Failing {
        consecutive: u32,
    },
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, Default)]
pub struct ViewFrame {
    pub snapshot: Arc<GameState>,
    pub view: ViewState,
    pub link: LinkStatus,
}

impl ViewFrame {
    fn same_as(&self, other: &ViewFrame) -> bool {
        Arc::ptr_eq(&self.snapshot, &other.snapshot)
            && self.view == other.view
            && self.link == other.link
    }
}

#[derive(Debug, Clone, Copy)]
enum Request {
    Update,
    Reset,
    Initial,
}

enum Reply {
    Update(Result<SyncResponse, SyncError>),
    Reset(Result<GameState, SyncError>),
    Initial(Result<GameState, SyncError>),
}

struct Completion {
    seq: u64,
    reply: Reply,
}

/// Cloneable front for a running [`SyncRuntime`].
#[derive(Debug, Clone)]
pub struct SyncHandle {
    commands: mpsc::UnboundedSender<ViewCommand>,
    frames: watch::Receiver<ViewFrame>,
}

impl SyncHandle {
    /// Queue a command. Returns false once the runtime has stopped.
    pub fn send(&self, command: ViewCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    pub fn toggle_pause(&self) -> bool {
        self.send(ViewCommand::TogglePause)
    }

    pub fn reset(&self) -> bool {
        self.send(ViewCommand::Reset)
    }

    pub fn toggle_results(&self) -> bool {
        self.send(ViewCommand::ToggleResults)
    }

    pub fn shutdown(&self) -> bool {
        self.send(ViewCommand::Shutdown)
    }

    /// Latest published frame.
    pub fn frame(&self) -> ViewFrame {
        self.frames.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewFrame> {
        self.frames.clone()
    }
}

pub struct SyncRuntime<S: GameServer> {
    server: Arc<S>,
    config: SyncConfig,
    store: ViewStore,
    link: LinkStatus,
    commands: mpsc::UnboundedReceiver<ViewCommand>,
    frames: watch::Sender<ViewFrame>,
    in_flight: JoinSet<Completion>,
    next_seq: u64,
    latest_applied: u64,
}

impl<S: GameServer> SyncRuntime<S> {
    pub fn new(server: Arc<S>, config: SyncConfig) -> (Self, SyncHandle) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (frame_tx, frame_rx) = watch::channel(ViewFrame::default());
        let runtime = Self {
            server,
            config,
            store: ViewStore::new(),
            link: LinkStatus::Connecting,
            commands: command_rx,
            frames: frame_tx,
            in_flight: JoinSet::new(),
            next_seq: 0,
            latest_applied: 0,
        };
        let handle = SyncHandle {
            commands: command_tx,
            frames: frame_rx,
        };
        (runtime, handle)
    }

    /// Start the runtime on the current tokio runtime.
    pub fn spawn(server: Arc<S>, config: SyncConfig) -> (SyncHandle, JoinHandle<()>) {
        let (runtime, handle) = Self::new(server, config);
        (handle, tokio::spawn(runtime.run()))
    }

    /// Run until shutdown is requested or every [`SyncHandle`] is dropped.
    pub async fn run(mut self) {
        let mut ticker = time::interval(self.config.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            target: "beast_spectator::sync",
            poll_interval_ms = self.config.poll_interval_ms,
            discard_stale = self.config.discard_stale,
            "sync.started"
        );
        if self.config.prime_on_start {
            self.dispatch(Request::Initial);
        }

        loop {
            tokio::select! {
                biased;
                command = self.commands.recv() => {
                    let Some(command) = command else { break };
                    if self.handle_command(command).is_break() {
                        break;
                    }
                }
                Some(joined) = self.in_flight.join_next(), if !self.in_flight.is_empty() => {
                    self.handle_joined(joined);
                }
                _ = ticker.tick() => {
                    self.handle_tick();
                }
            }
        }

        let abandoned = self.in_flight.len();
        self.in_flight.abort_all();
        info!(target: "beast_spectator::sync", abandoned, "sync.stopped");
    }

    fn handle_command(&mut self, command: ViewCommand) -> ControlFlow<()> {
        match apply_local(&mut self.store, command) {
            CommandEffect::Applied => {}
            CommandEffect::RequestReset => {
                info!(target: "beast_spectator::sync", "reset.requested");
                self.dispatch(Request::Reset);
            }
            CommandEffect::Stop => return ControlFlow::Break(()),
        }
        self.publish();
        ControlFlow::Continue(())
    }

    fn handle_tick(&mut self) {
        if !self.store.should_poll() {
            trace!(target: "beast_spectator::sync", "sync.tick_skipped=paused");
            return;
        }
        self.dispatch(Request::Update);
    }

    fn dispatch(&mut self, request: Request) {
        self.next_seq += 1;
        let seq = self.next_seq;
        let server = Arc::clone(&self.server);
        trace!(target: "beast_spectator::sync", seq, ?request, "sync.dispatch");
        self.in_flight.spawn(async move {
            let reply = match request {
                Request::Update => Reply::Update(server.fetch_update().await),
                Request::Reset => Reply::Reset(server.reset().await),
                Request::Initial => Reply::Initial(server.current_state().await),
            };
            Completion { seq, reply }
        });
    }

    fn handle_joined(&mut self, joined: Result<Completion, JoinError>) {
        match joined {
            Ok(completion) => self.apply_completion(completion),
            Err(err) if err.is_cancelled() => {}
            Err(err) => {
                warn!(target: "beast_spectator::sync", error = %err, "sync.request_panicked");
            }
        }
    }

    fn apply_completion(&mut self, completion: Completion) {
        let Completion { seq, reply } = completion;
        match reply {
            Reply::Update(Ok(response)) => {
                self.link = LinkStatus::Online;
                if self.config.discard_stale && seq < self.latest_applied {
                    debug!(
                        target: "beast_spectator::sync",
                        seq,
                        latest_applied = self.latest_applied,
                        "sync.discarded=stale"
                    );
                } else {
                    self.apply_update(seq, response);
                }
            }
            Reply::Update(Err(err)) => {
                self.record_failure();
                warn!(target: "beast_spectator::sync", seq, error = %err, "sync.failed");
            }
            Reply::Reset(Ok(state)) => {
                self.link = LinkStatus::Online;
                self.store.apply_reset(state);
                self.latest_applied = self.latest_applied.max(seq);
                info!(
                    target: "beast_spectator::sync",
                    seq,
                    turn = self.store.snapshot().turn_counter,
                    "reset.applied"
                );
            }
            Reply::Reset(Err(err)) => {
                warn!(target: "beast_spectator::sync", seq, error = %err, "reset.failed");
            }
            Reply::Initial(Ok(state)) => {
                self.link = LinkStatus::Online;
                if self.latest_applied > 0 {
                    debug!(target: "beast_spectator::sync", seq, "sync.initial_superseded");
                } else {
                    let latched = self.store.apply_initial(state);
                    self.latest_applied = seq;
                    debug!(target: "beast_spectator::sync", seq, latched, "sync.initial_applied");
                }
            }
            Reply::Initial(Err(err)) => {
                self.record_failure();
                warn!(target: "beast_spectator::sync", seq, error = %err, "sync.initial_failed");
            }
        }
        self.publish();
    }

    fn apply_update(&mut self, seq: u64, response: SyncResponse) {
        match self.store.apply_sync(response) {
            SyncApplied::Accepted { latched_pause } => {
                self.latest_applied = self.latest_applied.max(seq);
                let snapshot = self.store.snapshot();
                debug!(
                    target: "beast_spectator::sync",
                    seq,
                    turn = snapshot.turn_counter,
                    elapsed_ticks = self.store.view().elapsed_ticks,
                    "sync.accepted"
                );
                if latched_pause {
                    info!(
                        target: "beast_spectator::sync",
                        turn = snapshot.turn_counter,
                        "sync.game_over: polling paused until reset"
                    );
                }
            }
            SyncApplied::Unchanged => {
                trace!(target: "beast_spectator::sync", seq, "sync.unchanged");
            }
        }
    }

    fn record_failure(&mut self) {
        let consecutive = match self.link {
            LinkStatus::Failing { consecutive } => consecutive.saturating_add(1),
            LinkStatus::Connecting | LinkStatus::Online => 1,
        };
        self.link = LinkStatus::Failing { consecutive };
    }

    fn publish(&self) {
        let next = ViewFrame {
            snapshot: Arc::clone(self.store.snapshot()),
            view: self.store.view(),
            link: self.link,
        };
        self.frames.send_if_modified(|frame| {
            if frame.same_as(&next) {
                false
            } else {
                *frame = next;
                true
            }
        });
    }
}
