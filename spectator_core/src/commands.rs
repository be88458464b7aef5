use tracing::info;

use crate::store::{PauseToggle, ViewStore};

const LOG_TARGET: &str = "beast_spectator::commands";

/// User-triggered operations on the spectator view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewCommand {
    TogglePause,
    Reset,
    ToggleResults,
    Shutdown,
}

/// What the sync runtime still has to do after a command touched the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandEffect {
    Applied,
    RequestReset,
    Stop,
}

/// Apply the local part of `command`. Reset needs the server and is only requested here.
pub fn apply_local(store: &mut ViewStore, command: ViewCommand) -> CommandEffect {
    match command {
        ViewCommand::TogglePause => {
            match store.toggle_pause() {
                PauseToggle::Paused => info!(target: LOG_TARGET, "view.paused"),
                PauseToggle::Resumed => info!(target: LOG_TARGET, "view.resumed"),
                PauseToggle::LatchedByGameOver => info!(
                    target: LOG_TARGET,
                    "view.pause_latched: game over, reset to continue"
                ),
            }
            CommandEffect::Applied
        }
        ViewCommand::ToggleResults => {
            let visible = store.toggle_results();
            info!(target: LOG_TARGET, visible, "view.results_toggled");
            CommandEffect::Applied
        }
        ViewCommand::Reset => CommandEffect::RequestReset,
        ViewCommand::Shutdown => CommandEffect::Stop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beast_schema::{GameState, SyncResponse};

    #[test]
    fn local_commands_touch_only_view_state() {
        let mut store = ViewStore::new();
        store.apply_sync(SyncResponse::changed(GameState {
            turn_counter: 4,
            ..GameState::default()
        }));

        assert_eq!(
            apply_local(&mut store, ViewCommand::TogglePause),
            CommandEffect::Applied
        );
        assert_eq!(
            apply_local(&mut store, ViewCommand::ToggleResults),
            CommandEffect::Applied
        );

        let view = store.view();
        assert!(view.paused);
        assert!(view.show_results);
        assert_eq!(view.elapsed_ticks, 1);
        assert_eq!(store.snapshot().turn_counter, 4);
    }

    #[test]
    fn pause_command_cannot_lift_game_over() {
        let mut store = ViewStore::new();
        store.apply_sync(SyncResponse::changed(GameState {
            game_over: true,
            ..GameState::default()
        }));
        store.apply_sync(SyncResponse::changed(GameState::default()));

        assert_eq!(
            apply_local(&mut store, ViewCommand::TogglePause),
            CommandEffect::Applied
        );
        assert!(store.view().paused);
    }

    #[test]
    fn command_events_log_under_their_own_target() {
        assert_eq!(LOG_TARGET.rsplit("::").next(), Some("commands"));
        assert!(LOG_TARGET.starts_with("beast_spectator::"));
    }

    #[test]
    fn reset_is_deferred_to_the_server() {
        let mut store = ViewStore::new();
        store.toggle_pause();
        assert_eq!(
            apply_local(&mut store, ViewCommand::Reset),
            CommandEffect::RequestReset
        );
        assert!(store.view().paused, "reset only lands once the server answers");
        assert_eq!(
            apply_local(&mut store, ViewCommand::Shutdown),
            CommandEffect::Stop
        );
    }
}
