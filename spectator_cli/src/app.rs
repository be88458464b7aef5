use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use color_eyre::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::backend::CrosstermBackend;
use ratatui::prelude::*;
use spectator_core::config::DisplayConfig;
use spectator_core::{SyncHandle, ViewCommand};
use tracing::{error, info};

use crate::ui::{draw_ui, UiState};

const INPUT_POLL: Duration = Duration::from_millis(50);

pub struct SpectatorApp {
    terminal: Terminal<CrosstermBackend<std::io::Stdout>>,
    ui_state: UiState,
    sync: SyncHandle,
    log_receiver: Receiver<String>,
    frame_interval: Duration,
}

impl SpectatorApp {
    pub fn new(
        sync: SyncHandle,
        log_receiver: Receiver<String>,
        display: &DisplayConfig,
    ) -> Result<Self> {
        let stdout = std::io::stdout();
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        crossterm::terminal::enable_raw_mode()?;
        terminal.clear()?;
        terminal.hide_cursor()?;
        Ok(Self {
            terminal,
            ui_state: UiState::new(display.max_logs),
            sync,
            log_receiver,
            frame_interval: display.frame_interval(),
        })
    }

    pub fn run(mut self) -> Result<()> {
        let mut last_draw: Option<Instant> = None;

        loop {
            while let Ok(line) = self.log_receiver.try_recv() {
                self.ui_state.push_log(line);
            }

            if last_draw.map_or(true, |at| at.elapsed() >= self.frame_interval) {
                let frame = self.sync.frame();
                let ui_state = &self.ui_state;
                self.terminal
                    .draw(|terminal_frame| draw_ui(terminal_frame, &frame, ui_state))?;
                last_draw = Some(Instant::now());
            }

            if event::poll(INPUT_POLL)? {
                let Event::Key(key) = event::read()? else {
                    continue;
                };
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => break,
                    KeyCode::Char(' ') | KeyCode::Char('p') | KeyCode::Char('P') => {
                        self.dispatch(ViewCommand::TogglePause);
                    }
                    KeyCode::Char('r') | KeyCode::Char('R') => {
                        self.dispatch(ViewCommand::Reset);
                    }
                    KeyCode::Char('t') | KeyCode::Char('T') => {
                        self.dispatch(ViewCommand::ToggleResults);
                    }
                    _ => {}
                }
            }
        }

        info!("Spectator closed by user");
        Ok(())
    }

    fn dispatch(&mut self, command: ViewCommand) {
        if self.sync.send(command) {
            return;
        }
        error!(?command, "Sync runtime has stopped; command dropped");
        self.ui_state
            .push_log("Sync runtime stopped; restart the spectator");
    }
}

impl Drop for SpectatorApp {
    fn drop(&mut self) {
        let _ = self.terminal.show_cursor();
        let _ = crossterm::terminal::disable_raw_mode();
    }
}
