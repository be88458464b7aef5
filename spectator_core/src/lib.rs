//! Spectator engine for the Beast game server.
//!
//! Keeps a local copy of the authoritative snapshot in step with the server
//! ([`sync`]), applies the viewer's own controls ([`commands`], [`store`]) and
//! derives what a renderer needs to draw ([`view_model`]).

pub mod commands;
pub mod config;
pub mod server;
pub mod store;
pub mod sync;
pub mod view_model;

pub use beast_schema as schema;

pub use commands::{CommandEffect, ViewCommand};
pub use config::{load_config, ConfigError, ConfigSource, SpectatorConfig, SyncConfig};
pub use server::{GameServer, HttpGameServer, SyncError};
pub use store::{PauseToggle, SyncApplied, ViewState, ViewStore};
pub use sync::{LinkStatus, SyncHandle, SyncRuntime, ViewFrame};
