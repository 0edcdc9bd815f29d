//! Command implementations for the fsales CLI.
//!
//! This module contains the actual command handlers that are invoked by the CLI.

pub mod config;
pub mod items;
pub mod lookups;
pub mod remind;
pub mod report;

use std::env;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use fieldsales_api::client::StoreClient;
use fieldsales_api::models::SavedItem;
use fieldsales_sync::{
    FileStorage, MergePrefs, NotificationGenerator, PrefsStore, StorageError, SyncEngine,
    SyncError, UserSession,
};

use crate::cli::Cli;
use config::{load_config, Config};

/// Environment variable overriding the device storage directory.
pub const DATA_DIR_ENV: &str = "FSALES_DATA_DIR";

/// Error type for command execution.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Engine error. Its message is already meant for the user.
    #[error("{0}")]
    Sync(#[from] SyncError),

    /// Store error outside of an engine operation.
    #[error("store error: {0}")]
    Api(#[from] fieldsales_api::error::Error),

    /// Device storage error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// No location, report or reminder matched the user's input.
    #[error("{0}")]
    NotFound(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for command execution.
pub type Result<T> = std::result::Result<T, CommandError>;

/// Context for command execution, containing common dependencies.
pub struct CommandContext {
    /// Whether to output JSON.
    pub json_output: bool,
    /// Whether to use colors.
    pub use_colors: bool,
    /// Whether to be quiet (errors only).
    pub quiet: bool,
    /// Whether to be verbose.
    pub verbose: bool,
}

impl CommandContext {
    /// Creates a new command context from CLI arguments.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            json_output: cli.json,
            use_colors: !cli.no_color,
            quiet: cli.quiet,
            verbose: cli.verbose,
        }
    }
}

/// The signed-in session type used by commands.
pub type Session = UserSession<StoreClient, FileStorage>;

/// The sync engine type used by commands.
pub type Engine = SyncEngine<SavedItem, StoreClient>;

/// Everything an authenticated command works with.
pub struct Workspace {
    pub config: Config,
    pub session: Session,
    pub engine: Engine,
    pub prefs: PrefsStore<FileStorage>,
    pub reminders: Arc<NotificationGenerator<FileStorage>>,
    /// True when the store was unreachable and the session was restored
    /// from the offline copy.
    pub offline: bool,
}

impl Workspace {
    /// Signs in and wires the engine to the session's store and storage.
    ///
    /// Falls back to the offline copy when the store cannot be reached.
    /// A rejected token is never masked by the offline copy.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is incomplete, device storage is
    /// unusable, the store rejects the sign-in, or the store is unreachable
    /// with no offline copy to fall back on.
    pub async fn open(token: &str) -> Result<Self> {
        let config = load_config()?;
        let server_url = config.require_server_url()?.to_string();
        let uid = config.require_user_id()?.to_string();

        let client = StoreClient::builder(server_url, token)
            .timeout(Duration::from_secs(config.sync.timeout_seconds()))
            .build()?;
        let storage = open_storage()?;
        let prefs = PrefsStore::new(storage.clone());
        let reminders = Arc::new(NotificationGenerator::new(storage.clone()));

        let precedence = match config.merge.precedence {
            Some(precedence) => precedence,
            None => prefs.load::<MergePrefs>()?.precedence,
        };

        let mut session = UserSession::new(client.clone(), storage);
        let signed_in = session.sign_in(&uid).await.map(|_| ());
        let offline = match signed_in {
            Ok(()) => false,
            Err(e) => {
                if !e.is_unavailable() || !session.restore_offline(&uid)? {
                    return Err(e.into());
                }
                tracing::warn!(error = %e, "store unreachable, using offline copy");
                true
            }
        };

        let engine = SyncEngine::new(client)
            .with_precedence(precedence)
            .with_deletion_hook(reminders.clone());

        Ok(Self {
            config,
            session,
            engine,
            prefs,
            reminders,
            offline,
        })
    }
}

/// Opens device storage, honoring `FSALES_DATA_DIR`.
fn open_storage() -> Result<FileStorage> {
    match env::var(DATA_DIR_ENV) {
        Ok(dir) if !dir.is_empty() => Ok(FileStorage::with_dir(PathBuf::from(dir))),
        _ => Ok(FileStorage::new()?),
    }
}

/// Outcome of a confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmResult {
    Confirmed,
    Aborted,
}

/// Asks the user to confirm a destructive operation.
///
/// `force` skips the prompt. Without a terminal to ask on, the operation is
/// refused rather than assumed.
pub fn confirm(prompt: &str, force: bool) -> Result<ConfirmResult> {
    if force {
        return Ok(ConfirmResult::Confirmed);
    }

    if !io::stdin().is_terminal() {
        return Err(CommandError::Config(
            "Refusing to continue without confirmation. Use --force in non-interactive use."
                .to_string(),
        ));
    }

    let confirmed = dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| CommandError::Io(io::Error::other(e.to_string())))?;

    Ok(if confirmed {
        ConfirmResult::Confirmed
    } else {
        ConfirmResult::Aborted
    })
}
