use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod commands;
mod dispatch;
mod output;

use cli::Cli;
use commands::config::load_config;
use commands::{CommandContext, CommandError};
use dispatch::{AuthCommand, AuthDispatch, NoAuthCommand, NoAuthDispatch};
use fieldsales_sync::ErrorKind;

/// Environment variable holding the log filter (falls back to `RUST_LOG`).
const LOG_ENV: &str = "FSALES_LOG";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            if cli.json {
                let error_json = serde_json::json!({
                    "error": {
                        "code": error_code(&e),
                        "message": e.to_string(),
                    }
                });
                eprintln!("{:#}", error_json);
            } else {
                eprintln!("Error: {e}");
            }
            error_exit_code(&e)
        }
    }
}

/// Initializes logging to stderr.
///
/// `FSALES_LOG`, then `RUST_LOG`, choose the filter; otherwise only warnings
/// are shown, or debug output with `--verbose`.
fn init_tracing(cli: &Cli) {
    let default = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(!cli.no_color),
        )
        .init();
}

async fn run(cli: &Cli) -> commands::Result<()> {
    let ctx = CommandContext::from_cli(cli);

    // Config and help work without a token
    if let Some(dispatch) = NoAuthDispatch::try_from_cli(cli) {
        return dispatch.execute(&ctx);
    }

    let token = resolve_token(cli)?;

    match AuthDispatch::from_cli(cli) {
        Some(dispatch) => dispatch.execute(&ctx, &token).await,
        None => Ok(()),
    }
}

/// Returns the error code string for JSON output.
fn error_code(e: &CommandError) -> &'static str {
    match e {
        CommandError::Sync(sync) => match sync.kind() {
            ErrorKind::NotAuthenticated => "NOT_AUTHENTICATED",
            ErrorKind::DuplicateExists => "DUPLICATE_EXISTS",
            ErrorKind::ItemDoesNotExist => "ITEM_DOES_NOT_EXIST",
            ErrorKind::InvalidTransition => "INVALID_TRANSITION",
            ErrorKind::ImmutableField => "IMMUTABLE_FIELD",
            ErrorKind::RemoteSyncFailure => "REMOTE_SYNC_FAILURE",
        },
        CommandError::Api(api) if api.is_auth() => "AUTH_ERROR",
        CommandError::Api(_) => "API_ERROR",
        CommandError::Storage(_) => "STORAGE_ERROR",
        CommandError::Config(_) => "CONFIG_ERROR",
        CommandError::NotFound(_) => "NOT_FOUND",
        CommandError::Io(_) => "IO_ERROR",
        CommandError::Json(_) => "JSON_ERROR",
    }
}

/// Returns the exit code for an error.
fn error_exit_code(e: &CommandError) -> ExitCode {
    match e {
        CommandError::Config(_) => ExitCode::from(5),
        CommandError::Api(_) => ExitCode::from(2),
        CommandError::Sync(sync) if sync.kind() == ErrorKind::RemoteSyncFailure => {
            ExitCode::from(2)
        }
        CommandError::Sync(_) => ExitCode::from(1),
        CommandError::Storage(_) => ExitCode::from(5),
        CommandError::NotFound(_) => ExitCode::from(1),
        CommandError::Io(_) => ExitCode::from(3),
        CommandError::Json(_) => ExitCode::from(1),
    }
}

/// Resolves the store token with priority: flag or `FSALES_TOKEN` > config.
fn resolve_token(cli: &Cli) -> commands::Result<String> {
    // clap fills `cli.token` from either --token or FSALES_TOKEN
    if let Some(token) = &cli.token {
        return Ok(token.clone());
    }

    if let Some(token) = load_config()?.token {
        return Ok(token);
    }

    Err(CommandError::Config(
        "No store token. Set FSALES_TOKEN or run 'fsales config set token <token>'.".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldsales_sync::SyncError;
    use serial_test::serial;
    use std::env;
    use std::fs;
    use tempfile::TempDir;

    fn cli_with_token(token: Option<String>) -> Cli {
        Cli {
            verbose: false,
            quiet: false,
            json: false,
            no_color: false,
            token,
            command: Some(cli::Commands::List { starred: false }),
        }
    }

    /// Points FSALES_CONFIG at `path` until dropped.
    struct ConfigOverride(Option<String>);

    impl ConfigOverride {
        fn set(path: &std::path::Path) -> Self {
            let original = env::var("FSALES_CONFIG").ok();
            env::set_var("FSALES_CONFIG", path);
            Self(original)
        }
    }

    impl Drop for ConfigOverride {
        fn drop(&mut self) {
            match &self.0 {
                Some(val) => env::set_var("FSALES_CONFIG", val),
                None => env::remove_var("FSALES_CONFIG"),
            }
        }
    }

    #[test]
    fn test_resolve_token_from_flag() {
        let cli = cli_with_token(Some("flag-token".to_string()));
        assert_eq!(resolve_token(&cli).unwrap(), "flag-token");
    }

    #[test]
    #[serial]
    fn test_resolve_token_from_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "token = \"config-token\"\n").unwrap();
        let _config = ConfigOverride::set(&path);

        let result = resolve_token(&cli_with_token(None));

        assert_eq!(result.unwrap(), "config-token");
    }

    #[test]
    #[serial]
    fn test_resolve_token_missing_is_config_error() {
        let dir = TempDir::new().unwrap();
        let _config = ConfigOverride::set(&dir.path().join("missing.toml"));

        let result = resolve_token(&cli_with_token(None));

        assert!(matches!(result, Err(CommandError::Config(_))));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            error_code(&CommandError::Sync(SyncError::DuplicateExists)),
            "DUPLICATE_EXISTS"
        );
        assert_eq!(error_code(&CommandError::NotFound("x".into())), "NOT_FOUND");
        assert_eq!(error_code(&CommandError::Config("x".into())), "CONFIG_ERROR");
        let revoked = fieldsales_api::error::ApiError::Auth {
            message: "token revoked".to_string(),
        };
        assert_eq!(error_code(&CommandError::Api(revoked.into())), "AUTH_ERROR");
    }

    #[test]
    fn test_exit_codes() {
        let code = |e: CommandError| format!("{:?}", error_exit_code(&e));
        assert_eq!(code(CommandError::Config("x".into())), format!("{:?}", ExitCode::from(5)));
        assert_eq!(
            code(CommandError::Sync(SyncError::ItemDoesNotExist)),
            format!("{:?}", ExitCode::from(1))
        );
        assert_eq!(
            code(CommandError::Io(std::io::Error::other("x"))),
            format!("{:?}", ExitCode::from(3))
        );
    }
}
