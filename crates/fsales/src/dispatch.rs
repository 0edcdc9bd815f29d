//! Command dispatch module for routing CLI commands to their handlers.
//!
//! Commands that only touch local configuration run without a token. All
//! others open a [`Workspace`], which signs in to the store first.

use crate::cli::{Cli, Commands, ConfigCommands};
use crate::commands::items::{AddOptions, DeleteOptions, EditOptions, ListOptions};
use crate::commands::remind::RemindOptions;
use crate::commands::{self, CommandContext, Result, Workspace};

/// Trait for commands that can be executed without authentication.
pub trait NoAuthCommand {
    /// Execute the command without requiring a store token.
    fn execute(&self, ctx: &CommandContext) -> Result<()>;
}

/// Trait for commands that require authentication.
#[allow(async_fn_in_trait)]
pub trait AuthCommand {
    /// Execute the command with the provided store token.
    async fn execute(self, ctx: &CommandContext, token: &str) -> Result<()>;
}

/// Commands that don't require authentication.
pub enum NoAuthDispatch<'a> {
    Config(&'a Option<ConfigCommands>),
    Help,
}

impl<'a> NoAuthDispatch<'a> {
    /// Try to create a no-auth dispatch from the CLI command.
    /// Returns None if the command requires authentication.
    pub fn try_from_cli(cli: &'a Cli) -> Option<Self> {
        match &cli.command {
            Some(Commands::Config { command }) => Some(Self::Config(command)),
            None => Some(Self::Help),
            _ => None,
        }
    }
}

impl NoAuthCommand for NoAuthDispatch<'_> {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        match self {
            Self::Config(command) => dispatch_config(ctx, command),
            Self::Help => {
                if !ctx.quiet {
                    println!("fsales - saved locations for field sales");
                    println!("Use --help for usage information");
                }
                Ok(())
            }
        }
    }
}

/// Dispatch config subcommands.
fn dispatch_config(ctx: &CommandContext, command: &Option<ConfigCommands>) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::execute_show(ctx),
        Some(ConfigCommands::Set { key, value }) => {
            let opts = commands::config::ConfigSetOptions {
                key: key.clone(),
                value: value.clone(),
            };
            commands::config::execute_set(ctx, &opts)
        }
        Some(ConfigCommands::Path) => commands::config::execute_path(ctx),
    }
}

/// Commands that require authentication.
pub enum AuthDispatch {
    List(ListOptions),
    Add(AddOptions),
    Edit(EditOptions),
    Delete(DeleteOptions),
    Star(String),
    Report(String),
    Reported,
    Refresh,
    Remind(RemindOptions),
    Watch,
}

impl AuthDispatch {
    /// Create an auth dispatch from the CLI command.
    /// Returns None for commands handled by [`NoAuthDispatch`].
    pub fn from_cli(cli: &Cli) -> Option<Self> {
        let dispatch = match cli.command.as_ref()? {
            Commands::List { starred } => Self::List(ListOptions { starred: *starred }),
            Commands::Add {
                name,
                street,
                city,
                region,
                country,
                postal,
                notes,
                provider,
            } => Self::Add(AddOptions {
                name: name.clone(),
                street: street.clone(),
                city: city.clone(),
                region: region.clone(),
                country: country.clone(),
                postal: postal.clone(),
                notes: notes.clone(),
                provider: provider.clone(),
            }),
            Commands::Edit {
                id,
                name,
                notes,
                provider,
                contact_name,
                contact_email,
                contact_phone,
            } => Self::Edit(EditOptions {
                id: id.clone(),
                name: name.clone(),
                notes: notes.clone(),
                provider: provider.clone(),
                contact_name: contact_name.clone(),
                contact_email: contact_email.clone(),
                contact_phone: contact_phone.clone(),
            }),
            Commands::Delete { id, force } => Self::Delete(DeleteOptions {
                id: id.clone(),
                force: *force,
            }),
            Commands::Star { id } => Self::Star(id.clone()),
            Commands::Report { id } => Self::Report(id.clone()),
            Commands::Reported => Self::Reported,
            Commands::Refresh => Self::Refresh,
            Commands::Remind { dismiss } => Self::Remind(RemindOptions {
                dismiss: dismiss.clone(),
            }),
            Commands::Watch => Self::Watch,
            Commands::Config { .. } => return None,
        };
        Some(dispatch)
    }
}

impl AuthCommand for AuthDispatch {
    async fn execute(self, ctx: &CommandContext, token: &str) -> Result<()> {
        let mut ws = Workspace::open(token).await?;
        match self {
            Self::List(opts) => commands::items::execute_list(ctx, &ws, &opts),
            Self::Add(opts) => commands::items::execute_add(ctx, &mut ws, &opts).await,
            Self::Edit(opts) => commands::items::execute_edit(ctx, &mut ws, &opts).await,
            Self::Delete(opts) => commands::items::execute_delete(ctx, &mut ws, &opts).await,
            Self::Star(id) => commands::items::execute_star(ctx, &mut ws, &id).await,
            Self::Report(id) => commands::report::execute_report(ctx, &mut ws, &id).await,
            Self::Reported => commands::report::execute_reported(ctx, &mut ws).await,
            Self::Refresh => commands::report::execute_refresh(ctx, &mut ws).await,
            Self::Remind(opts) => commands::remind::execute_remind(ctx, &ws, &opts),
            Self::Watch => commands::remind::execute_watch(ctx, ws).await,
        }
    }
}
