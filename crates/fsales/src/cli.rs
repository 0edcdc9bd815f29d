//! CLI argument parsing using clap derive macros.
//!
//! This module defines the command-line interface for the fsales CLI.

use clap::{Parser, Subcommand};

/// fsales - saved locations for field sales
#[derive(Parser, Debug)]
#[command(name = "fsales")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Override store token (default: from config)
    #[arg(long, global = true, env = "FSALES_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List saved locations
    #[command(alias = "ls")]
    List {
        /// Show only starred locations
        #[arg(short, long)]
        starred: bool,
    },

    /// Save a new location
    #[command(alias = "a")]
    Add {
        /// Name of the location
        name: String,

        /// Street address
        #[arg(long, default_value = "")]
        street: String,

        /// City
        #[arg(long, default_value = "")]
        city: String,

        /// Region or state
        #[arg(long, default_value = "")]
        region: String,

        /// Country
        #[arg(long, default_value = "")]
        country: String,

        /// Postal code
        #[arg(long, default_value = "")]
        postal: String,

        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,

        /// Current provider
        #[arg(long)]
        provider: Option<String>,
    },

    /// Edit a saved location
    #[command(alias = "e")]
    Edit {
        /// Location ID (or unique prefix) or name
        id: String,

        /// New name (manually saved locations only)
        #[arg(long)]
        name: Option<String>,

        /// Replace notes
        #[arg(long)]
        notes: Option<String>,

        /// Replace current provider
        #[arg(long)]
        provider: Option<String>,

        /// Contact person name
        #[arg(long)]
        contact_name: Option<String>,

        /// Contact person email
        #[arg(long)]
        contact_email: Option<String>,

        /// Contact person phone
        #[arg(long)]
        contact_phone: Option<String>,
    },

    /// Delete a saved location
    #[command(alias = "rm")]
    Delete {
        /// Location ID (or unique prefix) or name
        id: String,

        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },

    /// Star or un-star a saved location
    Star {
        /// Location ID (or unique prefix) or name
        id: String,
    },

    /// Report a saved location to everyone
    Report {
        /// Location ID (or unique prefix) or name
        id: String,
    },

    /// List reported locations
    Reported,

    /// Reload reported locations and update reported flags
    Refresh,

    /// Generate and list follow-up reminders
    Remind {
        /// Dismiss the reminder with this ID
        #[arg(long)]
        dismiss: Option<String>,
    },

    /// Watch reported locations and reminders until interrupted
    Watch,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "server_url", "sync.poll_seconds")
        key: String,
        /// Value to set
        value: String,
    },

    /// Show config file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add_with_address() {
        let cli = Cli::try_parse_from([
            "fsales", "add", "Cafe A", "--street", "1 Main St", "--city", "Town", "--notes", "busy",
        ])
        .unwrap();

        if let Some(Commands::Add {
            name,
            street,
            city,
            postal,
            notes,
            ..
        }) = cli.command
        {
            assert_eq!(name, "Cafe A");
            assert_eq!(street, "1 Main St");
            assert_eq!(city, "Town");
            assert_eq!(postal, "");
            assert_eq!(notes.as_deref(), Some("busy"));
        } else {
            panic!("Expected Add command");
        }
    }

    #[test]
    fn test_parse_list_alias_and_global_flags() {
        let cli = Cli::try_parse_from(["fsales", "ls", "--starred", "--json", "--no-color"]).unwrap();
        assert!(cli.json);
        assert!(cli.no_color);
        assert!(matches!(cli.command, Some(Commands::List { starred: true })));
    }

    #[test]
    fn test_parse_delete_force() {
        let cli = Cli::try_parse_from(["fsales", "delete", "abc123", "-f"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Delete { ref id, force: true }) if id == "abc123"
        ));
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["fsales", "-q", "-v", "list"]).is_err());
    }

    #[test]
    fn test_parse_config_set() {
        let cli = Cli::try_parse_from(["fsales", "config", "set", "sync.poll_seconds", "30"]).unwrap();
        if let Some(Commands::Config {
            command: Some(ConfigCommands::Set { key, value }),
        }) = cli.command
        {
            assert_eq!(key, "sync.poll_seconds");
            assert_eq!(value, "30");
        } else {
            panic!("Expected Config Set command");
        }
    }
}
