// src/cli/mod.rs
//! CLI definitions for repkg
//!
//! The actual command implementations are in the `commands` module.
//! Running `repkg` without a command rebuilds all pending packages.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "repkg")]
#[command(version)]
#[command(about = "Automatically rebuild packages after their dependencies were updated", long_about = None)]
pub struct Cli {
    /// Configuration file (default: $REPKG_CONFIG or /etc/repkg/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the state database, overrides the configuration file
    #[arg(long, global = true)]
    pub db_path: Option<PathBuf>,

    /// Log more details (repeat for more)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rebuild all pending packages using the configured frontend
    Rebuild,

    /// Mark packages as updated and propagate rebuild triggers (root)
    Update {
        /// Packages that were installed or upgraded
        packages: Vec<String>,

        /// Also read whitespace separated package names from stdin
        #[arg(long)]
        stdin: bool,
    },

    /// Create a rule file for a package
    Create {
        /// Package that needs rebuilding
        package: String,

        /// Trigger packages, each as `name` or `name=scope`
        dependencies: Vec<String>,

        /// Append the package's installed dependencies
        #[arg(short, long)]
        auto: bool,
    },

    /// Remove the rule files of packages
    Remove {
        /// Packages whose rules should be removed
        #[arg(required = true)]
        packages: Vec<String>,
    },

    /// List packages pending a rebuild
    List {
        /// Show what triggered each rebuild
        #[arg(short, long)]
        detail: bool,
    },

    /// List the loaded rules
    Rules {
        /// Only print the package names
        #[arg(short, long)]
        short: bool,

        /// Only show rules of the caller's tier
        #[arg(short, long)]
        user: bool,
    },

    /// Forget pending rebuilds, all of them if no package is given (root)
    Clear {
        /// Packages to remove from the pending list
        packages: Vec<String>,
    },

    /// Show or configure the rebuild frontend
    ///
    /// Options go before `--set`; everything after the tool name is part
    /// of its command line.
    Frontend {
        /// Store TOOL as the frontend (root)
        #[arg(long, requires = "tool")]
        set: bool,

        /// Run the frontend once per wave instead of once for all packages
        #[arg(long)]
        waved: bool,

        /// Go back to the automatically detected frontend (root)
        #[arg(long, conflicts_with_all = ["set", "waved"])]
        reset: bool,

        /// Frontend command line; package names are appended
        #[arg(requires = "set", trailing_var_arg = true, allow_hyphen_values = true)]
        tool: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_command_means_rebuild() {
        let cli = Cli::try_parse_from(["repkg", "-vv"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_frontend_set_takes_arguments() {
        let cli = Cli::try_parse_from(["repkg", "frontend", "--waved", "--set", "yay", "-S", "--rebuild"]);
        match cli.unwrap().command {
            Some(Commands::Frontend { set, waved, reset, tool }) => {
                assert!(set && waved && !reset);
                assert_eq!(tool, vec!["yay", "-S", "--rebuild"]);
            }
            _ => panic!("expected frontend command"),
        }

        assert!(Cli::try_parse_from(["repkg", "frontend", "--set"]).is_err());
        assert!(Cli::try_parse_from(["repkg", "frontend", "--reset", "--waved"]).is_err());
    }

    #[test]
    fn test_frontend_flag_constraints() {
        assert!(Cli::try_parse_from(["repkg", "frontend", "yay"]).is_err());
        assert!(Cli::try_parse_from(["repkg", "frontend", "--reset", "--set", "yay"]).is_err());
        assert!(Cli::try_parse_from(["repkg", "-q", "-v", "list"]).is_err());
        assert!(Cli::try_parse_from(["repkg", "frontend", "--reset"]).is_ok());
    }

    #[test]
    fn test_update_flags() {
        let cli = Cli::try_parse_from(["repkg", "update", "--stdin", "libbar", "glibc"]).unwrap();
        match cli.command {
            Some(Commands::Update { packages, stdin }) => {
                assert!(stdin);
                assert_eq!(packages, vec!["libbar", "glibc"]);
            }
            _ => panic!("expected update command"),
        }
    }

    #[test]
    fn test_remove_requires_package() {
        assert!(Cli::try_parse_from(["repkg", "remove"]).is_err());
    }
}
