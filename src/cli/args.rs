//! CLI argument definitions using Clap

use clap::{Parser, Subcommand};

use crate::domain::listening::LanguageTag;

/// Voxloop - live speech transcription over the platform recognizer
#[derive(Parser, Debug)]
#[command(name = "voxloop")]
#[command(version)]
#[command(about = "Live speech transcription over the platform speech recognizer")]
#[command(long_about = None)]
pub struct Cli {
    /// Recognition language (BCP-47 tag, e.g. en-US or ar-SA)
    #[arg(short = 'l', long, value_name = "TAG")]
    pub language: Option<String>,

    /// Only update the transcript on completed utterances
    #[arg(long)]
    pub no_partials: bool,

    /// Config subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Parsed listening options
#[derive(Debug, Clone)]
pub struct ListenOptions {
    pub language: LanguageTag,
    pub partial_results: bool,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &["language", "partial_results"];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_defaults() {
        let cli = Cli::parse_from(["voxloop"]);
        assert!(cli.language.is_none());
        assert!(!cli.no_partials);
        assert!(cli.command.is_none());
    }

    #[test]
    fn cli_parses_language() {
        let cli = Cli::parse_from(["voxloop", "-l", "ar-SA"]);
        assert_eq!(cli.language, Some("ar-SA".to_string()));

        let cli = Cli::parse_from(["voxloop", "--language", "en-US"]);
        assert_eq!(cli.language, Some("en-US".to_string()));
    }

    #[test]
    fn cli_parses_no_partials() {
        let cli = Cli::parse_from(["voxloop", "--no-partials"]);
        assert!(cli.no_partials);
    }

    #[test]
    fn cli_parses_config_init() {
        let cli = Cli::parse_from(["voxloop", "config", "init"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                action: ConfigAction::Init
            })
        ));
    }

    #[test]
    fn cli_parses_config_set() {
        let cli = Cli::parse_from(["voxloop", "config", "set", "language", "ar-SA"]);
        if let Some(Commands::Config {
            action: ConfigAction::Set { key, value },
        }) = cli.command
        {
            assert_eq!(key, "language");
            assert_eq!(value, "ar-SA");
        } else {
            panic!("Expected Config Set command");
        }
    }

    #[test]
    fn cli_parses_config_path() {
        let cli = Cli::parse_from(["voxloop", "config", "path"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                action: ConfigAction::Path
            })
        ));
    }

    #[test]
    fn valid_config_keys() {
        assert!(is_valid_config_key("language"));
        assert!(is_valid_config_key("partial_results"));
        assert!(!is_valid_config_key("invalid_key"));
    }

    #[test]
    fn verify_cli() {
        // Verify the CLI definition is valid
        Cli::command().debug_assert();
    }
}
