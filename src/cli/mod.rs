pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "gator")]
#[command(about = "A personal RSS feed aggregator", long_about = None)]
pub struct Cli {
    /// Path to the config file (default: ~/.config/gator/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a user and log in as them
    Register {
        /// Unique user name
        name: String,
    },
    /// Switch the current user
    Login {
        /// Name of an existing user
        name: String,
    },
    /// List all users
    Users,
    /// Delete all users, feeds and follows
    Reset,
    /// Add a feed (if new) and follow it
    Addfeed {
        /// Display name for the feed
        name: String,
        /// URL of the feed
        url: String,
    },
    /// List every feed with the user who added it
    Feeds,
    /// Follow an existing feed
    Follow {
        /// URL of the feed to follow
        url: String,
    },
    /// List the feeds the current user follows
    Following,
    /// Stop following a feed
    Unfollow {
        /// URL of the feed to unfollow
        url: String,
    },
    /// Poll feeds forever, one feed per tick
    Agg {
        /// Time between requests (e.g., "30s", "1m", "1h")
        interval: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addfeed_requires_name_and_url() {
        assert!(Cli::try_parse_from(["gator", "addfeed", "Blog"]).is_err());

        let cli = Cli::try_parse_from(["gator", "addfeed", "Blog", "https://x.test/rss"]).unwrap();
        match cli.command {
            Commands::Addfeed { name, url } => {
                assert_eq!(name, "Blog");
                assert_eq!(url, "https://x.test/rss");
            }
            _ => panic!("expected addfeed"),
        }
    }

    #[test]
    fn test_agg_requires_interval() {
        assert!(Cli::try_parse_from(["gator", "agg"]).is_err());
        let cli = Cli::try_parse_from(["gator", "agg", "1m"]).unwrap();
        assert!(matches!(cli.command, Commands::Agg { interval } if interval == "1m"));
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["gator", "feeds", "--config", "/tmp/gator.toml"]).unwrap();
        assert!(matches!(cli.command, Commands::Feeds));
        assert_eq!(
            cli.config.as_deref(),
            Some(std::path::Path::new("/tmp/gator.toml"))
        );
    }
}
