use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Request timeout in seconds (overrides the configuration file)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct AccountArgs {
    /// Account email used for the login
    #[arg(short, long, env = "TOUTV_USERNAME")]
    pub username: Option<String>,

    /// Account password used for the login
    #[arg(short, long, env = "TOUTV_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve a TOU.TV page into a media resolver reference
    Extract {
        /// Page URL, e.g. https://ici.tou.tv/infoman/S20E01
        url: String,

        #[command(flatten)]
        account: AccountArgs,

        /// Cookies to send, as "name=value; name2=value2"
        #[arg(long)]
        cookies: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
        output: OutputFormat,

        /// Report whether a session was attached to the reference
        #[arg(long)]
        show_session: bool,
    },

    /// Run the account login only and report the outcome
    Login {
        #[command(flatten)]
        account: AccountArgs,
    },

    /// List supported platforms
    Platforms,

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Show or reset the configuration
    Config {
        /// Print the effective configuration
        #[arg(long)]
        show: bool,

        /// Overwrite the configuration file with defaults
        #[arg(long)]
        reset: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Pretty,
    Json,
    JsonCompact,
}
