use super::Parser;
use clap::Subcommand;

#[derive(Parser, Debug)]
#[command(name = "jobboard", about = "Job board client")]
pub struct Cli {
    #[arg(long)]
    pub settings: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in and print the resolved identity.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Restore the session from the refresh cookie and print who it belongs to.
    Whoami,
    /// Sign in and page through the job feed.
    Feed {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        q: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: u16,
        /// Stop after this many pages.
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_feed_arguments() {
        let cli = Cli::parse_from([
            "jobboard",
            "--settings",
            "settings/dev.toml",
            "feed",
            "--email",
            "a@example.com",
            "--password",
            "Passw0rd!",
            "--pages",
            "3",
        ]);
        assert_eq!(cli.settings.as_deref(), Some("settings/dev.toml"));
        match cli.command {
            Command::Feed { pages, limit, q, .. } => {
                assert_eq!(pages, 3);
                assert_eq!(limit, 20);
                assert!(q.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
