use crate::config::MigrationRequest;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "scrobble-migrate")]
#[command(about = "Copy Last.fm listening history to ListenBrainz")]
pub struct CliArgs {
    /// Last.fm username whose history is migrated
    pub username: String,

    /// Number of history pages to fetch, starting from the most recent
    pub total_pages: u32,

    /// Path to TOML configuration file (credentials, endpoints, pacing)
    #[arg(short, long, default_value = "scrobble-migrate.toml")]
    pub config: PathBuf,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

impl CliArgs {
    pub fn request(&self) -> MigrationRequest {
        MigrationRequest::new(self.username.clone(), self.total_pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_positional_arguments() {
        let args = CliArgs::try_parse_from(["scrobble-migrate", "rj", "5"]).unwrap();
        assert_eq!(args.request(), MigrationRequest::new("rj", 5));
        assert_eq!(args.config, PathBuf::from("scrobble-migrate.toml"));
        assert!(!args.verbose);
    }

    #[test]
    fn test_total_pages_must_be_a_number() {
        assert!(CliArgs::try_parse_from(["scrobble-migrate", "rj", "many"]).is_err());
        assert!(CliArgs::try_parse_from(["scrobble-migrate", "rj"]).is_err());
    }
}
