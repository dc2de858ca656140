//! CLI argument parsing with clap

use crate::config::{Config, FileOperation, NtfyConfig};
use clap::Parser;
use std::path::PathBuf;

/// Media Organizer - sort photos, RAW files and videos by capture date
///
/// Deduplicates media files by content and copies (or moves) them into a
/// year/month/day tree, using EXIF data, video metadata or file system
/// timestamps to date each file.
#[derive(Parser, Debug)]
#[command(name = "media-organizer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Source directory to scan
    pub source: PathBuf,

    /// Destination root (created if missing)
    pub destination: PathBuf,

    /// Move files instead of copying them
    #[arg(long = "move")]
    pub move_files: bool,

    /// Also write a full (debug level) log to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Show debug messages on the console
    #[arg(short, long)]
    pub verbose: bool,

    /// ntfy topic to notify when the run completes
    #[arg(long, value_name = "TOPIC")]
    pub ntfy: Option<String>,

    /// ntfy server base URL
    #[arg(long, env = "NTFY_SERVER", value_name = "URL")]
    pub ntfy_server: Option<String>,

    /// Path to configuration file (TOML format)
    ///
    /// Settings from the file are used as defaults; CLI arguments override them.
    #[arg(short = 'C', long)]
    pub config: Option<PathBuf>,

    /// Write the log file as JSON
    #[arg(long)]
    pub json_log: bool,
}

impl Cli {
    /// Merge CLI arguments with config from file
    /// CLI arguments take precedence over config file settings
    pub fn merge_with_config(&self, mut config: Config) -> Config {
        config.source_dir = self.source.clone();
        config.destination_dir = self.destination.clone();

        if self.move_files {
            config.operation = FileOperation::Move;
        }

        if let Some(ref topic) = self.ntfy {
            let mut ntfy = config
                .ntfy
                .take()
                .unwrap_or_else(|| NtfyConfig::new(topic.clone()));
            ntfy.topic = topic.clone();
            config.ntfy = Some(ntfy);
        }
        if let (Some(server), Some(ntfy)) = (&self.ntfy_server, config.ntfy.as_mut()) {
            ntfy.server = server.clone();
        }

        config
    }

    /// Convert CLI arguments to Config (when no config file is used)
    pub fn to_config(&self) -> Config {
        self.merge_with_config(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_arguments() {
        let cli = Cli::try_parse_from(["media-organizer", "/in", "/out"]).unwrap();
        let config = cli.to_config();

        assert_eq!(config.source_dir, PathBuf::from("/in"));
        assert_eq!(config.destination_dir, PathBuf::from("/out"));
        assert_eq!(config.operation, FileOperation::Copy);
        assert!(config.ntfy.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_all_flags() {
        let cli = Cli::try_parse_from([
            "media-organizer",
            "/in",
            "/out",
            "--move",
            "--log-file",
            "run.log",
            "-v",
            "--ntfy",
            "photos",
        ])
        .unwrap();
        let config = cli.to_config();

        assert!(cli.verbose);
        assert_eq!(cli.log_file, Some(PathBuf::from("run.log")));
        assert_eq!(config.operation, FileOperation::Move);
        assert_eq!(config.ntfy.unwrap().topic, "photos");
    }

    #[test]
    fn test_missing_destination_is_rejected() {
        assert!(Cli::try_parse_from(["media-organizer", "/in"]).is_err());
    }

    #[test]
    fn test_cli_overrides_config_file() {
        let cli = Cli::try_parse_from(["media-organizer", "/in", "/out", "--ntfy", "cli-topic"])
            .unwrap();
        let mut file_config = Config::new("/ignored", "/ignored");
        let mut ntfy = NtfyConfig::new("file-topic");
        ntfy.priority = 5;
        file_config.ntfy = Some(ntfy);
        file_config.operation = FileOperation::Move;

        let config = cli.merge_with_config(file_config);
        assert_eq!(config.source_dir, PathBuf::from("/in"));
        assert_eq!(config.operation, FileOperation::Move);

        let ntfy = config.ntfy.unwrap();
        assert_eq!(ntfy.topic, "cli-topic");
        assert_eq!(ntfy.priority, 5);
    }
}
