use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

use crate::config::UnzipConfig;
use crate::error::ConfigError;

#[derive(Parser, Debug)]
#[command(name = "zipserve")]
#[command(version)]
#[command(about = "Serve files and directory listings from inside zip archives", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipserve --root /srv/results                 serve /srv/results/*.zip under /unzip/\n  \
  zipserve --root . --bind 0.0.0.0:9000 -v     listen on all interfaces, debug logging\n  \
  zipserve --root . --mime log=text/plain      add a media type mapping")]
pub struct Cli {
    /// Directory holding the archives
    #[arg(long, value_name = "DIR", env = "ZIPSERVE_ROOT")]
    pub root: PathBuf,

    /// File extension that marks an archive
    #[arg(long, value_name = "EXT", default_value = "zip", env = "ZIPSERVE_EXTENSION")]
    pub extension: String,

    /// Address to listen on
    #[arg(long, value_name = "ADDR", default_value = "127.0.0.1:8080", env = "ZIPSERVE_BIND")]
    pub bind: SocketAddr,

    /// Extra content type mapping, e.g. `log=text/plain` (repeatable)
    #[arg(long = "mime", value_name = "EXT=TYPE")]
    pub media_types: Vec<String>,

    /// More logging (-vv => trace)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Less logging (-qq => errors only)
    #[arg(short = 'q', action = clap::ArgAction::Count, conflicts_with = "verbose")]
    pub quiet: u8,
}

impl Cli {
    /// Default log level; `RUST_LOG` still overrides it
    pub fn log_level(&self) -> LevelFilter {
        match (self.quiet, self.verbose) {
            (0, 0) => LevelFilter::Info,
            (0, 1) => LevelFilter::Debug,
            (0, _) => LevelFilter::Trace,
            (1, _) => LevelFilter::Warn,
            _ => LevelFilter::Error,
        }
    }

    /// Validate the arguments into a service configuration
    pub fn config(&self) -> Result<UnzipConfig, ConfigError> {
        UnzipConfig::new(&self.root, &self.extension)?.with_media_types(&self.media_types)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["zipserve", "--root", "/srv/results"]).unwrap();
        assert_eq!(cli.extension, "zip");
        assert_eq!(cli.bind, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(cli.log_level(), LevelFilter::Info);
        assert!(cli.media_types.is_empty());
    }

    #[test]
    fn verbosity_and_mappings() {
        let cli = Cli::try_parse_from([
            "zipserve",
            "--root",
            ".",
            "-vv",
            "--mime",
            "log=text/plain",
            "--mime",
            "dat=application/octet-stream",
        ])
        .unwrap();
        assert_eq!(cli.log_level(), LevelFilter::Trace);
        assert_eq!(cli.media_types.len(), 2);

        let quiet = Cli::try_parse_from(["zipserve", "--root", ".", "-qq"]).unwrap();
        assert_eq!(quiet.log_level(), LevelFilter::Error);
    }

    #[test]
    fn builds_config() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_str().unwrap();
        let cli =
            Cli::try_parse_from(["zipserve", "--root", root, "--mime", "dat=application/x-dat"])
                .unwrap();

        let config = cli.config().unwrap();
        assert_eq!(config.root, dir.path().canonicalize().unwrap());
        assert_eq!(
            config.media_types.guess("a.dat").as_deref(),
            Some("application/x-dat")
        );
    }
}
