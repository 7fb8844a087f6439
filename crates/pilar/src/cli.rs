//! Command-line interface handling for the Pilar server.
//!
//! This module provides command-line argument parsing using the `clap` crate.

use clap::{value_parser, Arg, ArgMatches, Command};
use std::path::PathBuf;

/// Command line arguments parsed from user input.
///
/// Every option overrides the corresponding configuration file setting and
/// the `PORT` environment variable.
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Path to the configuration file
    pub config_path: PathBuf,
    /// Optional override for the listening host
    pub host: Option<String>,
    /// Optional override for the listening port
    pub port: Option<u16>,
    /// Optional override for log level
    pub log_level: Option<String>,
    /// Whether to force JSON log output
    pub json_logs: bool,
}

impl CliArgs {
    /// Parses the process arguments.
    ///
    /// Exits with a usage message if the arguments are invalid.
    pub fn parse() -> Self {
        Self::from_matches(&command().get_matches())
    }

    /// Parses an explicit argument list; the first item is the program name.
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Ok(Self::from_matches(&command().try_get_matches_from(args)?))
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            config_path: matches
                .get_one::<String>("config")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("config.toml")),
            host: matches.get_one::<String>("host").cloned(),
            port: matches.get_one::<u16>("port").copied(),
            log_level: matches.get_one::<String>("log-level").cloned(),
            json_logs: matches.get_flag("json-logs"),
        }
    }
}

fn command() -> Command {
    Command::new("Pilar Server")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Shared-world WebSocket server with player spaces and mail")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config.toml"),
        )
        .arg(
            Arg::new("host")
                .long("host")
                .value_name("ADDRESS")
                .help("IP address to listen on (e.g., 127.0.0.1)"),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("TCP port to listen on (overrides the PORT environment variable)")
                .value_parser(value_parser!(u16)),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (trace, debug, info, warn, error)"),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .help("Output logs in JSON format")
                .action(clap::ArgAction::SetTrue),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = CliArgs::try_parse_from(["pilar"]).unwrap();
        assert_eq!(args.config_path, PathBuf::from("config.toml"));
        assert_eq!(args.host, None);
        assert_eq!(args.port, None);
        assert_eq!(args.log_level, None);
        assert!(!args.json_logs);
    }

    #[test]
    fn test_all_overrides() {
        let args = CliArgs::try_parse_from([
            "pilar",
            "--config",
            "prod.toml",
            "--host",
            "127.0.0.1",
            "--port",
            "9000",
            "--log-level",
            "debug",
            "--json-logs",
        ])
        .unwrap();

        assert_eq!(args.config_path, PathBuf::from("prod.toml"));
        assert_eq!(args.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(args.port, Some(9000));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(args.json_logs);
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        assert!(CliArgs::try_parse_from(["pilar", "--port", "http"]).is_err());
        assert!(CliArgs::try_parse_from(["pilar", "--port", "70000"]).is_err());
    }
}
