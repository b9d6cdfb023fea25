use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use serde_derive::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "relq", version, about = "Operate reliable queues stored in Redis")]
pub(crate) struct CliConfig {
    /// Path to the config file
    #[arg(short = 'c', long = "config", value_name = "FILE", default_value = "relq.toml")]
    pub(crate) config_file_path: String,
    /// Store url, like redis://127.0.0.1:6379/0
    #[arg(long)]
    pub(crate) url: Option<String>,
    /// Name of the waiting list
    #[arg(short, long)]
    pub(crate) queue: Option<String>,
    /// Seconds a blocking pop waits, 0 waits forever
    #[arg(short, long, value_name = "SECS")]
    pub(crate) timeout: Option<u64>,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Debug, PartialEq, Subcommand)]
pub(crate) enum Command {
    /// Push items, arguments are parsed as JSON, or taken as strings if they are not JSON
    Push {
        #[arg(required = true)]
        items: Vec<String>,
    },
    /// Pop one item, print it and commit it
    Pop {
        #[arg(short, long)]
        block: bool,
    },
    /// Print the length of the waiting and the processing list
    Length,
    /// Move the items of the processing list back to the waiting list
    Refill,
    /// Delete the waiting list
    Clear {
        /// Delete the processing list too
        #[arg(long)]
        processing: bool,
    },
    /// Print the items until the queue is empty
    Drain {
        #[arg(short, long)]
        block: bool,
        /// Stop after this many items
        #[arg(short = 'n', long, allow_negative_numbers = true)]
        count: Option<i64>,
        /// Leave the items in the processing list
        #[arg(long)]
        no_commit: bool,
    },
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Config {
    #[serde(default)]
    pub(crate) store: Store,
    #[serde(default)]
    pub(crate) queue: Queue,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Store {
    pub(crate) url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Queue {
    pub(crate) name: Option<String>,
    pub(crate) timeout_secs: Option<u64>,
}

/// Values after merging the config file and the command line.
#[derive(Debug, PartialEq)]
pub(crate) struct Settings {
    pub(crate) url: String,
    pub(crate) queue_name: String,
    pub(crate) timeout: Duration,
}

/// Read the config file. A missing file is not an error, every value has a default or can be
/// given on the command line.
pub(crate) fn parse_config(path: &str) -> Result<Config> {
    if !Path::new(path).exists() {
        log::info!("Config file {} not found, using defaults", path);

        return Ok(Config::default());
    }

    let cfg = std::fs::read_to_string(path)?;

    Ok(toml::from_str(&cfg)?)
}

pub(crate) fn cli() -> CliConfig {
    CliConfig::parse()
}

/// Command line flags win over the config file.
pub(crate) fn resolve(cli: &CliConfig, config: Config) -> Result<Settings> {
    let url = cli
        .url
        .clone()
        .or(config.store.url)
        .unwrap_or_else(|| relq::store::redis::DEFAULT_URL.to_string());

    let queue_name = cli
        .queue
        .clone()
        .or(config.queue.name)
        .ok_or_else(|| anyhow!("Queue name is missing, use --queue or the [queue] section of the config"))?;

    let timeout = cli.timeout.or(config.queue.timeout_secs).unwrap_or(0);

    Ok(Settings {
        url,
        queue_name,
        timeout: Duration::from_secs(timeout),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliConfig {
        CliConfig::try_parse_from(args).unwrap()
    }

    #[test]
    fn parse_drain_with_negative_count() {
        let cli = parse(&["relq", "-q", "jobs", "drain", "--count", "-1", "--no-commit"]);

        assert_eq!(Some("jobs".to_string()), cli.queue);
        assert_eq!(
            Command::Drain {
                block: false,
                count: Some(-1),
                no_commit: true
            },
            cli.command
        );
    }

    #[test]
    fn push_needs_items() {
        assert!(CliConfig::try_parse_from(["relq", "push"]).is_err());
    }

    #[test]
    fn flags_override_the_file() {
        let cli = parse(&["relq", "--url", "localhost:7000", "-t", "3", "length"]);
        let config: Config = toml::from_str(
            r#"
            [store]
            url = "redis://10.0.0.1"

            [queue]
            name = "from-file"
            timeout_secs = 10
            "#,
        )
        .unwrap();

        let settings = resolve(&cli, config).unwrap();

        assert_eq!(
            Settings {
                url: "localhost:7000".into(),
                queue_name: "from-file".into(),
                timeout: Duration::from_secs(3),
            },
            settings
        );
    }

    #[test]
    fn defaults_without_config() {
        let cli = parse(&["relq", "-q", "jobs", "refill"]);

        let settings = resolve(&cli, Config::default()).unwrap();

        assert_eq!(relq::store::redis::DEFAULT_URL, settings.url);
        assert_eq!(Duration::ZERO, settings.timeout);
    }

    #[test]
    fn queue_name_is_required() {
        let cli = parse(&["relq", "length"]);

        assert!(resolve(&cli, Config::default()).is_err());
    }

    #[test]
    fn missing_config_file_gives_defaults() {
        let config = parse_config("/nonexistent/relq.toml").unwrap();

        assert!(config.store.url.is_none());
        assert!(config.queue.name.is_none());
    }
}
