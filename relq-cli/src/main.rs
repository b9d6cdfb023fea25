mod config;

use anyhow::Result;
use config::{Command, Settings};
use log::{error, info};
use relq::{QueueConfig, RedisStore, ReliableQueue};
use serde_json::Value;

type Queue = ReliableQueue<Value, RedisStore>;

/// Arguments which are not valid JSON are pushed as strings, so `relq push hello` works.
fn parse_item(arg: &str) -> Value {
    serde_json::from_str(arg).unwrap_or_else(|_| Value::String(arg.to_string()))
}

async fn open_queue(settings: &Settings) -> Result<Queue> {
    let store = RedisStore::connect(&settings.url).await?;

    info!("Connected to {}", store.address());

    let config = QueueConfig::default()
        .queue_name(&settings.queue_name)
        .timeout(settings.timeout);

    Ok(ReliableQueue::new(store, config))
}

async fn run(command: Command, queue: &mut Queue) -> Result<()> {
    match command {
        Command::Push { items } => {
            for item in &items {
                queue.push(&parse_item(item)).await?;
            }

            println!("{}", queue.length().await?);
        }
        Command::Pop { block } => match queue.pop(block).await? {
            Some(item) => {
                println!("{item}");
                queue.commit().await?;
            }
            None => info!("Queue {} is empty", queue.waiting()),
        },
        Command::Length => {
            println!(
                "waiting: {}, processing: {}",
                queue.length().await?,
                queue.processing_length().await?
            );
        }
        Command::Refill => {
            let moved = queue.refill().await?;

            println!("{moved}");
        }
        Command::Clear { processing } => {
            queue.clear(processing).await?;
        }
        Command::Drain {
            block,
            count,
            no_commit,
        } => {
            let summary = queue
                .process(block, None, count, |item| {
                    if let Some(item) = item {
                        println!("{item}");
                    }

                    Ok(!no_commit)
                })
                .await?;

            info!("Handled {} items, committed {}", summary.handled, summary.committed);
        }
    }

    Ok(())
}

#[tokio::main]
pub async fn main() -> Result<()> {
    relq::setup_logger();

    let cli_config = config::cli();

    let config = config::parse_config(&cli_config.config_file_path)?;
    let settings = config::resolve(&cli_config, config)?;

    let mut queue = open_queue(&settings).await?;

    tokio::select! {
        result = run(cli_config.command, &mut queue) => {
            if let Err(e) = &result {
                error!("Error {:?}", e);
            }

            result
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");

            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_arguments_are_parsed() {
        assert_eq!(serde_json::json!({"id": 1}), parse_item(r#"{"id": 1}"#));
        assert_eq!(Value::from(42), parse_item("42"));
    }

    #[test]
    fn other_arguments_are_strings() {
        assert_eq!(Value::String("hello world".into()), parse_item("hello world"));
    }
}
