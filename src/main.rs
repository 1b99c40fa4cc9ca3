use anyhow::{Context, Result};
use log::{error, info};
use std::env;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use spamsieve::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables and initialize logging
    dotenv::dotenv().ok();
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("Starting SpamSieve v{}", spamsieve::VERSION);

    let config = match env::var("SPAMSIEVE_CONFIG") {
        Ok(path) => FilterConfig::load_or_create(&path)
            .with_context(|| format!("Failed to load configuration from {}", path))?,
        Err(_) => FilterConfig::from_env().context("Invalid SPAMSIEVE_* environment")?,
    };

    let filter = Arc::new(SpamFilter::new(config)?);
    let commands = FilterCommands::new(filter.clone());

    info!("Reading messages from stdin, lines starting with '/' are commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        if line.trim_start().starts_with('/') {
            match commands.process_command(&line) {
                Some(response) => println!("{}", response),
                None => println!("❓ Unknown command, try /help"),
            }
            continue;
        }

        let verdict = filter.check(&line);
        if verdict.is_spam {
            println!("SPAM\t{}\t{}", verdict.normalized, verdict.matched_patterns.join(", "));
        } else {
            println!("ok\t{}", verdict.normalized);
        }
    }

    let stats = filter.stats();
    info!("Shutting down with {} patterns", stats.patterns);
    Ok(())
}
