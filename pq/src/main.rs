//! pacequeue - rate-limited completion request coordinator
//!
//! CLI entry point for submitting prompts through the priority queue.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result, eyre};
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use serde_json::{Value, json};
use tracing::info;

use pacequeue::cli::{Cli, Command};
use pacequeue::config::Config;
use pacequeue::coordinator::{Coordinator, DispatchError, Gateway, SubmitError};

/// Caller name the CLI submits under
const CLI_CALLER: &str = "cli";

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pacequeue")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level).map(|s| s.to_uppercase()) {
        Some(s) => match s.as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("pacequeue.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    setup_logging(cli.log_level.as_deref(), config.log_level.as_deref()).context("Failed to setup logging")?;

    match cli.command {
        Command::Submit {
            prompt,
            priority,
            model,
            temperature,
            max_tokens,
        } => cmd_submit(&config, prompt, priority, model, temperature, max_tokens).await,
        Command::Batch { input } => cmd_batch(&config, &input).await,
        Command::Config => cmd_config(&config),
    }
}

/// Build the gateway from configuration
fn build_gateway(config: &Config) -> Result<Gateway> {
    let coordinator_config = config.coordinator_config().context("Invalid configuration")?;
    info!(?coordinator_config, "Starting coordinator");

    let coordinator = Coordinator::connect(&coordinator_config).context("Failed to create HTTP client")?;
    Ok(Gateway::new(coordinator).with_throttle(config.admission_throttle()?))
}

/// Submit one prompt and print the completion
async fn cmd_submit(
    config: &Config,
    prompt: String,
    priority: Option<i64>,
    model: Option<String>,
    temperature: Option<f64>,
    max_tokens: Option<i64>,
) -> Result<()> {
    let gateway = build_gateway(config)?;

    let mut payload = json!({ "prompt": prompt });
    if let Some(model) = model {
        payload["model"] = json!(model);
    }
    if let Some(temperature) = temperature {
        payload["temperature"] = json!(temperature);
    }
    if let Some(max_tokens) = max_tokens {
        payload["maxTokens"] = json!(max_tokens);
    }
    let submission = json!({ "payload": payload, "priority": priority });

    let handle = match gateway.submit(CLI_CALLER, &submission) {
        Ok(handle) => handle,
        Err(SubmitError::Invalid(e)) => {
            for field in &e.errors {
                eprintln!("{} {}", "invalid".red().bold(), field);
            }
            return Err(eyre!("Request rejected ({} field error(s))", e.errors.len()));
        }
        Err(e) => return Err(e.into()),
    };

    eprintln!("{} {} (priority {})", "queued".cyan(), handle.id(), handle.priority());

    match handle.await {
        Ok(response) => {
            println!("{}", response.completion.trim_start());
            eprintln!(
                "{} model={} stop_reason={}",
                "done".green().bold(),
                response.model,
                response.stop_reason
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("{} [{}] {}", "failed".red().bold(), e.code(), e);
            Err(eyre!(e))
        }
    }
}

fn error_json(e: &DispatchError) -> Value {
    json!({
        "code": e.code(),
        "status": e.status(),
        "attempts": e.attempts(),
        "message": e.to_string(),
    })
}

fn open_input(input: &Path) -> Result<Box<dyn BufRead>> {
    if input == Path::new("-") {
        return Ok(Box::new(BufReader::new(std::io::stdin())));
    }
    let file = fs::File::open(input).context(format!("Failed to open {}", input.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

/// Submit every line of a JSONL file concurrently, printing results as they finish
async fn cmd_batch(config: &Config, input: &Path) -> Result<()> {
    let gateway = build_gateway(config)?;
    let reader = open_input(input)?;

    let mut pending = FuturesUnordered::new();
    let mut rejected = 0usize;

    for (index, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read input")?;
        if line.trim().is_empty() {
            continue;
        }

        let submission: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                rejected += 1;
                println!("{}", json!({ "index": index, "ok": false, "rejected": e.to_string() }));
                continue;
            }
        };

        match gateway.submit(CLI_CALLER, &submission) {
            Ok(handle) => {
                let id = handle.id().to_string();
                let priority = handle.priority();
                pending.push(async move { (index, id, priority, handle.await) });
            }
            Err(e) => {
                rejected += 1;
                let detail = match &e {
                    SubmitError::Invalid(v) => json!(v.errors),
                    other => json!(other.to_string()),
                };
                println!("{}", json!({ "index": index, "ok": false, "rejected": detail }));
            }
        }
    }

    let total = pending.len() + rejected;
    let mut failed = 0usize;

    while let Some((index, id, priority, result)) = pending.next().await {
        let line = match result {
            Ok(response) => json!({ "index": index, "id": id, "priority": priority, "ok": true, "response": response }),
            Err(e) => {
                failed += 1;
                json!({ "index": index, "id": id, "priority": priority, "ok": false, "error": error_json(&e) })
            }
        };
        println!("{}", line);
    }

    let stats = gateway.coordinator().stats();
    eprintln!(
        "{} {} submitted, {} succeeded, {} failed, {} rejected, {} retries",
        "batch".cyan().bold(),
        total,
        stats.total_succeeded,
        failed,
        rejected,
        stats.total_retries
    );

    if failed + rejected > 0 {
        return Err(eyre!("{} of {} requests did not complete", failed + rejected, total));
    }
    Ok(())
}

/// Print the validated configuration
fn cmd_config(config: &Config) -> Result<()> {
    let coordinator_config = config.coordinator_config().context("Invalid configuration")?;
    let admission_limit = config.admission_limit()?;

    print!("{}", serde_yaml::to_string(&coordinator_config)?);
    println!("api-key-env: {}", config.api_key_env);
    println!(
        "pacing-interval-ms: {}",
        coordinator_config.pacing_interval().as_millis()
    );
    println!("admission-limit-per-minute: {}", admission_limit);
    Ok(())
}
