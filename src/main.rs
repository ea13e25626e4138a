use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use assetbook::app;
use assetbook::clock::{Clock, SystemClock};
use assetbook::config::{default_config_path, ResolvedConfig};
use assetbook::duration::{format_duration, parse_duration};
use assetbook::report::Sink;
use clap::{Parser, Subcommand};
use rand::Rng;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "assetbook")]
#[command(about = "Value a portfolio against live price quotes")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one valuation and print it
    Value {
        /// document, chat, datastore or json
        #[arg(long, default_value_t = Sink::Document)]
        sink: Sink,
    },
    /// Run valuations periodically until interrupted
    Watch {
        /// Time between runs (e.g. "30m", "1h")
        #[arg(long, default_value = "1h", value_parser = parse_duration_arg)]
        interval: Duration,

        /// Random jitter in the range [-jitter, +jitter] added to each interval
        #[arg(long, default_value = "0s", value_parser = parse_duration_arg)]
        jitter: Duration,

        #[arg(long, default_value_t = Sink::Document)]
        sink: Sink,
    },
    /// Show the resolved configuration
    Config,
    /// Show which price source each asset routes to
    Sources,
}

fn parse_duration_arg(s: &str) -> Result<Duration, String> {
    parse_duration(s).map_err(|e| e.to_string())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().with_writer(std::io::stderr).json())
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .init();
    }
}

const MIN_DELAY: Duration = Duration::from_secs(1);

fn compute_next_delay(interval: Duration, jitter: Duration) -> Duration {
    if jitter.is_zero() {
        return interval.max(MIN_DELAY);
    }

    let base_ms = interval.as_millis().min(u128::from(u64::MAX)) as i128;
    let jitter_ms = jitter.as_millis().min(u128::from(u64::MAX)) as i128;
    let offset = rand::thread_rng().gen_range(-jitter_ms..=jitter_ms);

    let delay_ms = (base_ms + offset).clamp(MIN_DELAY.as_millis() as i128, i128::from(u64::MAX));
    Duration::from_millis(delay_ms as u64)
}

async fn value_once(config: &ResolvedConfig, sink: Sink) -> Result<()> {
    let valuation = app::run_valuation(config).await?;
    let rendered = app::projector_for(sink, config).render(&valuation)?;
    println!("{rendered}");
    Ok(())
}

async fn watch(config: &ResolvedConfig, interval: Duration, jitter: Duration, sink: Sink) -> Result<()> {
    let clock = SystemClock;
    loop {
        if let Err(err) = value_once(config, sink).await {
            tracing::error!(error = %format!("{err:#}"), "valuation run failed");
        }

        let delay = compute_next_delay(interval, jitter);
        let next_run = chrono::Duration::from_std(delay)
            .ok()
            .and_then(|d| clock.now_in(&config.timezone).checked_add_signed(d))
            .map(|t| t.format("%y/%m/%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        tracing::info!(%next_run, "waiting {}", format_duration(delay));

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, stopping");
                return Ok(());
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = ResolvedConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config: {}", cli.config.display()))?;

    match cli.command {
        Command::Value { sink } => value_once(&config, sink).await?,
        Command::Watch {
            interval,
            jitter,
            sink,
        } => watch(&config, interval, jitter, sink).await?,
        Command::Config => {
            println!("Config file: {}", cli.config.display());
            println!("Timezone: {}", config.timezone);
            println!("Fetch timeout: {}", format_duration(config.fetch_timeout));
            println!("Assets: {}", config.assets.len());
            let client = app::build_http_client(&config)?;
            let router = app::build_router(&config, &client);
            for source_type in router.source_types() {
                let provider = config.providers.get(source_type);
                let endpoint = provider.map(|p| p.endpoint.as_str()).unwrap_or("-");
                let keyed = provider.is_some_and(|p| p.api_key.is_some());
                println!(
                    "  {source_type}: {endpoint}{}",
                    if keyed { " (api key set)" } else { "" }
                );
            }
        }
        Command::Sources => {
            let client = app::build_http_client(&config)?;
            let router = app::build_router(&config, &client);
            for (name, route) in app::describe_routes(&config, &router) {
                println!("{name}: {route}");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_delay_without_jitter_is_constant() {
        let interval = Duration::from_secs(3600);
        assert_eq!(compute_next_delay(interval, Duration::ZERO), interval);
    }

    #[test]
    fn next_delay_never_drops_below_floor() {
        assert_eq!(compute_next_delay(Duration::ZERO, Duration::ZERO), MIN_DELAY);
        assert_eq!(
            compute_next_delay(Duration::from_millis(200), Duration::ZERO),
            MIN_DELAY
        );
        for _ in 0..50 {
            assert!(compute_next_delay(Duration::ZERO, Duration::from_millis(500)) >= MIN_DELAY);
        }
    }

    #[test]
    fn next_delay_with_jitter_stays_in_range() {
        let interval = Duration::from_secs(600);
        let jitter = Duration::from_secs(120);

        for _ in 0..100 {
            let delay = compute_next_delay(interval, jitter);
            assert!(delay >= Duration::from_secs(480));
            assert!(delay <= Duration::from_secs(720));
        }
    }

    #[test]
    fn cli_parses_watch() {
        let cli = Cli::try_parse_from([
            "assetbook", "watch", "--interval", "30m", "--jitter", "1m", "--sink", "chat",
        ])
        .unwrap();
        match cli.command {
            Command::Watch {
                interval,
                jitter,
                sink,
            } => {
                assert_eq!(interval, Duration::from_secs(1800));
                assert_eq!(jitter, Duration::from_secs(60));
                assert_eq!(sink, Sink::Chat);
            }
            _ => panic!("expected watch"),
        }
    }
}
