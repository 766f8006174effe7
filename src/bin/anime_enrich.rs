//! anime-enrich: drive the view models from the command line and print JSON.
//!
//! Usage:
//!   anime-enrich last-watch <user-id>          Resolve a user's watch history
//!   anime-enrich azlist [--page N]             A-Z listing with MAL ids
//!   anime-enrich top-rate [--page N]           Most popular on the backend
//!   anime-enrich last-updates                  Recently updated on the backend
//!   anime-enrich top-characters [--page N]     Most favourited characters
//!   anime-enrich anime <mal-id>                One catalog record

use anime_enrich::backend::BackendClient;
use anime_enrich::catalog::CatalogClient;
use anime_enrich::config::AppConfig;
use anime_enrich::logging;
use anime_enrich::views::{
    AllAnimeView, LastUpdatesView, LastWatchView, TopCharactersView, TopRateView,
};
use anyhow::{bail, Context};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let result = match args[1].as_str() {
        "last-watch" => cmd_last_watch(&args[2..]).await,
        "azlist" => cmd_azlist(&args[2..]).await,
        "top-rate" => cmd_top_rate(&args[2..]).await,
        "last-updates" => cmd_last_updates().await,
        "top-characters" => cmd_top_characters(&args[2..]).await,
        "anime" => cmd_anime(&args[2..]).await,
        "version" | "--version" | "-V" => {
            println!("anime-enrich {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"anime-enrich - batch enrichment for the anime companion app

USAGE:
    anime-enrich <COMMAND> [OPTIONS]

COMMANDS:
    last-watch <user-id>        Resolve a user's watch history, newest first
    azlist [--page N]           One page of the A-Z listing with MAL ids
    top-rate [--page N]         One page of the most popular titles
    last-updates                Recently updated titles
    top-characters [--page N]   One page of the most favourited characters
    anime <mal-id>              Fetch one catalog record
    version                     Show version information
    help                        Show this help message

ENVIRONMENT:
    ANIME_ENRICH_CONFIG         YAML config file
    ANIME_CATALOG_URL           Catalog API base URL
    ANIME_BACKEND_URL           Streaming backend base URL
    ANIME_USER_SERVICE_URL      User service base URL
    ANIME_BATCH_CONCURRENCY     Requests per wave
    ANIME_BATCH_DELAY_MS        Pause between waves
    ANIME_BATCH_MAX_RETRIES     Retries per rate-limited item (last-watch keeps at least 3)
    RUST_LOG                    Log filter (logs go to stderr)"#
    );
}

fn setup() -> anyhow::Result<AppConfig> {
    logging::init();
    AppConfig::load().context("loading configuration")
}

/// Cancelled on Ctrl-C so a long run stops between waves.
fn interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            child.cancel();
        }
    });
    token
}

fn page_arg(args: &[String]) -> anyhow::Result<u32> {
    for (i, arg) in args.iter().enumerate() {
        if arg == "--page" {
            let Some(raw) = args.get(i + 1) else {
                bail!("--page needs a value");
            };
            return raw.parse().with_context(|| format!("invalid page: {raw}"));
        }
    }
    Ok(1)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
struct ViewDump<'a, T, S> {
    items: &'a [T],
    state: S,
}

async fn cmd_last_watch(args: &[String]) -> anyhow::Result<()> {
    let Some(user_id) = args.first() else {
        bail!("usage: anime-enrich last-watch <user-id>");
    };
    let config = setup()?;
    let backend = Arc::new(BackendClient::new(&config)?);
    let catalog = Arc::new(CatalogClient::new(&config)?);

    let batch = LastWatchView::batch_config_from(&config.batch).with_trailing_delay(false);
    let mut view = LastWatchView::new(backend, catalog, Some(user_id.clone()))
        .with_batch_config(batch)
        .with_cancellation(interrupt_token());
    view.load().await;

    let state = view.state();
    if let Some(notice) = state.notice() {
        eprintln!("{notice}");
    }
    print_json(&ViewDump {
        items: view.items(),
        state,
    })
}

async fn cmd_azlist(args: &[String]) -> anyhow::Result<()> {
    let page = page_arg(args)?;
    let config = setup()?;
    let backend = Arc::new(BackendClient::new(&config)?);

    let batch = config.batch.clone().with_trailing_delay(false);
    let mut view = AllAnimeView::new(backend)
        .with_batch_config(batch)
        .with_cancellation(interrupt_token());
    view.load(page).await;

    let state = view.state();
    if let Some(notice) = state.notice() {
        eprintln!("{notice}");
    }
    print_json(&ViewDump {
        items: view.items(),
        state,
    })
}

async fn cmd_top_rate(args: &[String]) -> anyhow::Result<()> {
    let page = page_arg(args)?;
    let config = setup()?;
    let backend = Arc::new(BackendClient::new(&config)?);

    let mut view = TopRateView::new(backend);
    view.load(page).await;

    let state = view.state();
    if let Some(notice) = state.notice() {
        eprintln!("{notice}");
    }
    print_json(&ViewDump {
        items: view.items(),
        state,
    })
}

async fn cmd_last_updates() -> anyhow::Result<()> {
    let config = setup()?;
    let backend = Arc::new(BackendClient::new(&config)?);

    let mut view = LastUpdatesView::new(backend);
    view.load().await;

    let state = view.state();
    if let Some(notice) = state.notice() {
        eprintln!("{notice}");
    }
    print_json(&ViewDump {
        items: view.items(),
        state,
    })
}

async fn cmd_top_characters(args: &[String]) -> anyhow::Result<()> {
    let page = page_arg(args)?;
    let config = setup()?;
    let catalog = Arc::new(CatalogClient::new(&config)?);

    let mut view = TopCharactersView::new(catalog);
    view.load(page).await;

    let state = view.state();
    if let Some(notice) = state.notice() {
        eprintln!("{notice}");
    }
    print_json(&ViewDump {
        items: view.items(),
        state,
    })
}

async fn cmd_anime(args: &[String]) -> anyhow::Result<()> {
    let Some(raw) = args.first() else {
        bail!("usage: anime-enrich anime <mal-id>");
    };
    let mal_id: u64 = raw
        .parse()
        .with_context(|| format!("invalid MAL id: {raw}"))?;
    let config = setup()?;
    let catalog = CatalogClient::new(&config)?;
    let anime = catalog.anime_by_id(mal_id).await?;
    print_json(&anime)
}
