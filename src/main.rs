use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

mod cache;
mod config;
mod domain;
mod error;
mod filters;
mod kv;
mod local_store;
mod logging;
mod mock_data;
mod server;
mod service;

use crate::cache::EventCache;
use crate::config::Config;
use crate::domain::EventType;
use crate::filters::{filter_by_date, filter_by_price, upcoming_events, DateFilter, PriceFilter};
use crate::kv::{KvStore, RedisKv};
use crate::local_store::LocalEventStore;
use crate::service::{DataMode, EventService};

#[derive(Parser)]
#[command(name = "afisha-events")]
#[command(about = "Afisha event catalog core: retrieval, caching and local overrides")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the local event injection API
    Serve {
        /// Port override for the local API
        #[arg(long)]
        port: Option<u16>,
    },
    /// One-shot event retrieval query
    Events {
        /// Scope to one category (concert, sport, theater, ...)
        #[arg(long = "type")]
        event_type: Option<String>,
        /// Date bucket: today, tomorrow, week, month
        #[arg(long)]
        date: Option<String>,
        /// Price bucket: free, cheap, medium, expensive, luxury
        #[arg(long)]
        price: Option<String>,
        /// Keep only upcoming events, sorted by date
        #[arg(long)]
        upcoming: bool,
    },
}

async fn connect_kv(config: &Config) -> Option<Arc<dyn KvStore>> {
    let url = config.redis_url()?;
    match RedisKv::connect(&url).await {
        Ok(kv) => Some(Arc::new(kv)),
        Err(e) => {
            warn!("Redis unavailable, running without backend: {}", e);
            None
        }
    }
}

fn build_service(
    config: &Config,
    kv: Option<Arc<dyn KvStore>>,
    store: Arc<LocalEventStore>,
) -> anyhow::Result<EventService> {
    let mode = if config.data.use_mock_data {
        DataMode::Mock
    } else {
        DataMode::Live
    };
    let cache = EventCache::new(kv, config.cache.ttl_seconds);
    let service = EventService::new(
        config.gateway.url.clone(),
        Duration::from_secs(config.gateway.timeout_seconds),
        mode,
        config.data.mock_fallback,
        cache,
        store,
    )?;
    info!(
        "Event service ready. Mode: {}",
        if mode == DataMode::Mock { "MOCK DATA" } else { "API" }
    );
    Ok(service)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();

    let config = Config::load().unwrap_or_else(|e| {
        warn!("{}; falling back to defaults", e);
        Config::default()
    });

    match cli.command {
        Commands::Serve { port } => {
            if !config.local_api.enabled {
                warn!("Local API disabled in config, nothing to serve");
                return Ok(());
            }
            let kv = connect_kv(&config).await;
            let store = Arc::new(LocalEventStore::open(kv).await);
            let port = port.unwrap_or(config.local_api.port);
            println!("🚀 Local API running on http://localhost:{port}");
            server::start_server(store, port)
                .await
                .map_err(|e| anyhow::anyhow!("server error: {e}"))?;
        }
        Commands::Events {
            event_type,
            date,
            price,
            upcoming,
        } => {
            let event_type = match event_type {
                Some(raw) => Some(raw.parse::<EventType>().map_err(anyhow::Error::new)?),
                None => None,
            };
            let date = match date {
                Some(raw) => Some(raw.parse::<DateFilter>().map_err(anyhow::Error::msg)?),
                None => None,
            };
            let price = match price {
                Some(raw) => Some(raw.parse::<PriceFilter>().map_err(anyhow::Error::msg)?),
                None => None,
            };

            let kv = connect_kv(&config).await;
            let store = Arc::new(LocalEventStore::open(kv.clone()).await);
            let service = build_service(&config, kv, store)?;

            let mut events = service.get_events(event_type).await;
            if upcoming {
                events = upcoming_events(events);
            }
            if let Some(date) = date {
                events = filter_by_date(events, date);
            }
            if let Some(price) = price {
                events = filter_by_price(events, price);
            }

            println!("\n📅 {} events", events.len());
            for event in &events {
                println!(
                    "   {}  {}  [{}]  {} — {}",
                    event.date_preview.format("%Y-%m-%d %H:%M"),
                    event.title,
                    event.event_type,
                    event.place,
                    if event.price == 0.0 {
                        "free".to_string()
                    } else {
                        format!("{:.0}", event.price)
                    }
                );
            }
        }
    }

    Ok(())
}
