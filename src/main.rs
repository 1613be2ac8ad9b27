use clap::{Parser, Subcommand};
use rank_tracker::config::{self, Settings};
use rank_tracker::location::{http_agent, LocationQuery, LocationResolver, ProviderChain};
use rank_tracker::server;
use tracing_subscriber::EnvFilter;

/// Rank Tracker: keyword positions in organic and local map results.
///
/// Examples:
///   rank-tracker serve
///   rank-tracker serve --host 0.0.0.0 --port 8080
///   rank-tracker geocode "Chicago, IL" --pincode 60601
///   rank-tracker status
#[derive(Parser)]
#[command(name = "rank-tracker", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP API server.
    Serve {
        /// Bind address. Defaults to API_HOST.
        #[arg(long)]
        host: Option<String>,

        /// Bind port. Defaults to API_PORT.
        #[arg(long, short = 'p')]
        port: Option<u16>,
    },

    /// Resolve a location through the provider chain and print it as JSON.
    Geocode {
        /// Free-form address, e.g. "Chicago, IL".
        address: String,

        #[arg(long)]
        pincode: Option<String>,

        #[arg(long)]
        city: Option<String>,

        #[arg(long)]
        country: Option<String>,
    },

    /// Probe DataForSEO and every geocoding provider.
    Status,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rank_tracker=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { host, port } => {
            let settings = load_settings();
            settings.log_summary();

            let host = host.unwrap_or_else(|| settings.api_host.clone());
            let port = port.unwrap_or(settings.api_port);
            let state = server::build_state(&settings);

            if let Err(e) = server::start(&host, port, state).await {
                eprintln!("Error: server failed: {}", e);
                std::process::exit(1);
            }
        }

        Command::Geocode { address, pincode, city, country } => {
            let (creds, timeout) = config::geocoding_from_env().unwrap_or_else(|e| {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            });
            let resolver = LocationResolver::new(ProviderChain::from_credentials(&creds, http_agent(timeout)));

            let mut query = LocationQuery::new(address);
            if let Some(p) = pincode {
                query = query.with_pincode(p);
            }
            if let Some(c) = city {
                query = query.with_city(c);
            }
            if let Some(c) = country {
                query = query.with_country(c);
            }

            let resolved = resolver.resolve(&query).await.unwrap_or_else(|e| {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            });

            eprintln!("  {} {}", "\u{1F4CD}", resolved.display_line());
            print_json(&resolved);
        }

        Command::Status => {
            let settings = load_settings();
            let state = server::build_state(&settings);

            let ranking = std::sync::Arc::clone(&state.ranking);
            let connected = tokio::task::spawn_blocking(move || ranking.test_connection())
                .await
                .unwrap_or(false);
            let geocoding = state.resolver.status().await;

            eprintln!(
                "  DataForSEO ({}): {}",
                state.ranking.base_url(),
                if connected { "connected" } else { "error" }
            );
            print_json(&geocoding);
        }
    }
}

fn load_settings() -> Settings {
    Settings::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        eprintln!("Set DATAFORSEO_LOGIN and DATAFORSEO_PASSWORD in the environment or a .env file.");
        std::process::exit(1);
    })
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: failed to serialize output: {}", e);
            std::process::exit(1);
        }
    }
}
