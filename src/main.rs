use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use hopscotch::gateway::Feedback;
use hopscotch::navigation::ScrollTo;
use hopscotch::session::{Hop, HopKind};
use hopscotch::{Config, HttpGateway, Navigator, SessionStore, SummaryView};

/// Interactive trail runner for hopscotch search.
#[derive(Debug, Parser)]
#[command(name = "hopscotch", version, about)]
struct Cli {
    /// Search backend base URL (overrides HOPSCOTCH_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(base_url) = cli.base_url {
        config.gateway.base_url = base_url;
    }

    // Initialize logging
    init_logging(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        base_url = %config.gateway.base_url,
        "Hopscotch starting..."
    );

    let gateway = match HttpGateway::new(&config.gateway, config.request.clone()) {
        Ok(g) => g,
        Err(e) => {
            error!(error = %e, "Failed to initialize gateway client");
            return Err(e.into());
        }
    };

    let store = Arc::new(SessionStore::new(Arc::new(gateway)));
    let navigator = Navigator::new(Arc::clone(&store));

    println!("hopscotch - type a query to start exploring");
    println!("commands: /similar N, /different N, /mark N [text], /jump N, /summary, /quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print_prompt(&store);
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('/') {
            if !handle_command(&navigator, &store, command).await {
                break;
            }
        } else {
            submit(&navigator, &store, &line).await;
        }
    }

    info!("Session ended");
    Ok(())
}

fn print_prompt(store: &SessionStore) {
    println!(
        "\n[box {} of {}]",
        store.current_hop(),
        store.latest_hop_id()
    );
}

/// Submit free text as a query against the latest input box, or a new one.
async fn submit(navigator: &Navigator, store: &SessionStore, query: &str) {
    let latest = store.latest_hop_id();
    let target = match store.hop(latest) {
        Some(hop) if hop.kind == HopKind::Input => latest,
        _ => store.next_hop_id(),
    };

    match navigator.submit_query(query, target).await {
        Ok(scroll) => {
            if let Some(hop) = store.hop(store.current_hop()) {
                print_hop(&hop);
            }
            announce_scroll(scroll);
        }
        Err(e) => println!("! {}", notification(&e)),
    }
}

/// Dispatch a slash command. Returns false when the loop should exit.
async fn handle_command(navigator: &Navigator, store: &SessionStore, command: &str) -> bool {
    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default();

    match name {
        "quit" | "q" => return false,
        "similar" | "different" => {
            let feedback = if name == "similar" {
                Feedback::Similar
            } else {
                Feedback::Different
            };
            let Some(index) = parts.next().and_then(|s| s.parse::<usize>().ok()) else {
                println!("! usage: /{} N (result number 0-2)", name);
                return true;
            };
            let latest = store.latest_hop_id();
            match navigator.give_feedback(feedback, latest, index).await {
                Ok(scroll) => {
                    if let Some(hop) = store.hop(store.current_hop()) {
                        print_hop(&hop);
                    }
                    announce_scroll(scroll);
                }
                Err(e) => println!("! {}", notification(&e)),
            }
        }
        "mark" => {
            let Some(index) = parts.next().and_then(|s| s.parse::<usize>().ok()) else {
                println!("! usage: /mark N [steering text]");
                return true;
            };
            let text: Vec<&str> = parts.collect();
            let steering_text = (!text.is_empty()).then(|| text.join(" "));
            match store.add_reference_point(store.latest_hop_id(), index, steering_text) {
                Ok(()) => println!("reference point recorded"),
                Err(e) => println!("! {}", notification(&e)),
            }
        }
        "jump" => {
            let Some(hop_id) = parts.next().and_then(|s| s.parse().ok()) else {
                println!("! usage: /jump N");
                return true;
            };
            match navigator.jump_to(hop_id) {
                Ok(scroll) => {
                    if let Some(hop) = store.hop(hop_id) {
                        print_hop(&hop);
                    }
                    announce_scroll(Some(scroll));
                }
                Err(e) => println!("! {}", notification(&e)),
            }
        }
        "summary" => print_summary(store),
        _ => println!("! unknown command: /{}", name),
    }

    true
}

fn print_hop(hop: &Hop) {
    if let Some(query) = &hop.query {
        println!("box {} - \"{}\"", hop.id, query);
    } else {
        println!("box {} - awaiting query", hop.id);
    }
    for (i, result) in hop.result_slice().iter().enumerate() {
        println!("  [{}] {} - {}", i, result.title, result.description);
        println!("      {}", result.url);
    }
}

fn print_summary(store: &SessionStore) {
    let view = SummaryView::project(&store.snapshot());

    println!("prompts:");
    for prompt in view.prompts() {
        println!("  box {}: {}", prompt.hop_id, prompt.query);
    }

    println!("reference points:");
    if view.reference_points().is_empty() {
        println!("  (none yet)");
    }
    for point in view.reference_points() {
        match &point.steering_text {
            Some(text) => println!("  box {}: {} (steering: {})", point.hop_id, point.result.title, text),
            None => println!("  box {}: {}", point.hop_id, point.result.title),
        }
    }

    if let Some(hop) = view.selected() {
        println!("selected:");
        print_hop(hop);
    }

    match view.share_path() {
        Some(path) => println!("share: {}", path),
        None => println!("share: no results yet"),
    }
}

fn announce_scroll(scroll: Option<ScrollTo>) {
    if let Some(scroll) = scroll {
        info!(hop_id = scroll.hop_id, "Centering box");
    }
}

/// One-line, recoverable user notification for any failure.
fn notification(error: &hopscotch::AppError) -> String {
    match error {
        hopscotch::AppError::Gateway(_) => {
            format!("{} - is the backend running?", error)
        }
        _ => error.to_string(),
    }
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        hopscotch::config::LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        hopscotch::config::LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
