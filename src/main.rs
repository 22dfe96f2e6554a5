use std::env;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address;
use anyhow::{bail, Context, Result};
use chrono::Utc;
use tokio::sync::{mpsc, RwLock};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use predict_and_win::api::{ChainReader, RpcClient};
use predict_and_win::config::Config;
use predict_and_win::directory::MarketDirectory;
use predict_and_win::models::{Direction, PredictionRequest};
use predict_and_win::state::AppState;
use predict_and_win::submit::PredictionSubmitter;
use predict_and_win::view::{render_card, render_page, render_submission, MarketCardView};
use predict_and_win::workers::DirectoryRefresherWorker;

const USAGE: &str = "usage: predict-and-win [watch | markets | predict <market> <above|below> <amount>]";

enum Command {
    /// Keep the market list on screen, refreshing periodically
    Watch,
    /// Print the market list once
    Markets,
    /// Submit one prediction, then show the refreshed market
    Predict {
        market: Address,
        direction: Direction,
        amount: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "predict_and_win=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = env::args().collect();
    let command = parse_command(&args)?;

    info!("Starting predict-and-win");

    // Load configuration
    let config = Config::from_env()?;
    info!("Configuration loaded (rpc: {})", config.rpc_url);

    let rpc = Arc::new(RpcClient::new(
        &config.rpc_url,
        Duration::from_millis(config.receipt_poll_interval),
    ));

    let reader: Arc<dyn ChainReader> = rpc.clone();
    let directory = Arc::new(MarketDirectory::new(reader, config.market_factory_address));
    info!("Listing markets from registry {}", directory.registry());

    let mut app = AppState::new(directory);
    if let Some(wallet) = config.wallet_address {
        app.connect(wallet);
    }
    let app = Arc::new(RwLock::new(app));

    match command {
        Command::Watch => watch(app, config.refresh_interval).await,
        Command::Markets => list_markets(app).await,
        Command::Predict {
            market,
            direction,
            amount,
        } => {
            predict(
                app,
                rpc,
                config.refresh_interval,
                PredictionRequest::new(market, direction, amount),
            )
            .await
        }
    }
}

fn parse_command(args: &[String]) -> Result<Command> {
    match args.get(1).map(String::as_str) {
        None | Some("watch") => Ok(Command::Watch),
        Some("markets") => Ok(Command::Markets),
        Some("predict") => {
            let (Some(market), Some(direction), Some(amount)) =
                (args.get(2), args.get(3), args.get(4))
            else {
                bail!("{}", USAGE);
            };

            Ok(Command::Predict {
                market: market.parse().context("market must be a valid address")?,
                direction: direction.parse().map_err(anyhow::Error::msg)?,
                amount: amount.clone(),
            })
        }
        Some(other) => bail!("unknown command '{}'\n{}", other, USAGE),
    }
}

/// Print the market list every time it changes until Ctrl-C
async fn watch(app: Arc<RwLock<AppState>>, refresh_interval: u64) -> Result<()> {
    let mut view_rx = app.read().await.directory().subscribe();

    // Held so the trigger channel stays open for the worker
    let (_trigger_tx, trigger_rx) = mpsc::channel(8);
    let refresher = DirectoryRefresherWorker::new(Arc::clone(&app), trigger_rx, refresh_interval);

    let refresher_handle = tokio::spawn(async move {
        refresher.run().await;
    });

    info!("Watching markets, Ctrl-C to exit");

    let mut last_printed = String::new();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
            changed = view_rx.changed() => {
                if changed.is_err() {
                    error!("Market directory closed unexpectedly");
                    break;
                }

                let page = render_page(&app.read().await.page(Utc::now()));
                if page != last_printed {
                    println!("{}", page);
                    last_printed = page;
                }
            }
        }
    }

    refresher_handle.abort();
    info!("Shutting down predict-and-win");
    Ok(())
}

async fn list_markets(app: Arc<RwLock<AppState>>) -> Result<()> {
    let app = app.read().await;
    app.refresh().await;
    println!("{}", render_page(&app.page(Utc::now())));
    Ok(())
}

/// Submit one prediction and print the market once pools are re-read
async fn predict(
    app: Arc<RwLock<AppState>>,
    rpc: Arc<RpcClient>,
    refresh_interval: u64,
    request: PredictionRequest,
) -> Result<()> {
    if !app.read().await.session().is_connected() {
        bail!("WALLET_ADDRESS must be set to submit a prediction");
    }

    let mut view_rx = app.read().await.directory().subscribe();
    let (trigger_tx, trigger_rx) = mpsc::channel(8);
    let refresher = DirectoryRefresherWorker::new(Arc::clone(&app), trigger_rx, refresh_interval);
    let refresher_handle = tokio::spawn(refresher.run());

    let listed_request = view_rx
        .wait_for(|view| view.request_id > 0 && !view.loading)
        .await
        .context("Market directory closed before listing")?
        .request_id;

    let market = app
        .write()
        .await
        .select_market(request.market)
        .with_context(|| format!("market {} is not listed or not open", request.market))?;

    println!("{}", render_card(&MarketCardView::from_snapshot(&market, Utc::now())));
    println!("Your prediction: {} with {} ETH", request.direction, request.amount);

    let submitter = PredictionSubmitter::new(rpc).with_refresh_trigger(trigger_tx);

    let mut state_rx = submitter.subscribe();
    let printer = tokio::spawn(async move {
        while state_rx.changed().await.is_ok() {
            let line = render_submission(&state_rx.borrow_and_update());
            if !line.is_empty() {
                println!("{}", line);
            }
        }
    });

    let session = app.read().await.session().clone();
    let result = submitter.submit(&session, &market, request).await;

    if result.is_ok() {
        view_rx
            .wait_for(|view| view.request_id > listed_request && !view.loading)
            .await
            .context("Market directory closed before refresh")?;

        if let Some(updated) = app.read().await.selected_market() {
            println!("{}", render_card(&MarketCardView::from_snapshot(&updated, Utc::now())));
        }
    }

    // Closing the submitter ends the printer after its last update
    drop(submitter);
    let _ = printer.await;

    app.write().await.close_modal();
    refresher_handle.abort();

    result.map(|_| ()).map_err(Into::into)
}
