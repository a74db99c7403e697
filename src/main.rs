use marginwatch::backend::HttpBackend;
use marginwatch::monitor::TracingSink;
use marginwatch::{AlertCardStore, Config, Scheduler, ThresholdMonitor};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let backend = Arc::new(HttpBackend::new(
        config.alert_api_url.clone(),
        config.agent_api_url.clone(),
    ));
    let cards = Arc::new(AlertCardStore::new(
        backend.clone(),
        config.manual_refresh_debounce,
    ));
    let sink = Arc::new(TracingSink::new());
    let monitor = Arc::new(ThresholdMonitor::new(
        backend,
        cards.clone(),
        sink,
        config.margin_threshold,
    ));

    let scheduler = Scheduler::new();

    {
        let cards = cards.clone();
        let monitor = monitor.clone();
        scheduler.start("alert-poll", config.poll_interval, move || {
            let cards = cards.clone();
            let monitor = monitor.clone();
            async move {
                cards.refresh().await;
                monitor.run_pass().await;
            }
        });
    }

    {
        let monitor = monitor.clone();
        scheduler.start("dedup-window", config.dedup_window, move || {
            let monitor = monitor.clone();
            async move {
                monitor.clear_window();
            }
        });
    }

    tracing::info!(
        "Monitoring started (poll {:?}, threshold {:.1}%, window {:?})",
        config.poll_interval,
        config.margin_threshold,
        config.dedup_window
    );

    if let Err(e) = tokio::signal::ctrl_c().await {
        eprintln!("Failed to listen for shutdown signal: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Shutting down");
    scheduler.shutdown();
}
