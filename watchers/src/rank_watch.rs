use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

use lib_ranksync::ingestors::SseUpdateChannel;
use lib_ranksync::retrieve::HttpSnapshotSource;
use lib_ranksync::{RankingSync, RankingView};

mod watch_logic;
use watch_logic::{config, logger, render};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let config = config::load_config();
    logger::setup_logging(&config.log_dir(), config.log_level())?;

    let sync_config = config.sync_config().context("Invalid ranking configuration")?;
    let source = HttpSnapshotSource::from_config(&sync_config).context("RANK_API_BASE must be an http(s) URL")?;
    let channel = if config.disable_stream.unwrap_or(false) {
        log::info!("Update stream disabled; running snapshot-only.");
        SseUpdateChannel::disabled()
    } else {
        SseUpdateChannel::from_config(&sync_config)
    };
    let sync = RankingSync::new(sync_config, Arc::new(source), Arc::new(channel));

    let mut views = sync.subscribe();
    sync.activate();

    let show_top = config.show_top.unwrap_or(10);
    let refresh_every = config.refresh_every_secs.filter(|s| *s > 0).map(Duration::from_secs);

    let printer = tokio::spawn(async move {
        let mut tracker = render::ViewTracker::default();
        while views.changed().await.is_ok() {
            let view = views.borrow_and_update().clone();
            print_view(&view, &mut tracker, show_top);
        }
    });

    tokio::select! {
        _ = signal::ctrl_c() => {
            log::info!("Ctrl-C received, initiating shutdown.");
        }
        _ = wait_for_terminate() => {}
        _ = periodic_refresh(&sync, refresh_every) => {}
    }

    sync.deactivate();
    printer.abort();
    let _ = printer.await;

    log::info!("Shutdown complete.");
    Ok(())
}

fn print_view(view: &RankingView, tracker: &mut render::ViewTracker, show_top: usize) {
    let changes = tracker.observe(view);
    if changes.status {
        log::info!("Stream status: {}", view.stream_status);
    }
    if changes.table {
        println!("{}", render::render_table(view, show_top));
    }
    println!("{}", render::render_status(view));
}

async fn periodic_refresh(sync: &RankingSync, every: Option<Duration>) {
    let Some(every) = every else {
        std::future::pending::<()>().await;
        return;
    };
    let mut ticker = tokio::time::interval(every);
    // The first tick fires immediately and activation already loads.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        log::debug!("Periodic refresh");
        sync.refresh();
    }
}

async fn wait_for_terminate() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut term_signal) => {
                term_signal.recv().await;
                log::info!("SIGTERM received, initiating shutdown.");
            }
            Err(e) => {
                log::warn!("Cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        // On non-unix platforms, just wait forever.
        std::future::pending::<()>().await;
    }
}
