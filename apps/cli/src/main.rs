mod args;
mod dirs;
mod logging;

use std::io;

use chrono::Local;
use tracker_app::{AppPaths, Scheduler, Tracker, TrackerConfig, ensure_app_data_dir, log_cycle};
use tracker_core::format_megabytes;
use tracker_store::UsageStore;
use unifi::UnifiClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = args::parse_args(std::env::args().skip(1)).map_err(|err| {
        eprintln!("{err}");
        args::print_help();
        io::Error::new(io::ErrorKind::InvalidInput, "invalid arguments")
    })?;

    dotenvy::dotenv().ok();
    let config = TrackerConfig::load(args.config.as_deref()).inspect_err(|err| {
        eprintln!("{err}");
    })?;
    logging::init_logging(&config.logging);

    let paths = AppPaths::for_config(&config, dirs::default_data_dir());
    ensure_app_data_dir(&paths)?;
    let store = UsageStore::new(&paths.state_path);

    if args.status {
        return print_status(&store, &config);
    }

    tracing::info!(
        controller = %config.controller.base_url,
        device = %config.controller.device_mac,
        billing_day = config.billing.start_day(),
        counter_mode = config.billing.counter_mode().as_str(),
        state_file = %store.path().display(),
        "LTE data usage tracker configured"
    );

    let source = UnifiClient::new(config.controller.clone());
    let mut tracker = Tracker::new(source, store, config.billing);
    match tracker.restore() {
        Ok(()) => tracing::info!(
            usage = %format_megabytes(tracker.record().cumulative_usage_bytes),
            "loaded stored usage"
        ),
        Err(err) => tracing::error!(
            step = err.step(),
            error = %err,
            "stored usage unreadable, cycles will be skipped until the state file is fixed or removed"
        ),
    }

    if args.once {
        let result = tracker.run_cycle(Local::now().fixed_offset()).await;
        log_cycle(&result);
        tracker.end_session();
        result?;
        tracker.flush()?;
        return Ok(());
    }

    println!("LTE Data Usage Tracker started. Press Ctrl+C to exit.");
    Scheduler::new(config.interval)?
        .run(&mut tracker, shutdown_signal())
        .await;

    Ok(())
}

fn print_status(
    store: &UsageStore,
    config: &TrackerConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let record = store.load()?;
    println!(
        "Cumulative LTE data usage: {}",
        format_megabytes(record.cumulative_usage_bytes)
    );
    match record.last_reset_at {
        Some(at) => println!("Last reset: {}", at.to_rfc3339()),
        None => println!("Last reset: never"),
    }
    println!("Billing cycle starts on day {}", config.billing.start_day());
    println!("State file: {}", store.path().display());
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
