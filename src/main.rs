use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use eframe::egui;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use unipad::config::Config;
use unipad::controller::{GilrsDiscovery, InputCoordinator};
use unipad::ui::PadUI;

/// Gamepad input with on-screen virtual sticks as fallback
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (default: ~/.config/unipad/config.toml)
    #[arg(short, long, env = "UNIPAD_CONFIG")]
    config: Option<PathBuf>,

    /// Log unified events to the console instead of opening a window
    #[arg(long)]
    headless: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;
    let args = Args::parse();

    let config = Config::load(args.config.as_deref()).await?;

    info!("Initializing gamepad discovery");
    let discovery = GilrsDiscovery::spawn(config.controller.collector.clone())
        .await
        .map_err(|e| eyre!("Failed to start gamepad discovery: {}", e))?;
    let coordinator = InputCoordinator::new(&config.controller, Box::new(discovery))?;

    if args.headless {
        return run_headless(coordinator).await;
    }

    info!("Starting pad window");
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([480.0, 320.0]),
        ..Default::default()
    };
    let ui_config = config.ui.clone();
    eframe::run_native(
        "unipad",
        native_options,
        Box::new(move |cc| Ok(Box::new(PadUI::new(cc, coordinator, ui_config)))),
    )
    .map_err(|e| eyre!("Pad window failed: {}", e))?;

    Ok(())
}

async fn run_headless(mut coordinator: InputCoordinator) -> Result<()> {
    coordinator.set_stick_changed_handler(|event| {
        info!(
            "Stick {:?}: ({:+.3}, {:+.3})",
            event.stick, event.vector.dx, event.vector.dy
        );
    });
    coordinator.set_button_changed_handler(|event| {
        info!(
            "Button {:?}: {:.3} (pressed: {})",
            event.button, event.value, event.pressed
        );
    });
    coordinator.set_connection_observer(|state| info!("Connection state: {}", state));

    info!("Running headless, press Ctrl+C to stop");
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                return Ok(());
            }
            alive = coordinator.pump_next() => {
                if !alive {
                    warn!("Hardware channel closed");
                    return Ok(());
                }
            }
        }
    }
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();
}
