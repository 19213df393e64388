//! Zone engine entry point.
//!
//! Wires the platform adapters into the engine, starts the enforcement
//! workers and blocks until Ctrl-C.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config()          -- TOML from the platform config dir
//!  └─ ZoneEngine::new()      -- computes initial zone geometry
//!  └─ engine.start()
//!       ├─ event pump        (WinEvent hook thread + pump thread)
//!       ├─ maximize poll     (slow-path sweep, 750 ms default)
//!       ├─ cursor guard      (clip reassert, 250 ms default)
//!       └─ overlay window    (topmost black popup over the exclusion zone)
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use zone_engine::application::commands::{EngineCommand, ZoneEngine};
use zone_engine::infrastructure::overlay_display::OverlayDisplay;
use zone_engine::infrastructure::storage::config;
use zone_engine::infrastructure::window_events::WindowEventSource;
use zone_engine::infrastructure::window_system::WindowSystem;

type PlatformAdapters = (
    Arc<dyn WindowSystem>,
    Arc<dyn WindowEventSource>,
    Arc<dyn OverlayDisplay>,
);

#[cfg(target_os = "windows")]
fn platform_adapters() -> PlatformAdapters {
    use zone_engine::infrastructure::overlay_display::windows::WindowsOverlayDisplay;
    use zone_engine::infrastructure::window_events::windows::WindowsWindowEventSource;
    use zone_engine::infrastructure::window_system::windows::WindowsWindowSystem;
    (
        Arc::new(WindowsWindowSystem::new()),
        Arc::new(WindowsWindowEventSource::new()),
        Arc::new(WindowsOverlayDisplay::new()),
    )
}

/// Non-Windows builds run against the in-memory adapters so the binary
/// stays buildable and testable on development machines.
#[cfg(not(target_os = "windows"))]
fn platform_adapters() -> PlatformAdapters {
    use zone_engine::infrastructure::overlay_display::mock::MockOverlayDisplay;
    use zone_engine::infrastructure::window_events::mock::MockWindowEventSource;
    use zone_engine::infrastructure::window_system::mock::MockWindowSystem;
    (
        Arc::new(MockWindowSystem::new()),
        Arc::new(MockWindowEventSource::new()),
        Arc::new(MockOverlayDisplay::new()),
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_config = config::load_config().context("loading configuration")?;

    // Initialise structured logging.  The config level is the default;
    // `RUST_LOG` overrides it.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(app_config.engine.log_level.clone())),
        )
        .init();

    info!("zone engine starting");

    let zone_config = app_config
        .zone_config()
        .context("invalid [zones] configuration")?;

    let (window_system, event_source, overlay) = platform_adapters();
    let mut engine = ZoneEngine::new(
        window_system,
        event_source,
        overlay,
        zone_config,
        app_config.engine.target_monitor,
        Duration::from_millis(app_config.engine.poll_interval_ms),
        Duration::from_millis(app_config.engine.cursor_interval_ms),
    );
    engine.start();

    info!("zone engine ready, press Ctrl-C to exit");
    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!("shutdown signal received");

    engine.handle_command(EngineCommand::Shutdown);

    info!("zone engine stopped");
    Ok(())
}
