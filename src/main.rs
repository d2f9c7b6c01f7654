//! Shift Clock - A state-managed HTTP server that tracks a caregiver's work shift
//! 
//! This is the main entry point for the shift-clock application.

use std::sync::Arc;
use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use shift_clock::{
    api::create_router,
    config::Config,
    services::{AlarmTrigger, CommandAlarm, JsonShiftFile, LoggedHaptic, SilentAlarm, SystemClock},
    state::AppState,
    store::SqliteSessionStore,
    tasks::{resume_signal_task, tick_task, wake_up_recovery_task},
    timer::ShiftTimer,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("shift_clock={},tower_http=info", config.log_level()))
        .init();

    info!("Starting shift-clock server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, db={}, shifts={}",
        config.host,
        config.port,
        config.db.display(),
        config.shifts.display()
    );

    let db_path = config.db.to_string_lossy().into_owned();
    let store = SqliteSessionStore::open(&db_path)
        .with_context(|| format!("Failed to open session database {}", db_path))?;

    let alarm: Arc<dyn AlarmTrigger> = if config.mute {
        Arc::new(SilentAlarm)
    } else {
        Arc::new(CommandAlarm::new(config.alarm_player.clone(), config.sounds_dir.clone()))
    };

    let mut timer = ShiftTimer::new(
        Arc::new(JsonShiftFile::new(config.shifts.clone())),
        Arc::new(store),
        alarm,
        Arc::new(SystemClock),
    )
    .with_alarm_settings(config.alarm_settings());
    if config.haptics {
        timer = timer.with_haptic(Arc::new(LoggedHaptic));
    }

    // Create application state and perform the initial load
    let state = Arc::new(AppState::new(timer, config.port, config.host.clone()));
    let snapshot = state.refresh()?;
    info!(
        "Timer loaded: status={}, remaining={}s",
        snapshot.status, snapshot.seconds_remaining
    );

    // Start the background tasks
    let tick = tokio::spawn(tick_task(Arc::clone(&state)));
    let wake = tokio::spawn(wake_up_recovery_task(
        Arc::clone(&state),
        config.wake_check_interval(),
        config.wake_threshold(),
    ));
    let resume = tokio::spawn(resume_signal_task(Arc::clone(&state)));

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /start          - Clock in to the current shift");
    info!("  POST /pause          - Pause the countdown");
    info!("  POST /resume         - Resume the countdown");
    info!("  POST /stop           - Clock out");
    info!("  POST /reset          - Close the session and re-evaluate");
    info!("  POST /refresh        - Reload shift and session");
    info!("  POST /alarm-settings - Change alarm sound and volume");
    info!("  GET  /sessions       - Session history for the shift");
    info!("  GET  /status         - Current timer status");
    info!("  GET  /health         - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    tick.abort();
    wake.abort();
    resume.abort();
    if let Err(e) = state.teardown() {
        warn!("Failed to tear down timer: {}", e);
    }

    info!("Server shutdown complete");
    Ok(())
}
