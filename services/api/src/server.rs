use crate::cli::ServeArgs;
use crate::infra::{
    default_cascade_config, AppState, InMemorySchedulingStore, LoggingCoverNotifier,
    RosterStaffDirectory,
};
use crate::routes::with_scheduling_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Utc;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use swirl_ops::config::AppConfig;
use swirl_ops::error::AppError;
use swirl_ops::telemetry;
use swirl_ops::workflows::scheduling::cover::ShiftCoverService;
use swirl_ops::workflows::scheduling::roster::StaffRoster;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let roster = match args.roster_csv.take() {
        Some(path) => {
            let roster = StaffRoster::from_path(&path)?;
            info!(path = %path.display(), staff = roster.len(), "staff roster imported");
            roster
        }
        None => StaffRoster::default(),
    };

    let store = Arc::new(InMemorySchedulingStore::default());
    let directory = Arc::new(RosterStaffDirectory::from_roster(roster));
    let notifier = Arc::new(LoggingCoverNotifier);
    let cover_service = Arc::new(ShiftCoverService::new(
        store,
        directory,
        notifier,
        default_cascade_config(),
    ));

    spawn_expiry_sweep(cover_service.clone(), config.sweep.interval);

    let app = with_scheduling_routes(cover_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "shift-cover scheduling service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Deadlines are wall-clock state; this loop only hurries them along. A
/// missed tick is harmless because status reads settle expiry lazily too.
fn spawn_expiry_sweep(
    service: Arc<ShiftCoverService<InMemorySchedulingStore, RosterStaffDirectory, LoggingCoverNotifier>>,
    interval: std::time::Duration,
) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            match service.expire_overdue(Utc::now()) {
                Ok(outcome) if outcome.expired > 0 => {
                    info!(
                        expired = outcome.expired,
                        escalated = outcome.escalated,
                        "expiry sweep completed"
                    );
                }
                Ok(_) => {}
                Err(err) => warn!(error = %err, "expiry sweep failed, will retry next tick"),
            }
        }
    });
}
