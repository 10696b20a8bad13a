use dotenvy::dotenv;
use tracing::{error, info};
use uuid::Uuid;

fn init_logging(format: &str) {
    common::utils::logging::init_logging(format);
    info!(service = "seed", event = "logger_init", "tracing subscriber initialized");
}

fn main() -> std::process::ExitCode {
    // .env first so DATA_DIR, ADMIN_* and RUST_LOG apply
    dotenv().ok();

    let cfg = match configs::AppConfig::load_and_validate() {
        Ok(cfg) => cfg,
        Err(e) => {
            // no config means no format choice; report with the compact logger
            common::utils::logging::init_logging_default();
            error!(service = "seed", event = "config_invalid", error = %e, "failed to load configuration");
            return std::process::ExitCode::FAILURE;
        }
    };
    init_logging(&cfg.logging.format);

    // ties the start and done events to a panic, if any
    let run_id = Uuid::new_v4();
    let pid = std::process::id();
    let version = env!("CARGO_PKG_VERSION");

    // panics go through tracing so JSON output stays parseable
    std::panic::set_hook(Box::new(move |info| {
        error!(service = "seed", event = "panic", %run_id, pid, message = %info, "unhandled panic occurred");
    }));

    // seeding is sequential file I/O, one thread is enough
    let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "seed", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return std::process::ExitCode::FAILURE;
        }
    };

    info!(service = "seed", event = "start", %run_id, pid, version, data_dir = %cfg.storage.data_dir, "seeding data directory");

    rt.block_on(async move {
        let platform = match platform::startup::bootstrap(&cfg).await {
            Ok(p) => p,
            Err(e) => {
                error!(service = "seed", event = "bootstrap_failed", error = %e, "bootstrap returned error");
                return std::process::ExitCode::FAILURE;
            }
        };

        // summary of what is on disk now
        let keys = platform.storage().keys().await.unwrap_or_default();
        info!(
            service = "seed",
            event = "done",
            %run_id,
            posts = platform.blogs.blogs().await.len(),
            jobs = platform.jobs.jobs().await.len(),
            storage_keys = keys.len(),
            "data directory ready"
        );
        std::process::ExitCode::SUCCESS
    })
}
