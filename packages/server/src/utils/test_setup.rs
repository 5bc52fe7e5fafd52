use dotenvy::dotenv;
use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Loads `.env` and routes engine logs to the test harness output.
pub fn setup_test_env() {
    INIT.call_once(|| {
        dotenv().ok();
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
