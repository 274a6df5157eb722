pub mod timezone;

pub use timezone::{business_now, business_today};

/// Initialize tracing with environment-based filtering
pub fn init_tracing() {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "movement_backend=info".to_string()
        } else {
            "movement_backend=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(log_level))
        .init();
}
