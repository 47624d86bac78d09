pub mod cache;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod router;
pub mod state;

pub use config::AppConfig;
pub use router::build_router;
pub use state::AppState;
