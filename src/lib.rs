pub mod app;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod models;
pub mod motivation;
pub mod state;
pub mod stats;
pub mod store;
pub mod ui;

pub use app::router;
pub use config::AppConfig;
pub use motivation::FallbackMotivation;
pub use state::AppState;
pub use store::JsonFileStore;
