pub mod app;
pub mod config;
pub mod errors;
pub mod extract;
pub mod handlers;
pub mod heatmap;
pub mod models;
pub mod state;
pub mod storage;
pub mod ui;
pub mod votes;
pub mod window;

pub use app::router;
pub use config::Config;
pub use state::AppState;
