pub mod aggregate;
pub mod app;
pub mod calendar;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod input;
pub mod models;
pub mod state;
pub mod storage;
pub mod store;
pub mod ui;
pub mod weather;

pub use app::router;
pub use config::AppConfig;
pub use state::AppState;
pub use storage::LocalStorage;
pub use store::RecordStore;
pub use weather::WeatherClient;
