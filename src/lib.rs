pub mod app;
pub mod clock;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod history;
pub mod models;
pub mod stats;
pub mod state;
pub mod storage;
pub mod tasks;
pub mod ui;

pub use app::router;
pub use clock::{Clock, ClockTicker, SystemClock};
pub use config::AppConfig;
pub use state::{AppState, Session};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
