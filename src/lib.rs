pub mod app;
pub mod build_info;
pub mod config;
pub mod diagnostics;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod remote;
pub mod storage;
pub mod ui;
pub mod state;

pub use app::router;
pub use config::{init_environment, init_tracing, load_dotenv, resolve_data_path};
pub use state::AppState;
pub use storage::{Backend, CounterStore};
