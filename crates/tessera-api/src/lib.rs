pub mod config;
pub mod error;
pub mod handlers;
pub mod state;
pub mod transport;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use state::AppState;
