pub mod app;
pub mod auth;
pub mod config;
pub mod errors;
pub mod state;

pub use crate::app::build_app;
pub use crate::errors::AppError;
pub use crate::state::AppState;
