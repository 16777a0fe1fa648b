//! HTTP transport for the Warren URL shortener.

pub mod app;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod model;
pub mod state;

pub use app::{App, RouterOptions};
pub use state::AppState;
