//! Core module: infrastructural pieces of the application.
//!
//! - Session validation and widget API key checks
//! - Configuration
//! - Error handling
//! - Shared application state

pub mod auth;
pub mod config;
pub mod error;
pub mod state;

pub use auth::{AgentContext, agent_auth_middleware, decode_jwt};
pub use config::Config;
pub use error::AppError;
pub use state::AppState;
