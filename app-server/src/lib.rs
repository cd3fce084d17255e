//! Chat web page and command-line front end for the conference assistant.

pub mod config;
pub mod render;
pub mod server;
pub mod session;

pub use config::{AppConfig, ConfigError, UiConfig};
pub use server::{AppState, SESSION_COOKIE, SessionStore, build_router, serve};
pub use session::{ChatSession, ChatTurn, Role, SessionState, SubmitOutcome, Transcript};
