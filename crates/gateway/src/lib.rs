//! Gateway client for the Mecanix shop backend.
//!
//! Every feature call goes through [`client::ApiClient`], which runs a
//! [`pipeline::Pipeline`] of stages around each dispatch: bearer-token
//! injection, development logging, session expiry on 401, fixed-delay
//! resends of GETs that got no response, and failure logging.

pub mod auth;
pub mod bootstrap;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod observability;
pub mod pipeline;
pub mod retry;
pub mod session;
pub mod stages;

pub use auth::AuthContext;
pub use client::ApiClient;
pub use config::GatewayConfig;
pub use error::{ApiError, GatewayError};
pub use session::{SessionEvent, SessionEvents};
