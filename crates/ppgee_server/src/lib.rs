//! HTTP surface for the PPGEE dashboard: one CRUD route per entity
//! collection plus the administrator login.

pub mod config;
mod http;

pub use config::ServerConfig;
pub use http::{build_router, AppState};
